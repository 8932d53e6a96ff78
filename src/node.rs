//! The node capability contract.
//!
//! Predicates and the walker never look at a concrete syntax tree. They only
//! consume the [`Node`] trait below, which any tree model can implement. The
//! vocabulary types (cursor kinds, access levels, types, locations) are shared
//! so that leaf predicates can be written once for every implementation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Read-only view of one entity in an externally owned syntax tree.
///
/// Implementations are cheap handles (typically a reference plus an index).
/// Equality must be identity: two handles are equal when they denote the same
/// entity of the same tree.
pub trait Node: Clone + PartialEq {
    /// Iterator over direct children, in source order.
    type Children: Iterator<Item = Self>;

    fn children(&self) -> Self::Children;

    fn kind(&self) -> CursorKind;

    /// Name of the entity, possibly empty.
    fn spelling(&self) -> &str;

    /// Human-oriented name (e.g. `f(int)` for functions).
    fn displayname(&self) -> &str;

    /// Declared type, if the entity has one.
    fn ty(&self) -> Option<&Type>;

    /// Result type of function-like entities.
    fn result_type(&self) -> Option<&Type>;

    fn access(&self) -> AccessSpecifier;

    fn location(&self) -> Option<&SourceLocation>;

    fn is_definition(&self) -> bool;

    fn semantic_parent(&self) -> Option<Self>;

    fn lexical_parent(&self) -> Option<Self>;

    /// Base name of the file the entity is declared in.
    fn file_name(&self) -> Option<&str> {
        self.location().and_then(SourceLocation::file_name)
    }
}

/// Syntactic category of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorKind {
    TranslationUnit,
    Namespace,
    LinkageSpec,
    ClassDecl,
    StructDecl,
    UnionDecl,
    ClassTemplate,
    EnumDecl,
    EnumConstantDecl,
    FieldDecl,
    VarDecl,
    ParmDecl,
    FunctionDecl,
    FunctionTemplate,
    CxxMethod,
    Constructor,
    Destructor,
    TypedefDecl,
    TypeAliasDecl,
    UsingDirective,
    UsingDeclaration,
    CxxAccessSpecifier,
    CxxBaseSpecifier,
    TemplateTypeParameter,
    TemplateNonTypeParameter,
    TemplateTemplateParameter,
    CompoundStmt,
    MacroDefinition,
    InclusionDirective,
}

impl CursorKind {
    pub const ALL: [CursorKind; 29] = [
        CursorKind::TranslationUnit,
        CursorKind::Namespace,
        CursorKind::LinkageSpec,
        CursorKind::ClassDecl,
        CursorKind::StructDecl,
        CursorKind::UnionDecl,
        CursorKind::ClassTemplate,
        CursorKind::EnumDecl,
        CursorKind::EnumConstantDecl,
        CursorKind::FieldDecl,
        CursorKind::VarDecl,
        CursorKind::ParmDecl,
        CursorKind::FunctionDecl,
        CursorKind::FunctionTemplate,
        CursorKind::CxxMethod,
        CursorKind::Constructor,
        CursorKind::Destructor,
        CursorKind::TypedefDecl,
        CursorKind::TypeAliasDecl,
        CursorKind::UsingDirective,
        CursorKind::UsingDeclaration,
        CursorKind::CxxAccessSpecifier,
        CursorKind::CxxBaseSpecifier,
        CursorKind::TemplateTypeParameter,
        CursorKind::TemplateNonTypeParameter,
        CursorKind::TemplateTemplateParameter,
        CursorKind::CompoundStmt,
        CursorKind::MacroDefinition,
        CursorKind::InclusionDirective,
    ];

    /// Snake-case name, as used in query files and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            CursorKind::TranslationUnit => "translation_unit",
            CursorKind::Namespace => "namespace",
            CursorKind::LinkageSpec => "linkage_spec",
            CursorKind::ClassDecl => "class_decl",
            CursorKind::StructDecl => "struct_decl",
            CursorKind::UnionDecl => "union_decl",
            CursorKind::ClassTemplate => "class_template",
            CursorKind::EnumDecl => "enum_decl",
            CursorKind::EnumConstantDecl => "enum_constant_decl",
            CursorKind::FieldDecl => "field_decl",
            CursorKind::VarDecl => "var_decl",
            CursorKind::ParmDecl => "parm_decl",
            CursorKind::FunctionDecl => "function_decl",
            CursorKind::FunctionTemplate => "function_template",
            CursorKind::CxxMethod => "cxx_method",
            CursorKind::Constructor => "constructor",
            CursorKind::Destructor => "destructor",
            CursorKind::TypedefDecl => "typedef_decl",
            CursorKind::TypeAliasDecl => "type_alias_decl",
            CursorKind::UsingDirective => "using_directive",
            CursorKind::UsingDeclaration => "using_declaration",
            CursorKind::CxxAccessSpecifier => "cxx_access_specifier",
            CursorKind::CxxBaseSpecifier => "cxx_base_specifier",
            CursorKind::TemplateTypeParameter => "template_type_parameter",
            CursorKind::TemplateNonTypeParameter => "template_non_type_parameter",
            CursorKind::TemplateTemplateParameter => "template_template_parameter",
            CursorKind::CompoundStmt => "compound_stmt",
            CursorKind::MacroDefinition => "macro_definition",
            CursorKind::InclusionDirective => "inclusion_directive",
        }
    }

    /// Record-like kinds that open a member scope.
    pub fn is_record(self) -> bool {
        matches!(
            self,
            CursorKind::ClassDecl
                | CursorKind::StructDecl
                | CursorKind::UnionDecl
                | CursorKind::ClassTemplate
        )
    }

    pub fn is_function_like(self) -> bool {
        matches!(
            self,
            CursorKind::FunctionDecl
                | CursorKind::FunctionTemplate
                | CursorKind::CxxMethod
                | CursorKind::Constructor
                | CursorKind::Destructor
        )
    }
}

/// Upper-case form (`CLASS_DECL`), used by tree dumps.
impl fmt::Display for CursorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name().to_ascii_uppercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownName {
    pub what: &'static str,
    pub name: String,
}

impl fmt::Display for UnknownName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.what, self.name)
    }
}

impl std::error::Error for UnknownName {}

impl FromStr for CursorKind {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        CursorKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| UnknownName {
                what: "cursor kind",
                name: s.to_string(),
            })
    }
}

/// C++ access level of a declaration. `None` marks entities without one
/// (namespace-scope declarations, the translation unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessSpecifier {
    #[default]
    None,
    Public,
    Protected,
    Private,
}

impl AccessSpecifier {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().trim_end_matches(':').trim() {
            "public" => Some(AccessSpecifier::Public),
            "protected" => Some(AccessSpecifier::Protected),
            "private" => Some(AccessSpecifier::Private),
            "none" => Some(AccessSpecifier::None),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AccessSpecifier::None => "none",
            AccessSpecifier::Public => "public",
            AccessSpecifier::Protected => "protected",
            AccessSpecifier::Private => "private",
        }
    }
}

impl fmt::Display for AccessSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AccessSpecifier {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccessSpecifier::parse(s).ok_or_else(|| UnknownName {
            what: "access specifier",
            name: s.to_string(),
        })
    }
}

/// Coarse classification of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Void,
    Bool,
    Char,
    Short,
    Int,
    Long,
    LongLong,
    Float,
    Double,
    LongDouble,
    Auto,
    Record,
    Enum,
    Typedef,
    Pointer,
    LValueReference,
    RValueReference,
    Array,
    FunctionProto,
    Unexposed,
}

impl TypeKind {
    /// Built-in scalar types.
    pub fn is_builtin(self) -> bool {
        matches!(
            self,
            TypeKind::Void
                | TypeKind::Bool
                | TypeKind::Char
                | TypeKind::Short
                | TypeKind::Int
                | TypeKind::Long
                | TypeKind::LongLong
                | TypeKind::Float
                | TypeKind::Double
                | TypeKind::LongDouble
        )
    }
}

/// A type descriptor: its classification and its (qualified) spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type {
    pub kind: TypeKind,
    pub spelling: String,
    pub is_const: bool,
}

impl Type {
    pub fn new(kind: TypeKind, spelling: impl Into<String>) -> Self {
        Self {
            kind,
            spelling: spelling.into(),
            is_const: false,
        }
    }

    pub fn with_const(mut self) -> Self {
        if !self.is_const {
            self.is_const = true;
            self.spelling = format!("const {}", self.spelling);
        }
        self
    }

    /// Pointer to this type.
    pub fn pointer(&self) -> Self {
        Type::new(TypeKind::Pointer, format!("{} *", self.spelling))
    }

    pub fn lvalue_reference(&self) -> Self {
        Type::new(TypeKind::LValueReference, format!("{} &", self.spelling))
    }

    pub fn rvalue_reference(&self) -> Self {
        Type::new(TypeKind::RValueReference, format!("{} &&", self.spelling))
    }

    /// Array of this type; `size` is the bound as written, if any.
    pub fn array(&self, size: Option<&str>) -> Self {
        Type::new(
            TypeKind::Array,
            format!("{} [{}]", self.spelling, size.unwrap_or("")),
        )
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spelling)
    }
}

/// A point in a source file. Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: Arc<Path>,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl SourceLocation {
    pub fn file_name(&self) -> Option<&str> {
        self.file.file_name().and_then(|name| name.to_str())
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// Byte range of a construct, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceRange {
    pub byte_start: usize,
    pub byte_end: usize,
}
