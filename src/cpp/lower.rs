//! Lowering from the tree-sitter concrete syntax tree to the cursor arena.
//!
//! Only declarations become cursors. Statements and expressions are dropped,
//! except that declarations found directly inside a function body are kept
//! under a `CompoundStmt` cursor.

use crate::cpp::parser::ParseOptions;
use crate::cpp::unit::{Diagnostic, NodeData, NodeId, TranslationUnit, ROOT};
use crate::node::{AccessSpecifier, CursorKind, SourceLocation, SourceRange, Type, TypeKind};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tree_sitter::{Node as TsNode, Tree};

pub(crate) fn lower(
    path: &Path,
    source: &str,
    tree: &Tree,
    options: ParseOptions,
) -> TranslationUnit {
    let file: Arc<Path> = Arc::from(path);
    let root_node = tree.root_node();

    let mut root = NodeData::new(CursorKind::TranslationUnit, path.to_string_lossy());
    root.qualified_name = String::new();
    root.extent = Some(range(root_node));

    let mut lowering = Lowering {
        source,
        file: Arc::clone(&file),
        options,
        nodes: vec![root],
        names: HashMap::new(),
        diagnostics: Vec::new(),
    };
    lowering.collect_diagnostics(root_node);
    lowering.lower_members(root_node, Scope::root(), &mut AccessSpecifier::None);

    tracing::debug!(
        file = %path.display(),
        cursors = lowering.nodes.len(),
        errors = lowering.diagnostics.len(),
        "lowered translation unit"
    );

    TranslationUnit::new(
        file,
        source.to_string(),
        options,
        lowering.nodes,
        lowering.diagnostics,
    )
}

/// Where new cursors go.
#[derive(Debug, Clone, Copy)]
struct Scope {
    /// Cursor whose child list receives new cursors.
    lexical: NodeId,
    /// Declaring scope: semantic parent of new cursors and base for name lookup.
    semantic: NodeId,
    /// Set while lowering the members of a record.
    record: Option<NodeId>,
}

impl Scope {
    fn root() -> Self {
        Self::inside(ROOT)
    }

    fn inside(id: NodeId) -> Self {
        Self {
            lexical: id,
            semantic: id,
            record: None,
        }
    }

    fn members_of(id: NodeId) -> Self {
        Self {
            lexical: id,
            semantic: id,
            record: Some(id),
        }
    }
}

#[derive(Debug, Clone)]
struct TemplateParam {
    kind: CursorKind,
    name: String,
    ty: Option<Type>,
    location: SourceLocation,
    extent: SourceRange,
}

/// A function declarator together with the construct that carries it.
struct FunctionSite<'t> {
    whole: TsNode<'t>,
    declarator: TsNode<'t>,
    /// `None` for constructors and destructors, which have no written type.
    result: Option<Type>,
    is_definition: bool,
    body: Option<TsNode<'t>>,
}

struct Lowering<'s> {
    source: &'s str,
    file: Arc<Path>,
    options: ParseOptions,
    nodes: Vec<NodeData>,
    /// Qualified name -> declaring cursor, for records, enums, typedefs and namespaces.
    names: HashMap<String, NodeId>,
    diagnostics: Vec<Diagnostic>,
}

impl<'s> Lowering<'s> {
    fn text(&self, node: TsNode<'_>) -> &'s str {
        &self.source[node.byte_range()]
    }

    fn location(&self, node: TsNode<'_>) -> SourceLocation {
        let point = node.start_position();
        SourceLocation {
            file: Arc::clone(&self.file),
            line: point.row + 1,
            column: point.column + 1,
            offset: node.start_byte(),
        }
    }

    fn collect_diagnostics(&mut self, node: TsNode<'_>) {
        if node.is_error() || node.is_missing() {
            let message = if node.is_missing() {
                format!("missing {}", node.kind())
            } else {
                "syntax error".to_string()
            };
            let location = self.location(node);
            tracing::debug!(%location, %message, "syntax error in source");
            self.diagnostics.push(Diagnostic {
                location,
                range: range(node),
                message,
            });
        }
        if node.has_error() {
            for child in children(node) {
                self.collect_diagnostics(child);
            }
        }
    }

    // ---------------------------------------------------------------
    // Arena and scopes

    fn push(&mut self, mut data: NodeData, scope: Scope) -> NodeId {
        let id = self.nodes.len();
        data.lexical_parent = Some(scope.lexical);
        if data.semantic_parent.is_none() {
            data.semantic_parent = Some(scope.semantic);
        }
        self.nodes.push(data);
        self.nodes[scope.lexical].children.push(id);
        id
    }

    fn register(&mut self, id: NodeId) {
        let data = &self.nodes[id];
        if data.spelling.is_empty() {
            return;
        }
        let key = data.qualified_name.clone();
        if let Some(&existing) = self.names.get(&key) {
            if self.nodes[existing].is_definition && !self.nodes[id].is_definition {
                return;
            }
        }
        self.names.insert(key, id);
    }

    /// Qualified name prefix contributed by `id`; functions, bodies and
    /// linkage blocks are transparent.
    fn scope_prefix(&self, mut id: NodeId) -> &str {
        loop {
            let data = &self.nodes[id];
            let transparent = data.kind.is_function_like()
                || matches!(data.kind, CursorKind::CompoundStmt | CursorKind::LinkageSpec);
            match data.semantic_parent {
                Some(parent) if transparent => id = parent,
                _ => return &data.qualified_name,
            }
        }
    }

    fn qualify(&self, scope: NodeId, name: &str) -> String {
        let prefix = self.scope_prefix(scope);
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}::{name}")
        }
    }

    /// Look `name` up from `scope` outwards.
    fn resolve(&self, name: &str, scope: NodeId) -> Option<NodeId> {
        if let Some(global) = name.strip_prefix("::") {
            return self.names.get(global).copied();
        }
        let mut prefix = self.scope_prefix(scope).to_string();
        loop {
            let key = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{prefix}::{name}")
            };
            if let Some(&id) = self.names.get(&key) {
                return Some(id);
            }
            if prefix.is_empty() {
                return None;
            }
            prefix = match prefix.rfind("::") {
                Some(at) => prefix[..at].to_string(),
                None => String::new(),
            };
        }
    }

    fn resolve_scope(&self, scopes: &[String], scope: Scope) -> NodeId {
        if scopes.is_empty() {
            return scope.semantic;
        }
        self.resolve(&scopes.join("::"), scope.semantic)
            .unwrap_or(scope.semantic)
    }

    fn member_access(scope: Scope, access: AccessSpecifier) -> AccessSpecifier {
        if scope.record.is_some() {
            access
        } else {
            AccessSpecifier::None
        }
    }

    /// Access of an out-of-line member: that of its in-class declaration.
    fn declared_access(&self, owner: NodeId, name: &str) -> AccessSpecifier {
        self.nodes[owner]
            .children
            .iter()
            .map(|&id| &self.nodes[id])
            .find(|data| data.spelling == name && data.kind != CursorKind::CxxAccessSpecifier)
            .map_or(AccessSpecifier::None, |data| data.access)
    }

    // ---------------------------------------------------------------
    // Containers

    fn lower_members(&mut self, container: TsNode<'_>, scope: Scope, access: &mut AccessSpecifier) {
        for child in named_children(container) {
            match child.kind() {
                "access_specifier" if scope.record.is_some() => {
                    if let Some(level) = AccessSpecifier::parse(self.text(child)) {
                        *access = level;
                    }
                    let mut data = NodeData::new(CursorKind::CxxAccessSpecifier, "");
                    data.access = *access;
                    data.location = Some(self.location(child));
                    data.extent = Some(range(child));
                    self.push(data, scope);
                }
                "preproc_if" | "preproc_ifdef" | "preproc_else" | "preproc_elif"
                | "preproc_elifdef" | "ERROR" => self.lower_members(child, scope, access),
                _ => self.lower_item(child, scope, *access),
            }
        }
    }

    fn lower_item(&mut self, node: TsNode<'_>, scope: Scope, access: AccessSpecifier) {
        match node.kind() {
            "namespace_definition" => self.lower_namespace(node, scope),
            "class_specifier" | "struct_specifier" | "union_specifier" => {
                self.lower_record(node, scope, access, None);
            }
            "enum_specifier" => {
                self.lower_enum(node, scope, access);
            }
            "declaration" | "field_declaration" => {
                self.lower_declaration(node, scope, access, None)
            }
            "function_definition" => self.lower_function_definition(node, scope, access, None),
            "template_declaration" => self.lower_template(node, scope, access),
            "linkage_specification" => self.lower_linkage(node, scope),
            "type_definition" => self.lower_typedef(node, scope, access),
            "alias_declaration" => self.lower_alias(node, scope, access),
            "using_declaration" => self.lower_using(node, scope, access),
            "preproc_include" if self.options.detailed_preprocessing_record => {
                self.lower_include(node, scope)
            }
            "preproc_def" | "preproc_function_def"
                if self.options.detailed_preprocessing_record =>
            {
                self.lower_macro(node, scope)
            }
            _ => {}
        }
    }

    fn lower_namespace(&mut self, node: TsNode<'_>, scope: Scope) {
        let parts: Vec<(String, TsNode<'_>)> = match node.child_by_field_name("name") {
            Some(name) => self
                .text(name)
                .split("::")
                .map(|part| part.trim().trim_start_matches("inline ").trim())
                .filter(|part| !part.is_empty())
                .map(|part| (part.to_string(), name))
                .collect(),
            None => Vec::new(),
        };
        let parts = if parts.is_empty() {
            vec![(String::new(), node)]
        } else {
            parts
        };

        let mut inner = scope;
        for (name, at) in parts {
            let mut data = NodeData::new(CursorKind::Namespace, name.as_str());
            data.qualified_name = if name.is_empty() {
                self.qualify(inner.semantic, "(anonymous namespace)")
            } else {
                self.qualify(inner.semantic, &name)
            };
            data.is_definition = true;
            data.location = Some(self.location(at));
            data.extent = Some(range(node));
            let id = self.push(data, inner);
            self.register(id);
            inner = Scope::inside(id);
        }

        if let Some(body) = node.child_by_field_name("body") {
            self.lower_members(body, inner, &mut AccessSpecifier::None);
        }
    }

    fn lower_linkage(&mut self, node: TsNode<'_>, scope: Scope) {
        let mut data = NodeData::new(CursorKind::LinkageSpec, "");
        data.qualified_name = String::new();
        data.location = Some(self.location(node));
        data.extent = Some(range(node));
        let id = self.push(data, scope);
        let inner = Scope::inside(id);
        if let Some(body) = node.child_by_field_name("body") {
            if body.kind() == "declaration_list" {
                self.lower_members(body, inner, &mut AccessSpecifier::None);
            } else {
                self.lower_item(body, inner, AccessSpecifier::None);
            }
        }
    }

    // ---------------------------------------------------------------
    // Records and enums

    fn lower_record(
        &mut self,
        node: TsNode<'_>,
        scope: Scope,
        access: AccessSpecifier,
        template: Option<&[TemplateParam]>,
    ) -> NodeId {
        let (keyword, base_kind, default_access) = match node.kind() {
            "struct_specifier" => ("struct", CursorKind::StructDecl, AccessSpecifier::Public),
            "union_specifier" => ("union", CursorKind::UnionDecl, AccessSpecifier::Public),
            _ => ("class", CursorKind::ClassDecl, AccessSpecifier::Private),
        };
        let kind = match template {
            Some(params) if !params.is_empty() => CursorKind::ClassTemplate,
            _ => base_kind,
        };
        let body = node.child_by_field_name("body");
        let name_node = node.child_by_field_name("name");
        let is_specialization = name_node.is_some_and(|n| n.kind() == "template_type");
        let (scopes, name) = match name_node {
            Some(n) => self.type_name_parts(n),
            None => (Vec::new(), String::new()),
        };
        let semantic = self.resolve_scope(&scopes, scope);

        let mut data = NodeData::new(kind, name.as_str());
        data.qualified_name = if name.is_empty() {
            let label = self.unnamed_label(keyword, node);
            self.qualify(semantic, &label)
        } else {
            self.qualify(semantic, &name)
        };
        if kind != CursorKind::ClassTemplate {
            data.ty = Some(Type::new(TypeKind::Record, data.qualified_name.clone()));
        }
        if let Some(params) = template.filter(|params| !params.is_empty()) {
            let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
            data.displayname = format!("{}<{}>", name, names.join(", "));
        }
        data.access = Self::member_access(scope, access);
        data.is_definition = body.is_some();
        data.location = Some(self.location(name_node.unwrap_or(node)));
        data.extent = Some(range(node));
        data.semantic_parent = Some(semantic);

        let id = self.push(data, scope);
        if !is_specialization {
            self.register(id);
        }

        let inner = Scope::members_of(id);
        if let Some(params) = template {
            self.push_template_params(params, inner);
        }
        if let Some(clause) = named_children(node)
            .into_iter()
            .find(|child| child.kind() == "base_class_clause")
        {
            self.lower_bases(clause, inner, default_access);
        }
        if let Some(body) = body {
            let mut access = default_access;
            self.lower_members(body, inner, &mut access);
        }
        id
    }

    fn lower_bases(&mut self, clause: TsNode<'_>, scope: Scope, default_access: AccessSpecifier) {
        let mut access = None;
        for child in named_children(clause) {
            match child.kind() {
                "access_specifier" => access = AccessSpecifier::parse(self.text(child)),
                "type_identifier"
                | "qualified_type_identifier"
                | "qualified_identifier"
                | "template_type" => {
                    let ty = self.base_type(child, scope);
                    let mut data = NodeData::new(CursorKind::CxxBaseSpecifier, ty.spelling.as_str());
                    data.ty = Some(ty);
                    data.access = access.take().unwrap_or(default_access);
                    data.location = Some(self.location(child));
                    data.extent = Some(range(child));
                    self.push(data, scope);
                }
                _ => {}
            }
        }
    }

    fn lower_enum(&mut self, node: TsNode<'_>, scope: Scope, access: AccessSpecifier) -> NodeId {
        let body = node.child_by_field_name("body");
        let name_node = node.child_by_field_name("name");
        let (scopes, name) = match name_node {
            Some(n) => self.type_name_parts(n),
            None => (Vec::new(), String::new()),
        };
        let semantic = self.resolve_scope(&scopes, scope);

        let mut data = NodeData::new(CursorKind::EnumDecl, name.as_str());
        data.qualified_name = if name.is_empty() {
            let label = self.unnamed_label("enum", node);
            self.qualify(semantic, &label)
        } else {
            self.qualify(semantic, &name)
        };
        let enum_type = Type::new(TypeKind::Enum, data.qualified_name.clone());
        data.ty = Some(enum_type.clone());
        data.access = Self::member_access(scope, access);
        data.is_definition = body.is_some();
        data.location = Some(self.location(name_node.unwrap_or(node)));
        data.extent = Some(range(node));
        data.semantic_parent = Some(semantic);

        let id = self.push(data, scope);
        self.register(id);

        if let Some(body) = body {
            let inner = Scope::inside(id);
            for enumerator in named_children(body) {
                if enumerator.kind() != "enumerator" {
                    continue;
                }
                let Some(name) = enumerator.child_by_field_name("name") else {
                    continue;
                };
                let mut constant = NodeData::new(CursorKind::EnumConstantDecl, self.text(name));
                constant.qualified_name = self.qualify(id, self.text(name));
                constant.ty = Some(enum_type.clone());
                constant.is_definition = true;
                constant.location = Some(self.location(name));
                constant.extent = Some(range(enumerator));
                self.push(constant, inner);
            }
        }
        id
    }

    fn unnamed_label(&self, keyword: &str, node: TsNode<'_>) -> String {
        let point = node.start_position();
        format!(
            "(unnamed {keyword} at {}:{}:{})",
            self.file.display(),
            point.row + 1,
            point.column + 1
        )
    }

    /// Split a declared tag name into enclosing scopes and the bare name.
    fn type_name_parts(&self, node: TsNode<'_>) -> (Vec<String>, String) {
        let name = match node.kind() {
            "template_type" => node
                .child_by_field_name("name")
                .map_or_else(|| self.text(node), |n| self.text(n)),
            _ => self.text(node),
        };
        let mut parts: Vec<String> = split_scoped(name);
        let last = parts.pop().unwrap_or_default();
        (parts, last)
    }

    // ---------------------------------------------------------------
    // Templates

    fn lower_template(&mut self, node: TsNode<'_>, scope: Scope, access: AccessSpecifier) {
        let params = node
            .child_by_field_name("parameters")
            .map(|list| self.template_params(list, scope))
            .unwrap_or_default();
        for child in named_children(node) {
            match child.kind() {
                "class_specifier" | "struct_specifier" | "union_specifier" => {
                    self.lower_record(child, scope, access, Some(&params));
                }
                "function_definition" => {
                    self.lower_function_definition(child, scope, access, Some(&params))
                }
                "declaration" | "field_declaration" => {
                    self.lower_declaration(child, scope, access, Some(&params))
                }
                "template_declaration" => self.lower_template(child, scope, access),
                "alias_declaration" => self.lower_alias(child, scope, access),
                _ => {}
            }
        }
    }

    fn template_params(&self, list: TsNode<'_>, scope: Scope) -> Vec<TemplateParam> {
        let mut params = Vec::new();
        for param in named_children(list) {
            let (kind, name, ty) = match param.kind() {
                "type_parameter_declaration" | "variadic_type_parameter_declaration" => (
                    CursorKind::TemplateTypeParameter,
                    first_of_kind(param, "type_identifier").map(|n| self.text(n)),
                    None,
                ),
                "optional_type_parameter_declaration" => (
                    CursorKind::TemplateTypeParameter,
                    param.child_by_field_name("name").map(|n| self.text(n)),
                    None,
                ),
                "template_template_parameter_declaration" => (
                    CursorKind::TemplateTemplateParameter,
                    named_children(param)
                        .into_iter()
                        .filter(|n| n.kind() != "template_parameter_list")
                        .find_map(|n| first_of_kind(n, "type_identifier"))
                        .map(|n| self.text(n)),
                    None,
                ),
                "parameter_declaration"
                | "optional_parameter_declaration"
                | "variadic_parameter_declaration" => {
                    let base = param
                        .child_by_field_name("type")
                        .map(|t| self.qualified_base_type(param, t, scope));
                    let (name, ty) = match (param.child_by_field_name("declarator"), base) {
                        (Some(declarator), Some(base)) => {
                            let (core, ty) = self.unwrap_declarator(declarator, base);
                            (Some(self.declarator_name(core).1), Some(ty))
                        }
                        (_, base) => (None, base),
                    };
                    params.push(TemplateParam {
                        kind: CursorKind::TemplateNonTypeParameter,
                        name: name.unwrap_or_default(),
                        ty,
                        location: self.location(param),
                        extent: range(param),
                    });
                    continue;
                }
                _ => continue,
            };
            params.push(TemplateParam {
                kind,
                name: name.unwrap_or_default().to_string(),
                ty,
                location: self.location(param),
                extent: range(param),
            });
        }
        params
    }

    fn push_template_params(&mut self, params: &[TemplateParam], scope: Scope) {
        for param in params {
            let mut data = NodeData::new(param.kind, param.name.as_str());
            data.ty = param.ty.clone();
            data.is_definition = true;
            data.location = Some(param.location.clone());
            data.extent = Some(param.extent);
            self.push(data, scope);
        }
    }

    // ---------------------------------------------------------------
    // Declarations

    fn lower_declaration(
        &mut self,
        node: TsNode<'_>,
        scope: Scope,
        access: AccessSpecifier,
        template: Option<&[TemplateParam]>,
    ) {
        let declarators = field_nodes(node, "declarator");
        let base = match node.child_by_field_name("type") {
            Some(tag) if is_tag(tag.kind()) => {
                let declares = tag.child_by_field_name("body").is_some() || declarators.is_empty();
                let ty = if declares {
                    let id = if tag.kind() == "enum_specifier" {
                        self.lower_enum(tag, scope, access)
                    } else {
                        self.lower_record(tag, scope, access, template)
                    };
                    self.nodes[id]
                        .ty
                        .clone()
                        .unwrap_or_else(|| Type::new(TypeKind::Unexposed, self.nodes[id].qualified_name.clone()))
                } else {
                    self.base_type(tag, scope)
                };
                Some(with_qualifiers(self, node, ty))
            }
            Some(ty) => Some(self.qualified_base_type(node, ty, scope)),
            None => None,
        };

        let is_static = has_keyword(self, node, "storage_class_specifier", "static");
        let is_extern = has_keyword(self, node, "storage_class_specifier", "extern");
        for declarator in declarators {
            let written = base
                .clone()
                .unwrap_or_else(|| Type::new(TypeKind::Void, "void"));
            let (core, ty) = self.unwrap_declarator(declarator, written);
            if core.kind() == "function_declarator" && is_function_name(core) {
                let site = FunctionSite {
                    whole: node,
                    declarator: core,
                    result: base.as_ref().map(|_| ty),
                    is_definition: false,
                    body: None,
                };
                self.lower_function(site, scope, access, template);
            } else {
                self.lower_variable(node, core, ty, scope, access, is_static, is_extern);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn lower_variable(
        &mut self,
        node: TsNode<'_>,
        core: TsNode<'_>,
        ty: Type,
        scope: Scope,
        access: AccessSpecifier,
        is_static: bool,
        is_extern: bool,
    ) {
        let (scopes, name) = self.declarator_name(core);
        let semantic = self.resolve_scope(&scopes, scope);
        let in_record = scope.record.is_some();
        let kind = if in_record && !is_static {
            CursorKind::FieldDecl
        } else {
            CursorKind::VarDecl
        };
        let ty = if core.kind() == "function_declarator" {
            // pointer to function, e.g. `int (*fp)(int)`
            let params = core
                .child_by_field_name("parameters")
                .map_or("()", |p| self.text(p));
            Type::new(TypeKind::Pointer, format!("{} (*){}", ty.spelling, params))
        } else {
            ty
        };

        let mut data = NodeData::new(kind, name.as_str());
        data.qualified_name = self.qualify(semantic, &name);
        data.ty = Some(ty);
        data.access = if in_record {
            access
        } else if self.nodes[semantic].kind.is_record() {
            self.declared_access(semantic, &name)
        } else {
            AccessSpecifier::None
        };
        data.is_definition = match kind {
            CursorKind::FieldDecl => true,
            _ => !is_extern && !(in_record && is_static),
        };
        data.location = Some(self.location(core));
        data.extent = Some(range(node));
        data.semantic_parent = Some(semantic);
        self.push(data, scope);
    }

    fn lower_function_definition(
        &mut self,
        node: TsNode<'_>,
        scope: Scope,
        access: AccessSpecifier,
        template: Option<&[TemplateParam]>,
    ) {
        let Some(declarator) = node.child_by_field_name("declarator") else {
            return;
        };
        let base = node
            .child_by_field_name("type")
            .map(|ty| self.qualified_base_type(node, ty, scope));
        let written = base
            .clone()
            .unwrap_or_else(|| Type::new(TypeKind::Void, "void"));
        let (core, ty) = self.unwrap_declarator(declarator, written);
        if core.kind() != "function_declarator" {
            return;
        }
        let site = FunctionSite {
            whole: node,
            declarator: core,
            result: base.map(|_| ty),
            is_definition: true,
            body: node.child_by_field_name("body"),
        };
        self.lower_function(site, scope, access, template);
    }

    fn lower_function(
        &mut self,
        site: FunctionSite<'_>,
        scope: Scope,
        access: AccessSpecifier,
        template: Option<&[TemplateParam]>,
    ) -> NodeId {
        let name_node = site
            .declarator
            .child_by_field_name("declarator")
            .unwrap_or(site.declarator);
        let (scopes, name) = self.declarator_name(name_node);
        let semantic = self.resolve_scope(&scopes, scope);
        let owner = Some(semantic).filter(|&id| self.nodes[id].kind.is_record());

        let kind = match (template, owner) {
            (Some(params), _) if !params.is_empty() => CursorKind::FunctionTemplate,
            (_, Some(_)) if name.starts_with('~') => CursorKind::Destructor,
            (_, Some(record)) if self.nodes[record].spelling == name => CursorKind::Constructor,
            (_, Some(_)) => CursorKind::CxxMethod,
            (_, None) => CursorKind::FunctionDecl,
        };

        let params = self.function_params(site.declarator, scope);
        let param_types: Vec<String> = params
            .iter()
            .map(|p| p.ty.as_ref().map_or_else(String::new, |t| t.spelling.clone()))
            .chain(has_variadic(site.declarator).then(|| "...".to_string()))
            .collect();
        let result = site
            .result
            .unwrap_or_else(|| Type::new(TypeKind::Void, "void"));
        let is_const = named_children(site.declarator)
            .into_iter()
            .any(|child| child.kind() == "type_qualifier" && self.text(child) == "const");

        let mut data = NodeData::new(kind, name.as_str());
        data.qualified_name = self.qualify(semantic, &name);
        data.displayname = format!("{}({})", name, param_types.join(", "));
        data.ty = Some(Type::new(
            TypeKind::FunctionProto,
            format!(
                "{} ({}){}",
                result.spelling,
                param_types.join(", "),
                if is_const { " const" } else { "" }
            ),
        ));
        data.result_type = Some(result);
        data.access = match owner {
            Some(_) if scope.record.is_some() => access,
            Some(record) => self.declared_access(record, &name),
            None => AccessSpecifier::None,
        };
        data.is_definition = site.is_definition;
        data.location = Some(self.location(name_node));
        data.extent = Some(range(site.whole));
        data.semantic_parent = Some(semantic);

        let id = self.push(data, scope);
        let inner = Scope::inside(id);
        if let Some(params) = template {
            self.push_template_params(params, inner);
        }
        for param in params {
            let mut data = NodeData::new(CursorKind::ParmDecl, param.name.as_str());
            data.ty = param.ty;
            data.is_definition = true;
            data.location = Some(param.location);
            data.extent = Some(param.extent);
            self.push(data, inner);
        }
        if let Some(body) = site.body.filter(|b| b.kind() == "compound_statement") {
            if !self.options.skip_function_bodies {
                let mut data = NodeData::new(CursorKind::CompoundStmt, "");
                data.qualified_name = String::new();
                data.location = Some(self.location(body));
                data.extent = Some(range(body));
                let block = self.push(data, inner);
                self.lower_members(
                    body,
                    Scope {
                        lexical: block,
                        semantic: id,
                        record: None,
                    },
                    &mut AccessSpecifier::None,
                );
            }
        }
        id
    }

    /// Parameters of a function declarator; a lone unnamed `void` means none.
    fn function_params(&self, declarator: TsNode<'_>, scope: Scope) -> Vec<TemplateParam> {
        let Some(list) = declarator.child_by_field_name("parameters") else {
            return Vec::new();
        };
        let mut params = Vec::new();
        for param in named_children(list) {
            if !matches!(
                param.kind(),
                "parameter_declaration"
                    | "optional_parameter_declaration"
                    | "variadic_parameter_declaration"
            ) {
                continue;
            }
            let Some(type_node) = param.child_by_field_name("type") else {
                continue;
            };
            let base = self.qualified_base_type(param, type_node, scope);
            let (name, ty) = match param.child_by_field_name("declarator") {
                Some(declarator) => {
                    let (core, ty) = self.unwrap_declarator(declarator, base);
                    let name = if is_identifier(core.kind()) {
                        self.text(core).to_string()
                    } else {
                        String::new()
                    };
                    (name, ty)
                }
                None => (String::new(), base),
            };
            params.push(TemplateParam {
                kind: CursorKind::ParmDecl,
                name,
                ty: Some(ty),
                location: self.location(param),
                extent: range(param),
            });
        }
        let only_void = matches!(
            params.as_slice(),
            [only] if only.name.is_empty() && only.ty.as_ref().is_some_and(|t| t.kind == TypeKind::Void)
        );
        if only_void {
            params.clear();
        }
        params
    }

    fn lower_typedef(&mut self, node: TsNode<'_>, scope: Scope, access: AccessSpecifier) {
        if let Some(tag) = node.child_by_field_name("type") {
            if is_tag(tag.kind()) && tag.child_by_field_name("body").is_some() {
                if tag.kind() == "enum_specifier" {
                    self.lower_enum(tag, scope, access);
                } else {
                    self.lower_record(tag, scope, access, None);
                }
            }
        }
        for declarator in field_nodes(node, "declarator") {
            let (core, _) = self.unwrap_declarator(declarator, Type::new(TypeKind::Unexposed, ""));
            let (_, name) = self.declarator_name(core);
            self.push_type_alias(CursorKind::TypedefDecl, &name, core, node, scope, access);
        }
    }

    fn lower_alias(&mut self, node: TsNode<'_>, scope: Scope, access: AccessSpecifier) {
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        let name_text = self.text(name).to_string();
        self.push_type_alias(CursorKind::TypeAliasDecl, &name_text, name, node, scope, access);
    }

    fn push_type_alias(
        &mut self,
        kind: CursorKind,
        name: &str,
        at: TsNode<'_>,
        whole: TsNode<'_>,
        scope: Scope,
        access: AccessSpecifier,
    ) {
        let mut data = NodeData::new(kind, name);
        data.qualified_name = self.qualify(scope.semantic, name);
        data.ty = Some(Type::new(TypeKind::Typedef, data.qualified_name.clone()));
        data.access = Self::member_access(scope, access);
        data.is_definition = true;
        data.location = Some(self.location(at));
        data.extent = Some(range(whole));
        let id = self.push(data, scope);
        self.register(id);
    }

    fn lower_using(&mut self, node: TsNode<'_>, scope: Scope, access: AccessSpecifier) {
        let Some(target) = named_children(node).into_iter().last() else {
            return;
        };
        let is_directive = children(node)
            .into_iter()
            .any(|child| !child.is_named() && child.kind() == "namespace");
        let written = split_scoped(self.text(target));
        let (kind, spelling) = if is_directive {
            (CursorKind::UsingDirective, written.join("::"))
        } else {
            (
                CursorKind::UsingDeclaration,
                written.last().cloned().unwrap_or_default(),
            )
        };
        let mut data = NodeData::new(kind, spelling.as_str());
        data.access = Self::member_access(scope, access);
        data.location = Some(self.location(target));
        data.extent = Some(range(node));
        self.push(data, scope);
    }

    fn lower_include(&mut self, node: TsNode<'_>, scope: Scope) {
        let Some(path) = node.child_by_field_name("path") else {
            return;
        };
        let spelling = self
            .text(path)
            .trim()
            .trim_matches(|c| matches!(c, '"' | '<' | '>'));
        let mut data = NodeData::new(CursorKind::InclusionDirective, spelling);
        data.location = Some(self.location(path));
        data.extent = Some(range(node));
        self.push(data, scope);
    }

    fn lower_macro(&mut self, node: TsNode<'_>, scope: Scope) {
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        let mut data = NodeData::new(CursorKind::MacroDefinition, self.text(name));
        data.is_definition = true;
        data.location = Some(self.location(name));
        data.extent = Some(range(node));
        self.push(data, scope);
    }

    // ---------------------------------------------------------------
    // Types and declarators

    /// Written type of a declaration, with `const` from the declaration's
    /// specifiers applied.
    fn qualified_base_type(&self, decl: TsNode<'_>, type_node: TsNode<'_>, scope: Scope) -> Type {
        let ty = self.base_type(type_node, scope);
        with_qualifiers(self, decl, ty)
    }

    fn base_type(&self, node: TsNode<'_>, scope: Scope) -> Type {
        let text = self.text(node);
        match node.kind() {
            "primitive_type" | "sized_type_specifier" => builtin_type(text),
            "type_identifier" | "qualified_type_identifier" | "qualified_identifier" => {
                self.named_type(&split_scoped(text).join("::"), scope.semantic)
            }
            "class_specifier" | "struct_specifier" | "union_specifier" | "enum_specifier" => {
                let fallback = if node.kind() == "enum_specifier" {
                    TypeKind::Enum
                } else {
                    TypeKind::Record
                };
                match node.child_by_field_name("name") {
                    Some(name) => {
                        let name = split_scoped(self.text(name)).join("::");
                        match self.resolve(&name, scope.semantic) {
                            Some(_) => self.named_type(&name, scope.semantic),
                            None => Type::new(fallback, name),
                        }
                    }
                    None => Type::new(fallback, collapse_whitespace(text)),
                }
            }
            "placeholder_type_specifier" => Type::new(TypeKind::Auto, collapse_whitespace(text)),
            "template_type" => {
                let base = node
                    .child_by_field_name("name")
                    .map(|name| self.named_type(&split_scoped(self.text(name)).join("::"), scope.semantic).spelling)
                    .unwrap_or_default();
                let arguments = node
                    .child_by_field_name("arguments")
                    .map_or(String::new(), |args| collapse_whitespace(self.text(args)));
                Type::new(TypeKind::Unexposed, format!("{base}{arguments}"))
            }
            _ => Type::new(TypeKind::Unexposed, collapse_whitespace(text)),
        }
    }

    fn named_type(&self, name: &str, scope: NodeId) -> Type {
        let Some(id) = self.resolve(name, scope) else {
            return Type::new(TypeKind::Unexposed, name);
        };
        let data = &self.nodes[id];
        let kind = match data.kind {
            CursorKind::ClassDecl
            | CursorKind::StructDecl
            | CursorKind::UnionDecl
            | CursorKind::ClassTemplate => TypeKind::Record,
            CursorKind::EnumDecl => TypeKind::Enum,
            CursorKind::TypedefDecl | CursorKind::TypeAliasDecl => TypeKind::Typedef,
            _ => return Type::new(TypeKind::Unexposed, name),
        };
        Type::new(kind, data.qualified_name.clone())
    }

    /// Strip pointer/reference/array/init wrappers, deriving the type as we go.
    fn unwrap_declarator<'t>(&self, mut node: TsNode<'t>, mut ty: Type) -> (TsNode<'t>, Type) {
        loop {
            let next = match node.kind() {
                "pointer_declarator" => {
                    ty = ty.pointer();
                    node.child_by_field_name("declarator")
                }
                "reference_declarator" => {
                    ty = if self.text(node).trim_start().starts_with("&&") {
                        ty.rvalue_reference()
                    } else {
                        ty.lvalue_reference()
                    };
                    named_children(node).into_iter().last()
                }
                "array_declarator" => {
                    let size = node.child_by_field_name("size").map(|s| self.text(s));
                    ty = ty.array(size);
                    node.child_by_field_name("declarator")
                }
                "init_declarator" => node.child_by_field_name("declarator"),
                "parenthesized_declarator" | "attributed_declarator" => {
                    named_children(node).into_iter().next()
                }
                _ => None,
            };
            match next {
                Some(inner) => node = inner,
                None => return (node, ty),
            }
        }
    }

    /// Scopes and bare name of a declarator core.
    fn declarator_name(&self, node: TsNode<'_>) -> (Vec<String>, String) {
        match node.kind() {
            "qualified_identifier" => {
                let mut scopes = Vec::new();
                let mut current = node;
                loop {
                    if let Some(scope) = current.child_by_field_name("scope") {
                        let scope_text = self.text(scope);
                        let bare = scope_text.split('<').next().unwrap_or(scope_text);
                        scopes.extend(split_scoped(bare));
                    }
                    match current.child_by_field_name("name") {
                        Some(name) if name.kind() == "qualified_identifier" => current = name,
                        Some(name) => return (scopes, self.simple_name(name)),
                        None => return (scopes, self.simple_name(current)),
                    }
                }
            }
            "template_function" => {
                let name = node.child_by_field_name("name").unwrap_or(node);
                (Vec::new(), self.simple_name(name))
            }
            kind if is_identifier(kind) || kind == "operator_name" || kind == "destructor_name" => {
                (Vec::new(), self.simple_name(node))
            }
            _ => match first_identifier(node) {
                Some(name) => (Vec::new(), self.simple_name(name)),
                None => (Vec::new(), String::new()),
            },
        }
    }

    fn simple_name(&self, node: TsNode<'_>) -> String {
        let text = collapse_whitespace(self.text(node));
        match node.kind() {
            "operator_name" => {
                let rest = text.trim_start_matches("operator").trim();
                if rest.starts_with(|c: char| c.is_alphabetic()) {
                    format!("operator {rest}")
                } else {
                    format!("operator{}", rest.replace(' ', ""))
                }
            }
            "destructor_name" => text.replace(' ', ""),
            _ => text,
        }
    }
}

fn range(node: TsNode<'_>) -> SourceRange {
    SourceRange {
        byte_start: node.start_byte(),
        byte_end: node.end_byte(),
    }
}

fn children<'t>(node: TsNode<'t>) -> Vec<TsNode<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

fn named_children<'t>(node: TsNode<'t>) -> Vec<TsNode<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn field_nodes<'t>(node: TsNode<'t>, field: &str) -> Vec<TsNode<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

fn first_of_kind<'t>(node: TsNode<'t>, kind: &str) -> Option<TsNode<'t>> {
    named_children(node).into_iter().find(|child| child.kind() == kind)
}

fn first_identifier(node: TsNode<'_>) -> Option<TsNode<'_>> {
    for child in named_children(node) {
        if is_identifier(child.kind()) {
            return Some(child);
        }
        if child.kind() == "parameter_list" {
            continue;
        }
        if let Some(found) = first_identifier(child) {
            return Some(found);
        }
    }
    None
}

fn is_identifier(kind: &str) -> bool {
    matches!(kind, "identifier" | "field_identifier" | "type_identifier")
}

fn is_tag(kind: &str) -> bool {
    matches!(
        kind,
        "class_specifier" | "struct_specifier" | "union_specifier" | "enum_specifier"
    )
}

/// Whether a function declarator names a function rather than wrapping a
/// pointer to one.
fn is_function_name(declarator: TsNode<'_>) -> bool {
    declarator
        .child_by_field_name("declarator")
        .is_some_and(|name| {
            is_identifier(name.kind())
                || matches!(
                    name.kind(),
                    "qualified_identifier"
                        | "destructor_name"
                        | "operator_name"
                        | "template_function"
                        | "operator_cast"
                )
        })
}

fn has_variadic(declarator: TsNode<'_>) -> bool {
    declarator
        .child_by_field_name("parameters")
        .is_some_and(|list| {
            children(list)
                .into_iter()
                .any(|child| child.kind() == "variadic_parameter" || child.kind() == "...")
        })
}

fn has_keyword(lowering: &Lowering<'_>, node: TsNode<'_>, kind: &str, keyword: &str) -> bool {
    named_children(node)
        .into_iter()
        .any(|child| child.kind() == kind && lowering.text(child).trim() == keyword)
}

fn with_qualifiers(lowering: &Lowering<'_>, decl: TsNode<'_>, ty: Type) -> Type {
    if has_keyword(lowering, decl, "type_qualifier", "const") {
        ty.with_const()
    } else {
        ty
    }
}

/// `a :: b::c` -> `["a", "b", "c"]`.
fn split_scoped(text: &str) -> Vec<String> {
    text.split("::")
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn builtin_type(text: &str) -> Type {
    let words: Vec<&str> = text.split_whitespace().collect();
    let has = |word: &str| words.contains(&word);
    let longs = words.iter().filter(|w| **w == "long").count();
    let kind = if has("void") {
        TypeKind::Void
    } else if has("bool") {
        TypeKind::Bool
    } else if words.iter().any(|w| w.starts_with("char") || *w == "wchar_t") {
        TypeKind::Char
    } else if has("float") {
        TypeKind::Float
    } else if has("double") {
        if longs > 0 {
            TypeKind::LongDouble
        } else {
            TypeKind::Double
        }
    } else if has("short") {
        TypeKind::Short
    } else if longs >= 2 {
        TypeKind::LongLong
    } else if longs == 1 {
        TypeKind::Long
    } else if has("int") || has("signed") || has("unsigned") {
        TypeKind::Int
    } else {
        // size_t, int32_t and friends are library typedefs
        TypeKind::Typedef
    };
    Type::new(kind, words.join(" "))
}
