use crate::cpp::parser::ParseOptions;
use crate::node::{AccessSpecifier, CursorKind, Node, SourceLocation, SourceRange, Type};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

pub(crate) type NodeId = usize;

pub(crate) const ROOT: NodeId = 0;

/// Everything the lowering records about one cursor.
#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub kind: CursorKind,
    pub spelling: String,
    pub displayname: String,
    /// Scope-qualified name (`ns::Foo`), empty for the translation unit.
    pub qualified_name: String,
    pub ty: Option<Type>,
    pub result_type: Option<Type>,
    pub access: AccessSpecifier,
    pub location: Option<SourceLocation>,
    pub extent: Option<SourceRange>,
    pub is_definition: bool,
    pub semantic_parent: Option<NodeId>,
    pub lexical_parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl NodeData {
    pub fn new(kind: CursorKind, spelling: impl Into<String>) -> Self {
        let spelling = spelling.into();
        Self {
            kind,
            displayname: spelling.clone(),
            qualified_name: spelling.clone(),
            spelling,
            ty: None,
            result_type: None,
            access: AccessSpecifier::None,
            location: None,
            extent: None,
            is_definition: false,
            semantic_parent: None,
            lexical_parent: None,
            children: Vec::new(),
        }
    }
}

/// A syntax error region found while parsing. Lowering continues past it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub location: SourceLocation,
    pub range: SourceRange,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// An immutable cursor tree for one source file.
pub struct TranslationUnit {
    path: Arc<Path>,
    source: String,
    options: ParseOptions,
    nodes: Vec<NodeData>,
    diagnostics: Vec<Diagnostic>,
}

impl TranslationUnit {
    pub(crate) fn new(
        path: Arc<Path>,
        source: String,
        options: ParseOptions,
        nodes: Vec<NodeData>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Self {
            path,
            source,
            options,
            nodes,
            diagnostics,
        }
    }

    /// The root cursor.
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor { tu: self, id: ROOT }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of cursors, the root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id]
    }
}

impl fmt::Debug for TranslationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationUnit")
            .field("path", &self.path)
            .field("nodes", &self.nodes.len())
            .field("diagnostics", &self.diagnostics.len())
            .finish()
    }
}

/// Handle to one cursor of a [`TranslationUnit`].
#[derive(Clone, Copy)]
pub struct Cursor<'tu> {
    tu: &'tu TranslationUnit,
    id: NodeId,
}

impl<'tu> Cursor<'tu> {
    fn data(&self) -> &'tu NodeData {
        self.tu.data(self.id)
    }

    fn at(&self, id: NodeId) -> Cursor<'tu> {
        Cursor { tu: self.tu, id }
    }

    pub fn translation_unit(&self) -> &'tu TranslationUnit {
        self.tu
    }

    /// Scope-qualified name, e.g. `ns::Outer::Inner`.
    pub fn qualified_name(&self) -> &'tu str {
        &self.data().qualified_name
    }

    pub fn extent(&self) -> Option<SourceRange> {
        self.data().extent
    }

    /// Source text covered by the cursor's extent.
    pub fn text(&self) -> Option<&'tu str> {
        let range = self.extent()?;
        self.tu.source.get(range.byte_start..range.byte_end)
    }
}

impl<'tu> PartialEq for Cursor<'tu> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tu, other.tu) && self.id == other.id
    }
}

impl<'tu> Eq for Cursor<'tu> {}

impl<'tu> std::hash::Hash for Cursor<'tu> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.tu, state);
        self.id.hash(state);
    }
}

impl<'tu> fmt::Debug for Cursor<'tu> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.kind(), self.spelling())
    }
}

impl<'tu> Node for Cursor<'tu> {
    type Children = Children<'tu>;

    fn children(&self) -> Children<'tu> {
        Children {
            tu: self.tu,
            ids: self.data().children.iter(),
        }
    }

    fn kind(&self) -> CursorKind {
        self.data().kind
    }

    fn spelling(&self) -> &str {
        &self.data().spelling
    }

    fn displayname(&self) -> &str {
        &self.data().displayname
    }

    fn ty(&self) -> Option<&Type> {
        self.data().ty.as_ref()
    }

    fn result_type(&self) -> Option<&Type> {
        self.data().result_type.as_ref()
    }

    fn access(&self) -> AccessSpecifier {
        self.data().access
    }

    fn location(&self) -> Option<&SourceLocation> {
        self.data().location.as_ref()
    }

    fn is_definition(&self) -> bool {
        self.data().is_definition
    }

    fn semantic_parent(&self) -> Option<Self> {
        self.data().semantic_parent.map(|id| self.at(id))
    }

    fn lexical_parent(&self) -> Option<Self> {
        self.data().lexical_parent.map(|id| self.at(id))
    }
}

/// Children of a [`Cursor`], in source order.
#[derive(Clone)]
pub struct Children<'tu> {
    tu: &'tu TranslationUnit,
    ids: std::slice::Iter<'tu, NodeId>,
}

impl<'tu> Iterator for Children<'tu> {
    type Item = Cursor<'tu>;

    fn next(&mut self) -> Option<Cursor<'tu>> {
        self.ids.next().map(|&id| Cursor { tu: self.tu, id })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

impl ExactSizeIterator for Children<'_> {}

#[cfg(test)]
mod tests {
    use crate::cpp::parse_source;
    use crate::node::Node;

    #[test]
    fn cursor_identity_is_per_unit() {
        let a = parse_source("a.cpp", "class Foo {};").unwrap();
        let b = parse_source("a.cpp", "class Foo {};").unwrap();
        assert_eq!(a.cursor(), a.cursor());
        assert_ne!(a.cursor(), b.cursor());
    }

    #[test]
    fn text_covers_the_extent() {
        let unit = parse_source("a.cpp", "class Foo { int x; };").unwrap();
        let foo = unit.cursor().children().next().unwrap();
        assert_eq!(foo.text(), Some("class Foo { int x; }"));
        assert_eq!(foo.qualified_name(), "Foo");
    }

    #[test]
    fn children_know_their_length() {
        let unit = parse_source("a.cpp", "int a; int b; int c;").unwrap();
        assert_eq!(unit.cursor().children().len(), 3);
        assert!(!unit.is_empty());
    }
}
