//! ASCII rendering of a subtree for human inspection.

use crate::node::Node;

/// Render `root` and everything below it, one `KIND name` line per node.
///
/// ```text
/// TRANSLATION_UNIT tmp.cpp
///   +--CLASS_DECL Foo
///      +--FIELD_DECL x
/// ```
pub fn dump<N: Node>(root: &N) -> String {
    let mut out = label(root);
    out.push('\n');
    write_children(&mut out, root, "");
    out
}

/// `KIND spelling`, falling back to the display name for unnamed nodes.
pub fn label<N: Node>(node: &N) -> String {
    let text = if node.spelling().is_empty() {
        node.displayname()
    } else {
        node.spelling()
    };
    format!("{} {}", node.kind(), text).trim_end().to_string()
}

fn write_children<N: Node>(out: &mut String, node: &N, prefix: &str) {
    let mut children = node.children().peekable();
    while let Some(child) = children.next() {
        let last = children.peek().is_none();
        out.push_str(prefix);
        out.push_str("  +--");
        out.push_str(&label(&child));
        out.push('\n');
        let nested = format!("{prefix}{}", if last { "   " } else { "  |" });
        write_children(out, &child, &nested);
    }
}
