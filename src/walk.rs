//! Lazy depth-first traversal.

use crate::node::Node;
use std::iter::FusedIterator;

/// Walk the subtree rooted at `root` in pre-order and yield every node that
/// satisfies `predicate`, `root` included.
///
/// Rejected nodes are still descended into. The iterator is lazy: the
/// predicate runs only on nodes reached while producing the requested
/// matches. Pass `&predicate` to reuse one predicate for several walks.
pub fn walk<N, P>(predicate: P, root: N) -> Walk<N, P>
where
    N: Node,
    P: Fn(&N) -> bool,
{
    Walk {
        predicate,
        pending: Some(root),
        stack: Vec::new(),
    }
}

/// Every node of the subtree in pre-order.
pub fn descendants<N: Node>(root: N) -> Walk<N, fn(&N) -> bool> {
    fn always<N>(_: &N) -> bool {
        true
    }
    walk(always::<N> as fn(&N) -> bool, root)
}

/// Iterator returned by [`walk`].
pub struct Walk<N: Node, P> {
    predicate: P,
    pending: Option<N>,
    stack: Vec<N::Children>,
}

impl<N: Node, P> Walk<N, P> {
    fn advance(&mut self) -> Option<N> {
        if let Some(node) = self.pending.take() {
            return Some(node);
        }
        while let Some(children) = self.stack.last_mut() {
            match children.next() {
                Some(node) => return Some(node),
                None => {
                    self.stack.pop();
                }
            }
        }
        None
    }
}

impl<N, P> Iterator for Walk<N, P>
where
    N: Node,
    P: Fn(&N) -> bool,
{
    type Item = N;

    fn next(&mut self) -> Option<N> {
        while let Some(node) = self.advance() {
            self.stack.push(node.children());
            if (self.predicate)(&node) {
                return Some(node);
            }
        }
        None
    }
}

impl<N, P> FusedIterator for Walk<N, P>
where
    N: Node,
    P: Fn(&N) -> bool,
{
}
