use crate::ast::Node;

/// Depth-first pre-order traversal. `enter` returning `false` skips the node's children.
pub trait Visitor {
    fn enter(&mut self, node: &Node, depth: usize) -> bool;

    fn leave(&mut self, _node: &Node, _depth: usize) {}
}

pub fn walk<V: Visitor + ?Sized>(node: &Node, visitor: &mut V) {
    walk_at(node, 0, visitor);
}

fn walk_at<V: Visitor + ?Sized>(node: &Node, depth: usize, visitor: &mut V) {
    if visitor.enter(node, depth) {
        for child in &node.children {
            walk_at(child, depth + 1, visitor);
        }
    }
    visitor.leave(node, depth);
}
