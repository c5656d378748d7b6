use std::fmt::Write;

use super::KDTreeNode;

/// Debug dump of the number of triangles in every node of a tree.
pub struct TreePrinter;

impl TreePrinter {
    /// Returns one `Level: <depth>, Triangles: <count>` line per node in pre-order, where the
    /// given node has depth 1.
    pub fn print(root: &KDTreeNode) -> String {
        let mut out = String::new();

        Self::process(&mut out, root, 1);

        out
    }

    fn process(out: &mut String, node: &KDTreeNode, depth: usize) {
        _ = writeln!(out, "Level: {}, Triangles: {}", depth, node.triangles().len());

        if let Some([left, right]) = node.children() {
            Self::process(out, left, depth + 1);
            Self::process(out, right, depth + 1);
        }
    }
}
