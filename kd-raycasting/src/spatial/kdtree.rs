use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{math::AABB, Error, Mesh, Result};

use super::{BuildStats, Builder};

/// Determines which bounding box is stored in the tree nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundingBoxMode {
    /// The box is recomputed from the triangles assigned to the node.
    #[default]
    Tight,

    /// The box is the cell obtained by clipping the parent's cell at the split plane.
    Loose,
}

/// The options for building a k-d tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KDTreeOptions {
    /// Nodes with at most this number of triangles become leaves.
    pub max_triangles_per_leaf: usize,

    /// The kind of bounding boxes stored in the nodes.
    pub bounding_boxes: BoundingBoxMode,

    /// Nodes at this depth become leaves regardless of their number of triangles. The root has
    /// depth 1.
    pub max_depth: usize,
}

impl Default for KDTreeOptions {
    fn default() -> Self {
        Self {
            max_triangles_per_leaf: 3,
            bounding_boxes: BoundingBoxMode::Tight,
            max_depth: 64,
        }
    }
}

/// A single node of the k-d tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KDTreeNode {
    pub(super) bbox: AABB,

    /// Indices into the triangles of the mesh.
    pub(super) triangles: Vec<usize>,

    /// The lower and the upper child. Leaves have no children.
    pub(super) children: Option<Box<[KDTreeNode; 2]>>,
}

impl KDTreeNode {
    /// Returns the bounding volume of the node.
    #[inline]
    pub fn bounding_box(&self) -> &AABB {
        &self.bbox
    }

    /// Returns the indices of the triangles assigned to the node.
    #[inline]
    pub fn triangles(&self) -> &[usize] {
        &self.triangles
    }

    /// Returns the lower and the upper child of the node or None for leaves.
    #[inline]
    pub fn children(&self) -> Option<&[KDTreeNode; 2]> {
        self.children.as_deref()
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// Pre-order iterator over the nodes of a tree together with their depth.
pub struct NodeIter<'a> {
    stack: Vec<(usize, &'a KDTreeNode)>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = (usize, &'a KDTreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;

        if let Some([left, right]) = node.children() {
            self.stack.push((depth + 1, right));
            self.stack.push((depth + 1, left));
        }

        Some((depth, node))
    }
}

/// A k-d tree over the triangles of a mesh. The tree owns the mesh and is immutable once built.
#[derive(Serialize, Deserialize)]
pub struct KDTree {
    pub(super) mesh: Mesh,
    pub(super) root: KDTreeNode,
    options: KDTreeOptions,
    stats: BuildStats,
}

impl KDTree {
    /// Validates the given mesh and builds the k-d tree over its triangles.
    ///
    /// # Arguments
    /// * `mesh` - The mesh to build the tree for.
    /// * `options` - The build options.
    pub fn new(mesh: Mesh, options: KDTreeOptions) -> Result<Self> {
        mesh.validate()?;

        let (root, stats) = Builder::new(&mesh, &options).build();

        info!(
            "Built k-d tree over {} triangles: {} nodes, {} leaves, {} levels",
            mesh.num_triangles(),
            stats.num_nodes,
            stats.num_leaves,
            stats.num_levels
        );

        if stats.num_forced_leaves > 0 {
            warn!(
                "{} leaves exceed {} triangles, because their triangles could not be separated",
                stats.num_forced_leaves, options.max_triangles_per_leaf
            );
        }

        Ok(Self {
            mesh,
            root,
            options,
            stats,
        })
    }

    #[inline]
    pub fn root(&self) -> &KDTreeNode {
        &self.root
    }

    #[inline]
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    #[inline]
    pub fn options(&self) -> &KDTreeOptions {
        &self.options
    }

    /// Returns the statistics gathered during construction.
    #[inline]
    pub fn build_stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Returns the depth of the deepest leaf, where the root has depth 1.
    #[inline]
    pub fn num_levels(&self) -> usize {
        self.stats.num_levels
    }

    #[inline]
    pub fn num_leaves(&self) -> usize {
        self.stats.num_leaves
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.stats.num_nodes
    }

    /// Returns the number of leaves that hold more triangles than allowed, because splitting
    /// them further would not have separated their triangles.
    #[inline]
    pub fn num_forced_leaves(&self) -> usize {
        self.stats.num_forced_leaves
    }

    /// Returns a pre-order iterator over all nodes and their depth.
    pub fn nodes(&self) -> NodeIter<'_> {
        NodeIter {
            stack: vec![(1, &self.root)],
        }
    }

    /// Returns an iterator over all leaves.
    pub fn leaves(&self) -> impl Iterator<Item = &KDTreeNode> {
        self.nodes().map(|(_, node)| node).filter(|node| node.is_leaf())
    }

    /// Returns the depth and the number of triangles of every node in pre-order.
    pub fn node_triangle_counts(&self) -> Vec<(usize, usize)> {
        self.nodes()
            .map(|(depth, node)| (depth, node.triangles.len()))
            .collect()
    }

    /// Writes the tree together with its mesh to the given writer.
    ///
    /// # Arguments
    /// * `writer` - The writer to write the tree to.
    pub fn write<W: std::io::Write>(&self, writer: W) -> Result<()> {
        bincode::serialize_into(writer, self).map_err(|e| Error::SerializationError(Box::new(e)))
    }

    /// Reads a tree previously written with [`KDTree::write`] and validates all of its indices.
    ///
    /// # Arguments
    /// * `reader` - The reader to read the tree from.
    pub fn read_from<R: std::io::Read>(reader: R) -> Result<Self> {
        let tree: Self = bincode::deserialize_from(reader)
            .map_err(|e| Error::DeserializationError(Box::new(e)))?;

        tree.mesh.validate()?;

        let num_triangles = tree.mesh.num_triangles();
        for (_, node) in tree.nodes() {
            if let Some(&triangle) = node.triangles.iter().find(|&&t| t >= num_triangles) {
                return Err(Error::InvalidTriangleIndex {
                    triangle,
                    num_triangles,
                });
            }
        }

        Ok(tree)
    }
}

#[cfg(test)]
mod test {
    use nalgebra_glm::Vec3;

    use super::*;
    use crate::Triangle;

    fn quad_mesh() -> Mesh {
        Mesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(4.0, 0.0, 0.0),
                Vec3::new(4.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(8.0, 0.0, 0.0),
                Vec3::new(8.0, 1.0, 0.0),
            ],
            vec![
                Triangle::new(0, 1, 2),
                Triangle::new(0, 2, 3),
                Triangle::new(1, 4, 5),
                Triangle::new(1, 5, 2),
            ],
        )
    }

    #[test]
    fn test_invalid_mesh_is_rejected() {
        let mut mesh = quad_mesh();
        mesh.triangles.push(Triangle::new(0, 1, 42));

        let result = KDTree::new(mesh, KDTreeOptions::default());
        assert!(matches!(
            result,
            Err(Error::InvalidVertexIndex { vertex: 42, .. })
        ));
    }

    #[test]
    fn test_empty_mesh() {
        let tree = KDTree::new(Mesh::default(), KDTreeOptions::default()).unwrap();

        assert!(tree.root().is_leaf());
        assert!(tree.root().triangles().is_empty());
        assert_eq!(tree.num_leaves(), 1);
        assert_eq!(tree.num_levels(), 1);
    }

    #[test]
    fn test_node_iteration() {
        let options = KDTreeOptions {
            max_triangles_per_leaf: 1,
            ..Default::default()
        };
        let tree = KDTree::new(quad_mesh(), options).unwrap();

        let nodes: Vec<_> = tree.nodes().collect();
        assert_eq!(nodes.len(), tree.num_nodes());
        assert_eq!(nodes[0].0, 1);
        assert_eq!(tree.leaves().count(), tree.num_leaves());

        let max_depth = nodes.iter().map(|(depth, _)| *depth).max().unwrap();
        assert_eq!(max_depth, tree.num_levels());

        let counts = tree.node_triangle_counts();
        assert_eq!(counts[0], (1, 4));
        assert_eq!(counts.len(), tree.num_nodes());
    }

    #[test]
    fn test_write_and_read_tree() {
        let tree = KDTree::new(quad_mesh(), KDTreeOptions::default()).unwrap();

        let mut buffer = Vec::new();
        tree.write(&mut buffer).unwrap();
        let tree2 = KDTree::read_from(&buffer[..]).unwrap();

        assert_eq!(tree.options(), tree2.options());
        assert_eq!(tree.num_leaves(), tree2.num_leaves());
        assert_eq!(tree.num_levels(), tree2.num_levels());
        assert_eq!(tree.node_triangle_counts(), tree2.node_triangle_counts());
    }

    #[test]
    fn test_read_rejects_invalid_triangle_index() {
        let mut tree = KDTree::new(quad_mesh(), KDTreeOptions::default()).unwrap();
        tree.root.triangles.push(17);

        let mut buffer = Vec::new();
        tree.write(&mut buffer).unwrap();

        assert!(matches!(
            KDTree::read_from(&buffer[..]),
            Err(Error::InvalidTriangleIndex {
                triangle: 17,
                num_triangles: 4
            })
        ));
    }
}
