use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::{
    math::{Axis, AABB},
    Mesh,
};

use super::{BoundingBoxMode, KDTreeNode, KDTreeOptions};

/// The number of splits that may keep every triangle of a node on both sides before a node with
/// the same triangles becomes a leaf.
pub(crate) const MAX_STALLED_SPLITS: usize = 3;

/// Statistics gathered while building a k-d tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    /// The depth of the deepest leaf, where the root has depth 1.
    pub num_levels: usize,

    /// The total number of leaves.
    pub num_leaves: usize,

    /// The total number of nodes, including the leaves.
    pub num_nodes: usize,

    /// The number of leaves with more triangles than allowed.
    pub num_forced_leaves: usize,
}

/// A candidate split of a cell at the midpoint of one of its axes.
struct Split {
    axis: Axis,
    median: f32,
    left: Vec<usize>,
    right: Vec<usize>,
}

impl Split {
    /// Returns true if at least one side holds fewer than the given number of triangles.
    #[inline]
    fn separates(&self, num_triangles: usize) -> bool {
        self.left.len() < num_triangles || self.right.len() < num_triangles
    }
}

/// Builds a k-d tree by recursively splitting the longest axis of the node's cell at its
/// midpoint. If no triangle is separated along the longest axis, the other axes are tried.
pub struct Builder<'a> {
    mesh: &'a Mesh,
    options: &'a KDTreeOptions,
    stats: BuildStats,
}

impl<'a> Builder<'a> {
    /// Creates a new k-d tree builder for the given mesh.
    ///
    /// # Arguments
    /// * `mesh` - The validated mesh whose triangles are sorted into the tree.
    /// * `options` - The options for the tree.
    pub fn new(mesh: &'a Mesh, options: &'a KDTreeOptions) -> Self {
        Self {
            mesh,
            options,
            stats: BuildStats::default(),
        }
    }

    /// Builds the tree over all triangles of the mesh and returns its root node together with
    /// the build statistics.
    pub fn build(mut self) -> (KDTreeNode, BuildStats) {
        let triangles: Vec<usize> = (0..self.mesh.num_triangles()).collect();
        let bounds = self.mesh.bounding_box();

        let root = self.build_node(triangles, bounds, 1, 0);

        (root, self.stats)
    }

    /// Recursively builds the node for the given triangles.
    ///
    /// # Arguments
    /// * `triangles` - The triangles assigned to the node.
    /// * `bounds` - The cell of the node, i.e., the parent's cell clipped at the split plane.
    /// * `depth` - The depth of the node.
    /// * `stalled_splits` - The number of splits on the path to the node that kept all
    ///                      triangles on both sides.
    fn build_node(
        &mut self,
        triangles: Vec<usize>,
        mut bounds: AABB,
        depth: usize,
        stalled_splits: usize,
    ) -> KDTreeNode {
        self.stats.num_nodes += 1;

        let mut bbox = match self.options.bounding_boxes {
            BoundingBoxMode::Tight => self.mesh.triangles_bounding_box(&triangles),
            BoundingBoxMode::Loose => bounds.clone(),
        };

        if triangles.len() <= self.options.max_triangles_per_leaf {
            return self.leaf(bbox, triangles, depth, false);
        }

        if depth >= self.options.max_depth {
            debug!(
                "Maximum depth {} reached with {} triangles",
                depth,
                triangles.len()
            );
            return self.leaf(bbox, triangles, depth, true);
        }

        'cell: loop {
            let mut stalled = None;

            for axis in Self::split_axes(&bounds) {
                let median = bounds.midpoint(axis);
                let (left, right) = self.partition(&triangles, axis, median);

                trace!(
                    "Split {:?} at {}: {} left, {} right of {} triangles",
                    axis,
                    median,
                    left.len(),
                    right.len(),
                    triangles.len()
                );

                // Every triangle lands on at least one side, so an empty side means the other
                // one holds all triangles and the node just shrinks its cell.
                if left.is_empty() || right.is_empty() {
                    let (left_bounds, right_bounds) = bounds.split(axis, median);
                    bounds = if left.is_empty() {
                        right_bounds
                    } else {
                        left_bounds
                    };

                    if self.options.bounding_boxes == BoundingBoxMode::Loose {
                        bbox = bounds.clone();
                    }

                    continue 'cell;
                }

                let split = Split {
                    axis,
                    median,
                    left,
                    right,
                };

                if split.separates(triangles.len()) {
                    return self.inner(bbox, triangles, &bounds, split, depth, stalled_splits);
                }

                stalled.get_or_insert(split);
            }

            let Some(split) = stalled else {
                debug!(
                    "Cell {} cannot be split anymore, keeping {} triangles at depth {}",
                    bounds,
                    triangles.len(),
                    depth
                );
                return self.leaf(bbox, triangles, depth, true);
            };

            // the triangles straddle the split plane of every axis, the smaller cells of the
            // children may still separate them
            if stalled_splits >= MAX_STALLED_SPLITS {
                debug!(
                    "All {} triangles straddle the split planes at depth {}",
                    triangles.len(),
                    depth
                );
                return self.leaf(bbox, triangles, depth, true);
            }

            return self.inner(bbox, triangles, &bounds, split, depth, stalled_splits + 1);
        }
    }

    /// Returns the axes along which the cell can be split, starting with its longest axis
    /// followed by the others in the order X, Y, Z. An axis can only be split if its midpoint
    /// lies strictly inside the cell.
    fn split_axes(bounds: &AABB) -> Vec<Axis> {
        let longest = bounds.longest_axis();

        std::iter::once(longest)
            .chain(Axis::ALL.into_iter().filter(|&axis| axis != longest))
            .filter(|&axis| {
                let i = axis.index();
                let median = bounds.midpoint(axis);
                bounds.min[i] < median && median < bounds.max[i]
            })
            .collect()
    }

    /// Creates an inner node and recursively builds both children of the given split.
    ///
    /// # Arguments
    /// * `bbox` - The bounding box of the node.
    /// * `triangles` - The triangles assigned to the node.
    /// * `bounds` - The cell of the node.
    /// * `split` - The split of the cell.
    /// * `depth` - The depth of the node.
    /// * `stalled_splits` - The stalled split count for children that keep all triangles.
    fn inner(
        &mut self,
        bbox: AABB,
        triangles: Vec<usize>,
        bounds: &AABB,
        split: Split,
        depth: usize,
        stalled_splits: usize,
    ) -> KDTreeNode {
        let (left_bounds, right_bounds) = bounds.split(split.axis, split.median);

        let num_triangles = triangles.len();
        let stalled = |side: &[usize]| {
            if side.len() < num_triangles {
                0
            } else {
                stalled_splits
            }
        };
        let left_stalled = stalled(&split.left);
        let right_stalled = stalled(&split.right);

        let left = self.build_node(split.left, left_bounds, depth + 1, left_stalled);
        let right = self.build_node(split.right, right_bounds, depth + 1, right_stalled);

        KDTreeNode {
            bbox,
            triangles,
            children: Some(Box::new([left, right])),
        }
    }

    /// Sorts the given triangles into the two halves of the split. Triangles whose extent along
    /// the axis straddles the median are put into both halves.
    ///
    /// # Arguments
    /// * `triangles` - The triangles to sort.
    /// * `axis` - The split axis.
    /// * `median` - The position of the split plane along the axis.
    fn partition(&self, triangles: &[usize], axis: Axis, median: f32) -> (Vec<usize>, Vec<usize>) {
        let mut left = Vec::with_capacity(triangles.len());
        let mut right = Vec::with_capacity(triangles.len());

        for &triangle in triangles {
            let (min_value, max_value) = self.mesh.projected_extent(triangle, axis);

            if min_value < median {
                left.push(triangle);
            }

            if max_value >= median {
                right.push(triangle);
            }
        }

        (left, right)
    }

    /// Creates a leaf and records it in the statistics.
    fn leaf(
        &mut self,
        bbox: AABB,
        triangles: Vec<usize>,
        depth: usize,
        forced: bool,
    ) -> KDTreeNode {
        self.stats.num_levels = self.stats.num_levels.max(depth);
        self.stats.num_leaves += 1;

        if forced {
            self.stats.num_forced_leaves += 1;
        }

        KDTreeNode {
            bbox,
            triangles,
            children: None,
        }
    }
}
