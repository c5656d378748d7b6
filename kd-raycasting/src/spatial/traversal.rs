use nalgebra_glm::Vec3;

use crate::math::{triangle_ray, Ray};

use super::{KDTree, KDTreeNode, RayIntersectionTest};

/// The nearest intersection of a ray with the triangles of a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// The ray parameter of the intersection.
    pub t: f32,

    /// The intersection point, i.e., ray.pos + t * ray.dir.
    pub point: Vec3,

    /// The face normal of the hit triangle.
    pub normal: Vec3,

    /// The index of the hit triangle.
    pub triangle: usize,
}

/// Counters about the work done by ray queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    /// The number of ray/bounding volume tests.
    pub num_volume_tests: usize,

    /// The number of ray/triangle tests.
    pub num_triangle_tests: usize,
}

impl std::ops::Add<Self> for TraversalStats {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            num_volume_tests: self.num_volume_tests + rhs.num_volume_tests,
            num_triangle_tests: self.num_triangle_tests + rhs.num_triangle_tests,
        }
    }
}

impl std::ops::AddAssign<Self> for TraversalStats {
    fn add_assign(&mut self, rhs: Self) {
        self.num_volume_tests += rhs.num_volume_tests;
        self.num_triangle_tests += rhs.num_triangle_tests;
    }
}

/// The nearest triangle hit found so far.
#[derive(Clone, Copy)]
struct Nearest {
    t: f32,
    normal: Vec3,
    triangle: usize,
}

impl Nearest {
    fn into_hit(self, ray: &Ray) -> Hit {
        Hit {
            t: self.t,
            point: ray.at(self.t),
            normal: self.normal,
            triangle: self.triangle,
        }
    }
}

impl KDTree {
    /// Returns the nearest intersection of the given ray with the triangles of the tree.
    ///
    /// # Arguments
    /// * `ray` - The ray to intersect.
    pub fn intersect(&self, ray: &Ray) -> Option<Hit> {
        let mut stats = TraversalStats::default();
        self.intersect_with_stats(ray, &mut stats)
    }

    /// Returns the nearest intersection of the given ray and adds the performed tests to the
    /// given stats.
    ///
    /// # Arguments
    /// * `ray` - The ray to intersect.
    /// * `stats` - The stats to update.
    pub fn intersect_with_stats(&self, ray: &Ray, stats: &mut TraversalStats) -> Option<Hit> {
        stats.num_volume_tests += 1;
        self.root.bbox.intersects_ray(ray, None)?;

        self.visit(&self.root, ray, None, stats)
            .map(|nearest| nearest.into_hit(ray))
    }

    /// Visits the given node whose bounding box is known to be hit by the ray and returns the
    /// nearest hit among the given one and the ones found in the subtree.
    ///
    /// # Arguments
    /// * `node` - The node to visit.
    /// * `ray` - The ray to intersect.
    /// * `nearest` - The nearest hit found so far.
    /// * `stats` - The stats to update.
    fn visit(
        &self,
        node: &KDTreeNode,
        ray: &Ray,
        mut nearest: Option<Nearest>,
        stats: &mut TraversalStats,
    ) -> Option<Nearest> {
        let Some(children) = node.children() else {
            for &triangle in node.triangles() {
                stats.num_triangle_tests += 1;

                let [p0, p1, p2] = self.mesh.triangle_vertices(triangle);
                let max_t = nearest.map(|n| n.t);

                // a triangle referenced by multiple leaves is only taken if strictly closer
                if let Some(hit) = triangle_ray(p0, p1, p2, ray, max_t) {
                    if nearest.map_or(true, |n| hit.t < n.t) {
                        nearest = Some(Nearest {
                            t: hit.t,
                            normal: hit.normal,
                            triangle,
                        });
                    }
                }
            }

            return nearest;
        };

        let max_t = nearest.map(|n| n.t);
        let mut hits = children.each_ref().map(|child| {
            stats.num_volume_tests += 1;
            child
                .bbox
                .intersects_ray(ray, max_t)
                .map(|t_near| (t_near, child))
        });

        // visit the nearer child first
        if let [Some((t0, _)), Some((t1, _))] = hits {
            if t0 > t1 {
                hits.swap(0, 1);
            }
        }

        for (t_near, child) in hits.into_iter().flatten() {
            if nearest.is_some_and(|n| n.t < t_near) {
                continue;
            }

            nearest = self.visit(child, ray, nearest, stats);
        }

        nearest
    }
}

#[cfg(test)]
mod test {
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::{
        raycaster::{NaiveRaycaster, Raycaster},
        test_utils::{gen_random_mesh, gen_random_ray},
        BoundingBoxMode, KDTreeOptions, Mesh, Triangle,
    };

    fn options(k: usize, bounding_boxes: BoundingBoxMode) -> KDTreeOptions {
        KDTreeOptions {
            max_triangles_per_leaf: k,
            bounding_boxes,
            ..Default::default()
        }
    }

    #[test]
    fn test_single_triangle() {
        let mesh = Mesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![Triangle::new(0, 1, 2)],
        );

        for bounding_boxes in [BoundingBoxMode::Tight, BoundingBoxMode::Loose] {
            let tree = KDTree::new(mesh.clone(), options(1, bounding_boxes)).unwrap();

            let centroid = Vec3::new(1.0 / 3.0, 1.0 / 3.0, 0.0);
            let origin = centroid + Vec3::new(0.0, 0.0, 5.0);
            let ray = Ray::new(origin, Vec3::new(0.0, 0.0, -1.0));
            let hit = tree.intersect(&ray).unwrap();

            assert!((hit.t - 5.0).abs() < 1e-6);
            assert!((hit.point - centroid).norm() < 1e-6);
            assert_eq!(hit.normal, Vec3::new(0.0, 0.0, 1.0));
            assert_eq!(hit.triangle, 0);

            // pointing away from the triangle
            let ray = Ray::new(origin, Vec3::new(0.0, 0.0, 1.0));
            assert!(tree.intersect(&ray).is_none());
        }
    }

    #[test]
    fn test_separated_triangles() {
        let mesh = Mesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(10.0, 0.0, 2.0),
                Vec3::new(11.0, 0.0, 2.0),
                Vec3::new(10.0, 1.0, 2.0),
            ],
            vec![Triangle::new(0, 1, 2), Triangle::new(3, 4, 5)],
        );

        for bounding_boxes in [BoundingBoxMode::Tight, BoundingBoxMode::Loose] {
            let tree = KDTree::new(mesh.clone(), options(1, bounding_boxes)).unwrap();
            assert_eq!(tree.num_leaves(), 2);

            let down = Vec3::new(0.0, 0.0, -1.0);

            let hit = tree
                .intersect(&Ray::new(Vec3::new(0.25, 0.25, 10.0), down))
                .unwrap();
            assert_eq!(hit.triangle, 0);
            assert!((hit.t - 10.0).abs() < 1e-5);

            let hit = tree
                .intersect(&Ray::new(Vec3::new(10.25, 0.25, 10.0), down))
                .unwrap();
            assert_eq!(hit.triangle, 1);
            assert!((hit.t - 8.0).abs() < 1e-5);

            assert!(tree
                .intersect(&Ray::new(Vec3::new(5.0, 0.25, 10.0), down))
                .is_none());
        }
    }

    #[test]
    fn test_nearest_of_stacked_triangles() {
        // three parallel triangles stacked along z, the nearest one must win
        let mut mesh = Mesh::default();
        for (i, z) in [3.0, -1.0, 1.0].into_iter().enumerate() {
            mesh.vertices.extend([
                Vec3::new(-1.0, -1.0, z),
                Vec3::new(1.0, -1.0, z),
                Vec3::new(0.0, 1.0, z),
            ]);

            let i = (i * 3) as u32;
            mesh.triangles.push(Triangle::new(i, i + 1, i + 2));
        }

        for bounding_boxes in [BoundingBoxMode::Tight, BoundingBoxMode::Loose] {
            let tree = KDTree::new(mesh.clone(), options(1, bounding_boxes)).unwrap();

            let hit = tree
                .intersect(&Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -1.0)))
                .unwrap();
            assert_eq!(hit.triangle, 0);
            assert!((hit.t - 7.0).abs() < 1e-5);

            let hit = tree
                .intersect(&Ray::new(Vec3::new(0.0, 0.0, -10.0), Vec3::new(0.0, 0.0, 1.0)))
                .unwrap();
            assert_eq!(hit.triangle, 1);
            assert!((hit.t - 9.0).abs() < 1e-5);

            // starting between the triangles
            let hit = tree
                .intersect(&Ray::new(Vec3::new(0.0, 0.0, 2.0), Vec3::new(0.0, 0.0, -1.0)))
                .unwrap();
            assert_eq!(hit.triangle, 2);
            assert!((hit.t - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_ray_missing_root_box() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let tree = KDTree::new(gen_random_mesh(&mut rng, 100), KDTreeOptions::default()).unwrap();

        let ray = Ray::new(Vec3::new(50.0, 50.0, 50.0), Vec3::new(1.0, 0.0, 0.0));
        let mut stats = TraversalStats::default();

        assert!(tree.intersect_with_stats(&ray, &mut stats).is_none());
        assert_eq!(stats.num_volume_tests, 1);
        assert_eq!(stats.num_triangle_tests, 0);
    }

    #[test]
    fn test_coincident_triangles() {
        let p = Vec3::new(1.0, 1.0, 1.0);
        let mesh = Mesh::new(vec![p; 3], (0..10).map(|_| Triangle::new(0, 1, 2)).collect());
        let tree = KDTree::new(mesh, options(2, BoundingBoxMode::Tight)).unwrap();

        let ray = Ray::new(Vec3::new(1.0, 1.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(tree.intersect(&ray).is_none());
    }

    #[test]
    fn test_idempotent_queries() {
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let tree = KDTree::new(gen_random_mesh(&mut rng, 200), KDTreeOptions::default()).unwrap();

        for _ in 0..100 {
            let ray = gen_random_ray(&mut rng);
            assert_eq!(tree.intersect(&ray), tree.intersect(&ray));
        }
    }

    #[test]
    fn test_consistency_with_brute_force() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mesh = gen_random_mesh(&mut rng, 500);
        let naive = NaiveRaycaster::new(&mesh);

        for bounding_boxes in [BoundingBoxMode::Tight, BoundingBoxMode::Loose] {
            for k in [1, 4] {
                let tree = KDTree::new(mesh.clone(), options(k, bounding_boxes)).unwrap();

                let mut num_hits = 0;
                let mut tree_stats = TraversalStats::default();
                let mut naive_stats = TraversalStats::default();
                for _ in 0..500 {
                    let ray = gen_random_ray(&mut rng);

                    let expected = naive.cast(&ray, &mut naive_stats);
                    let actual = tree.cast(&ray, &mut tree_stats);

                    match (expected, actual) {
                        (Some(expected), Some(actual)) => {
                            num_hits += 1;
                            assert!((expected.t - actual.t).abs() < 1e-4);
                            assert!((expected.normal - actual.normal).norm() < 1e-4);
                        }
                        (None, None) => {}
                        _ => panic!(
                            "Mismatch for ray {:?}: brute force {:?}, tree {:?}",
                            ray, expected, actual
                        ),
                    }
                }

                assert!(num_hits > 0);
                assert!(tree_stats.num_triangle_tests < naive_stats.num_triangle_tests);
            }
        }
    }

    #[test]
    fn test_traversal_stats_add() {
        let a = TraversalStats {
            num_volume_tests: 1,
            num_triangle_tests: 2,
        };
        let mut b = TraversalStats {
            num_volume_tests: 3,
            num_triangle_tests: 4,
        };

        assert_eq!(
            a + b,
            TraversalStats {
                num_volume_tests: 4,
                num_triangle_tests: 6
            }
        );

        b += a;
        assert_eq!(b.num_volume_tests, 4);
        assert_eq!(b.num_triangle_tests, 6);
    }
}
