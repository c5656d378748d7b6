use crate::{
    math::{triangle_ray, Ray},
    spatial::{Hit, TraversalStats},
    Mesh,
};

use super::Raycaster;

/// A very simple ray caster without any acceleration structures, i.e., every ray is tested
/// against every triangle.
pub struct NaiveRaycaster<'a> {
    mesh: &'a Mesh,
}

impl<'a> NaiveRaycaster<'a> {
    /// Creates a new naive raycaster for the given validated mesh.
    ///
    /// # Arguments
    /// * `mesh` - The mesh whose triangles are tested.
    pub fn new(mesh: &'a Mesh) -> Self {
        Self { mesh }
    }
}

impl Raycaster for NaiveRaycaster<'_> {
    fn get_name() -> &'static str {
        "naive_raycaster"
    }

    fn cast(&self, ray: &Ray, stats: &mut TraversalStats) -> Option<Hit> {
        stats.num_triangle_tests += self.mesh.num_triangles();
        brute_force_intersect(self.mesh, ray)
    }
}

/// Returns the nearest hit of the ray by testing all triangles of the mesh. Of several hits at
/// the same distance the one with the lowest triangle index is returned.
///
/// # Arguments
/// * `mesh` - The validated mesh to test.
/// * `ray` - The ray to cast.
pub fn brute_force_intersect(mesh: &Mesh, ray: &Ray) -> Option<Hit> {
    let mut nearest: Option<Hit> = None;

    for triangle in 0..mesh.num_triangles() {
        let [p0, p1, p2] = mesh.triangle_vertices(triangle);
        if let Some(hit) = triangle_ray(p0, p1, p2, ray, nearest.map(|n| n.t)) {
            if nearest.map_or(true, |n| hit.t < n.t) {
                nearest = Some(Hit {
                    t: hit.t,
                    point: ray.at(hit.t),
                    normal: hit.normal,
                    triangle,
                });
            }
        }
    }

    nearest
}
