//! Nearest-hit ray casting against a triangle mesh.

mod naive_raycaster;

pub use naive_raycaster::*;

use crate::{
    math::Ray,
    spatial::{Hit, TraversalStats},
    KDTree,
};

/// A trait for determining the nearest triangle hit by a ray.
pub trait Raycaster {
    /// Returns the name of the raycaster.
    fn get_name() -> &'static str
    where
        Self: Sized;

    /// Casts the given ray and returns the nearest hit, if any.
    ///
    /// # Arguments
    /// * `ray` - The ray to cast.
    /// * `stats` - The stats into which the performed tests are counted.
    fn cast(&self, ray: &Ray, stats: &mut TraversalStats) -> Option<Hit>;
}

impl Raycaster for KDTree {
    fn get_name() -> &'static str {
        "kd_tree_raycaster"
    }

    #[inline]
    fn cast(&self, ray: &Ray, stats: &mut TraversalStats) -> Option<Hit> {
        self.intersect_with_stats(ray, stats)
    }
}
