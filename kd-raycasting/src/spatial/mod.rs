//! Spatial indices for fast raycasting.
//!
//! This module contains the spatial indices used for fast raycasting. The
//! spatial indices are used to quickly find the triangles that intersect with a ray.

mod builder;
mod kdtree;
mod printer;
mod traversal;

pub use builder::*;
pub use kdtree::*;
pub use printer::*;
pub use traversal::*;

use crate::math::{aabb_ray, Ray, AABB};

/// A trait to enable intersection tests with rays.
pub trait RayIntersectionTest {
    /// Tests the intersection of the ray with the object.
    /// Returns the distance to the intersection point if the ray intersects
    /// with the object, otherwise None.
    ///
    /// # Arguments
    /// * `ray` - The ray to test the intersection with.
    /// * `max_depth` - Optionally, a value can be provided to limit the intersection. This value
    ///             usually comes from previous intersection tests and can be used to reduce the
    ///             search space.
    fn intersects_ray(&self, ray: &Ray, max_depth: Option<f32>) -> Option<f32>;
}

impl RayIntersectionTest for AABB {
    #[inline]
    fn intersects_ray(&self, ray: &Ray, max_depth: Option<f32>) -> Option<f32> {
        aabb_ray(self, ray, max_depth).map(|(t_near, _)| t_near)
    }
}
