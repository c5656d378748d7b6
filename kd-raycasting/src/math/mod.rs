//! Geometric primitives used by the acceleration structures.

mod aabb;
mod intersection;
mod plane;
mod ray;

pub use aabb::*;
pub use intersection::*;
pub use plane::*;
pub use ray::*;
