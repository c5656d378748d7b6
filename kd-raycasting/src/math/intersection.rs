use nalgebra_glm::Vec3;

use super::{Plane, Ray, AABB};

/// The result of a successful ray/triangle intersection test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// The ray parameter of the intersection, i.e., ray.pos + t * ray.dir is the hit point.
    pub t: f32,

    /// The normalized face normal of the triangle.
    pub normal: Vec3,
}

/// Determines the intersection between the given triangle and ray. If there is an intersection it
/// returns the coefficient t that defines the intersection point along the given ray together
/// with the face normal of the triangle.
/// That is, ray.pos + t * ray.dir is the intersection point
///
/// # Arguments
/// * `p0` - The first vertex of the triangle.
/// * `p1` - The second vertex of the triangle.
/// * `p2` - The third vertex of the triangle.
/// * `ray` - The ray to compute the intersection with.
/// * `max_f` - Optionally, the maximum value for t. If the intersection point is further away
///             than max_f, None is returned.
pub fn triangle_ray(
    p0: &Vec3,
    p1: &Vec3,
    p2: &Vec3,
    ray: &Ray,
    max_f: Option<f32>,
) -> Option<TriangleHit> {
    // compute intersection point with the plane of the triangle and the given ray
    let plane = Plane::from_triangle(p0, p1, p2);
    let lambda = plane_ray(&plane, ray)?;

    if let Some(max_f) = max_f {
        if lambda > max_f {
            return None;
        }
    }

    let pos0: Vec3 = ray.at(lambda);

    // check if the intersection is located inside the triangle
    // see: https://www.scratchapixel.com/lessons/3d-basic-rendering/ray-tracing-rendering-a-triangle/ray-triangle-intersection-geometric-solution.html
    let edge0: Vec3 = p1 - p0;
    let edge1: Vec3 = p2 - p1;
    let edge2: Vec3 = p0 - p2;
    let c0: Vec3 = pos0 - p0;
    let c1: Vec3 = pos0 - p1;
    let c2: Vec3 = pos0 - p2;

    // degenerated triangles have a NaN normal and fail all of the following comparisons
    if plane.n.dot(&edge0.cross(&c0)) > 0f32
        && plane.n.dot(&edge1.cross(&c1)) > 0f32
        && plane.n.dot(&edge2.cross(&c2)) > 0f32
    {
        Some(TriangleHit {
            t: lambda,
            normal: plane.n,
        })
    } else {
        None
    }
}

/// Determines the intersection between the given plane and ray. If there is an intersection it
/// returned the coefficient a that defines the intersection point along the given ray.
/// That is, ray.pos + a * ray.dir is the intersection point
///
/// # Arguments
/// * `plane` - The plane to compute the intersection with.
/// * `ray` - The ray to compute the intersection with.
pub fn plane_ray(plane: &Plane, ray: &Ray) -> Option<f32> {
    let a = plane.n.dot(&ray.dir);
    if a == 0f32 {
        return None;
    }

    let lambda = -(plane.d + plane.n.dot(&ray.pos)) / a;
    if lambda < 0f32 {
        None
    } else {
        Some(lambda)
    }
}

/// Determines the intersection between the given AABB and ray. If there is an intersection it
/// returns the entry and exit coefficients (t_near, t_far) along the given ray. A ray starting
/// inside the AABB has t_near == 0.
///
/// # Arguments
/// * `aabb` - The AABB to compute the intersection with.
/// * `ray` - The ray to compute the intersection with.
/// * `max_f` - Optionally, the maximum value for t. If the AABB is further away than max_f,
///             None is returned.
pub fn aabb_ray(aabb: &AABB, ray: &Ray, max_f: Option<f32>) -> Option<(f32, f32)> {
    if aabb.is_empty() {
        return None;
    }

    let mut t_min = 0f32;
    let mut t_max = max_f.unwrap_or(f32::MAX);

    // we iterate over each axis and determine the intersection point with the AABB
    for axis in 0..3 {
        // If the ray is parallel to the plane we check if the ray is inside the AABB.
        // If the ray is not inside the AABB we return None, because the ray does cannot intersect.
        if ray.dir[axis] == 0f32
            && (ray.pos[axis] < aabb.min[axis] || ray.pos[axis] > aabb.max[axis])
        {
            return None;
        }

        let t0 = (aabb.min[axis] - ray.pos[axis]) / ray.dir[axis];
        let t1 = (aabb.max[axis] - ray.pos[axis]) / ray.dir[axis];

        // f32::min/max ignore the NaN produced by a parallel ray lying on a slab boundary
        t_min = t_min.max(t0.min(t1));
        t_max = t_max.min(t0.max(t1));

        if t_min > t_max {
            return None;
        }
    }

    Some((t_min, t_max))
}
