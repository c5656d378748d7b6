use nalgebra_glm::Vec3;

use super::Ray;

/// A plane given in Hessian normal form, i.e., n * p + d = 0 for all points p on the plane.
pub struct Plane {
    pub d: f32,
    pub n: Vec3,
}

impl Plane {
    /// Creates the plane that is orthogonal to the given ray.
    ///
    /// # Arguments
    /// * `ray` - The ray which is orthogonal to the plane
    pub fn from_ray(ray: &Ray) -> Self {
        let n = ray.dir.normalize();
        let d = -n.dot(&ray.pos);

        Self { d, n }
    }

    /// Creates a plane spanned by the two given basis vectors and moved to the position.
    ///
    /// # Argument
    /// * `pos` - A position on the plane.
    /// * `b0` - The first basis vector that spans the plane.
    /// * `b1` - The second basis vector that spans the plane.
    pub fn from_basis(pos: &Vec3, b0: &Vec3, b1: &Vec3) -> Self {
        let n = b0.cross(b1).normalize();
        let d = -n.dot(pos);

        Self { d, n }
    }

    /// Creates a plane spanned by the given triangle.
    ///
    /// # Argument
    /// * `p0` - The first vertex of the triangle.
    /// * `p1` - The second vertex of the triangle.
    /// * `p2` - The third vertex of the triangle.
    pub fn from_triangle(p0: &Vec3, p1: &Vec3, p2: &Vec3) -> Self {
        let b0 = p1 - p0;
        let b1 = p2 - p0;
        Self::from_basis(p0, &b0, &b1)
    }

    /// Returns the signed distance, i.e., the distance between the plane and the point that can
    /// be negative or positive.
    ///
    /// # Arguments
    /// * `p` - The point to which the signed distance will be computed.
    #[inline]
    pub fn signed_distance(&self, p: &Vec3) -> f32 {
        self.n.dot(p) + self.d
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_signed_distance() {
        let pos = Vec3::new(1f32, 2f32, 3f32);
        let dir = Vec3::new(1f32, 1f32, 1f32);
        let plane = Plane::from_ray(&Ray::new(pos, dir));

        assert_eq!(plane.signed_distance(&pos), 0f32);
        assert!(plane.signed_distance(&Vec3::new(2f32, 4f32, 5f32)) > 0f32);
        assert!(plane.signed_distance(&Vec3::new(0.5f32, 1f32, 3f32)) < 0f32);
    }

    #[test]
    fn test_from_triangle() {
        let plane = Plane::from_triangle(
            &Vec3::new(0f32, 0f32, 2f32),
            &Vec3::new(1f32, 0f32, 2f32),
            &Vec3::new(0f32, 1f32, 2f32),
        );

        assert_eq!(plane.n, Vec3::new(0f32, 0f32, 1f32));
        assert_eq!(plane.signed_distance(&Vec3::new(5f32, -3f32, 2f32)), 0f32);
        assert_eq!(plane.signed_distance(&Vec3::new(0f32, 0f32, 5f32)), 3f32);
    }
}
