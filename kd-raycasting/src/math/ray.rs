use nalgebra_glm::{normalize, Vec3};

/// A single ray that starts at pos and goes into infinity along dir
#[derive(Debug, Clone)]
pub struct Ray {
    /// The start position of the ray
    pub pos: Vec3,

    /// The direction of the ray. Ray parameters are measured in multiples of this vector.
    pub dir: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction. The direction is kept as is.
    ///
    /// # Arguments
    /// * `pos` - The start position of the ray.
    /// * `dir` - The direction of the ray.
    pub fn new(pos: Vec3, dir: Vec3) -> Self {
        Self { pos, dir }
    }

    /// Creates a new ray spanned by the two positions x0 and x1.
    ///
    /// # Arguments
    /// * `x0` - The start position of the ray
    /// * `x1` - The next position along the line of the ray.
    pub fn from_pos(x0: &Vec3, x1: &Vec3) -> Self {
        Self {
            dir: normalize(&(x1 - x0)),
            pos: *x0,
        }
    }

    /// Returns the point on the ray for the given ray parameter.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.pos + t * self.dir
    }
}
