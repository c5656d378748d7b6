use std::fmt;
use std::fmt::Display;

use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

/// One of the three coordinate axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes in their tie-break priority order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Returns the component index of the axis, i.e., 0 for X, 1 for Y and 2 for Z.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// An AABB bounding volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AABB {
    /// the corner with the lower coordinates
    pub min: glm::Vec3,
    /// the corner with the upper coordinates
    pub max: glm::Vec3,
}

impl AABB {
    /// Creates a new empty bounding volume, i.e., min is +inf and max is -inf.
    pub fn new() -> Self {
        let min = glm::vec3(f32::INFINITY, f32::INFINITY, f32::INFINITY);
        let max = glm::vec3(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY);

        AABB { min, max }
    }

    /// Creates a new bounding volume from the given iterator of vec3 positions.
    ///
    /// # Arguments
    /// * `positions` - The iterator of vec3 positions to create the bounding volume from.
    pub fn from_iter<I>(positions: I) -> Self
    where
        I: Iterator<Item = glm::Vec3>,
    {
        let mut result = AABB::new();

        result.extend_iter(positions);

        result
    }

    /// Creates a new cubic bounding volume with the specified center and size.
    ///
    /// # Arguments
    /// * `center` - The center of the AABB bounding volume.
    /// * `size` - The edge length of the cubic bounding volume.
    pub fn new_cube(center: &glm::Vec3, size: f32) -> Self {
        let half_size = glm::vec3(size / 2f32, size / 2f32, size / 2f32);

        AABB {
            min: *center - half_size,
            max: *center + half_size,
        }
    }

    /// Returns true if the bbox is empty and false otherwise.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Extends the bounding volume with the given position
    ///
    ///* `p` - The position about which the volume is extended
    pub fn extend_pos(&mut self, p: &glm::Vec3) {
        self.min = glm::min2(&self.min, p);
        self.max = glm::max2(&self.max, p);
    }

    /// Extends the bounding volume with the given volume
    ///
    ///* `rhs` - The right-hand-side bounding volume about which the volume is extended
    pub fn extend_bbox(&mut self, rhs: &Self) {
        self.min = glm::min2(&self.min, &rhs.min);
        self.max = glm::max2(&self.max, &rhs.max);
    }

    /// Extends the bounding volume from the given iterator of vec3 positions.
    pub fn extend_iter<I>(&mut self, positions: I)
    where
        I: Iterator<Item = glm::Vec3>,
    {
        positions.for_each(|p| self.extend_pos(&p))
    }

    /// Computes and returns the bounding box center
    #[inline]
    pub fn get_center(&self) -> glm::Vec3 {
        (self.min + self.max) / 2.0
    }

    /// Computes and returns the bounding box size
    #[inline]
    pub fn get_size(&self) -> glm::Vec3 {
        self.max - self.min
    }

    /// Returns the axis with the largest extent. Equal extents resolve to the axis that comes
    /// first in the order X, Y, Z.
    pub fn longest_axis(&self) -> Axis {
        let size = self.get_size();

        if size.x >= size.y && size.x >= size.z {
            Axis::X
        } else if size.y >= size.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    /// Returns the midpoint of the volume along the given axis.
    ///
    /// # Arguments
    /// * `axis` - The axis along which the midpoint is computed.
    #[inline]
    pub fn midpoint(&self, axis: Axis) -> f32 {
        let i = axis.index();
        self.min[i] + (self.max[i] - self.min[i]) / 2f32
    }

    /// Clips the volume at the given value along the given axis and returns the lower and the
    /// upper part.
    ///
    /// # Arguments
    /// * `axis` - The axis orthogonal to the clipping plane.
    /// * `value` - The position of the clipping plane along the axis.
    pub fn split(&self, axis: Axis, value: f32) -> (AABB, AABB) {
        let mut lower = self.clone();
        let mut upper = self.clone();

        lower.max[axis.index()] = value;
        upper.min[axis.index()] = value;

        (lower, upper)
    }

    #[inline]
    pub fn contains_point(&self, p: &glm::Vec3) -> bool {
        (0..3).all(|i| self.min[i] <= p[i] && p[i] <= self.max[i])
    }

    #[inline]
    pub fn contains_aabb(&self, aabb: &AABB) -> bool {
        (0..3).all(|i| self.min[i] <= aabb.min[i] && aabb.max[i] <= self.max[i])
    }
}

impl Default for AABB {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

fn vec3_to_string(f: &mut fmt::Formatter<'_>, v: &glm::Vec3) -> fmt::Result {
    write!(f, "({}, {}, {})", v[0], v[1], v[2])
}

impl Display for AABB {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        vec3_to_string(f, &self.min)?;
        write!(f, "-")?;
        vec3_to_string(f, &self.max)
    }
}
