mod io;
mod triangulation;

pub use io::*;

use crate::{
    math::{Axis, AABB},
    Error, Result,
};
use nalgebra_glm::{TVec3, Vec3};
use serde::{Deserialize, Serialize};

/// Three indices into the vertex array of a mesh.
pub type Triangle = TVec3<u32>;

/// A simple tessellated mesh, i.e., the geometry buffers the acceleration structures are
/// built on.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    /// Creates a new mesh from the given vertex and triangle buffers.
    ///
    /// # Arguments
    /// * `vertices` - The vertex positions.
    /// * `triangles` - The triangles referencing the vertex positions.
    pub fn new(vertices: Vec<Vec3>, triangles: Vec<Triangle>) -> Self {
        Self {
            vertices,
            triangles,
        }
    }

    /// Checks that all vertices are finite and all triangles reference existing vertices.
    pub fn validate(&self) -> Result<()> {
        if let Some(index) = self
            .vertices
            .iter()
            .position(|v| !v.iter().all(|c| c.is_finite()))
        {
            return Err(Error::NonFiniteVertex(index));
        }

        let num_vertices = self.vertices.len();
        for (triangle, t) in self.triangles.iter().enumerate() {
            if let Some(vertex) = t.iter().find(|&&v| v as usize >= num_vertices) {
                return Err(Error::InvalidVertexIndex {
                    triangle,
                    vertex: *vertex,
                    num_vertices,
                });
            }
        }

        Ok(())
    }

    /// Returns the number of triangles of the mesh.
    #[inline]
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Returns the three vertex positions of the specified triangle.
    ///
    /// # Arguments
    /// * `triangle` - The index of the triangle.
    #[inline]
    pub fn triangle_vertices(&self, triangle: usize) -> [&Vec3; 3] {
        let t = &self.triangles[triangle];

        [
            &self.vertices[t[0] as usize],
            &self.vertices[t[1] as usize],
            &self.vertices[t[2] as usize],
        ]
    }

    /// Projects the vertices of the specified triangle onto the given axis and returns the
    /// minimum and the maximum of the projected values.
    ///
    /// # Arguments
    /// * `triangle` - The index of the triangle.
    /// * `axis` - The axis onto which the triangle is projected.
    pub fn projected_extent(&self, triangle: usize, axis: Axis) -> (f32, f32) {
        let i = axis.index();

        self.triangle_vertices(triangle)
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v[i]), hi.max(v[i]))
            })
    }

    /// Returns the bounding box over all vertices of the mesh.
    pub fn bounding_box(&self) -> AABB {
        AABB::from_iter(self.vertices.iter().copied())
    }

    /// Returns the tight bounding box over the vertices of the given triangles.
    ///
    /// # Arguments
    /// * `triangles` - The indices of the triangles to enclose.
    pub fn triangles_bounding_box(&self, triangles: &[usize]) -> AABB {
        AABB::from_iter(
            triangles
                .iter()
                .flat_map(|&t| self.triangle_vertices(t))
                .copied(),
        )
    }

    /// Writes the mesh to the given writer.
    ///
    /// # Arguments
    /// * `writer` - The writer to write the mesh to.
    pub fn write<W: std::io::Write>(&self, writer: W) -> Result<()> {
        bincode::serialize_into(writer, self).map_err(|e| Error::SerializationError(Box::new(e)))
    }

    /// Reads the mesh from the given reader and validates it.
    ///
    /// # Arguments
    /// * `reader` - The reader to read the mesh from.
    pub fn read_from<R: std::io::Read>(reader: R) -> Result<Self> {
        let mesh: Self = bincode::deserialize_from(reader)
            .map_err(|e| Error::DeserializationError(Box::new(e)))?;
        mesh.validate()?;

        Ok(mesh)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn two_triangles() -> Mesh {
        Mesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(5.0, 5.0, 5.0),
                Vec3::new(6.0, 4.0, 7.0),
            ],
            vec![Triangle::new(0, 1, 2), Triangle::new(3, 4, 2)],
        )
    }

    #[test]
    fn test_validate() {
        assert!(two_triangles().validate().is_ok());
        assert!(Mesh::default().validate().is_ok());

        let mut mesh = two_triangles();
        mesh.triangles.push(Triangle::new(0, 1, 5));
        match mesh.validate() {
            Err(Error::InvalidVertexIndex {
                triangle,
                vertex,
                num_vertices,
            }) => {
                assert_eq!(triangle, 2);
                assert_eq!(vertex, 5);
                assert_eq!(num_vertices, 5);
            }
            r => panic!("unexpected validation result {:?}", r),
        }

        let mut mesh = two_triangles();
        mesh.vertices[3].y = f32::NAN;
        assert!(matches!(mesh.validate(), Err(Error::NonFiniteVertex(3))));

        let mut mesh = two_triangles();
        mesh.vertices[1].x = f32::INFINITY;
        assert!(matches!(mesh.validate(), Err(Error::NonFiniteVertex(1))));
    }

    #[test]
    fn test_projected_extent() {
        let mesh = two_triangles();

        assert_eq!(mesh.projected_extent(0, Axis::X), (0.0, 1.0));
        assert_eq!(mesh.projected_extent(1, Axis::X), (0.0, 6.0));
        assert_eq!(mesh.projected_extent(1, Axis::Y), (1.0, 5.0));
        assert_eq!(mesh.projected_extent(1, Axis::Z), (0.0, 7.0));
    }

    #[test]
    fn test_bounding_boxes() {
        let mesh = two_triangles();

        let bbox = mesh.bounding_box();
        assert_eq!(bbox.min, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(bbox.max, Vec3::new(6.0, 5.0, 7.0));

        let bbox = mesh.triangles_bounding_box(&[0]);
        assert_eq!(bbox.min, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(bbox.max, Vec3::new(1.0, 1.0, 0.0));

        assert!(mesh.triangles_bounding_box(&[]).is_empty());
    }

    #[test]
    fn test_serialize_and_deserialize_mesh() {
        let mesh = two_triangles();

        let mut buffer = Vec::new();
        mesh.write(&mut buffer).unwrap();
        let mesh2 = Mesh::read_from(&buffer[..]).unwrap();

        assert_eq!(mesh.vertices, mesh2.vertices);
        assert_eq!(mesh.triangles, mesh2.triangles);
    }
}
