use std::path::Path;

use cad_import::{
    loader::Manager,
    structure::{CADData, IndexData, Node, Point3D, Shape},
};
use log::{debug, error};
use nalgebra_glm::{Mat4, Vec3, Vec4};

use crate::{Error, Result};

use super::{triangulation::triangulate, Mesh, Triangle};

/// Tries to load the CAD file from the given path and appends its triangles to the mesh.
///
/// # Arguments
/// * `mesh` - The mesh to append the loaded triangles to.
/// * `path` - The path to load the CAD data from.
pub fn load_into_mesh<P: AsRef<Path>>(mesh: &mut Mesh, path: P) -> Result<()> {
    let cad_data = load_cad_data(path.as_ref())?;
    add_cad_data_to_mesh(mesh, &cad_data)
}

/// Tries to load the cad data from the given path
///
/// # Arguments
/// * `file_path` - The path to load the CAD data from.
fn load_cad_data(file_path: &Path) -> Result<CADData> {
    let manager = Manager::new();

    let mime_types = determine_mime_types(&manager, file_path)?;

    for mime_type in mime_types.iter() {
        if let Some(loader) = manager.get_loader_by_mime_type(mime_type.as_str()) {
            let cad_data = loader
                .read_file(file_path, mime_type)
                .map_err(Error::CadImport)?;

            return Ok(cad_data);
        }
    }

    error!("Cannot find loader for the input file {:?}", file_path);
    Err(Error::NoLoaderFound)
}

/// Tries to find the mime types for the given file based on the file extension.
///
/// # Arguments
/// * `input_file` - The input file whose extension will be used
pub fn determine_mime_types(manager: &Manager, input_file: &Path) -> Result<Vec<String>> {
    let ext = input_file
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or(Error::InvalidFileExtension)?;

    Ok(manager.get_mime_types_for_extension(ext))
}

/// Flattens the node structure of the given CAD data into the given mesh. Instanced shapes are
/// duplicated with their world transform applied to the vertex positions.
///
/// # Arguments
/// * `mesh` - The mesh to which the data will be added.
/// * `cad_data` - The CAD data to flatten.
pub fn add_cad_data_to_mesh(mesh: &mut Mesh, cad_data: &CADData) -> Result<()> {
    let root_node = cad_data.get_root_node();
    let transform = node_transform(root_node).unwrap_or_else(Mat4::identity);

    traverse(mesh, root_node, &transform)
}

/// Returns the local transformation of the node, if it has one.
fn node_transform(node: &Node) -> Option<Mat4> {
    node.get_transform()
        .map(|t| Mat4::from_column_slice(t.as_slice()))
}

/// Internal function for traversing over the node structure and appending all shapes.
///
/// # Arguments
/// * `mesh` - The mesh to which the data will be added.
/// * `node` - The currently visited node.
/// * `transform` - The accumulated world transform of the visited node.
fn traverse(mesh: &mut Mesh, node: &Node, transform: &Mat4) -> Result<()> {
    for shape in node.get_shapes() {
        append_shape(mesh, shape, transform)?;
    }

    for child in node.get_children().iter() {
        let child_transform = match node_transform(child) {
            Some(t) => transform * t,
            None => *transform,
        };

        traverse(mesh, child, &child_transform)?;
    }

    Ok(())
}

/// Appends the triangles of all parts of the given shape to the mesh.
///
/// # Arguments
/// * `mesh` - The mesh to which the shape will be appended.
/// * `shape` - The shape to append.
/// * `transform` - The world transform of the shape.
fn append_shape(mesh: &mut Mesh, shape: &Shape, transform: &Mat4) -> Result<()> {
    for part in shape.get_parts() {
        let in_mesh = part.get_mesh();
        let positions = in_mesh.get_vertices().get_positions().as_slice();
        let in_primitive_data = in_mesh.get_primitives();
        let primitive_type = in_primitive_data.get_primitive_type();

        let triangles = match in_primitive_data.get_raw_index_data() {
            IndexData::Indices(indices) => triangulate(primitive_type, indices),
            IndexData::NonIndexed(n) => {
                let indices: Vec<u32> = (0..to_vertex_index(*n)?).collect();
                triangulate(primitive_type, &indices)
            }
        };

        match triangles {
            Some(triangles) => append_triangles(mesh, positions, &triangles, transform)?,
            None => debug!("Primitive type {:?} is not triangle", primitive_type),
        }
    }

    Ok(())
}

/// Appends the given triangles and their transformed positions to the mesh.
///
/// # Arguments
/// * `mesh` - The mesh to which the triangles will be appended.
/// * `pos` - The positions of the vertices of the triangles.
/// * `triangles` - The triangles to append to the mesh.
/// * `transform` - The transform applied to the positions.
fn append_triangles(
    mesh: &mut Mesh,
    pos: &[Point3D],
    triangles: &[[u32; 3]],
    transform: &Mat4,
) -> Result<()> {
    // the merged mesh must stay addressable with u32 indices
    to_vertex_index(mesh.vertices.len() + pos.len())?;
    let index_offset = to_vertex_index(mesh.vertices.len())?;

    let triangles = triangles
        .iter()
        .map(|t| offset_triangle(t, index_offset))
        .collect::<Result<Vec<_>>>()?;

    mesh.vertices.extend(pos.iter().map(|p| {
        let p = Vec3::from_row_slice(p.0.as_slice());
        (transform * Vec4::new(p.x, p.y, p.z, 1.0)).xyz()
    }));
    mesh.triangles.extend(triangles);

    Ok(())
}

/// Converts the given vertex count or index into a u32 vertex index.
fn to_vertex_index(n: usize) -> Result<u32> {
    u32::try_from(n).map_err(|_| {
        error!("{} vertices cannot be addressed with 32 bit indices", n);
        Error::TooManyVertices(n)
    })
}

/// Shifts the vertex indices of the given triangle by the given offset.
///
/// # Arguments
/// * `t` - The vertex indices of the triangle.
/// * `offset` - The number of vertices in front of the triangle's vertices.
fn offset_triangle(t: &[u32; 3], offset: u32) -> Result<Triangle> {
    let shift = |i: u32| {
        i.checked_add(offset)
            .ok_or(Error::TooManyVertices(i as usize + offset as usize))
    };

    Ok(Triangle::new(shift(t[0])?, shift(t[1])?, shift(t[2])?))
}
