use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CAD import error: {0}")]
    CadImport(#[from] cad_import::Error),

    #[error("File has either no extension or an invalid extension")]
    InvalidFileExtension,

    #[error("No loader found for the given file")]
    NoLoaderFound,

    #[error("Serialization error: {0}")]
    SerializationError(Box<dyn std::error::Error + Send + Sync>),

    #[error("Deserialization error: {0}")]
    DeserializationError(Box<dyn std::error::Error + Send + Sync>),

    #[error("Triangle {triangle} references vertex {vertex}, but the mesh has only {num_vertices} vertices")]
    InvalidVertexIndex {
        triangle: usize,
        vertex: u32,
        num_vertices: usize,
    },

    #[error("The mesh would require {0} vertices, which exceeds the 32 bit index range")]
    TooManyVertices(usize),

    #[error("Vertex {0} has a non-finite coordinate")]
    NonFiniteVertex(usize),

    #[error("Tree node references triangle {triangle}, but the mesh has only {num_triangles} triangles")]
    InvalidTriangleIndex {
        triangle: usize,
        num_triangles: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
