use cad_import::structure::PrimitiveType;

/// Converts the given index data into a list of triangles. Returns none if the primitive type is
/// neither Triangles, TriangleFan nor TriangleStrip. Incomplete trailing triangles are dropped.
///
/// # Arguments
/// * `primitive` - The primitive type the indices describe.
/// * `indices` - The raw vertex indices.
pub fn triangulate(primitive: PrimitiveType, indices: &[u32]) -> Option<Vec<[u32; 3]>> {
    let triangles = match primitive {
        PrimitiveType::Triangles => indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect(),
        PrimitiveType::TriangleFan => match indices.split_first() {
            Some((&center, rim)) => rim.windows(2).map(|w| [center, w[0], w[1]]).collect(),
            None => Vec::new(),
        },
        // every second triangle of a strip is flipped to keep a consistent orientation
        PrimitiveType::TriangleStrip => indices
            .windows(3)
            .enumerate()
            .map(|(i, w)| {
                if i % 2 == 0 {
                    [w[0], w[1], w[2]]
                } else {
                    [w[1], w[0], w[2]]
                }
            })
            .collect(),
        _ => return None,
    };

    Some(triangles)
}
