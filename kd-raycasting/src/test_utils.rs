use nalgebra_glm::Vec3;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::{Mesh, Triangle};

/// Generates a mesh of random triangles with an edge length of up to ~3 within [-11, 11]^3.
///
/// # Arguments
/// * `rng` - The random number generator.
/// * `num_triangles` - The number of triangles to generate.
pub fn gen_random_mesh(rng: &mut ChaCha8Rng, num_triangles: usize) -> Mesh {
    let mut mesh = Mesh::default();

    for i in 0..num_triangles {
        let center = Vec3::new(
            rng.random_range(-10f32..10f32),
            rng.random_range(-10f32..10f32),
            rng.random_range(-10f32..10f32),
        );

        for _ in 0..3 {
            mesh.vertices.push(
                center
                    + Vec3::new(
                        rng.random_range(-1f32..1f32),
                        rng.random_range(-1f32..1f32),
                        rng.random_range(-1f32..1f32),
                    ),
            );
        }

        let i = (i * 3) as u32;
        mesh.triangles.push(Triangle::new(i, i + 1, i + 2));
    }

    mesh
}

/// Generates a mesh of random triangles whose bounding boxes are pairwise disjoint. Every
/// triangle lies inside its own cell of a unit grid with a gap of at least 0.2 to its neighbors.
///
/// # Arguments
/// * `rng` - The random number generator.
/// * `num_triangles` - The number of triangles to generate.
pub fn gen_separated_mesh(rng: &mut ChaCha8Rng, num_triangles: usize) -> Mesh {
    let mut mesh = Mesh::default();
    let n = 8;

    for i in 0..num_triangles {
        let cell = Vec3::new((i % n) as f32, ((i / n) % n) as f32, (i / (n * n)) as f32);

        for _ in 0..3 {
            mesh.vertices.push(
                cell + Vec3::new(
                    rng.random_range(0.1f32..0.9f32),
                    rng.random_range(0.1f32..0.9f32),
                    rng.random_range(0.1f32..0.9f32),
                ),
            );
        }

        let i = (i * 3) as u32;
        mesh.triangles.push(Triangle::new(i, i + 1, i + 2));
    }

    mesh
}

/// Generates a random ray starting outside of [-15, 15]^3 that points towards a random position
/// inside of [-10, 10]^3.
///
/// # Arguments
/// * `rng` - The random number generator.
pub fn gen_random_ray(rng: &mut ChaCha8Rng) -> crate::math::Ray {
    let mut origin = Vec3::new(
        rng.random_range(-20f32..20f32),
        rng.random_range(-20f32..20f32),
        rng.random_range(-20f32..20f32),
    );
    let axis: usize = rng.random_range(0..3);
    origin[axis] = if rng.random_bool(0.5) { -20f32 } else { 20f32 };

    let target = Vec3::new(
        rng.random_range(-10f32..10f32),
        rng.random_range(-10f32..10f32),
        rng.random_range(-10f32..10f32),
    );

    crate::math::Ray::from_pos(&origin, &target)
}
