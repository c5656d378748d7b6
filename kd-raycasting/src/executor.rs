use std::{fs::File, io::BufWriter, path::Path};

use log::{info, log_enabled, trace, warn, Level};
use nalgebra_glm::Vec3;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::{
    math::{Ray, AABB},
    raycaster::{brute_force_intersect, NaiveRaycaster, Raycaster},
    spatial::{Hit, TraversalStats, TreePrinter},
    BenchConfig, Error, KDTree, Mesh, ProgressCallback, Result, StatsNode, StatsNodeTrait,
};

/// The relative tolerance for comparing hit distances against the brute force result.
const DISTANCE_TOLERANCE: f32 = 1e-4;

/// The results of a benchmark run.
#[derive(Debug, Clone, Default)]
pub struct BenchReport {
    /// The number of cast rays.
    pub num_rays: usize,

    /// The number of rays that hit a triangle.
    pub num_hits: usize,

    /// The number of rays whose result differs from the brute force result.
    pub num_mismatches: usize,

    /// The tests performed by the k-d tree.
    pub tree_stats: TraversalStats,

    /// The tests performed by the brute force raycaster, if verification is enabled.
    pub naive_stats: Option<TraversalStats>,
}

/// A benchmark executor that builds the k-d tree and casts random rays against it.
pub struct BenchExecutor {
    config: BenchConfig,
    mesh: Mesh,
}

impl BenchExecutor {
    /// Creates a new benchmark executor.
    ///
    /// # Arguments
    /// * `config` - The benchmark configuration.
    /// * `mesh` - The mesh to benchmark.
    pub fn new(config: BenchConfig, mesh: Mesh) -> Self {
        Self { config, mesh }
    }

    /// Runs the benchmark.
    ///
    /// # Arguments
    /// * `s` - The stats node to write the timings to.
    pub fn run(self, s: StatsNode) -> Result<BenchReport> {
        info!("Num Triangles: {}", self.mesh.num_triangles());
        info!("Num Rays: {}", self.config.num_rays);

        info!("Building the k-d tree...");
        let tree = {
            let _t = s.get_child("build").register_timing();
            KDTree::new(self.mesh, self.config.tree.clone()).map_err(|err| {
                log::error!("Failed to build the k-d tree: {:?}", err);
                err
            })?
        };

        info!(
            "Tree: {} levels, {} leaves, {} nodes",
            tree.num_levels(),
            tree.num_leaves(),
            tree.num_nodes()
        );

        if log_enabled!(Level::Trace) {
            trace!("Triangles per node:\n{}", TreePrinter::print(tree.root()));
        }

        if let Some(path) = self.config.tree_output.as_ref() {
            let _t = s.get_child("write").register_timing();
            Self::write_tree(&tree, Path::new(path))?;
        }

        let rays = Self::gen_rays(
            &tree.mesh().bounding_box(),
            self.config.num_rays,
            self.config.seed,
        );

        let report = {
            let _t = s.get_child("cast").register_timing();
            Self::cast_rays(&tree, &rays, self.config.verify, Self::print_progress)
        };

        if report.num_mismatches > 0 {
            warn!(
                "{} of {} rays differ from the brute force result",
                report.num_mismatches, report.num_rays
            );
        }

        Ok(report)
    }

    /// Casts the given rays against the tree and optionally compares every result with the
    /// brute force result.
    ///
    /// # Arguments
    /// * `tree` - The tree to cast the rays against.
    /// * `rays` - The rays to cast.
    /// * `verify` - Should the results be compared with the brute force results.
    /// * `progress` - The progress callback.
    fn cast_rays(
        tree: &KDTree,
        rays: &[Ray],
        verify: bool,
        progress: ProgressCallback,
    ) -> BenchReport {
        info!("Casting rays with {}...", KDTree::get_name());
        if verify {
            info!("Verifying against {}...", NaiveRaycaster::get_name());
        }

        let mut report = BenchReport {
            num_rays: rays.len(),
            naive_stats: verify.then(TraversalStats::default),
            ..Default::default()
        };

        let mut last_update = None;
        for (i, ray) in rays.iter().enumerate() {
            let p0 = i * 10 / rays.len();
            if last_update != Some(p0) {
                last_update = Some(p0);
                progress(0, 1, i as f32 * 100f32 / rays.len() as f32, "Casting rays...");
            }

            let hit = tree.cast(ray, &mut report.tree_stats);
            if hit.is_some() {
                report.num_hits += 1;
            }

            if let Some(naive_stats) = report.naive_stats.as_mut() {
                naive_stats.num_triangle_tests += tree.mesh().num_triangles();
                let expected = brute_force_intersect(tree.mesh(), ray);

                if !Self::same_hit(&hit, &expected) {
                    warn!(
                        "Ray {:?}: k-d tree reports {:?}, brute force reports {:?}",
                        ray, hit, expected
                    );
                    report.num_mismatches += 1;
                }
            }
        }

        progress(0, 1, 100f32, "Casting rays...DONE");

        report
    }

    /// Returns true if both results agree within the distance tolerance.
    fn same_hit(a: &Option<Hit>, b: &Option<Hit>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => (a.t - b.t).abs() <= DISTANCE_TOLERANCE * a.t.abs().max(1f32),
            (None, None) => true,
            _ => false,
        }
    }

    /// Generates deterministic random rays that start on a sphere around the given volume and
    /// point towards random positions inside of it.
    ///
    /// # Arguments
    /// * `volume` - The volume to shoot the rays at.
    /// * `num_rays` - The number of rays to generate.
    /// * `seed` - The seed of the random number generator.
    fn gen_rays(volume: &AABB, num_rays: usize, seed: u64) -> Vec<Ray> {
        if volume.is_empty() {
            warn!("The mesh has no vertices, no rays are generated");
            return Vec::new();
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let center = volume.get_center();
        let radius = volume.get_size().norm().max(1f32);

        (0..num_rays)
            .map(|_| {
                let origin = center + Self::gen_unit_vector(&mut rng) * radius;
                let target = Vec3::new(
                    Self::gen_in_range(&mut rng, volume.min.x, volume.max.x),
                    Self::gen_in_range(&mut rng, volume.min.y, volume.max.y),
                    Self::gen_in_range(&mut rng, volume.min.z, volume.max.z),
                );

                Ray::from_pos(&origin, &target)
            })
            .collect()
    }

    /// Returns a uniformly distributed random direction.
    fn gen_unit_vector(rng: &mut ChaCha8Rng) -> Vec3 {
        loop {
            let v = Vec3::new(
                rng.random_range(-1f32..=1f32),
                rng.random_range(-1f32..=1f32),
                rng.random_range(-1f32..=1f32),
            );

            let l = v.norm();
            if l > 1e-3 && l <= 1f32 {
                return v / l;
            }
        }
    }

    /// Returns a random value between min and max, accepting empty ranges.
    fn gen_in_range(rng: &mut ChaCha8Rng, min: f32, max: f32) -> f32 {
        if min < max {
            rng.random_range(min..max)
        } else {
            min
        }
    }

    /// Writes the tree to the given file and creates the parent directories if needed.
    ///
    /// # Arguments
    /// * `tree` - The tree to write.
    /// * `path` - The destination file.
    fn write_tree(tree: &KDTree, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| {
                log::error!("Failed to create the output directory: {:?}", err);
                Error::Io(err)
            })?;
        }

        info!("Writing the k-d tree to {}...", path.display());
        let writer = BufWriter::new(File::create(path)?);
        tree.write(writer)
    }

    /// Prints the progress of the current stage.
    ///
    /// # Arguments
    /// * `current_stage` - The current stage.
    /// * `total_stages` - The total number of stages.
    /// * `progress` - The progress of the current stage.
    /// * `msg` - The message to print.
    fn print_progress(current_stage: usize, total_stages: usize, progress: f32, msg: &str) {
        info!(
            "Stage {}/{} ({:.2}%): {}",
            current_stage + 1,
            total_stages,
            progress,
            msg
        );
    }
}
