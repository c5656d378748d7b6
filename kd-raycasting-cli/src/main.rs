use std::{fs::File, time::Instant};

use anyhow::Result;
use clap::Parser;
use kd_raycasting::{
    load_into_mesh, BenchConfig, BenchExecutor, BenchReport, Mesh, Stats, StatsNodeTrait,
};
use log::{error, info, LevelFilter};
use options::Options;

mod options;

/// Initializes the program logging
///
/// # Arguments
/// * `filter` - The log level filter, i.e., the minimum log level to be logged.
fn initialize_logging(filter: LevelFilter) {
    let mut builder = pretty_env_logger::formatted_timed_builder();

    builder.filter_level(filter).init();
}

/// Loads all CAD files matching the provided glob patterns into a single mesh.
///
/// # Arguments
/// * `patterns` - The glob patterns for the CAD files.
fn load_cad_files(patterns: &[String]) -> Result<(Mesh, usize)> {
    let mut mesh = Mesh::default();
    let mut num_read_files = 0;

    for pattern in patterns {
        let paths = glob::glob(pattern).map_err(|err| {
            error!("Invalid input pattern '{}': {:?}", pattern, err);
            err
        })?;

        for entry in paths {
            match entry {
                Ok(path) => {
                    info!("Loading CAD data '{}'...", path.display());

                    if let Err(err) = load_into_mesh(&mut mesh, &path) {
                        error!("Failed to load CAD data: {:?}", err);
                        info!("Skipping CAD data...");
                    } else {
                        num_read_files += 1;
                    }
                }
                Err(err) => {
                    error!("Failed to read entry: {:?}", err);
                    info!("Skipping entry...");
                }
            }
        }
    }

    Ok((mesh, num_read_files))
}

/// Prints the mesh information.
///
/// # Arguments
/// * `mesh` - The mesh to print the information for.
fn print_mesh_info(mesh: &Mesh) {
    let bbox = mesh.bounding_box();

    info!("Mesh information:");
    info!("  - Number of triangles: {}", mesh.num_triangles());
    info!("  - Number of vertices: {}", mesh.vertices.len());
    if !bbox.is_empty() {
        info!("  - Bounding box: {}", bbox);
    }
}

/// Prints the benchmark report.
///
/// # Arguments
/// * `report` - The report to print.
fn print_report(report: &BenchReport) {
    let per_ray = |n: usize| n as f64 / report.num_rays.max(1) as f64;

    info!("Benchmark report:");
    info!("  - Number of rays: {}", report.num_rays);
    info!("  - Number of hits: {}", report.num_hits);
    info!(
        "  - Volume tests per ray: {:.2}",
        per_ray(report.tree_stats.num_volume_tests)
    );
    info!(
        "  - Triangle tests per ray: {:.2}",
        per_ray(report.tree_stats.num_triangle_tests)
    );

    if let Some(naive_stats) = report.naive_stats {
        info!(
            "  - Brute force triangle tests per ray: {:.2}",
            per_ray(naive_stats.num_triangle_tests)
        );
        info!("  - Mismatches: {}", report.num_mismatches);
    }
}

/// Runs the program.
///
/// # Arguments
/// * `options` - The program options.
fn run_program(options: Options) -> anyhow::Result<()> {
    let mut config = BenchConfig::read(File::open(&options.config)?).map_err(|err| {
        error!("Failed to read the configuration: {:?}", err);
        err
    })?;

    if let Some(num_rays) = options.num_rays {
        config.num_rays = num_rays;
    }

    let s = Stats::root();
    let t_ = Instant::now();
    let mesh = {
        let _t = s.get_child("loading").register_timing();

        let (mesh, num_read) = load_cad_files(&config.input).map_err(|err| {
            error!("Failed to load CAD data: {:?}", err);
            err
        })?;

        info!(
            "Loaded {} CAD files in {} ms",
            num_read,
            t_.elapsed().as_secs_f64() * 1e3f64
        );

        mesh
    };

    print_mesh_info(&mesh);

    let report = BenchExecutor::new(config, mesh).run(s.get_child("benchmark"))?;
    print_report(&report);

    if report.num_mismatches > 0 {
        anyhow::bail!(
            "{} rays differ from the brute force result",
            report.num_mismatches
        );
    }

    Ok(())
}

fn main() {
    let options = Options::parse();
    initialize_logging(options.log_level.into());
    options.dump_to_log();

    match run_program(options) {
        Ok(_) => {
            info!("Stat:");
            match Stats::root().lock() {
                Ok(stats) => info!("{}", stats),
                Err(_) => error!("Stats are unavailable"),
            }
            info!("Program completed successfully");
        }
        Err(err) => {
            error!("Program failed: {:?}", err);
            std::process::exit(1);
        }
    }
}
