mod config;
mod error;
mod executor;
pub mod math;
mod mesh;
pub mod raycaster;
pub mod spatial;
mod stats;

#[cfg(test)]
mod test_utils;

pub use config::*;
pub use error::*;
pub use executor::*;
pub use mesh::*;
pub use spatial::{BoundingBoxMode, Hit, KDTree, KDTreeNode, KDTreeOptions};
pub use stats::*;

/// A general progress callback function to give updates on the progress.
///
/// # Arguments
/// * `current_stage` - The current stage of the progress starting at 0.
/// * `total_stages` - The total number of stages.
/// * `progress` - The progress of the current stage in percent.
/// * `msg` - The message to display.
pub type ProgressCallback = fn(current_stage: usize, total_stages: usize, progress: f32, msg: &str);
