use log::error;
use serde::{Deserialize, Serialize};

use crate::{Error, KDTreeOptions, Result};

/// The configuration for a raycasting benchmark
#[derive(Debug, Deserialize, Serialize)]
pub struct BenchConfig {
    /// The input files for the benchmark.
    /// Can be expressions like `*.glb`
    pub input: Vec<String>,

    /// The options for building the k-d tree
    #[serde(default)]
    pub tree: KDTreeOptions,

    /// The number of random rays to cast
    pub num_rays: usize,

    /// The seed for generating the random rays
    #[serde(default)]
    pub seed: u64,

    /// Should every ray be compared against the brute force result
    #[serde(default)]
    pub verify: bool,

    /// Optionally, the file to which the built tree is written
    #[serde(default)]
    pub tree_output: Option<String>,
}

impl BenchConfig {
    /// Reads the configuration from the provided reader.
    ///
    /// # Arguments
    /// * `reader` - The reader to read the configuration from.
    pub fn read<R: std::io::Read>(reader: R) -> Result<Self> {
        let config: BenchConfig = serde_yaml::from_reader(reader).map_err(|e| {
            error!("Failed to parse the configuration: {:?}", e);

            Error::DeserializationError(Box::new(e))
        })?;

        Ok(config)
    }

    /// Writes the configuration to the provided writer.
    ///
    /// # Arguments
    /// * `writer` - The writer to write the configuration to.
    pub fn write<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        let yaml = serde_yaml::to_string(&self).map_err(|e| {
            error!("Failed to serialize the configuration: {:?}", e);

            Error::SerializationError(Box::new(e))
        })?;

        writer.write_all(yaml.as_bytes())?;

        Ok(())
    }
}
