//! Ingestion settings.
//!
//! Settings are plain values threaded into [crate::pipelines::Upload] at construction.
//! They can be loaded from a JSON file, where every missing key falls back to its default.
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Default block size: 10 MiB.
pub const MAXIMUM_BLOCK_SIZE: usize = 1024 * 1024 * 10;
/// Default metadata cardinality cap.
pub const MAX_METADATA_OPTIONS: usize = 100;
/// Default document set name prefix.
pub const DATABASE_PREFIX: &str = "GRETEL5";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Byte threshold above which a block is flushed.
    pub max_block_size: usize,
    /// Distinct values kept per metadata field.
    /// Checkbox fields going past this are dropped from the facets.
    pub max_metadata_options: usize,
    /// Delete the input artifact on cleanup.
    pub delete_input_files: bool,
    /// Prefix of document set names.
    pub database_prefix: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_block_size: MAXIMUM_BLOCK_SIZE,
            max_metadata_options: MAX_METADATA_OPTIONS,
            delete_input_files: false,
            database_prefix: DATABASE_PREFIX.to_string(),
        }
    }
}

impl IngestConfig {
    /// Load settings from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let f = File::open(path)?;
        let config = serde_json::from_reader(BufReader::new(f))?;
        Ok(config)
    }
}
