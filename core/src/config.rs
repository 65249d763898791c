use std::path::Path;

use crate::errors::{GraphError, Result};

const DEFAULT_PARALLEL_THRESHOLD: usize = 1024;

/// Settings for the worker pool that executes bulk operations of the
/// materialized representations.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Bulk inputs with fewer entries than this are folded sequentially on the
    /// calling thread.
    pub parallel_threshold: usize,
    /// Size of a dedicated worker pool. If `None`, the global rayon pool is
    /// used.
    pub worker_threads: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            worker_threads: None,
        }
    }
}

impl Config {
    /// Read the configuration from a TOML file.
    ///
    /// Missing fields take their default value.
    pub fn load_from(location: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(location)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker_threads == Some(0) {
            return Err(GraphError::InvalidConfiguration(
                "the number of worker threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
