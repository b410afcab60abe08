use serde::Deserialize;
use std::fs;
use tracing::warn;

use crate::constants;

/// Runtime configuration, read from `config.toml` when present.
///
/// Every field has a default so the pipeline runs without any config file,
/// the same way the original dashboard ran on hard-coded constants.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// URL of the open-data CSV with material received at the ecocentros.
    pub data_url: String,
    /// Timeout for the remote fetch, in seconds.
    pub timeout_seconds: u64,
    /// How long a fetched payload stays valid in the cache, in seconds.
    pub cache_ttl_seconds: i64,
    /// How many materials the top-N view keeps.
    pub top_n: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_url: constants::DATA_URL.to_string(),
            timeout_seconds: 30,
            cache_ttl_seconds: 3600,
            top_n: 10,
        }
    }
}

impl Config {
    pub fn load_or_default() -> Self {
        let config_path = "config.toml";
        match fs::read_to_string(config_path) {
            Ok(raw) => match toml::from_str(&raw) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Ignoring malformed '{}': {}", config_path, e);
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }
}
