use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{CPR_PAIR_WINDOW_SECS, RESERVED_SQUAWKS, SQUAWK_CHANGE_WINDOW_SECS};
use crate::error::{LogError, Result};
use crate::interval::{default_profiles, IntervalProfile};

/// Run tunables. Every field may be left out of the TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum seconds between the two CPR halves of a position.
    pub cpr_pair_window: f64,
    /// Seconds a squawk change keeps status messages in the mode-change series.
    pub squawk_change_window: f64,
    /// Codes that never open a squawk change episode.
    pub reserved_squawks: Vec<String>,
    /// Drop extended squitters with a bad parity.
    pub verify_crc: bool,
    pub intervals: Vec<IntervalProfile>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cpr_pair_window: CPR_PAIR_WINDOW_SECS,
            squawk_change_window: SQUAWK_CHANGE_WINDOW_SECS,
            reserved_squawks: RESERVED_SQUAWKS.iter().map(|s| s.to_string()).collect(),
            verify_crc: true,
            intervals: default_profiles(),
        }
    }
}

impl Config {
    /// Read a TOML file. A missing file is an error, use `Config::default()` to run without one.
    #[tracing::instrument]
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(LogError::MissingFile(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        debug!("config loaded: {:?}", config);
        Ok(config)
    }
}
