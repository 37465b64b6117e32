//! Application configuration
//!
//! Settings are read from `<config dir>/bitrate-analyzer/config.json`:
//! - ffprobe binary override
//! - probe timeout
//! - default directory for exported reports
//!
//! A missing file means defaults; command-line flags override whatever is loaded.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AnalysisError;

/// Default time allowed for a single ffprobe query (5 minutes)
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 300;

/// File name used when exporting without an explicit path
pub const DEFAULT_EXPORT_FILE_NAME: &str = "bitrate_analysis.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Explicit ffprobe binary; discovered from search paths when unset
    pub ffprobe_path: Option<PathBuf>,
    /// Maximum seconds a single ffprobe query may run
    pub probe_timeout_secs: u64,
    /// Directory for exported reports; home directory when unset
    pub export_dir: Option<PathBuf>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            ffprobe_path: None,
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            export_dir: None,
        }
    }
}

impl AnalyzerConfig {
    /// Location of the user config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("bitrate-analyzer").join("config.json"))
    }

    /// Load the user config file, or defaults if there isn't one
    pub fn load() -> Result<Self, AnalysisError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory on this platform, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, AnalysisError> {
        if !path.exists() {
            debug!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            AnalysisError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: AnalyzerConfig = serde_json::from_str(&contents).map_err(|e| {
            AnalysisError::Config(format!("invalid config {}: {}", path.display(), e))
        })?;
        config.validate()?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.probe_timeout_secs == 0 {
            return Err(AnalysisError::Config(
                "probe_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Default file an export is written to
    pub fn default_export_path(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_EXPORT_FILE_NAME)
    }
}
