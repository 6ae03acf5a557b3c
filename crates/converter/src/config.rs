use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use crate::codec::Codec;
use crate::error::ConvertError;

pub const DEFAULT_BITRATE_KBPS: u32 = 256;
pub const DEFAULT_MAX_PARALLEL: usize = 4;

/// Configuration for a conversion run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Output codec
    pub codec: Codec,
    /// Target bitrate in kbps (ignored for PCM)
    pub bitrate_kbps: u32,
    /// Root for converted files; None writes next to each source
    pub output_dir: Option<PathBuf>,
    /// Number of jobs run together in one window
    pub max_parallel: usize,
    /// Path to ffmpeg binary
    pub ffmpeg_bin: PathBuf,
    /// Kill a single conversion after this many seconds
    pub job_timeout_secs: Option<u64>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl ConvertConfig {
    /// Create a default configuration with sensible values
    pub fn default_config() -> Self {
        Self {
            codec: Codec::Mp3,
            bitrate_kbps: DEFAULT_BITRATE_KBPS,
            output_dir: None,
            max_parallel: DEFAULT_MAX_PARALLEL,
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            job_timeout_secs: None,
        }
    }

    /// Load configuration from a file, or return defaults if path is None or file doesn't exist
    pub fn load_config(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default_config();

        if let Some(config_path) = path {
            if config_path.exists() {
                let content = std::fs::read_to_string(config_path)
                    .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

                if config_path.extension().and_then(|s| s.to_str()) == Some("toml") {
                    config = toml::from_str(&content)
                        .with_context(|| format!("Failed to parse TOML config: {}", config_path.display()))?;
                } else {
                    config = serde_json::from_str(&content)
                        .with_context(|| format!("Failed to parse JSON config: {}", config_path.display()))?;
                }
            }
        }

        Ok(config)
    }

    /// Reject values no run can work with
    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.bitrate_kbps == 0 {
            return Err(ConvertError::Config("bitrate must be a positive number of kbps".to_string()));
        }
        if self.max_parallel == 0 {
            return Err(ConvertError::Config("max_parallel must be at least 1".to_string()));
        }
        if self.job_timeout_secs == Some(0) {
            return Err(ConvertError::Config("job timeout must be at least 1 second".to_string()));
        }
        Ok(())
    }

    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout_secs.map(Duration::from_secs)
    }

    /// The per-job options every job in the run shares
    pub fn options(&self) -> ConversionOptions {
        ConversionOptions {
            codec: self.codec,
            bitrate_kbps: self.bitrate_kbps,
            output_dir: self.output_dir.clone(),
        }
    }
}

/// Immutable per-run conversion settings, shared read-only by all jobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOptions {
    pub codec: Codec,
    pub bitrate_kbps: u32,
    pub output_dir: Option<PathBuf>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        ConvertConfig::default_config().options()
    }
}
