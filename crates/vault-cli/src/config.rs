//! # CLI Configuration
//!
//! Optional YAML file with the vault's defaults. Precedence: command-line
//! flags, then the file, then built-in defaults.
//!
//! ```yaml
//! data_dir: ~/.vault
//! issuer: Example Registry
//! qr:
//!   error_correction: Q
//!   max_version: 25
//!   module_px: 6
//! camera:
//!   frame_interval_ms: 33
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use vault_state::DEFAULT_FRAME_INTERVAL;
use vault_transfer::QrSettings;
use vault_vc::DEFAULT_ISSUER;

/// Default data directory, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = ".vault";

/// Camera acquisition settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    /// Delay between frames.
    pub frame_interval_ms: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: DEFAULT_FRAME_INTERVAL.as_millis() as u64,
        }
    }
}

impl CameraConfig {
    /// The frame interval as a duration.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

/// Resolved CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VaultConfig {
    /// Directory holding the vault's JSON collections.
    pub data_dir: PathBuf,
    /// Issuer display name stamped on ingested credentials.
    pub issuer: String,
    /// QR rendering settings.
    pub qr: QrSettings,
    /// Camera settings.
    pub camera: CameraConfig,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            issuer: DEFAULT_ISSUER.to_string(),
            qr: QrSettings::default(),
            camera: CameraConfig::default(),
        }
    }
}

impl VaultConfig {
    /// Load from `path`, or the defaults if no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            None => Self::default(),
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config: {}", path.display()))?;
                Self::from_yaml(&content)
                    .with_context(|| format!("invalid config: {}", path.display()))?
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML. An empty document yields the defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply command-line overrides.
    pub fn with_data_dir(mut self, data_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        self
    }

    fn validate(&self) -> Result<()> {
        if !(1..=40).contains(&self.qr.max_version) {
            bail!("qr.max_version must be between 1 and 40, got {}", self.qr.max_version);
        }
        if self.qr.module_px == 0 {
            bail!("qr.module_px must be at least 1");
        }
        if self.camera.frame_interval_ms == 0 {
            bail!("camera.frame_interval_ms must be at least 1");
        }
        if self.issuer.trim().is_empty() {
            bail!("issuer must not be blank");
        }
        Ok(())
    }
}
