use std::{fs, path::Path, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_SYSFS_GPIO_PATH: &str = "/sys/class/gpio";

/// Retry policy for the first direction write after an export, while udev may
/// still be adjusting permissions on the freshly created pin directory.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct SettleConfig {
    pub attempts: u32,
    pub delay_ms: u64,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay_ms: 20,
        }
    }
}

impl SettleConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GpioConfig {
    pub base_path: PathBuf,
    pub settle: SettleConfig,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from(DEFAULT_SYSFS_GPIO_PATH),
            settle: SettleConfig::default(),
        }
    }
}

impl GpioConfig {
    pub fn with_base_path<P: Into<PathBuf>>(base_path: P) -> Self {
        Self {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(&path)
            .map_err(|e| ConfigError::Read(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let config: GpioConfig = serde_json::from_str(contents)
            .map_err(|e| ConfigError::Invalid(format!("Invalid config json: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.settle.attempts == 0 {
            return Err(ConfigError::Invalid(
                "settle.attempts must be at least 1".into(),
            ));
        }
        if self.base_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("base_path must not be empty".into()));
        }
        Ok(())
    }

    pub fn export_path(&self) -> PathBuf {
        self.base_path.join("export")
    }

    pub fn unexport_path(&self) -> PathBuf {
        self.base_path.join("unexport")
    }

    pub fn pin_path(&self, pin: u8) -> PathBuf {
        self.base_path.join(format!("gpio{pin}"))
    }
}
