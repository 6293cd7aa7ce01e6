//! Runner configuration: indicator settings plus batch execution settings.

use serde::{Deserialize, Serialize};
use std::path::Path;

use tickerlab_core::{ConfigError, IndicatorConfig};

/// Complete runner configuration, loadable from TOML.
///
/// ```toml
/// threads = 4
///
/// [indicators]
/// sma_windows = [10, 15, 20, 50]
/// rsi_period = 14
///
/// [indicators.macd]
/// signal_seed = "mean"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub indicators: IndicatorConfig,

    /// Worker threads of the batch pool. `None` lets rayon pick.
    pub threads: Option<usize>,
}

impl RunnerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == Some(0) {
            return Err(ConfigError::Invalid("threads must be >= 1 when set".into()));
        }
        self.indicators.validate()
    }
}
