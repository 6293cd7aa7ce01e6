//! Indicator configuration.
//!
//! Every period the engine uses is a parameter here; nothing is hardcoded
//! per indicator. Defaults match the stock toolkit's reports: SMA 10/15/20/50,
//! RSI 14, MACD 12/26/9, TTM over 4 quarters, partitions keyed by symbol.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::PartitionBy;
use crate::indicators::SeedRule;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// MACD leg and signal periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdConfig {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
    /// Seed of the signal EMA. `mean` seeds with the mean of the first
    /// `signal` MACD values; `last` with the raw `signal`-th MACD value.
    pub signal_seed: SeedRule,
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
            signal_seed: SeedRule::Mean,
        }
    }
}

/// Full indicator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Window lengths of the SMA family. Each produces an `sma_{w}` column.
    pub sma_windows: Vec<usize>,
    pub rsi_period: usize,
    pub macd: MacdConfig,
    /// Number of quarterly reports summed into trailing EPS.
    pub ttm_quarters: usize,
    pub partition_by: PartitionBy,
    /// Restrict recurrences (RSI, EMA, MACD) to points dated strictly after
    /// `last_date - days` of each partition. `None` uses the full history.
    /// When set, those columns depend on the partition's last date, so
    /// appending a later point can change earlier values.
    pub recurrence_window_days: Option<u32>,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_windows: vec![10, 15, 20, 50],
            rsi_period: 14,
            macd: MacdConfig::default(),
            ttm_quarters: 4,
            partition_by: PartitionBy::Symbol,
            recurrence_window_days: None,
        }
    }
}

impl IndicatorConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string. Missing keys take defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(w) = self.sma_windows.iter().find(|w| **w == 0) {
            return Err(ConfigError::Invalid(format!("SMA window must be >= 1, got {w}")));
        }
        let mut seen = self.sma_windows.clone();
        seen.sort_unstable();
        seen.dedup();
        if seen.len() != self.sma_windows.len() {
            return Err(ConfigError::Invalid("duplicate SMA window".into()));
        }
        if self.rsi_period == 0 {
            return Err(ConfigError::Invalid("rsi_period must be >= 1".into()));
        }
        let m = &self.macd;
        if m.fast == 0 || m.slow == 0 || m.signal == 0 {
            return Err(ConfigError::Invalid("MACD periods must be >= 1".into()));
        }
        if m.fast >= m.slow {
            return Err(ConfigError::Invalid(format!(
                "MACD fast period ({}) must be shorter than slow period ({})",
                m.fast, m.slow
            )));
        }
        if self.ttm_quarters == 0 {
            return Err(ConfigError::Invalid("ttm_quarters must be >= 1".into()));
        }
        if self.recurrence_window_days == Some(0) {
            return Err(ConfigError::Invalid(
                "recurrence_window_days must be >= 1 when set".into(),
            ));
        }
        Ok(())
    }
}
