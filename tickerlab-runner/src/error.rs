use thiserror::Error;

use tickerlab_core::{ConfigError, StoreError};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
    #[error("dataframe error: {0}")]
    Frame(String),
}
