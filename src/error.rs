use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LogError>;

/// Failures that end a run. Per-record problems never show up here.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("file {0} not found")]
    MissingFile(PathBuf),

    #[error("IO error {0}")]
    Io(#[from] std::io::Error),

    #[error("bad configuration {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid aircraft address {0}, expecting 6 hex digits")]
    BadAddress(String),

    #[error("export failed {0}")]
    Export(#[from] serde_json::Error),
}
