use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Not a cache file (missing header)")]
    InvalidHeader,

    #[error("Cache version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Config error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("Could not determine the user cache directory")]
    MissingCacheDir,

    #[error("Path is not valid UTF-8: {path}")]
    NonUtf8Path { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, CacheError>;
