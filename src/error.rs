// ABOUTME: Application-wide error types for imagedash.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::images::ImageError;
use crate::registry::RegistryError;
use crate::runtime::RuntimeError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{failed} of {total} image operation(s) failed")]
    PartialFailure { failed: usize, total: usize },

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
