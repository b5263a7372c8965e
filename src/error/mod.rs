use std::io;

use crate::config::ConfigError;
use crate::state::StateError;
use crate::storage::StorageError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("failed to build HTTP client")]
    HttpClient(#[from] reqwest::Error),
    #[error("could not determine the launcher install directory")]
    InstallDir(#[source] io::Error),
}
