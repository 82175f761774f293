use std::path::PathBuf;

use thiserror::Error;

use kobo_model::ModelError;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse csv {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("no main table {expected:?} found in {dir}")]
    MainTableMissing { dir: PathBuf, expected: String },
    #[error("invalid mapping file {path}: {source}")]
    Mapping { path: PathBuf, source: ModelError },
    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, IngestError>;
