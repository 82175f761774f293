use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("record key must not be blank")]
    EmptyRecordKey,
    #[error("field path {path:?} is malformed: empty segment")]
    InvalidPath { path: String },
    #[error("main table {table:?} is missing the record key column {column:?}")]
    MissingKeyColumn { table: String, column: String },
    #[error("mapping file is malformed: {0}")]
    Mapping(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
