//! Mapping file loading.

use std::path::Path;

use kobo_model::PathMapping;

use crate::error::{IngestError, Result};

/// Loads and normalizes a JSON mapping file. Both on-disk shapes (flat
/// `field -> path` and rich `fields`/`choices`) are accepted.
pub fn load_mapping(path: &Path) -> Result<PathMapping> {
    let text = std::fs::read_to_string(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    PathMapping::from_json(&text).map_err(|source| IngestError::Mapping {
        path: path.to_path_buf(),
        source,
    })
}
