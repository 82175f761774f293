//! Discovery of a record set from a directory of CSV files.
//!
//! The main table lives in `data.csv`; every other CSV file is treated as a
//! child table named after its file stem (the repeat group name).

use std::path::{Path, PathBuf};

use kobo_model::{RecordSet, Table};

use crate::csv_table::read_csv_table;
use crate::error::{IngestError, Result};

/// File stem of the main table.
pub const MAIN_TABLE_NAME: &str = "data";

/// Lists all CSV files in a directory, sorted by filename.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }
    let entries = std::fs::read_dir(dir).map_err(|source| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|source| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if is_csv {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Loads a [`RecordSet`] from a directory: `data.csv` as the main table,
/// every other CSV as a child table.
///
/// Child tables lacking the key column are kept in the set; the converter
/// treats them as reference sheets and skips them. A missing main table or
/// a main table without the key column is a structural error.
pub fn load_record_set(dir: &Path, key_column: &str) -> Result<RecordSet> {
    let files = list_csv_files(dir)?;
    let mut main: Option<Table> = None;
    let mut children = Vec::new();
    for path in &files {
        let table = read_csv_table(path)?;
        if table.name.eq_ignore_ascii_case(MAIN_TABLE_NAME) {
            main = Some(table);
        } else {
            children.push(table);
        }
    }
    let main = main.ok_or_else(|| IngestError::MainTableMissing {
        dir: dir.to_path_buf(),
        expected: format!("{MAIN_TABLE_NAME}.csv"),
    })?;
    tracing::info!(
        rows = main.rows.len(),
        children = children.len(),
        "loaded record set from {}",
        dir.display()
    );
    Ok(RecordSet::new(main, children, key_column)?)
}
