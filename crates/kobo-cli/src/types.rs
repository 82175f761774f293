use std::path::PathBuf;

use kobo_convert::ValidationSummary;

#[derive(Debug)]
pub struct ConvertResult {
    pub output_dir: PathBuf,
    pub documents: Vec<DocumentSummary>,
    /// Record keys that failed to convert; the run continues past them.
    pub failed_records: Vec<String>,
    /// Main rows skipped for a blank or missing record key.
    pub skipped_blank_keys: usize,
    /// Child rows whose key matched no main record.
    pub orphan_rows: usize,
    /// Child tables present in the input but absent from the mapping.
    pub ignored_child_tables: Vec<String>,
    pub findings: ValidationSummary,
    pub errors: Vec<String>,
    pub dry_run: bool,
}

#[derive(Debug)]
pub struct DocumentSummary {
    pub record_key: String,
    pub instance_id: String,
    /// Repeat instances emitted for this record, across all repeat groups.
    pub repeat_instances: usize,
    /// `None` on dry runs.
    pub path: Option<PathBuf>,
}
