//! The conversion pipeline: load, convert record by record, write, report.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use tracing::{info, info_span, warn};

use kobo_convert::{
    HierarchyBuilder, MetadataRules, ValidationPolicy, ValidationReporter,
};
use kobo_ingest::{load_mapping, load_record_set};
use kobo_model::RecordKey;
use kobo_output::{DocumentOptions, SubmissionDocument, UUID_PREFIX, write_document};

use crate::types::{ConvertResult, DocumentSummary};

pub struct ConvertConfig {
    pub data_dir: PathBuf,
    pub mapping_path: PathBuf,
    pub output_dir: PathBuf,
    pub document: DocumentOptions,
    /// Convert only this record key when set.
    pub only_key: Option<String>,
    /// Validated-field overrides; empty means the default policy.
    pub validated_fields: Vec<String>,
    pub dry_run: bool,
}

pub fn run_convert(config: &ConvertConfig) -> Result<ConvertResult> {
    let span = info_span!("convert", data_dir = %config.data_dir.display());
    let _guard = span.enter();
    let start = Instant::now();

    let mapping = load_mapping(&config.mapping_path)?;
    let rules = MetadataRules::default();
    let records = load_record_set(&config.data_dir, rules.record_key())?;
    let policy = if config.validated_fields.is_empty() {
        ValidationPolicy::default()
    } else {
        ValidationPolicy::new(config.validated_fields.iter().cloned())
    };
    let builder = HierarchyBuilder::new(&records, &mapping, &rules, &policy);
    let mut reporter = ValidationReporter::new();

    let all_keys = records.record_keys();
    let skipped_blank_keys = records.main.rows.len() - all_keys.len();
    if skipped_blank_keys > 0 {
        warn!(count = skipped_blank_keys, "main rows skipped for blank record key");
    }
    let keys = match &config.only_key {
        Some(only) => {
            let key = RecordKey::new(only).map_err(|_| anyhow!("invalid record key {only:?}"))?;
            if !all_keys.contains(&key) {
                return Err(anyhow!("no record found with key {only:?}"));
            }
            vec![key]
        }
        None => all_keys,
    };

    let ignored_child_tables = builder.ignored_child_tables();
    for table in &ignored_child_tables {
        warn!(table = %table, "child table not referenced by the mapping; dropped");
    }
    let orphan_rows = builder.orphan_row_count();
    if orphan_rows > 0 {
        warn!(count = orphan_rows, "orphaned child rows dropped");
    }

    let repeat_tables: Vec<_> = builder
        .repeat_groups()
        .into_iter()
        .map(|group| group.table)
        .collect();

    let mut documents = Vec::new();
    let mut failed_records = Vec::new();
    let mut errors = Vec::new();
    for key in &keys {
        match convert_record(config, &builder, &records, &rules, &repeat_tables, key, &mut reporter) {
            Ok(summary) => documents.push(summary),
            Err(error) => {
                // One bad record never aborts the batch.
                warn!(record_key = %key, error = %error, "record conversion failed");
                errors.push(format!("{key}: {error:#}"));
                failed_records.push(key.as_str().to_string());
            }
        }
    }

    info!(
        records = documents.len(),
        failed = failed_records.len(),
        duration_ms = start.elapsed().as_millis(),
        "conversion complete"
    );

    Ok(ConvertResult {
        output_dir: config.output_dir.clone(),
        documents,
        failed_records,
        skipped_blank_keys,
        orphan_rows,
        ignored_child_tables,
        findings: reporter.summarize(),
        errors,
        dry_run: config.dry_run,
    })
}

fn convert_record(
    config: &ConvertConfig,
    builder: &HierarchyBuilder<'_>,
    records: &kobo_model::RecordSet,
    rules: &MetadataRules,
    repeat_tables: &[&kobo_model::Table],
    key: &RecordKey,
    reporter: &mut ValidationReporter,
) -> Result<DocumentSummary> {
    let tree = builder
        .build_record(key, reporter)
        .ok_or_else(|| anyhow!("record key not found in main table"))?;
    let repeat_instances = repeat_tables
        .iter()
        .map(|table| records.child_rows(table, key).len())
        .sum();
    let update_linkage = records
        .main_row(key)
        .and_then(|row| row.text(rules.update_linkage()));
    let document = SubmissionDocument::assemble(&config.document, tree, update_linkage);
    let instance_id = document.instance_id().to_string();

    let path = if config.dry_run {
        None
    } else {
        let file_name = format!("{}.xml", instance_id.trim_start_matches(UUID_PREFIX));
        let path = config.output_dir.join(file_name);
        write_document(&path, &document)
            .with_context(|| format!("write document for {key}"))?;
        Some(path)
    };

    Ok(DocumentSummary {
        record_key: key.as_str().to_string(),
        instance_id,
        repeat_instances,
        path,
    })
}

/// Serialize the findings summary as pretty JSON for machine consumption.
pub fn write_findings_report(path: &Path, result: &ConvertResult) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("create {}", path.display()))?;
    serde_json::to_writer_pretty(file, &result.findings)
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
