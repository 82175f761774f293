use std::fs;
use std::path::Path;

use kobo_cli::pipeline::{ConvertConfig, run_convert, write_findings_report};
use kobo_output::DocumentOptions;

fn write_fixture(dir: &Path) {
    fs::write(
        dir.join("data.csv"),
        "_submission__uuid,sector,deprecatedID,_status\n\
         U1,Health,prior-0a1b,submitted_via_web\n\
         U2,Education,,submitted_via_web\n",
    )
    .unwrap();
    fs::write(
        dir.join("FIGURES_COMMUNITY.csv"),
        "_submission__uuid,community,households,_index\n\
         U1,Port Royal,12,1\n\
         U2,Unknownville,3,2\n\
         U1,Hope Bay,7,3\n",
    )
    .unwrap();
    fs::write(
        dir.join("mapping.json"),
        r#"{
            "fields": {
                "sector": "RESPONSES/sector",
                "FIGURES_COMMUNITY": "RESPONSES/FIGURES_COMMUNITY",
                "community": "RESPONSES/FIGURES_COMMUNITY/community",
                "households": "RESPONSES/FIGURES_COMMUNITY/households"
            },
            "choices": {
                "sector": { "Health": "HEALTH", "Education": "EDU" },
                "community": { "Port Royal": "JM0101", "Hope Bay": "JM0402" }
            }
        }"#,
    )
    .unwrap();
}

fn config(dir: &Path, dry_run: bool) -> ConvertConfig {
    ConvertConfig {
        data_dir: dir.to_path_buf(),
        mapping_path: dir.join("mapping.json"),
        output_dir: dir.join("output"),
        document: DocumentOptions {
            form_id: "aFormId123".into(),
            version_id: "vVersionId456".into(),
            form_version: Some("1 (2026-01-01 00:00:00)".into()),
            formhub_uuid: Some("9f81fa5ef9a9".into()),
        },
        only_key: None,
        validated_fields: Vec::new(),
        dry_run,
    }
}

#[test]
fn converts_all_records_and_writes_documents() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    let result = run_convert(&config(dir.path(), false)).unwrap();

    assert_eq!(result.documents.len(), 2);
    assert!(result.failed_records.is_empty());
    assert_eq!(result.documents[0].record_key, "U1");
    assert_eq!(result.documents[0].repeat_instances, 2);
    assert_eq!(result.documents[1].record_key, "U2");
    assert_eq!(result.documents[1].repeat_instances, 1);

    let first = result.documents[0].path.as_ref().unwrap();
    let xml = fs::read_to_string(first).unwrap();
    assert!(xml.starts_with("<aFormId123"));
    assert!(xml.contains("<sector>HEALTH</sector>"));
    assert!(xml.contains("<community>JM0101</community>"));
    assert!(xml.contains("<position>1</position>"));
    assert!(xml.contains("<position>2</position>"));
    assert!(xml.contains("<__version__>vVersionId456</__version__>"));
    assert!(xml.contains("<deprecatedID>uuid:prior-0a1b</deprecatedID>"));
    // Bookkeeping columns stay out of the content groups.
    assert!(!xml.contains("_status"));
    assert!(!xml.contains("_index"));

    let second = result.documents[1].path.as_ref().unwrap();
    let xml = fs::read_to_string(second).unwrap();
    assert!(!xml.contains("deprecatedID"));
    // Unmatched community value passes through.
    assert!(xml.contains("<community>Unknownville</community>"));
}

#[test]
fn unmatched_validated_value_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    let result = run_convert(&config(dir.path(), true)).unwrap();

    let group = result
        .findings
        .groups
        .iter()
        .find(|group| group.field == "community")
        .unwrap();
    assert_eq!(group.entries.len(), 1);
    assert_eq!(group.entries[0].value.as_deref(), Some("Unknownville"));
    assert_eq!(group.entries[0].count, 1);
    assert_eq!(group.entries[0].example_key, "U2");
}

#[test]
fn dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    let result = run_convert(&config(dir.path(), true)).unwrap();

    assert_eq!(result.documents.len(), 2);
    assert!(result.documents.iter().all(|doc| doc.path.is_none()));
    assert!(!dir.path().join("output").exists());
}

#[test]
fn single_record_selection() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    let mut config = config(dir.path(), true);
    config.only_key = Some("U2".into());
    let result = run_convert(&config).unwrap();
    assert_eq!(result.documents.len(), 1);
    assert_eq!(result.documents[0].record_key, "U2");
}

#[test]
fn unknown_record_key_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    let mut config = config(dir.path(), true);
    config.only_key = Some("nope".into());
    assert!(run_convert(&config).is_err());
}

#[test]
fn findings_report_serializes_the_summary() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    let result = run_convert(&config(dir.path(), true)).unwrap();
    let report_path = dir.path().join("findings.json");
    write_findings_report(&report_path, &result).unwrap();

    let text = fs::read_to_string(&report_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert!(value["groups"].is_array());
    assert!(text.contains("Unknownville"));
}

#[test]
fn failed_document_write_does_not_abort_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    // A regular file where the output directory should go makes every
    // write fail; output file names are freshly minted per record, so a
    // single record cannot be targeted ahead of time.
    fs::write(dir.path().join("output"), "not a directory").unwrap();

    let result = run_convert(&config(dir.path(), false)).unwrap();

    // Both records were attempted: the run carried on past the first
    // failure instead of aborting.
    assert!(result.documents.is_empty());
    assert_eq!(result.failed_records, vec!["U1".to_string(), "U2".to_string()]);
    assert_eq!(result.errors.len(), 2);
    assert!(result.errors[0].starts_with("U1:"));
    assert!(result.errors[1].starts_with("U2:"));

    // Findings gathered before the write step survive the failures.
    let unmatched = result
        .findings
        .groups
        .iter()
        .find(|group| group.field == "community")
        .unwrap();
    assert_eq!(unmatched.entries[0].value.as_deref(), Some("Unknownville"));
}

#[test]
fn missing_main_table_is_a_structural_error() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    fs::remove_file(dir.path().join("data.csv")).unwrap();

    assert!(run_convert(&config(dir.path(), true)).is_err());
}
