use anyhow::{Context, Result};
use comfy_table::{Cell, Color, Table};

use kobo_ingest::load_mapping;
use kobo_output::DocumentOptions;

use kobo_cli::pipeline::{ConvertConfig, run_convert, write_findings_report};
use kobo_cli::summary::apply_table_style;
use kobo_cli::types::ConvertResult;

use crate::cli::{ConvertArgs, InspectArgs};

pub fn run_convert_command(args: &ConvertArgs) -> Result<ConvertResult> {
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| args.data_dir.join("output"));
    let config = ConvertConfig {
        data_dir: args.data_dir.clone(),
        mapping_path: args.mapping.clone(),
        output_dir,
        document: DocumentOptions {
            form_id: args.form_id.clone(),
            version_id: args.version_id.clone(),
            form_version: args.form_version.clone(),
            formhub_uuid: args.formhub_uuid.clone(),
        },
        only_key: args.uuid.clone(),
        validated_fields: args.validated_fields.clone(),
        dry_run: args.dry_run,
    };
    let result = run_convert(&config)?;
    if let Some(path) = &args.findings_report {
        write_findings_report(path, &result).context("write findings report")?;
    }
    Ok(result)
}

pub fn run_inspect(args: &InspectArgs) -> Result<()> {
    let mapping = load_mapping(&args.mapping)?;

    let mut fields = Table::new();
    fields.set_header(vec!["Field", "Path", "Role", "Choices"]);
    apply_table_style(&mut fields);
    for (name, path) in mapping.fields() {
        let role = if mapping.is_group_only(name) {
            Cell::new("group").fg(Color::DarkGrey)
        } else if path.is_empty() {
            Cell::new("dropped").fg(Color::Yellow)
        } else {
            Cell::new("field")
        };
        let choices = match mapping.choices_for(name) {
            Some(table) => Cell::new(table.len()),
            None => Cell::new("-").fg(Color::DarkGrey),
        };
        fields.add_row(vec![
            Cell::new(name),
            Cell::new(path.to_string()),
            role,
            choices,
        ]);
    }
    println!("Fields: {}", mapping.field_count());
    println!("{fields}");

    let orphaned: Vec<&str> = mapping
        .choice_fields()
        .filter(|(name, _)| mapping.path_of(name).is_none())
        .map(|(name, _)| name)
        .collect();
    if !orphaned.is_empty() {
        println!("Choice tables without a mapped field: {}", orphaned.join(", "));
    }
    Ok(())
}
