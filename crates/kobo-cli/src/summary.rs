use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use kobo_convert::{FindingKind, ValidationSummary};

use crate::types::ConvertResult;

pub fn print_summary(result: &ConvertResult) {
    if result.dry_run {
        println!("Dry run: no files written");
    } else {
        println!("Output: {}", result.output_dir.display());
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Record"),
        header_cell("Instance ID"),
        header_cell("Repeats"),
        header_cell("File"),
    ]);
    apply_document_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for document in &result.documents {
        let file_cell = match &document.path {
            Some(path) => Cell::new(path.display().to_string()),
            None => dim_cell("-"),
        };
        table.add_row(vec![
            Cell::new(&document.record_key)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(&document.instance_id),
            Cell::new(document.repeat_instances),
            file_cell,
        ]);
    }
    println!("{table}");

    print_run_counts(result);
    print_findings(&result.findings);

    if !result.errors.is_empty() {
        eprintln!("Errors:");
        for error in &result.errors {
            eprintln!("- {error}");
        }
    }
}

fn print_run_counts(result: &ConvertResult) {
    println!(
        "Converted {} record(s), {} failed",
        result.documents.len(),
        result.failed_records.len()
    );
    if result.skipped_blank_keys > 0 {
        println!("Skipped {} main row(s) with a blank record key", result.skipped_blank_keys);
    }
    if result.orphan_rows > 0 {
        println!("Dropped {} orphaned child row(s)", result.orphan_rows);
    }
    if !result.ignored_child_tables.is_empty() {
        println!(
            "Ignored child table(s) with no mapping: {}",
            result.ignored_child_tables.join(", ")
        );
    }
}

/// The detailed findings listing: one row per distinct (field, kind, value).
fn print_findings(findings: &ValidationSummary) {
    if findings.is_empty() {
        return;
    }

    // Short shape first so the headline numbers are visible even when the
    // detailed table scrolls past.
    let warnings: Vec<String> = findings
        .warning_counts()
        .into_iter()
        .map(|(field, kind, count)| format!("{field} {}: {count}", kind_label(kind)))
        .collect();
    println!();
    println!("Warnings: {}", warnings.join(", "));

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Kind"),
        header_cell("Value"),
        header_cell("Count"),
        header_cell("Example record"),
    ]);
    apply_findings_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    for group in &findings.groups {
        for entry in &group.entries {
            table.add_row(vec![
                Cell::new(&group.field)
                    .fg(Color::Blue)
                    .add_attribute(Attribute::Bold),
                kind_cell(group.kind),
                match &entry.value {
                    Some(value) => Cell::new(value),
                    None => dim_cell("(blank)"),
                },
                Cell::new(entry.count)
                    .fg(Color::Yellow)
                    .add_attribute(Attribute::Bold),
                Cell::new(&entry.example_key),
            ]);
        }
    }
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_document_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
}

fn apply_findings_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn kind_label(kind: FindingKind) -> &'static str {
    match kind {
        FindingKind::Blank => "blank",
        FindingKind::Unmatched => "unmatched",
    }
}

fn kind_cell(kind: FindingKind) -> Cell {
    match kind {
        FindingKind::Blank => Cell::new("BLANK").fg(Color::Yellow),
        FindingKind::Unmatched => Cell::new("UNMATCHED").fg(Color::Red),
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
