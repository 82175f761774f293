//! CSV table loading with header-row auto-detection.
//!
//! Offline form exports often bury the real header row under title and
//! instruction rows. Detection scores the leading rows and picks the last
//! row that looks like a row of form field names.

use std::path::Path;

use csv::ReaderBuilder;

use kobo_model::{CellValue, Row, Table};

use crate::error::{IngestError, Result};

/// How many leading rows to probe for the header.
const HEADER_PROBE_ROWS: usize = 20;

fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    let mut parts = trimmed.split_whitespace();
    let mut normalized = String::new();
    if let Some(first) = parts.next() {
        normalized.push_str(first);
        for part in parts {
            normalized.push(' ');
            normalized.push_str(part);
        }
    }
    normalized
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

#[derive(Debug, Default, Clone, Copy)]
struct RowStats {
    total: usize,
    non_empty: usize,
    numeric: usize,
    identifier: usize,
    underscored: usize,
}

impl RowStats {
    fn non_empty_ratio(self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.non_empty as f64 / self.total as f64
        }
    }

    fn identifier_ratio(self) -> f64 {
        if self.non_empty == 0 {
            0.0
        } else {
            self.identifier as f64 / self.non_empty as f64
        }
    }

    fn underscored_ratio(self) -> f64 {
        if self.non_empty == 0 {
            0.0
        } else {
            self.underscored as f64 / self.non_empty as f64
        }
    }
}

fn row_stats(row: &[String]) -> RowStats {
    let mut stats = RowStats {
        total: row.len(),
        ..RowStats::default()
    };
    for cell in row {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            continue;
        }
        stats.non_empty += 1;
        if trimmed.parse::<f64>().is_ok() {
            stats.numeric += 1;
        }
        if is_identifier_like(trimmed) {
            stats.identifier += 1;
        }
        if trimmed.contains('_') && is_identifier_like(trimmed) {
            stats.underscored += 1;
        }
    }
    stats
}

/// Form field names look like identifiers: no spaces, alphanumeric with
/// underscores, starting with a letter or underscore.
fn is_identifier_like(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// A header row is well filled, carries no numeric cells, is made of
/// identifier-shaped names, and a meaningful share of those names contain
/// underscores. Title and instruction rows fail the fill test; data rows
/// fail the numeric or underscore tests.
fn is_header_row(stats: RowStats) -> bool {
    stats.non_empty_ratio() >= 0.6
        && stats.numeric == 0
        && stats.identifier_ratio() >= 0.8
        && stats.underscored_ratio() >= 0.3
}

/// Picks the header row index: the last header-shaped row before data
/// begins, defaulting to the first row when nothing qualifies.
///
/// Scanning stops at the first header-shaped row whose successor is not
/// header-shaped. Taking the last header-shaped row anywhere in the window
/// would let a stray identifier-only data row further down swallow every
/// row above it.
fn detect_header_row(rows: &[Vec<String>]) -> usize {
    let probe = rows.len().min(HEADER_PROBE_ROWS);
    for (idx, row) in rows.iter().enumerate().take(probe) {
        if !is_header_row(row_stats(row)) {
            continue;
        }
        let next_is_header = rows
            .get(idx + 1)
            .is_some_and(|next| is_header_row(row_stats(next)));
        if !next_is_header {
            return idx;
        }
    }
    0
}

/// Reads a CSV file into a [`Table`] named after the file stem.
///
/// Rows that are entirely blank are skipped; cells are trimmed and
/// BOM-stripped; the header row is auto-detected.
pub fn read_csv_table(path: &Path) -> Result<Table> {
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("table")
        .to_string();
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|source| IngestError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| IngestError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let row: Vec<String> = record.iter().map(normalize_cell).collect();
        if row.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        raw_rows.push(row);
    }
    if raw_rows.is_empty() {
        return Ok(Table::new(name, Vec::new()));
    }
    let header_index = detect_header_row(&raw_rows);
    if header_index > 0 {
        tracing::debug!(
            table = %name,
            skipped = header_index,
            "header row detected below leading rows"
        );
    }
    let headers: Vec<String> = raw_rows[header_index]
        .iter()
        .map(|value| normalize_header(value))
        .collect();
    let mut table = Table::new(name, headers.clone());
    for record in raw_rows.iter().skip(header_index + 1) {
        let mut row = Row::default();
        for (idx, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = record.get(idx).map(String::as_str).unwrap_or("");
            row.cells
                .insert(header.clone(), CellValue::from_raw(value));
        }
        table.push_row(row);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(lines: &[&[&str]]) -> Vec<Vec<String>> {
        lines
            .iter()
            .map(|line| line.iter().map(|cell| (*cell).to_string()).collect())
            .collect()
    }

    #[test]
    fn header_detection_skips_title_rows() {
        let data = rows(&[
            &["Organization 5W Form", "", "", ""],
            &["Please fill one row per activity", "", "", ""],
            &["sector", "activity_type", "activity_title", "same_as_lead"],
            &["Health", "Distribution", "Water trucking", "yes"],
        ]);
        assert_eq!(detect_header_row(&data), 2);
    }

    #[test]
    fn header_detection_plain_export() {
        let data = rows(&[
            &["sector", "activity_type"],
            &["Health", "Distribution"],
        ]);
        assert_eq!(detect_header_row(&data), 0);
    }

    #[test]
    fn data_rows_with_numbers_are_not_headers() {
        let data = rows(&[
            &["parish", "idp_people_targeted"],
            &["JM04", "120"],
            &["JM02", "45"],
        ]);
        assert_eq!(detect_header_row(&data), 0);
    }

    #[test]
    fn identifier_shaped_data_row_does_not_displace_the_header() {
        // Row 2 happens to be all identifier-shaped codes; the header is
        // still the first header-shaped row followed by data.
        let data = rows(&[
            &["parish_code", "activity_type"],
            &["JM04", "120"],
            &["JM02_alt", "water_trucking"],
            &["JM05", "7"],
        ]);
        assert_eq!(detect_header_row(&data), 0);
    }

    #[test]
    fn consecutive_header_like_rows_prefer_the_last_before_data() {
        let data = rows(&[
            &["lead_org", "focal_point"],
            &["sector", "activity_type"],
            &["Health", "Distribution"],
        ]);
        assert_eq!(detect_header_row(&data), 1);
    }

    #[test]
    fn identifier_like_cells() {
        assert!(is_identifier_like("_submission__uuid"));
        assert!(is_identifier_like("activity_type_2"));
        assert!(!is_identifier_like("Lead Organization"));
        assert!(!is_identifier_like("2024"));
    }
}
