use std::collections::BTreeMap;

use crate::RecordKey;
use crate::error::{ModelError, Result};

/// A single scalar cell. Blank or absent cells are `Missing`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum CellValue {
    Text(String),
    Missing,
}

impl CellValue {
    /// Normalizes a raw cell: trims whitespace, maps empty to `Missing`.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            CellValue::Missing
        } else {
            CellValue::Text(trimmed.to_string())
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(value) => Some(value),
            CellValue::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Row {
    pub cells: BTreeMap<String, CellValue>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    /// Non-blank text for a column, if present.
    pub fn text(&self, column: &str) -> Option<&str> {
        self.cells.get(column).and_then(CellValue::as_text)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }
}

/// An ordered table of rows. Row order is significant: for child tables it
/// determines repeat-instance order in the output document.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// The immutable input to a conversion run: one main table plus any child
/// tables, all linked by the record key column.
#[derive(Debug, Clone)]
pub struct RecordSet {
    pub main: Table,
    pub children: Vec<Table>,
    key_column: String,
}

impl RecordSet {
    /// Builds a record set, verifying the key column exists in the main
    /// table. Child tables without the key column are kept; the converter
    /// treats them as reference sheets and skips them.
    pub fn new(main: Table, children: Vec<Table>, key_column: impl Into<String>) -> Result<Self> {
        let key_column = key_column.into();
        if !main.has_column(&key_column) {
            return Err(ModelError::MissingKeyColumn {
                table: main.name.clone(),
                column: key_column,
            });
        }
        Ok(Self {
            main,
            children,
            key_column,
        })
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// Record keys of the main table, in row order, skipping blank keys.
    pub fn record_keys(&self) -> Vec<RecordKey> {
        self.main
            .rows
            .iter()
            .filter_map(|row| row.text(&self.key_column))
            .filter_map(|value| RecordKey::new(value).ok())
            .collect()
    }

    /// The first main-table row carrying the given key.
    pub fn main_row(&self, key: &RecordKey) -> Option<&Row> {
        self.main
            .rows
            .iter()
            .find(|row| row.text(&self.key_column) == Some(key.as_str()))
    }

    /// All rows of a child table belonging to the given record, in the
    /// child table's original row order.
    pub fn child_rows<'a>(&self, table: &'a Table, key: &RecordKey) -> Vec<&'a Row> {
        table
            .rows
            .iter()
            .filter(|row| row.text(&self.key_column) == Some(key.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        Row {
            cells: pairs
                .iter()
                .map(|(name, value)| ((*name).to_string(), CellValue::from_raw(value)))
                .collect(),
        }
    }

    #[test]
    fn cell_normalization() {
        assert_eq!(CellValue::from_raw("  x "), CellValue::Text("x".into()));
        assert!(CellValue::from_raw("   ").is_missing());
    }

    #[test]
    fn missing_key_column_is_structural_error() {
        let main = Table::new("data", vec!["sector".into()]);
        assert!(RecordSet::new(main, Vec::new(), "_submission__uuid").is_err());
    }

    #[test]
    fn child_rows_preserve_table_order() {
        let main = {
            let mut t = Table::new("data", vec!["_submission__uuid".into()]);
            t.push_row(row(&[("_submission__uuid", "U1")]));
            t
        };
        let mut child = Table::new(
            "FOCAL_POINTS",
            vec!["email".into(), "_submission__uuid".into()],
        );
        child.push_row(row(&[("email", "a@x.com"), ("_submission__uuid", "U1")]));
        child.push_row(row(&[("email", "b@x.com"), ("_submission__uuid", "U2")]));
        child.push_row(row(&[("email", "c@x.com"), ("_submission__uuid", "U1")]));
        let set = RecordSet::new(main, vec![child], "_submission__uuid").unwrap();
        let key = RecordKey::new("U1").unwrap();
        let rows = set.child_rows(&set.children[0], &key);
        let emails: Vec<_> = rows.iter().filter_map(|r| r.text("email")).collect();
        assert_eq!(emails, vec!["a@x.com", "c@x.com"]);
    }
}
