use std::collections::{BTreeMap, BTreeSet};

/// A per-field translation table from display labels to canonical codes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChoiceTable {
    by_label: BTreeMap<String, String>,
    by_label_folded: BTreeMap<String, String>,
    codes: BTreeSet<String>,
}

impl ChoiceTable {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        let by_label_folded = entries
            .iter()
            .map(|(label, code)| (label.trim().to_lowercase(), code.clone()))
            .collect();
        let codes = entries.values().cloned().collect();
        Self {
            by_label: entries,
            by_label_folded,
            codes,
        }
    }

    /// Exact label lookup, then case-insensitive.
    pub fn code_for(&self, label: &str) -> Option<&str> {
        let trimmed = label.trim();
        if let Some(code) = self.by_label.get(trimmed) {
            return Some(code);
        }
        self.by_label_folded
            .get(&trimmed.to_lowercase())
            .map(String::as_str)
    }

    /// True if the value already appears as a canonical code in this table.
    pub fn is_code(&self, value: &str) -> bool {
        self.codes.contains(value.trim())
    }

    pub fn len(&self) -> usize {
        self.by_label.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_label.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ChoiceTable {
        ChoiceTable::new(BTreeMap::from([
            ("Health".to_string(), "HEALTH".to_string()),
            ("Saint Andrew".to_string(), "JM02".to_string()),
        ]))
    }

    #[test]
    fn exact_then_case_insensitive() {
        let t = table();
        assert_eq!(t.code_for("Health"), Some("HEALTH"));
        assert_eq!(t.code_for("  health "), Some("HEALTH"));
        assert_eq!(t.code_for("saint andrew"), Some("JM02"));
        assert_eq!(t.code_for("Unknownville"), None);
    }

    #[test]
    fn recognizes_existing_codes() {
        let t = table();
        assert!(t.is_code("JM02"));
        assert!(!t.is_code("Saint Andrew"));
    }
}
