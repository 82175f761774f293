//! Accumulation and summarization of data-quality findings.

use std::collections::BTreeMap;

use kobo_model::RecordKey;

/// The two advisory finding kinds. Neither ever blocks conversion.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// A validated field was blank.
    Blank,
    /// A validated field carried a value with no choice-table match.
    Unmatched,
}

/// One observation made during resolution.
#[derive(Debug, Clone)]
pub struct Finding {
    pub kind: FindingKind,
    pub field: String,
    pub value: Option<String>,
    pub record_key: RecordKey,
}

impl Finding {
    pub fn blank(field: impl Into<String>, record_key: &RecordKey) -> Self {
        Self {
            kind: FindingKind::Blank,
            field: field.into(),
            value: None,
            record_key: record_key.clone(),
        }
    }

    pub fn unmatched(
        field: impl Into<String>,
        value: impl Into<String>,
        record_key: &RecordKey,
    ) -> Self {
        Self {
            kind: FindingKind::Unmatched,
            field: field.into(),
            value: Some(value.into()),
            record_key: record_key.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct Tally {
    count: usize,
    example_key: RecordKey,
}

/// Run-scoped accumulator. Findings are deduplicated by (field, kind,
/// value); each group keeps an occurrence count and the first record key
/// seen.
#[derive(Debug, Default)]
pub struct ValidationReporter {
    groups: BTreeMap<(String, FindingKind), BTreeMap<Option<String>, Tally>>,
}

impl ValidationReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, finding: Finding) {
        let group = self
            .groups
            .entry((finding.field, finding.kind))
            .or_default();
        group
            .entry(finding.value)
            .and_modify(|tally| tally.count += 1)
            .or_insert(Tally {
                count: 1,
                example_key: finding.record_key,
            });
    }

    /// Builds the structured summary. Pure and repeatable: accumulated
    /// state is not cleared.
    pub fn summarize(&self) -> ValidationSummary {
        let groups = self
            .groups
            .iter()
            .map(|((field, kind), entries)| FindingGroup {
                field: field.clone(),
                kind: *kind,
                entries: entries
                    .iter()
                    .map(|(value, tally)| FindingEntry {
                        value: value.clone(),
                        count: tally.count,
                        example_key: tally.example_key.as_str().to_string(),
                    })
                    .collect(),
            })
            .collect();
        ValidationSummary { groups }
    }
}

/// The aggregate report, structured so both a detailed listing and a short
/// warning count can be derived from it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ValidationSummary {
    pub groups: Vec<FindingGroup>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FindingGroup {
    pub field: String,
    pub kind: FindingKind,
    pub entries: Vec<FindingEntry>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FindingEntry {
    /// The offending raw value; `None` for blank findings.
    pub value: Option<String>,
    pub count: usize,
    pub example_key: String,
}

impl ValidationSummary {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total occurrences across all groups of the given kind.
    pub fn total_of(&self, kind: FindingKind) -> usize {
        self.groups
            .iter()
            .filter(|group| group.kind == kind)
            .flat_map(|group| group.entries.iter())
            .map(|entry| entry.count)
            .sum()
    }

    /// The short presentation: per (field, kind), total occurrences.
    pub fn warning_counts(&self) -> Vec<(String, FindingKind, usize)> {
        self.groups
            .iter()
            .map(|group| {
                (
                    group.field.clone(),
                    group.kind,
                    group.entries.iter().map(|entry| entry.count).sum(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(value: &str) -> RecordKey {
        RecordKey::new(value).unwrap()
    }

    #[test]
    fn repeated_value_counts_with_first_example() {
        let mut reporter = ValidationReporter::new();
        reporter.record(Finding::unmatched("community", "Unknownville", &key("U1")));
        reporter.record(Finding::unmatched("community", "Unknownville", &key("U2")));
        reporter.record(Finding::unmatched("community", "Unknownville", &key("U3")));

        let summary = reporter.summarize();
        assert_eq!(summary.groups.len(), 1);
        let entry = &summary.groups[0].entries[0];
        assert_eq!(entry.count, 3);
        assert_eq!(entry.example_key, "U1");
    }

    #[test]
    fn summarize_is_repeatable() {
        let mut reporter = ValidationReporter::new();
        reporter.record(Finding::blank("parish", &key("U1")));
        let first = reporter.summarize();
        let second = reporter.summarize();
        assert_eq!(first.total_of(FindingKind::Blank), 1);
        assert_eq!(second.total_of(FindingKind::Blank), 1);
    }

    #[test]
    fn blank_and_unmatched_group_separately() {
        let mut reporter = ValidationReporter::new();
        reporter.record(Finding::blank("parish", &key("U1")));
        reporter.record(Finding::unmatched("parish", "Atlantis", &key("U2")));
        let summary = reporter.summarize();
        assert_eq!(summary.groups.len(), 2);
        assert_eq!(summary.total_of(FindingKind::Blank), 1);
        assert_eq!(summary.total_of(FindingKind::Unmatched), 1);
        assert_eq!(summary.warning_counts().len(), 2);
    }
}
