//! Label-to-code resolution.
//!
//! Resolution is a total function: it never fails, it degrades to
//! passthrough and records a finding for fields designated as validated.

use std::collections::BTreeSet;

use kobo_model::{CellValue, ChoiceTable, PathMapping, RecordKey};

use crate::report::{Finding, ValidationReporter};

/// Which fields feed the validation reporter. Organization deployments
/// differ, so the set is configuration, not a constant; the default matches
/// the reference deployment's location fields.
#[derive(Debug, Clone)]
pub struct ValidationPolicy {
    validated: BTreeSet<String>,
}

impl ValidationPolicy {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            validated: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_validated(&self, field: &str) -> bool {
        self.validated.contains(field)
    }

    pub fn validated_fields(&self) -> impl Iterator<Item = &str> {
        self.validated.iter().map(String::as_str)
    }
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self::new(["parish", "community"])
    }
}

/// True if a value already has the shape of a canonical code: a short
/// alphabetic prefix followed by digits (e.g. `JM04`). Such values pass
/// through without a finding even when absent from the choice table.
pub fn looks_like_code(value: &str) -> bool {
    let trimmed = value.trim();
    let letters: String = trimmed.chars().take_while(|ch| ch.is_ascii_alphabetic()).collect();
    if letters.is_empty() || letters.len() > 4 {
        return false;
    }
    let rest = &trimmed[letters.len()..];
    if rest.is_empty() || rest.len() > 6 {
        return false;
    }
    rest.chars().all(|ch| ch.is_ascii_digit())
}

/// Converts display values to canonical codes through the mapping's choice
/// tables, tracking blanks and mismatches for validated fields.
#[derive(Debug)]
pub struct LabelResolver<'a> {
    mapping: &'a PathMapping,
    policy: &'a ValidationPolicy,
}

impl<'a> LabelResolver<'a> {
    pub fn new(mapping: &'a PathMapping, policy: &'a ValidationPolicy) -> Self {
        Self { mapping, policy }
    }

    /// Resolves a cell. `None` means the cell was blank (the caller still
    /// emits an empty element for mapped fields).
    pub fn resolve(
        &self,
        field: &str,
        value: &CellValue,
        record_key: &RecordKey,
        reporter: &mut ValidationReporter,
    ) -> Option<String> {
        let Some(raw) = value.as_text() else {
            if self.policy.is_validated(field) {
                reporter.record(Finding::blank(field, record_key));
            }
            return None;
        };
        Some(self.resolve_text(field, raw, record_key, reporter))
    }

    fn resolve_text(
        &self,
        field: &str,
        raw: &str,
        record_key: &RecordKey,
        reporter: &mut ValidationReporter,
    ) -> String {
        let Some(choices) = self.mapping.choices_for(field) else {
            return raw.to_string();
        };
        // Already a canonical code: keep as-is, no lookup.
        if choices.is_code(raw) {
            return raw.to_string();
        }
        if let Some(code) = choices.code_for(raw) {
            return code.to_string();
        }
        if let Some(joined) = resolve_multi_select(field, choices, raw, record_key, self.policy, reporter) {
            return joined;
        }
        if looks_like_code(raw) {
            return raw.to_string();
        }
        if self.policy.is_validated(field) {
            reporter.record(Finding::unmatched(field, raw, record_key));
        }
        raw.to_string()
    }
}

/// Multi-select answers arrive joined by `;`, `|`, or spaces. Tokens are
/// converted independently and rejoined with the single-space separator the
/// form system uses internally.
///
/// The space separator is ambiguous with multi-word labels, so it only
/// applies when every token resolves; `;` and `|` are unambiguous and
/// convert best-effort.
fn resolve_multi_select(
    field: &str,
    choices: &ChoiceTable,
    raw: &str,
    record_key: &RecordKey,
    policy: &ValidationPolicy,
    reporter: &mut ValidationReporter,
) -> Option<String> {
    for sep in [';', '|'] {
        if raw.contains(sep) {
            let converted: Vec<String> = split_tokens(raw, sep)
                .map(|token| convert_token(field, choices, token, record_key, policy, reporter))
                .collect();
            return Some(converted.join(" "));
        }
    }
    if raw.contains(' ') {
        let tokens: Vec<&str> = split_tokens(raw, ' ').collect();
        let all_known = tokens
            .iter()
            .all(|token| choices.is_code(token) || choices.code_for(token).is_some());
        if all_known && !tokens.is_empty() {
            let converted: Vec<String> = tokens
                .iter()
                .map(|token| {
                    if choices.is_code(token) {
                        (*token).to_string()
                    } else {
                        choices.code_for(token).unwrap_or(token).to_string()
                    }
                })
                .collect();
            return Some(converted.join(" "));
        }
    }
    None
}

fn split_tokens(raw: &str, sep: char) -> impl Iterator<Item = &str> {
    raw.split(sep).map(str::trim).filter(|token| !token.is_empty())
}

fn convert_token(
    field: &str,
    choices: &ChoiceTable,
    token: &str,
    record_key: &RecordKey,
    policy: &ValidationPolicy,
    reporter: &mut ValidationReporter,
) -> String {
    if choices.is_code(token) {
        return token.to_string();
    }
    if let Some(code) = choices.code_for(token) {
        return code.to_string();
    }
    if !looks_like_code(token) && policy.is_validated(field) {
        reporter.record(Finding::unmatched(field, token, record_key));
    }
    token.to_string()
}
