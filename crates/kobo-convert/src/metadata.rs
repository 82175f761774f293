//! Classification of platform bookkeeping columns.
//!
//! Export files carry columns the platform injects alongside the collected
//! answers. These must never reach the output document, from the main table
//! or from any child table. The rules live in one ordered table so the
//! precedence is auditable and testable.

use std::collections::BTreeSet;

/// Bookkeeping columns the platform injects into every export.
const EXACT_BOOKKEEPING: &[&str] = &[
    "_id",
    "_index",
    "_notes",
    "_parent_index",
    "_parent_table_name",
    "_status",
    "_submission_time",
    "_submitted_by",
    "_tags",
    "_validation_status",
    "__version__",
];

/// Default record key column name.
pub const DEFAULT_RECORD_KEY: &str = "_submission__uuid";

/// Default update-linkage column name.
pub const DEFAULT_UPDATE_LINKAGE: &str = "deprecatedID";

/// Prefix of columns referencing the parent submission in child tables.
const SUBMISSION_PREFIX: &str = "_submission__";

/// Internal column prefix.
const INTERNAL_PREFIX: &str = "_";

/// The ordered rule table deciding whether a column is platform
/// bookkeeping or domain data.
#[derive(Debug, Clone)]
pub struct MetadataRules {
    exact: BTreeSet<String>,
    record_key: String,
    update_linkage: String,
    allow: BTreeSet<String>,
}

impl MetadataRules {
    pub fn new(record_key: impl Into<String>, update_linkage: impl Into<String>) -> Self {
        let record_key = record_key.into();
        let update_linkage = update_linkage.into();
        let allow = BTreeSet::from([record_key.clone(), update_linkage.clone()]);
        Self {
            exact: EXACT_BOOKKEEPING.iter().map(|s| (*s).to_string()).collect(),
            record_key,
            update_linkage,
            allow,
        }
    }

    pub fn record_key(&self) -> &str {
        &self.record_key
    }

    pub fn update_linkage(&self) -> &str {
        &self.update_linkage
    }

    /// True if the column is platform bookkeeping rather than domain data.
    ///
    /// Rules, in order:
    /// 1. exact match against the fixed bookkeeping list;
    /// 2. submission-prefix columns, except the record key itself;
    /// 3. any internal-prefix column not on the allow-list.
    pub fn is_metadata(&self, column: &str) -> bool {
        if self.exact.contains(column) {
            return true;
        }
        if column.starts_with(SUBMISSION_PREFIX) && column != self.record_key {
            return true;
        }
        if column.starts_with(INTERNAL_PREFIX) && !self.allow.contains(column) {
            return true;
        }
        false
    }

    /// True for columns that must not appear inside output groups: all
    /// metadata columns plus the preserved allow-list columns, which are
    /// carried through the envelope (`meta` block), not the hierarchy.
    pub fn is_bookkeeping(&self, column: &str) -> bool {
        self.is_metadata(column) || self.allow.contains(column)
    }
}

impl Default for MetadataRules {
    fn default() -> Self {
        Self::new(DEFAULT_RECORD_KEY, DEFAULT_UPDATE_LINKAGE)
    }
}
