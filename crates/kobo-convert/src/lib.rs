//! Conversion engine: flat linked tables in, per-record hierarchy trees out.
//!
//! The pieces compose left to right: [`MetadataRules`] decides which columns
//! are platform bookkeeping, [`LabelResolver`] turns display labels into
//! canonical codes, [`HierarchyBuilder`] assembles the tree for each record,
//! and [`ValidationReporter`] accumulates the advisory findings the run
//! produces along the way.

pub mod builder;
pub mod metadata;
pub mod report;
pub mod resolve;

pub use builder::{FieldNode, GroupNode, HierarchyBuilder, Node, RepeatGroup};
pub use metadata::{DEFAULT_RECORD_KEY, DEFAULT_UPDATE_LINKAGE, MetadataRules};
pub use report::{Finding, FindingEntry, FindingGroup, FindingKind, ValidationReporter, ValidationSummary};
pub use resolve::{LabelResolver, ValidationPolicy, looks_like_code};
