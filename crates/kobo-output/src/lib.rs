//! Submission document output generation.

pub mod common;
pub mod document;

pub use common::{UUID_PREFIX, ensure_parent_dir, uuid_uri};
pub use document::{DocumentOptions, SubmissionDocument, write_document};
