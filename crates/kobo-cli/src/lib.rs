//! Library surface of the converter CLI: logging bootstrap, the conversion
//! pipeline, and summary presentation. The binary in `main.rs` is a thin
//! wrapper over these.

pub mod logging;
pub mod pipeline;
pub mod summary;
pub mod types;
