//! Shared serialization helpers.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

/// URI-style prefix the submission endpoint requires on identity values.
pub const UUID_PREFIX: &str = "uuid:";

/// Prefixes an identity value, tolerating values that already carry the
/// prefix.
pub fn uuid_uri(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.starts_with(UUID_PREFIX) {
        trimmed.to_string()
    } else {
        format!("{UUID_PREFIX}{trimmed}")
    }
}

/// Write a simple text element.
pub fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Ensure the parent directory of a file path exists.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_uri_does_not_double_prefix() {
        assert_eq!(uuid_uri("00a0"), "uuid:00a0");
        assert_eq!(uuid_uri("uuid:00a0"), "uuid:00a0");
        assert_eq!(uuid_uri("  00a0  "), "uuid:00a0");
    }
}
