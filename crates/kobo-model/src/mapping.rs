use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use indexmap::IndexMap;

use crate::choices::ChoiceTable;
use crate::error::{ModelError, Result};

/// Path segment delimiter used by mapping files.
pub const PATH_DELIMITER: char = '/';

/// An ordered sequence of path segments, outermost group first, with the
/// field name as the final segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Parses a delimited path string. Leading and trailing delimiters are
    /// tolerated; an empty interior segment is a structural error. An empty
    /// or all-whitespace string yields the empty path (fields with empty
    /// paths are dropped by the converter, not rejected here).
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim().trim_matches(PATH_DELIMITER);
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        let mut segments = Vec::new();
        for segment in trimmed.split(PATH_DELIMITER) {
            let segment = segment.trim();
            if segment.is_empty() {
                return Err(ModelError::InvalidPath {
                    path: text.to_string(),
                });
            }
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    pub fn from_segments(segments: Vec<String>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The final segment (the field name for a field path).
    pub fn leaf(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// All segments but the last: the groups the leaf nests under.
    pub fn parent(&self) -> &[String] {
        match self.segments.len() {
            0 => &[],
            n => &self.segments[..n - 1],
        }
    }

    /// True if this path starts with every segment of `prefix` and is
    /// strictly longer.
    pub fn extends(&self, prefix: &FieldPath) -> bool {
        self.segments.len() > prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }

    /// The segments below `prefix`, or `None` if this path does not extend it.
    pub fn strip_prefix(&self, prefix: &FieldPath) -> Option<&[String]> {
        if self.extends(prefix) {
            Some(&self.segments[prefix.segments.len()..])
        } else {
            None
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Raw on-disk mapping shapes. The flat shape is just `field -> path`; the
/// rich shape separates `fields` and `choices`.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum MappingFile {
    Rich {
        fields: IndexMap<String, String>,
        #[serde(default)]
        choices: BTreeMap<String, BTreeMap<String, String>>,
    },
    Flat(IndexMap<String, String>),
}

/// The normalized field-to-path table, with optional per-field choice
/// tables. Field declaration order is preserved: it drives element order
/// within each output group.
#[derive(Debug, Clone, Default)]
pub struct PathMapping {
    fields: IndexMap<String, FieldPath>,
    choices: BTreeMap<String, ChoiceTable>,
    group_only: BTreeSet<String>,
    group_segments: BTreeSet<String>,
}

impl PathMapping {
    pub fn new(fields: IndexMap<String, FieldPath>, choices: BTreeMap<String, ChoiceTable>) -> Self {
        let group_only = detect_group_only(&fields);
        let group_segments = fields
            .values()
            .flat_map(|path| path.parent().iter().cloned())
            .collect();
        Self {
            fields,
            choices,
            group_only,
            group_segments,
        }
    }

    /// Loads a mapping from JSON text. Both on-disk shapes normalize to the
    /// same in-memory structure.
    pub fn from_json(text: &str) -> Result<Self> {
        let file: MappingFile =
            serde_json::from_str(text).map_err(|e| ModelError::Mapping(e.to_string()))?;
        Self::from_file(file)
    }

    /// Loads a mapping from any reader producing JSON.
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let file: MappingFile =
            serde_json::from_reader(reader).map_err(|e| ModelError::Mapping(e.to_string()))?;
        Self::from_file(file)
    }

    fn from_file(file: MappingFile) -> Result<Self> {
        let (raw_fields, raw_choices) = match file {
            MappingFile::Rich { fields, choices } => (fields, choices),
            MappingFile::Flat(fields) => (fields, BTreeMap::new()),
        };
        let mut fields = IndexMap::with_capacity(raw_fields.len());
        for (name, path) in raw_fields {
            fields.insert(name, FieldPath::parse(&path)?);
        }
        let choices = raw_choices
            .into_iter()
            .map(|(field, entries)| (field, ChoiceTable::new(entries)))
            .collect();
        Ok(Self::new(fields, choices))
    }

    /// The mapped path for a field, or `None` for unmapped fields (which
    /// the converter skips, by design).
    pub fn path_of(&self, field: &str) -> Option<&FieldPath> {
        self.fields.get(field)
    }

    /// Mapped fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldPath)> {
        self.fields.iter().map(|(name, path)| (name.as_str(), path))
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn choices_for(&self, field: &str) -> Option<&ChoiceTable> {
        self.choices.get(field)
    }

    pub fn choice_fields(&self) -> impl Iterator<Item = (&str, &ChoiceTable)> {
        self.choices
            .iter()
            .map(|(name, table)| (name.as_str(), table))
    }

    /// True if the name occurs as a non-leaf segment in any mapped path.
    pub fn is_group(&self, name: &str) -> bool {
        self.group_segments.contains(name)
    }

    /// True for entries that are structural group markers rather than
    /// fields: the entry's name equals its path's last segment and other
    /// paths extend that path. Such entries never emit elements.
    pub fn is_group_only(&self, field: &str) -> bool {
        self.group_only.contains(field)
    }

    /// The full path of a named group. Prefers the group's own mapping
    /// entry; otherwise derives the prefix from the first field path that
    /// passes through the segment.
    pub fn group_path(&self, group: &str) -> Option<FieldPath> {
        if let Some(path) = self.fields.get(group) {
            if path.leaf() == Some(group) {
                return Some(path.clone());
            }
        }
        for path in self.fields.values() {
            if let Some(index) = path.parent().iter().position(|s| s == group) {
                return Some(FieldPath::from_segments(
                    path.segments()[..=index].to_vec(),
                ));
            }
        }
        None
    }
}

fn detect_group_only(fields: &IndexMap<String, FieldPath>) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for (name, path) in fields {
        if path.leaf() != Some(name.as_str()) {
            continue;
        }
        let is_group = fields
            .values()
            .any(|other| other != path && other.extends(path));
        if is_group {
            out.insert(name.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tolerates_outer_delimiters() {
        let path = FieldPath::parse("/RESPONSES/sector/").unwrap();
        assert_eq!(path.segments(), ["RESPONSES", "sector"]);
        assert_eq!(path.leaf(), Some("sector"));
        assert_eq!(path.parent(), ["RESPONSES"]);
    }

    #[test]
    fn parse_rejects_empty_interior_segment() {
        assert!(FieldPath::parse("RESPONSES//sector").is_err());
    }

    #[test]
    fn parse_empty_is_empty_path() {
        assert!(FieldPath::parse("  ").unwrap().is_empty());
    }

    #[test]
    fn group_only_detection() {
        let mapping = PathMapping::from_json(
            r#"{
                "RESPONSES": "RESPONSES",
                "sector": "RESPONSES/sector",
                "FOCAL_POINTS": "RESPONSES/FOCAL_POINTS",
                "email": "RESPONSES/FOCAL_POINTS/email"
            }"#,
        )
        .unwrap();
        assert!(mapping.is_group_only("RESPONSES"));
        assert!(mapping.is_group_only("FOCAL_POINTS"));
        assert!(!mapping.is_group_only("sector"));
        assert!(mapping.is_group("RESPONSES"));
        assert!(!mapping.is_group("sector"));
    }

    #[test]
    fn group_path_prefers_own_entry() {
        let mapping = PathMapping::from_json(
            r#"{
                "FOCAL_POINTS": "RESPONSES/FOCAL_POINTS",
                "email": "RESPONSES/FOCAL_POINTS/email"
            }"#,
        )
        .unwrap();
        let path = mapping.group_path("FOCAL_POINTS").unwrap();
        assert_eq!(path.to_string(), "RESPONSES/FOCAL_POINTS");
        let derived = mapping.group_path("RESPONSES").unwrap();
        assert_eq!(derived.to_string(), "RESPONSES");
    }
}
