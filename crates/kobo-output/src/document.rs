//! Submission document assembly and serialization.
//!
//! The assembler wraps one built hierarchy tree in the fixed submission
//! envelope: root element carrying form identity and version, optional
//! `formhub` block, the content groups, the `__version__` marker, and the
//! `meta` identity block last. No I/O happens here; [`write_document`] is
//! the separate disk step.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use uuid::Uuid;

use kobo_convert::{FieldNode, GroupNode, Node};

use crate::common::{ensure_parent_dir, uuid_uri, write_text_element};

/// Options for document assembly, shared across all records of a run.
#[derive(Debug, Clone)]
pub struct DocumentOptions {
    /// Form identity; becomes the root element name and its `id` attribute.
    pub form_id: String,
    /// Opaque version marker emitted as the `__version__` element.
    pub version_id: String,
    /// Root `version` attribute. `None` derives one from the current time.
    pub form_version: Option<String>,
    /// `formhub/uuid` content. The value must match the target form or the
    /// endpoint routes the submission elsewhere; omitted when `None`.
    pub formhub_uuid: Option<String>,
}

impl DocumentOptions {
    pub fn new(form_id: impl Into<String>, version_id: impl Into<String>) -> Self {
        Self {
            form_id: form_id.into(),
            version_id: version_id.into(),
            form_version: None,
            formhub_uuid: None,
        }
    }

    fn resolved_form_version(&self) -> String {
        self.form_version
            .clone()
            .unwrap_or_else(|| format!("1 ({})", Utc::now().format("%Y-%m-%d %H:%M:%S")))
    }
}

/// One assembled submission document, ready to serialize.
#[derive(Debug, Clone)]
pub struct SubmissionDocument {
    form_id: String,
    form_version: String,
    version_id: String,
    formhub_uuid: Option<String>,
    instance_id: String,
    deprecated_id: Option<String>,
    tree: GroupNode,
}

impl SubmissionDocument {
    /// Assembles the envelope around a built tree. Every call mints a fresh
    /// instance identifier; the supersedes identifier comes from the
    /// record's update-linkage value when one is present.
    pub fn assemble(
        options: &DocumentOptions,
        tree: GroupNode,
        update_linkage: Option<&str>,
    ) -> Self {
        Self {
            form_id: options.form_id.clone(),
            form_version: options.resolved_form_version(),
            version_id: options.version_id.clone(),
            formhub_uuid: options.formhub_uuid.clone(),
            instance_id: uuid_uri(&Uuid::new_v4().to_string()),
            deprecated_id: update_linkage
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(uuid_uri),
            tree,
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn deprecated_id(&self) -> Option<&str> {
        self.deprecated_id.as_deref()
    }

    /// Serializes the document. Element ordering is fixed: `formhub`, the
    /// content groups in their built order, `__version__`, then `meta`.
    pub fn to_xml(&self) -> Result<String> {
        let mut xml = Writer::new_with_indent(Vec::new(), b' ', 4);

        let mut root = BytesStart::new(self.form_id.as_str());
        root.push_attribute(("id", self.form_id.as_str()));
        root.push_attribute(("version", self.form_version.as_str()));
        xml.write_event(Event::Start(root))?;

        if let Some(formhub_uuid) = &self.formhub_uuid {
            xml.write_event(Event::Start(BytesStart::new("formhub")))?;
            write_text_element(&mut xml, "uuid", formhub_uuid)?;
            xml.write_event(Event::End(BytesEnd::new("formhub")))?;
        }

        for node in &self.tree.children {
            write_node(&mut xml, node)?;
        }

        write_text_element(&mut xml, "__version__", &self.version_id)?;

        xml.write_event(Event::Start(BytesStart::new("meta")))?;
        write_text_element(&mut xml, "instanceID", &self.instance_id)?;
        if let Some(deprecated_id) = &self.deprecated_id {
            write_text_element(&mut xml, "deprecatedID", deprecated_id)?;
        }
        xml.write_event(Event::End(BytesEnd::new("meta")))?;

        xml.write_event(Event::End(BytesEnd::new(self.form_id.as_str())))?;

        let bytes = xml.into_inner();
        String::from_utf8(bytes).context("serialized document is not valid UTF-8")
    }
}

fn write_node<W: std::io::Write>(xml: &mut Writer<W>, node: &Node) -> Result<()> {
    match node {
        Node::Field(FieldNode { name, value }) => match value {
            Some(text) => write_text_element(xml, name, text)?,
            // Blank answers keep their element, empty.
            None => xml.write_event(Event::Empty(BytesStart::new(name.as_str())))?,
        },
        Node::Group(group) => {
            xml.write_event(Event::Start(BytesStart::new(group.name.as_str())))?;
            for child in &group.children {
                write_node(xml, child)?;
            }
            xml.write_event(Event::End(BytesEnd::new(group.name.as_str())))?;
        }
    }
    Ok(())
}

/// Write an assembled document to disk.
pub fn write_document(output_path: &Path, document: &SubmissionDocument) -> Result<()> {
    ensure_parent_dir(output_path)?;
    let file =
        File::create(output_path).with_context(|| format!("create {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);
    std::io::Write::write_all(&mut writer, document.to_xml()?.as_bytes())
        .with_context(|| format!("write {}", output_path.display()))?;
    Ok(())
}
