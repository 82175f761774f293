//! The tabular-to-hierarchical transformation.
//!
//! For each main record the builder produces one tree: domain columns
//! resolved and placed at their mapped paths, intermediate singleton groups
//! created on demand, and child-table rows expanded into ordered repeat
//! instances carrying a 1-based position.

use kobo_model::{FieldPath, PathMapping, RecordKey, RecordSet, Row, Table};

use crate::metadata::MetadataRules;
use crate::resolve::{LabelResolver, ValidationPolicy};
use crate::report::ValidationReporter;

/// Name of the synthetic ordering element inside repeat instances.
const POSITION_FIELD: &str = "position";

/// A node of the built tree. Field order within a group follows mapping
/// declaration order; repeat instances follow child-table row order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Group(GroupNode),
    Field(FieldNode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupNode {
    pub name: String,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNode {
    pub name: String,
    /// `None` for blank cells; the element is still emitted, empty.
    pub value: Option<String>,
}

impl GroupNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Finds or creates the named child group. Revisiting a group reuses
    /// the existing node.
    fn ensure_group(&mut self, name: &str) -> &mut GroupNode {
        let index = self.children.iter().position(
            |child| matches!(child, Node::Group(group) if group.name == name),
        );
        let index = match index {
            Some(index) => index,
            None => {
                self.children.push(Node::Group(GroupNode::new(name)));
                self.children.len() - 1
            }
        };
        match &mut self.children[index] {
            Node::Group(group) => group,
            Node::Field(_) => unreachable!("index points at a group node"),
        }
    }

    fn place_field(&mut self, parents: &[String], name: &str, value: Option<String>) {
        let mut current = self;
        for segment in parents {
            current = current.ensure_group(segment);
        }
        current.children.push(Node::Field(FieldNode {
            name: name.to_string(),
            value,
        }));
    }

    fn has_fields(&self) -> bool {
        self.children.iter().any(|child| match child {
            Node::Field(_) => true,
            Node::Group(group) => group.has_fields(),
        })
    }

    /// Drops group subtrees that never received a field.
    fn prune_empty(&mut self) {
        for child in &mut self.children {
            if let Node::Group(group) = child {
                group.prune_empty();
            }
        }
        self.children.retain(|child| match child {
            Node::Field(_) => true,
            Node::Group(group) => group.has_fields(),
        });
    }
}

/// A child table admitted as a repeat group, with its resolved path.
#[derive(Debug)]
pub struct RepeatGroup<'a> {
    pub table: &'a Table,
    pub path: FieldPath,
}

pub struct HierarchyBuilder<'a> {
    records: &'a RecordSet,
    mapping: &'a PathMapping,
    rules: &'a MetadataRules,
    resolver: LabelResolver<'a>,
}

impl<'a> HierarchyBuilder<'a> {
    pub fn new(
        records: &'a RecordSet,
        mapping: &'a PathMapping,
        rules: &'a MetadataRules,
        policy: &'a ValidationPolicy,
    ) -> Self {
        Self {
            records,
            mapping,
            rules,
            resolver: LabelResolver::new(mapping, policy),
        }
    }

    /// Child tables that participate as repeat groups. Tables without the
    /// key column are reference sheets; tables without a group path in the
    /// mapping are dropped (a reportable condition, not an error).
    pub fn repeat_groups(&self) -> Vec<RepeatGroup<'a>> {
        let mut groups = Vec::new();
        for table in &self.records.children {
            if !table.has_column(self.records.key_column()) {
                tracing::debug!(table = %table.name, "no key column; treating as reference sheet");
                continue;
            }
            match self.mapping.group_path(&table.name) {
                Some(path) => groups.push(RepeatGroup { table, path }),
                None => {
                    tracing::warn!(table = %table.name, "child table has no mapped group path; dropped");
                }
            }
        }
        groups
    }

    /// Child tables dropped because no mapping path references them.
    pub fn ignored_child_tables(&self) -> Vec<String> {
        self.records
            .children
            .iter()
            .filter(|table| {
                table.has_column(self.records.key_column())
                    && self.mapping.group_path(&table.name).is_none()
            })
            .map(|table| table.name.clone())
            .collect()
    }

    /// Child rows referencing a key absent from the main table.
    pub fn orphan_row_count(&self) -> usize {
        let keys: std::collections::BTreeSet<&str> = self
            .records
            .main
            .rows
            .iter()
            .filter_map(|row| row.text(self.records.key_column()))
            .collect();
        self.repeat_groups()
            .iter()
            .flat_map(|group| group.table.rows.iter())
            .filter(|row| match row.text(self.records.key_column()) {
                Some(key) => !keys.contains(key),
                None => true,
            })
            .count()
    }

    /// Builds the tree for one main record. Returns `None` when the key
    /// matches no main row.
    pub fn build_record(
        &self,
        key: &RecordKey,
        reporter: &mut ValidationReporter,
    ) -> Option<GroupNode> {
        let main_row = self.records.main_row(key)?;
        let repeat_groups = self.repeat_groups();
        let mut root = GroupNode::new("");

        // Main-table pass: every mapped domain column present in the row,
        // except fields living under a repeat group (those come from child
        // rows).
        for (field, path) in self.mapping.fields() {
            if !self.is_domain_field(field, path, main_row) {
                continue;
            }
            if repeat_groups.iter().any(|group| path.extends(&group.path)) {
                continue;
            }
            self.place(&mut root, path, field, main_row, key, reporter);
        }

        // Repeat pass: one instance per matching child row, in child-table
        // row order.
        for group in &repeat_groups {
            let rows = self.records.child_rows(group.table, key);
            for (index, row) in rows.iter().enumerate() {
                let instance = self.build_instance(group, row, index + 1, key, reporter);
                let mut parent = &mut root;
                for segment in group.path.parent() {
                    parent = parent.ensure_group(segment);
                }
                parent.children.push(Node::Group(instance));
            }
        }

        root.prune_empty();
        Some(root)
    }

    fn build_instance(
        &self,
        group: &RepeatGroup<'_>,
        row: &Row,
        position: usize,
        key: &RecordKey,
        reporter: &mut ValidationReporter,
    ) -> GroupNode {
        let mut instance = GroupNode::new(group.path.segments().last().cloned().unwrap_or_default());
        let explicit_position = self.explicit_position(group, row);
        instance.children.push(Node::Field(FieldNode {
            name: POSITION_FIELD.to_string(),
            value: Some(explicit_position.unwrap_or_else(|| position.to_string())),
        }));
        for (field, path) in self.mapping.fields() {
            if !self.is_domain_field(field, path, row) {
                continue;
            }
            let Some(relative) = path.strip_prefix(&group.path) else {
                continue;
            };
            // Only the direct `position` child doubles as the ordering
            // element; a nested one is an ordinary field.
            if relative.len() == 1 && relative[0] == POSITION_FIELD {
                continue;
            }
            let (leaf, parents) = match relative.split_last() {
                Some(split) => split,
                None => continue,
            };
            let value = row
                .get(field)
                .map(|cell| self.resolver.resolve(field, cell, key, reporter))
                .unwrap_or(None);
            let mut current = &mut instance;
            for segment in parents {
                current = current.ensure_group(segment);
            }
            current.children.push(Node::Field(FieldNode {
                name: leaf.clone(),
                value,
            }));
        }
        instance
    }

    /// A column mapped to the repeat group's direct `position` child
    /// overrides the synthetic index when it carries a value. A `position`
    /// field nested deeper inside the instance is unrelated.
    fn explicit_position(&self, group: &RepeatGroup<'_>, row: &Row) -> Option<String> {
        for (field, path) in self.mapping.fields() {
            let Some(relative) = path.strip_prefix(&group.path) else {
                continue;
            };
            if relative.len() == 1 && relative[0] == POSITION_FIELD {
                if let Some(value) = row.text(field) {
                    return Some(value.to_string());
                }
            }
        }
        None
    }

    fn is_domain_field(&self, field: &str, path: &FieldPath, row: &Row) -> bool {
        !path.is_empty()
            && !self.mapping.is_group_only(field)
            && !self.rules.is_bookkeeping(field)
            && row.has_column(field)
    }

    fn place(
        &self,
        root: &mut GroupNode,
        path: &FieldPath,
        field: &str,
        row: &Row,
        key: &RecordKey,
        reporter: &mut ValidationReporter,
    ) {
        let value = row
            .get(field)
            .map(|cell| self.resolver.resolve(field, cell, key, reporter))
            .unwrap_or(None);
        let leaf = match path.leaf() {
            Some(leaf) => leaf.to_string(),
            None => return,
        };
        root.place_field(path.parent(), &leaf, value);
    }
}
