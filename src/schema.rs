//! Boundary JSON model for the two schema documents: the field-definition
//! tree and the enumeration tables.
//!
//! Documents are validated here before any metadata is derived from them.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FormError, FormResult};

/// Named option lists consumed by selection widgets.
pub type EnumTable = BTreeMap<String, Vec<EnumOption>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumOption {
    pub value: serde_json::Value,
    pub label: String,
}

/// Which variant of the form is being rendered. Controls `new_only` field
/// visibility; passed explicitly instead of being read from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormMode {
    Standard,
    NewEntry,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Widget {
    #[default]
    Input,
    Selection,
    Textarea,
    File,
    Markdown,
}

/// One node of the field-definition tree. A node with children is a group;
/// a node without children is a single form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldNode {
    pub key: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub original_path: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub children: Vec<FieldNode>,

    #[serde(default)]
    pub widget: Widget,
    #[serde(default)]
    pub enum_ref: Option<String>,
    #[serde(default = "default_width")]
    pub width: u8,
    /// Mandatory marker; the value `"P"` makes the field required.
    #[serde(default)]
    pub mandatory: Option<String>,
    #[serde(default)]
    pub default_value: serde_json::Value,

    #[serde(default)]
    pub skip: bool,
    #[serde(default)]
    pub new_only: bool,

    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub rows: Option<u32>,
    #[serde(default)]
    pub content: Option<String>,
}

fn default_width() -> u8 {
    12
}

impl FieldNode {
    pub fn is_group(&self) -> bool {
        !self.children.is_empty()
    }

    /// Stable identifier used to address this field across configs, values
    /// and errors: explicit id, else original path, else key.
    pub fn field_id(&self) -> &str {
        self.id
            .as_deref()
            .or(self.original_path.as_deref())
            .unwrap_or(&self.key)
    }

    pub fn is_required(&self) -> bool {
        self.mandatory.as_deref() == Some("P")
    }

    /// Whether this node is dropped from the rendered form in `mode`.
    pub fn hidden_in(&self, mode: FormMode) -> bool {
        self.skip || (self.new_only && mode != FormMode::NewEntry)
    }
}

/// The two parsed schema documents, loaded together.
#[derive(Debug, Clone)]
pub struct SchemaDocuments {
    pub structure: Vec<FieldNode>,
    pub enums: EnumTable,
}

/// Reads and parses both schema documents. Either failure aborts the load;
/// there is no partial result.
pub fn load_documents(structure_path: &Path, enums_path: &Path) -> FormResult<SchemaDocuments> {
    let structure = read_json(structure_path, "structure")?;
    let enums = read_json(enums_path, "enums")?;
    Ok(SchemaDocuments { structure, enums })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> FormResult<T> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| FormError::schema(format!("read {what} document '{}': {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| FormError::schema(format!("parse {what} document '{}': {e}", path.display())))
}

pub fn parse_structure(text: &str) -> FormResult<Vec<FieldNode>> {
    serde_json::from_str(text).map_err(|e| FormError::schema(format!("parse structure: {e}")))
}

pub fn parse_enums(text: &str) -> FormResult<EnumTable> {
    serde_json::from_str(text).map_err(|e| FormError::schema(format!("parse enums: {e}")))
}

pub fn find_root<'a>(structure: &'a [FieldNode], root_key: &str) -> FormResult<&'a FieldNode> {
    structure
        .iter()
        .find(|n| n.key == root_key)
        .ok_or_else(|| FormError::schema(format!("root node '{root_key}' not found")))
}

/// Structural invariants checked before metadata building: field identifiers
/// are unique across the tree, leaf widths stay within one row, and group
/// nodes do not double as fields.
pub fn validate_structure(structure: &[FieldNode]) -> FormResult<()> {
    let mut seen = BTreeSet::new();
    for node in structure {
        validate_node(node, &mut seen)?;
    }
    Ok(())
}

fn validate_node(node: &FieldNode, seen: &mut BTreeSet<String>) -> FormResult<()> {
    if node.key.trim().is_empty() {
        return Err(FormError::schema("node key must be non-empty"));
    }

    if node.is_group() {
        if node.widget != Widget::Input {
            return Err(FormError::schema(format!(
                "group '{}' also declares a widget",
                node.key
            )));
        }
        for child in &node.children {
            validate_node(child, seen)?;
        }
        return Ok(());
    }

    let id = node.field_id();
    if !seen.insert(id.to_string()) {
        return Err(FormError::schema(format!("duplicate field id '{id}'")));
    }
    if node.width < 1 || node.width > 12 {
        return Err(FormError::schema(format!(
            "field '{id}' has width {} (must be 1..=12)",
            node.width
        )));
    }
    Ok(())
}

/// Identifiers of every file-upload field in the tree, derived from the
/// widget kind rather than a hardcoded list.
pub fn file_field_ids(structure: &[FieldNode]) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    for node in structure {
        collect_file_ids(node, &mut ids);
    }
    ids
}

fn collect_file_ids(node: &FieldNode, ids: &mut BTreeSet<String>) {
    if node.is_group() {
        for child in &node.children {
            collect_file_ids(child, ids);
        }
    } else if node.widget == Widget::File {
        ids.insert(node.field_id().to_string());
    }
}
