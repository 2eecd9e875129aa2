//! Derives the three widget-facing artifacts from a validated field tree:
//! the per-field configuration mapping, the packed tab/row layout, and the
//! initial-values mapping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::FormResult;
use crate::layout::{FlatItem, Layout, Tab, pack_rows};
use crate::schema::{EnumTable, FieldNode, FormMode, Widget, find_root, validate_structure};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Input,
    Combobox,
    Textarea,
    File,
    Markdown,
}

/// Widget configuration for a single field, serialized with the attribute
/// names the form widget consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<crate::schema::EnumOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(rename = "allowCustom", skip_serializing_if = "Option::is_none")]
    pub allow_custom: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple: Option<bool>,
    #[serde(rename = "innerLabel", skip_serializing_if = "Option::is_none")]
    pub inner_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u8>,
}

impl FieldConfig {
    pub fn new(kind: FieldKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            options: None,
            placeholder: None,
            allow_custom: None,
            content: None,
            rows: None,
            required: None,
            multiple: None,
            inner_label: None,
            width: None,
        }
    }
}

/// Everything the form widget needs to render: field configs, packed
/// layout, and non-empty default values keyed by field identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormMetadata {
    pub fields: BTreeMap<String, FieldConfig>,
    pub layout: Layout,
    pub values: BTreeMap<String, serde_json::Value>,
}

/// Builds [`FormMetadata`] from the schema documents. The structure is
/// validated first; the root's immediate children become tabs, with
/// `skip`/`new_only` nodes dropped according to `mode`. Deterministic for a
/// given input.
#[tracing::instrument(skip(structure, enums))]
pub fn build_metadata(
    structure: &[FieldNode],
    enums: &EnumTable,
    root_key: &str,
    mode: FormMode,
) -> FormResult<FormMetadata> {
    validate_structure(structure)?;
    let root = find_root(structure, root_key)?;

    let mut meta = FormMetadata::default();
    for child in &root.children {
        if child.hidden_in(mode) {
            continue;
        }
        let items = flatten_children(child, mode, enums, &mut meta);
        if items.is_empty() {
            continue;
        }
        meta.layout.tabs.push(Tab {
            label: tab_label(child),
            rows: pack_rows(items),
        });
    }
    Ok(meta)
}

fn tab_label(node: &FieldNode) -> String {
    node.description.clone().unwrap_or_else(|| node.key.clone())
}

/// Flattens a group's subtree into an ordered item sequence: a nested group
/// with a description contributes a separator before its own children, a
/// leaf contributes one field item.
fn flatten_children(
    node: &FieldNode,
    mode: FormMode,
    enums: &EnumTable,
    meta: &mut FormMetadata,
) -> Vec<FlatItem> {
    let mut items = Vec::new();
    for child in &node.children {
        if child.hidden_in(mode) {
            continue;
        }
        if child.is_group() {
            if let Some(description) = &child.description {
                items.push(FlatItem::Separator {
                    label: description.clone(),
                });
            }
            items.extend(flatten_children(child, mode, enums, meta));
        } else {
            items.push(field_item(child, enums, meta));
        }
    }
    items
}

fn field_item(node: &FieldNode, enums: &EnumTable, meta: &mut FormMetadata) -> FlatItem {
    let field_id = node.field_id().to_string();

    meta.fields
        .insert(field_id.clone(), field_config(node, &field_id, enums));

    if has_default(node) {
        meta.values
            .insert(field_id.clone(), node.default_value.clone());
    }

    FlatItem::Field {
        field: field_id,
        width: node.width,
    }
}

fn field_config(node: &FieldNode, field_id: &str, enums: &EnumTable) -> FieldConfig {
    let label = node.description.clone().unwrap_or_else(|| node.key.clone());

    let mut config = match node.widget {
        Widget::Input => FieldConfig::new(FieldKind::Input, label),
        Widget::Selection => {
            let mut c = FieldConfig::new(FieldKind::Combobox, label);
            c.allow_custom = Some(false);
            c.placeholder = Some("Select...".to_string());
            c.options = Some(resolve_options(node, field_id, enums));
            c
        }
        Widget::Markdown => {
            let mut c = FieldConfig::new(FieldKind::Markdown, label);
            c.content = node.content.clone();
            // Markdown blocks always span the full row.
            c.width = Some(crate::layout::ROW_UNITS);
            c
        }
        Widget::File => {
            let mut c = FieldConfig::new(FieldKind::File, label);
            if node.multiple {
                c.multiple = Some(true);
            }
            c.inner_label = node.label.clone();
            c
        }
        Widget::Textarea => {
            let mut c = FieldConfig::new(FieldKind::Textarea, label);
            c.rows = node.rows;
            c
        }
    };

    if node.is_required() {
        config.required = Some(true);
    }
    config
}

fn resolve_options(
    node: &FieldNode,
    field_id: &str,
    enums: &EnumTable,
) -> Vec<crate::schema::EnumOption> {
    match node.enum_ref.as_ref().and_then(|name| enums.get(name)) {
        Some(options) => options.clone(),
        None => {
            tracing::warn!(
                field = field_id,
                enum_ref = node.enum_ref.as_deref(),
                "enumeration not found, rendering empty options"
            );
            Vec::new()
        }
    }
}

fn has_default(node: &FieldNode) -> bool {
    if node.default_value.is_null() {
        return false;
    }
    node.default_value.as_str() != Some("")
}
