//! Drives the external form widget: applies the built metadata, reacts to
//! submit/changed events, and flips the check/save buttons accordingly.
//!
//! The widget itself is behind [`FormSurface`]; tests use an in-memory
//! implementation.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::codec::{ExportOpts, FormData, export_document, export_filename, import_document};
use crate::error::FormResult;
use crate::layout::Layout;
use crate::metadata::{FieldConfig, FormMetadata, build_metadata};
use crate::schema::{FormMode, load_documents};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    CheckData,
    Save,
    ImportData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonVariant {
    Default,
    Neutral,
    Primary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonPosition {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Button {
    pub action: Action,
    pub label: String,
    pub variant: ButtonVariant,
    pub position: ButtonPosition,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
}

/// Events the widget reports back.
#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    Submit { action: Action, form_data: FormData },
    Changed,
}

/// Seam to the form-rendering widget. The structured arguments carry the
/// widget's wire shape in their serde representation; validation errors stay
/// serialized because the widget maintains them as an opaque mapping.
pub trait FormSurface {
    fn apply_fields(&mut self, fields: &BTreeMap<String, FieldConfig>);
    fn apply_layout(&mut self, layout: &Layout);
    fn apply_values(&mut self, values: &BTreeMap<String, serde_json::Value>);
    fn apply_buttons(&mut self, buttons: &[Button]);

    /// Serialized field-id → error mapping, as maintained by the widget.
    fn validation_errors(&self) -> Option<String>;

    /// Lets the user choose a document to import; `None` when cancelled.
    fn pick_import_file(&mut self) -> FormResult<Option<String>>;
    fn replace_form_data(&mut self, data: FormData);
    fn request_render(&mut self);

    fn deliver_download(&mut self, filename: &str, contents: &[u8]);
    fn alert(&mut self, message: &str);
    /// Unrecoverable initialization failure; replaces the whole form area.
    fn fatal(&mut self, message: &str);
}

pub struct FormController<S: FormSurface> {
    surface: S,
    buttons: Vec<Button>,
    export: ExportOpts,
}

impl<S: FormSurface> FormController<S> {
    pub fn new(surface: S, export: ExportOpts) -> Self {
        Self {
            surface,
            buttons: default_buttons(),
            export,
        }
    }

    /// Loads and validates the schema documents, builds the metadata, and
    /// initializes the widget. A failure anywhere is routed to the surface's
    /// fatal handler; nothing is partially applied.
    pub fn start(
        surface: S,
        structure_path: &Path,
        enums_path: &Path,
        root_key: &str,
        mode: FormMode,
        export: ExportOpts,
    ) -> Self {
        let mut controller = Self::new(surface, export);
        let meta = load_documents(structure_path, enums_path)
            .and_then(|docs| build_metadata(&docs.structure, &docs.enums, root_key, mode));
        match meta {
            Ok(meta) => controller.initialize(&meta),
            Err(err) => controller.surface.fatal(&format!("Error loading form: {err}")),
        }
        controller
    }

    pub fn initialize(&mut self, meta: &FormMetadata) {
        self.surface.apply_fields(&meta.fields);
        self.surface.apply_layout(&meta.layout);
        if !meta.values.is_empty() {
            self.surface.apply_values(&meta.values);
        }
        self.surface.apply_buttons(&self.buttons);
    }

    pub fn handle_event(&mut self, event: FormEvent) {
        match event {
            FormEvent::Submit {
                action: Action::CheckData,
                ..
            } => self.on_check(),
            FormEvent::Submit {
                action: Action::Save,
                form_data,
            } => self.on_save(&form_data),
            FormEvent::Submit {
                action: Action::ImportData,
                ..
            } => self.on_import(),
            FormEvent::Changed => {
                self.set_button_disabled(Action::Save, true);
                self.set_button_disabled(Action::CheckData, false);
            }
        }
    }

    fn on_check(&mut self) {
        if self.has_validation_errors() {
            tracing::debug!("validation errors present, save stays disabled");
            return;
        }
        self.set_button_disabled(Action::CheckData, true);
        self.set_button_disabled(Action::Save, false);
    }

    fn has_validation_errors(&self) -> bool {
        let Some(raw) = self.surface.validation_errors() else {
            return false;
        };
        if raw.is_empty() {
            return false;
        }
        match serde_json::from_str::<BTreeMap<String, serde_json::Value>>(&raw) {
            Ok(errors) => !errors.is_empty(),
            Err(err) => {
                // Fail-open: an unreadable mapping counts as no errors.
                tracing::warn!(%err, "ignoring malformed validation errors");
                false
            }
        }
    }

    fn on_save(&mut self, form_data: &FormData) {
        match export_document(form_data) {
            Ok(doc) => {
                let filename = export_filename(
                    form_data,
                    &self.export,
                    chrono::Utc::now().date_naive(),
                );
                self.surface.deliver_download(&filename, doc.as_bytes());
            }
            Err(err) => self.surface.alert(&format!("Save failed: {err}")),
        }
    }

    fn on_import(&mut self) {
        let text = match self.surface.pick_import_file() {
            Ok(Some(text)) => text,
            Ok(None) => return,
            Err(err) => {
                self.surface.alert(&format!("Import failed: {err}"));
                return;
            }
        };
        match import_document(&text) {
            Ok(data) => {
                self.surface.replace_form_data(data);
                self.surface.request_render();
            }
            Err(err) => self.surface.alert(&format!("Import failed: {err}")),
        }
    }

    fn set_button_disabled(&mut self, action: Action, disabled: bool) {
        let mut changed = false;
        for button in &mut self.buttons {
            if button.action == action && button.disabled != disabled {
                button.disabled = disabled;
                changed = true;
            }
        }
        // Only push the buttons attribute when a flag actually flipped.
        if changed {
            self.surface.apply_buttons(&self.buttons);
        }
    }

    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

/// Initial button set: import on the left, check/save on the right, save
/// disabled until a check passes.
fn default_buttons() -> Vec<Button> {
    vec![
        Button {
            action: Action::ImportData,
            label: "Load data".to_string(),
            variant: ButtonVariant::Default,
            position: ButtonPosition::Left,
            disabled: false,
        },
        Button {
            action: Action::CheckData,
            label: "Check data".to_string(),
            variant: ButtonVariant::Neutral,
            position: ButtonPosition::Right,
            disabled: false,
        },
        Button {
            action: Action::Save,
            label: "Save form".to_string(),
            variant: ButtonVariant::Primary,
            position: ButtonPosition::Right,
            disabled: true,
        },
    ]
}
