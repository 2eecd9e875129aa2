//! Formweave turns a declarative JSON field schema into everything a form
//! widget needs to render a data-entry form, and round-trips the entered
//! data through JSON files.
//!
//! - Load and validate the two schema documents (field tree + enum tables)
//! - Build a [`metadata::FormMetadata`]: field configs, 12-unit packed
//!   rows grouped into tabs, and initial values
//! - Drive the widget through [`controller::FormController`] over the
//!   [`controller::FormSurface`] seam
//! - Export/import form data with uploaded files embedded as base64 records
#![forbid(unsafe_code)]

pub mod codec;
pub mod controller;
pub mod error;
pub mod layout;
pub mod metadata;
pub mod schema;

pub use codec::{
    ExportOpts, FileContent, FileValue, FormData, FormValue, export_document, export_filename,
    import_document,
};
pub use controller::{Action, Button, FormController, FormEvent, FormSurface};
pub use error::{FormError, FormResult};
pub use layout::{FlatItem, FrUnits, Layout, Row, RowItem, Tab, pack_rows};
pub use metadata::{FieldConfig, FieldKind, FormMetadata, build_metadata};
pub use schema::{
    EnumOption, EnumTable, FieldNode, FormMode, SchemaDocuments, Widget, file_field_ids,
    load_documents, validate_structure,
};
