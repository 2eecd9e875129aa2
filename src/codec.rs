//! Export/import of entered form data.
//!
//! Export walks the value tree, turning file values into embedded base64
//! records, and serializes the result as indented JSON under a
//! date-and-name derived filename. Import is the inverse: embedded records
//! are decoded back into in-memory file values, everything else is taken
//! wholesale.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::NaiveDate;

use crate::error::{FormError, FormResult};

/// Everything a field can hold during a session.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    List(Vec<FormValue>),
    Map(BTreeMap<String, FormValue>),
    File(FileValue),
}

pub type FormData = BTreeMap<String, FormValue>;

/// An uploaded file. Content is either already in memory or still a path,
/// read lazily at export time.
#[derive(Debug, Clone, PartialEq)]
pub struct FileValue {
    pub name: String,
    pub media_type: String,
    /// Modification timestamp, epoch milliseconds.
    pub last_modified: u64,
    pub content: FileContent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileContent {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

impl FileValue {
    fn read_bytes(&self) -> FormResult<Cow<'_, [u8]>> {
        match &self.content {
            FileContent::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
            FileContent::Path(path) => std::fs::read(path).map(Cow::Owned).map_err(|e| {
                FormError::export(format!(
                    "read file '{}' for '{}': {e}",
                    path.display(),
                    self.name
                ))
            }),
        }
    }
}

impl From<serde_json::Value> for FormValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::Text(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

/// Naming inputs for the exported document. The surname/given-name field
/// identifiers are schema-specific and therefore configurable.
#[derive(Debug, Clone)]
pub struct ExportOpts {
    pub document_title: String,
    pub surname_field: String,
    pub given_name_field: String,
}

impl Default for ExportOpts {
    fn default() -> Self {
        Self {
            document_title: "Personal questionnaire".to_string(),
            surname_field: "surname".to_string(),
            given_name_field: "given_name".to_string(),
        }
    }
}

/// Serializes form data as 2-space indented JSON with files embedded.
pub fn export_document(data: &FormData) -> FormResult<String> {
    let value = export_form(data)?;
    serde_json::to_string_pretty(&value).map_err(|e| FormError::serde(e.to_string()))
}

pub fn export_form(data: &FormData) -> FormResult<serde_json::Value> {
    let mut map = serde_json::Map::new();
    for (key, value) in data {
        map.insert(key.clone(), export_value(value)?);
    }
    Ok(serde_json::Value::Object(map))
}

fn export_value(value: &FormValue) -> FormResult<serde_json::Value> {
    Ok(match value {
        FormValue::Null => serde_json::Value::Null,
        FormValue::Bool(b) => serde_json::Value::Bool(*b),
        FormValue::Number(n) => serde_json::Value::Number(n.clone()),
        FormValue::Text(s) => serde_json::Value::String(s.clone()),
        FormValue::List(items) => serde_json::Value::Array(
            items
                .iter()
                .map(export_value)
                .collect::<FormResult<Vec<_>>>()?,
        ),
        FormValue::Map(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                out.insert(k.clone(), export_value(v)?);
            }
            serde_json::Value::Object(out)
        }
        FormValue::File(file) => {
            let bytes = file.read_bytes()?;
            serde_json::json!({
                "name": file.name,
                "type": file.media_type,
                "size": bytes.len(),
                "lastModified": file.last_modified,
                "data": format!("data:{};base64,{}", file.media_type, BASE64.encode(&bytes)),
                "isFile": true,
            })
        }
    })
}

/// `<ISO-date> <document-title> <surname> <given-name>.json`, with
/// placeholders when the name fields are absent or empty.
pub fn export_filename(data: &FormData, opts: &ExportOpts, date: NaiveDate) -> String {
    let surname = text_field(data, &opts.surname_field).unwrap_or("Surname");
    let given_name = text_field(data, &opts.given_name_field).unwrap_or("GivenName");
    format!(
        "{} {} {surname} {given_name}.json",
        date.format("%Y-%m-%d"),
        opts.document_title
    )
}

fn text_field<'a>(data: &'a FormData, field: &str) -> Option<&'a str> {
    match data.get(field)? {
        FormValue::Text(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}

/// Parses an exported document back into form data. Objects carrying
/// `isFile: true` with a well-formed record become file values again;
/// malformed records stay plain maps.
pub fn import_document(text: &str) -> FormResult<FormData> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| FormError::import(format!("invalid JSON: {e}")))?;
    let serde_json::Value::Object(map) = value else {
        return Err(FormError::import("expected a top-level object"));
    };
    Ok(map
        .into_iter()
        .map(|(k, v)| (k, import_value(v)))
        .collect())
}

fn import_value(value: serde_json::Value) -> FormValue {
    match value {
        serde_json::Value::Array(items) => {
            FormValue::List(items.into_iter().map(import_value).collect())
        }
        serde_json::Value::Object(map) => match decode_file_record(&map) {
            Some(file) => FormValue::File(file),
            None => FormValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, import_value(v)))
                    .collect(),
            ),
        },
        other => FormValue::from(other),
    }
}

fn decode_file_record(map: &serde_json::Map<String, serde_json::Value>) -> Option<FileValue> {
    if map.get("isFile")?.as_bool() != Some(true) {
        return None;
    }
    let name = map.get("name")?.as_str()?;
    let media_type = map.get("type")?.as_str()?;
    let last_modified = map.get("lastModified")?.as_u64()?;
    let data_url = map.get("data")?.as_str()?;

    let payload = data_url.strip_prefix("data:")?;
    let (_, encoded) = payload.split_once(";base64,")?;
    let bytes = BASE64.decode(encoded).ok()?;

    Some(FileValue {
        name: name.to_string(),
        media_type: media_type.to_string(),
        last_modified,
        content: FileContent::Bytes(bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(s: &str) -> FormValue {
        FormValue::Text(s.to_string())
    }

    fn sample_file() -> FileValue {
        FileValue {
            name: "cv.txt".to_string(),
            media_type: "text/plain".to_string(),
            last_modified: 1_700_000_000_000,
            content: FileContent::Bytes(b"This is a test file content".to_vec()),
        }
    }

    #[test]
    fn file_exports_as_embedded_record() {
        let mut data = FormData::new();
        data.insert("999102".to_string(), FormValue::File(sample_file()));

        let exported = export_form(&data).unwrap();
        let record = &exported["999102"];
        assert_eq!(record["isFile"], json!(true));
        assert_eq!(record["name"], json!("cv.txt"));
        assert_eq!(record["type"], json!("text/plain"));
        assert_eq!(record["size"], json!(27));
        assert!(
            record["data"]
                .as_str()
                .unwrap()
                .starts_with("data:text/plain;base64,")
        );
    }

    #[test]
    fn roundtrip_preserves_all_value_shapes() {
        let mut nested = BTreeMap::new();
        nested.insert("street".to_string(), text("Main 1"));
        nested.insert("zip".to_string(), FormValue::Number(12345.into()));

        let mut data = FormData::new();
        data.insert("surname".to_string(), text("Novak"));
        data.insert("consent".to_string(), FormValue::Bool(true));
        data.insert("missing".to_string(), FormValue::Null);
        data.insert("address".to_string(), FormValue::Map(nested));
        data.insert(
            "phones".to_string(),
            FormValue::List(vec![text("111"), text("222")]),
        );
        data.insert("cv".to_string(), FormValue::File(sample_file()));
        data.insert(
            "attachments".to_string(),
            FormValue::List(vec![
                FormValue::File(sample_file()),
                FormValue::File(FileValue {
                    name: "photo.png".to_string(),
                    media_type: "image/png".to_string(),
                    last_modified: 1_700_000_000_001,
                    content: FileContent::Bytes(vec![0x89, 0x50, 0x4e, 0x47]),
                }),
            ]),
        );

        let doc = export_document(&data).unwrap();
        let imported = import_document(&doc).unwrap();
        assert_eq!(imported, data);
    }

    #[test]
    fn reexport_is_byte_stable() {
        let mut data = FormData::new();
        data.insert("cv".to_string(), FormValue::File(sample_file()));
        data.insert("surname".to_string(), text("Novak"));

        let first = export_document(&data).unwrap();
        let second = export_document(&import_document(&first).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn export_uses_two_space_indentation() {
        let mut data = FormData::new();
        data.insert("surname".to_string(), text("Novak"));
        let doc = export_document(&data).unwrap();
        assert!(doc.contains("\n  \"surname\": \"Novak\""));
    }

    #[test]
    fn path_backed_file_read_failure_is_an_export_error() {
        let mut data = FormData::new();
        data.insert(
            "cv".to_string(),
            FormValue::File(FileValue {
                name: "gone.txt".to_string(),
                media_type: "text/plain".to_string(),
                last_modified: 0,
                content: FileContent::Path(PathBuf::from("target/does/not/exist.txt")),
            }),
        );
        let err = export_document(&data).unwrap_err();
        assert!(err.to_string().contains("export error:"));
    }

    #[test]
    fn filename_uses_name_fields_with_fallbacks() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 4).unwrap();
        let opts = ExportOpts::default();

        let mut data = FormData::new();
        data.insert("surname".to_string(), text("Novak"));
        data.insert("given_name".to_string(), text("Jan"));
        assert_eq!(
            export_filename(&data, &opts, date),
            "2026-08-04 Personal questionnaire Novak Jan.json"
        );

        let empty = FormData::new();
        assert_eq!(
            export_filename(&empty, &opts, date),
            "2026-08-04 Personal questionnaire Surname GivenName.json"
        );
    }

    #[test]
    fn filename_fields_are_configurable() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 4).unwrap();
        let opts = ExportOpts {
            document_title: "Employee form".to_string(),
            surname_field: "10053".to_string(),
            given_name_field: "10054".to_string(),
        };
        let mut data = FormData::new();
        data.insert("10053".to_string(), text("Svobodova"));
        data.insert("10054".to_string(), text("Eva"));
        assert_eq!(
            export_filename(&data, &opts, date),
            "2026-08-04 Employee form Svobodova Eva.json"
        );
    }

    #[test]
    fn malformed_json_is_an_import_error() {
        let err = import_document("{not json").unwrap_err();
        assert!(err.to_string().contains("import error:"));
        assert!(import_document("[1, 2]").is_err());
    }

    #[test]
    fn malformed_file_record_stays_a_plain_map() {
        let doc = json!({
            "broken": { "isFile": true, "name": "x" },
        })
        .to_string();
        let imported = import_document(&doc).unwrap();
        match &imported["broken"] {
            FormValue::Map(map) => assert_eq!(map["name"], text("x")),
            other => panic!("expected map, got {other:?}"),
        }
    }
}
