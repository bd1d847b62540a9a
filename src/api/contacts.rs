use crate::api::models::{Contact, ContactSource, CLOUD_BACKUP};
use crate::utils::run_on_runtime;
use async_trait::async_trait;
use log::debug;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

/// How long the cloud-backup fallback pretends to work before importing.
pub const FALLBACK_DELAY: Duration = Duration::from_millis(2000);

const UNNAMED: &str = "بدون اسم";
const NO_NUMBER: &str = "بدون رقم";

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("could not read contacts export {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("contacts export is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("contacts export has no contact list")]
    MissingList,
    #[error("background read failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Serialize)]
pub struct PickerOptions {
    pub multiple: bool,
}

/// What the picker is asked for: which properties, and whether several
/// contacts may be chosen at once.
#[derive(Debug, Clone, Serialize)]
pub struct PickerRequest {
    pub properties: Vec<&'static str>,
    pub options: PickerOptions,
}

impl Default for PickerRequest {
    fn default() -> Self {
        Self {
            properties: vec!["name", "tel"],
            options: PickerOptions { multiple: true },
        }
    }
}

/// A picked contact as the platform hands it over. Only the first name and
/// the first number are used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawContact {
    pub name: Vec<String>,
    pub tel: Vec<String>,
}

impl RawContact {
    fn from_value(item: &Value) -> Self {
        Self {
            name: string_list(item.get("name")),
            tel: string_list(item.get("tel").or_else(|| item.get("phone"))),
        }
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.to_string())
            .collect(),
        _ => Vec::new(),
    }
}

#[async_trait(?Send)]
pub trait ContactPicker {
    async fn select(&self, request: &PickerRequest) -> Result<Vec<RawContact>, SyncError>;
}

/// Picks every contact from a JSON export on disk: either a bare array of
/// `{ "name": [..], "tel": [..] }` records or an object wrapping one under
/// `contacts` or `data`.
pub struct FileContactPicker {
    path: PathBuf,
}

impl FileContactPicker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait(?Send)]
impl ContactPicker for FileContactPicker {
    async fn select(&self, request: &PickerRequest) -> Result<Vec<RawContact>, SyncError> {
        debug!("reading contacts export {} for {:?}", self.path.display(), request.properties);
        // Disk reads stay off the UI loop.
        let path = self.path.clone();
        let text = run_on_runtime(tokio::fs::read_to_string(path))
            .await?
            .map_err(|source| SyncError::Io {
                path: self.path.clone(),
                source,
            })?;
        let json: Value = serde_json::from_str(&text)?;
        let list = json
            .as_array()
            .or_else(|| json.get("contacts").and_then(|v| v.as_array()))
            .or_else(|| json.get("data").and_then(|v| v.as_array()))
            .ok_or(SyncError::MissingList)?;
        let mut picked: Vec<RawContact> = list.iter().map(RawContact::from_value).collect();
        if !request.options.multiple {
            picked.truncate(1);
        }
        Ok(picked)
    }
}

/// Where contacts come from on sync. Chosen once, when the store is built.
#[derive(Clone)]
pub enum ContactSync {
    Picker(Rc<dyn ContactPicker>),
    CloudFallback,
}

impl ContactSync {
    pub fn from_export(path: Option<&Path>) -> Self {
        match path {
            Some(path) => ContactSync::Picker(Rc::new(FileContactPicker::new(path))),
            None => ContactSync::CloudFallback,
        }
    }
}

/// Turns picker records into contacts. Ids are `phone-<millis>-<index>`.
pub fn format_picked(raw: &[RawContact], now_millis: i64) -> Vec<Contact> {
    raw.iter()
        .enumerate()
        .map(|(index, c)| {
            Contact::new(
                format!("phone-{now_millis}-{index}"),
                c.name.first().map(String::as_str).unwrap_or(UNNAMED),
                c.tel.first().map(String::as_str).unwrap_or(NO_NUMBER),
                ContactSource::Phone,
            )
        })
        .collect()
}

/// The fixed cloud-backup set, with ids unique to this import batch.
pub fn cloud_backup(now_millis: i64) -> Vec<Contact> {
    CLOUD_BACKUP
        .iter()
        .enumerate()
        .map(|(index, (name, phone))| {
            Contact::new(format!("cloud-{now_millis}-{index}"), *name, *phone, ContactSource::Cloud)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn format_picked_uses_first_entries_and_placeholders() {
        let raw = vec![
            RawContact {
                name: vec!["Lina".into(), "Lina K".into()],
                tel: vec!["0555".into(), "0666".into()],
            },
            RawContact::default(),
        ];
        let contacts = format_picked(&raw, 42);
        assert_eq!(contacts[0], Contact::new("phone-42-0", "Lina", "0555", ContactSource::Phone));
        assert_eq!(contacts[1].name, UNNAMED);
        assert_eq!(contacts[1].phone_number, NO_NUMBER);
        assert_eq!(contacts[1].id, "phone-42-1");
    }

    #[test]
    fn cloud_backup_ids_are_unique_per_batch() {
        let first = cloud_backup(1);
        let second = cloud_backup(2);
        assert_eq!(first.len(), 6);
        assert!(first.iter().all(|c| c.source == ContactSource::Cloud));
        assert!(first.iter().all(|a| second.iter().all(|b| a.id != b.id)));
    }

    #[test]
    fn picker_request_matches_the_platform_shape() {
        let json = serde_json::to_value(PickerRequest::default()).unwrap();
        assert_eq!(json, serde_json::json!({"properties": ["name", "tel"], "options": {"multiple": true}}));
    }

    #[tokio::test]
    async fn file_picker_reads_wrapped_and_bare_exports() {
        let mut bare = tempfile::NamedTempFile::new().unwrap();
        write!(bare, r#"[{{"name":["Omar"],"tel":["0501"]}},{{"name":"Huda","phone":"0502"}}]"#).unwrap();
        let picked = FileContactPicker::new(bare.path())
            .select(&PickerRequest::default())
            .await
            .unwrap();
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[1].name, vec!["Huda".to_string()]);
        assert_eq!(picked[1].tel, vec!["0502".to_string()]);

        let mut wrapped = tempfile::NamedTempFile::new().unwrap();
        write!(wrapped, r#"{{"data":[{{"name":["Omar"],"tel":[]}}]}}"#).unwrap();
        let picked = FileContactPicker::new(wrapped.path())
            .select(&PickerRequest::default())
            .await
            .unwrap();
        assert_eq!(picked, vec![RawContact { name: vec!["Omar".into()], tel: vec![] }]);
    }

    #[tokio::test]
    async fn file_picker_reports_missing_and_malformed_exports() {
        let missing = FileContactPicker::new("/nonexistent/contacts.json");
        assert!(matches!(
            missing.select(&PickerRequest::default()).await,
            Err(SyncError::Io { .. })
        ));

        let mut junk = tempfile::NamedTempFile::new().unwrap();
        write!(junk, r#"{{"count": 3}}"#).unwrap();
        assert!(matches!(
            FileContactPicker::new(junk.path()).select(&PickerRequest::default()).await,
            Err(SyncError::MissingList)
        ));
    }
}
