use crate::api::draft::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Overrides `api_key` from the config file when set.
pub const API_KEY_ENV: &str = "API_KEY";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not encode config: {0}")]
    Encode(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    /// JSON export used as the contact picker. Without it, sync falls back
    /// to the cloud backup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contacts_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            contacts_file: None,
        }
    }
}

impl Settings {
    fn toml_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("rasaili.toml"))
    }

    /// Reads the user's config file, falling back to defaults, then applies
    /// the environment override.
    pub fn load() -> Self {
        let mut settings = match Self::toml_path() {
            Some(path) => Self::load_or_init(&path),
            None => Self::default(),
        };
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                settings.api_key = key;
            }
        }
        settings
    }

    /// Like [`Settings::load_from`], but a missing file is created with the
    /// defaults so there is something to edit. A broken file is left alone.
    pub fn load_or_init(path: &Path) -> Self {
        if !path.exists() {
            let settings = Self::default();
            if let Err(e) = settings.save_to(path) {
                log::warn!("could not write {}: {e}", path.display());
            }
            return settings;
        }
        Self::load_from(path).unwrap_or_else(|e| {
            log::warn!("ignoring {}: {e}", path.display());
            Self::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(feature = "gui")]
pub fn build_ui(app: &adw::Application) {
    use crate::api::contacts::ContactSync;
    use crate::api::draft::{DraftGenerator, GeminiClient};
    use crate::storage::{KeyValueStore, MemoryStore, Persistence, SqliteStore};
    use crate::store::{Collaborators, Store};
    use crate::utils::{GlibDelay, GlibTimers, SystemClock, ThreadRandom};
    use std::rc::Rc;

    let settings = Settings::load();

    let kv: Box<dyn KeyValueStore> = match SqliteStore::open_default() {
        Ok(store) => Box::new(store),
        Err(e) => {
            log::error!("local storage unavailable, changes will not be kept: {e}");
            Box::new(MemoryStore::default())
        }
    };

    let drafter: Rc<dyn DraftGenerator> =
        match GeminiClient::new(&settings.endpoint, &settings.model, &settings.api_key) {
            Ok(client) => Rc::new(client),
            Err(e) => {
                log::warn!("draft assistant disabled: {e}");
                Rc::new(DisabledDrafter)
            }
        };

    let contacts = ContactSync::from_export(settings.contacts_file.as_deref());
    if let ContactSync::Picker(_) = contacts {
        log::info!("contact sync reads from the configured export");
    }

    let store = Store::new(
        Persistence::new(kv),
        Collaborators {
            contacts,
            drafter,
            delay: Rc::new(GlibDelay),
            random: Rc::new(ThreadRandom),
            timers: Rc::new(GlibTimers),
            clock: Rc::new(SystemClock),
        },
    );
    crate::ui::main_window::show_main_window(app, store);
}

/// Stands in when the configured endpoint cannot be used at all.
#[cfg(feature = "gui")]
struct DisabledDrafter;

#[cfg(feature = "gui")]
#[async_trait::async_trait(?Send)]
impl crate::api::draft::DraftGenerator for DisabledDrafter {
    async fn generate(&self, _prompt: &str) -> Result<String, crate::api::draft::DraftError> {
        Err(crate::api::draft::DraftError::MissingApiKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_trip_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("rasaili.toml");
        let settings = Settings {
            api_key: "secret".into(),
            model: "gemini-2.0-flash".into(),
            endpoint: "http://localhost:8080".into(),
            contacts_file: Some(PathBuf::from("/tmp/contacts.json")),
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rasaili.toml");
        fs::write(&path, "api_key = \"k\"\n").unwrap();
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.api_key, "k");
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.endpoint, DEFAULT_ENDPOINT);
        assert!(settings.contacts_file.is_none());
    }

    #[test]
    fn first_load_writes_the_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg").join("rasaili.toml");
        assert_eq!(Settings::load_or_init(&path), Settings::default());
        assert!(path.exists());
        assert_eq!(Settings::load_from(&path).unwrap(), Settings::default());
    }

    #[test]
    fn broken_file_falls_back_without_being_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rasaili.toml");
        fs::write(&path, "model = [").unwrap();
        assert_eq!(Settings::load_or_init(&path), Settings::default());
        assert_eq!(fs::read_to_string(&path).unwrap(), "model = [");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rasaili.toml");
        fs::write(&path, "model = [").unwrap();
        assert!(matches!(Settings::load_from(&path), Err(ConfigError::Parse(_))));
    }
}
