use anyhow::Result;
use log::{info, warn};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::{DataStore, FIRST_RUN_KEY, SETTINGS_KEY};

pub const DEFAULT_API_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.2";
pub const DEFAULT_SHORTCUT: &str = "Shift+Space";
/// Registered by a shell when the configured shortcut cannot be bound.
pub const FALLBACK_SHORTCUT: &str = "CommandOrControl+Alt+O";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    System,
    Light,
    Dark,
}

/// The scheme actually painted once `system` has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppliedScheme {
    Light,
    Dark,
}

impl ColorScheme {
    pub fn resolve(self, system_prefers_dark: bool) -> AppliedScheme {
        match self {
            ColorScheme::Light => AppliedScheme::Light,
            ColorScheme::Dark => AppliedScheme::Dark,
            ColorScheme::System if system_prefers_dark => AppliedScheme::Dark,
            ColorScheme::System => AppliedScheme::Light,
        }
    }
}

impl AppliedScheme {
    pub fn as_str(self) -> &'static str {
        match self {
            AppliedScheme::Light => "light",
            AppliedScheme::Dark => "dark",
        }
    }
}

/// A `"yes"` / `"no"` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toggle {
    #[default]
    Yes,
    No,
}

impl Toggle {
    pub fn is_enabled(self) -> bool {
        matches!(self, Toggle::Yes)
    }
}

/// Keys the core understands. Anything else is carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    ApiUrl,
    SelectedModel,
    ColorScheme,
    RunOnStartup,
    AlwaysOnTop,
    Shortcut,
}

impl SettingKey {
    pub const ALL: [SettingKey; 6] = [
        SettingKey::ApiUrl,
        SettingKey::SelectedModel,
        SettingKey::ColorScheme,
        SettingKey::RunOnStartup,
        SettingKey::AlwaysOnTop,
        SettingKey::Shortcut,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::ApiUrl => "apiUrl",
            SettingKey::SelectedModel => "selectedModel",
            SettingKey::ColorScheme => "colorScheme",
            SettingKey::RunOnStartup => "runOnStartup",
            SettingKey::AlwaysOnTop => "alwaysOnTop",
            SettingKey::Shortcut => "shortcut",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|candidate| candidate.as_str() == key)
    }

    /// Whether the shell has to re-apply window, tray or login-item state
    /// after this key changes.
    pub fn requires_shell_effect(self) -> bool {
        matches!(
            self,
            SettingKey::ColorScheme
                | SettingKey::RunOnStartup
                | SettingKey::AlwaysOnTop
                | SettingKey::Shortcut
        )
    }
}

/// Persisted settings merged over the compiled-in defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub api_url: String,
    pub selected_model: String,
    pub color_scheme: ColorScheme,
    pub run_on_startup: Toggle,
    pub always_on_top: Toggle,
    pub shortcut: String,
    /// Unrecognised keys, preserved so a round trip through the shell does
    /// not drop them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            selected_model: DEFAULT_MODEL.to_string(),
            color_scheme: ColorScheme::default(),
            run_on_startup: Toggle::Yes,
            always_on_top: Toggle::Yes,
            shortcut: DEFAULT_SHORTCUT.to_string(),
            extra: Map::new(),
        }
    }
}

impl Settings {
    /// Builds settings from a stored (possibly partial) object. Each
    /// recognised key falls back to its default on its own.
    pub fn from_map(stored: &Map<String, Value>) -> Self {
        let defaults = Settings::default();
        let extra = stored
            .iter()
            .filter(|(key, _)| SettingKey::from_key(key).is_none())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            api_url: text_field(stored, SettingKey::ApiUrl).unwrap_or(defaults.api_url),
            selected_model: text_field(stored, SettingKey::SelectedModel)
                .unwrap_or(defaults.selected_model),
            color_scheme: typed_field(stored, SettingKey::ColorScheme)
                .unwrap_or(defaults.color_scheme),
            run_on_startup: typed_field(stored, SettingKey::RunOnStartup)
                .unwrap_or(defaults.run_on_startup),
            always_on_top: typed_field(stored, SettingKey::AlwaysOnTop)
                .unwrap_or(defaults.always_on_top),
            shortcut: text_field(stored, SettingKey::Shortcut).unwrap_or(defaults.shortcut),
            extra,
        }
    }

    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    pub fn launch_at_login(&self) -> bool {
        self.run_on_startup.is_enabled()
    }

    pub fn pin_on_top(&self) -> bool {
        self.always_on_top.is_enabled()
    }

    /// Base URL without a trailing slash, ready for `{base}/api/...`.
    pub fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}

fn text_field(stored: &Map<String, Value>, key: SettingKey) -> Option<String> {
    stored
        .get(key.as_str())
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn typed_field<T: DeserializeOwned>(stored: &Map<String, Value>, key: SettingKey) -> Option<T> {
    let value = stored.get(key.as_str())?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            warn!(
                "[tray:settings] Ignoring stored {}={} ({err}), using default",
                key.as_str(),
                value
            );
            None
        }
    }
}

/// Reads and writes the `settings` object of the shared document.
#[derive(Clone)]
pub struct SettingsStore {
    store: DataStore,
}

impl SettingsStore {
    pub fn new(store: DataStore) -> Self {
        Self { store }
    }

    /// Never fails: an unreadable store yields the defaults.
    pub async fn get(&self) -> Settings {
        Settings::from_map(&self.stored().await)
    }

    /// The raw value persisted for `key`, without default substitution.
    pub async fn stored_value(&self, key: &str) -> Option<Value> {
        self.stored().await.remove(key)
    }

    /// Overwrites exactly one key and persists the full object. The value is
    /// stored as given.
    pub async fn set(&self, key: &str, value: Value) -> Result<Settings> {
        self.set_when(key, value, |_| true).await?;
        Ok(self.get().await)
    }

    /// Like [`SettingsStore::set`] but only when `predicate` accepts the
    /// currently stored value. Check and write happen under one store lock.
    pub async fn set_when<P>(&self, key: &str, value: Value, predicate: P) -> Result<bool>
    where
        P: FnOnce(Option<&Value>) -> bool,
    {
        let (_, applied) = self
            .store
            .update_with(|mut document| {
                let stored = settings_object(&document);
                if !predicate(stored.get(key)) {
                    return (document, false);
                }

                let mut merged = Settings::default().to_map();
                merged.extend(stored);
                merged.insert(key.to_string(), value);
                document.insert(SETTINGS_KEY.to_string(), Value::Object(merged));
                (document, true)
            })
            .await?;
        Ok(applied)
    }

    /// True exactly once per data directory; the flag is cleared on the first
    /// observation.
    pub async fn is_first_run(&self) -> bool {
        let result = self
            .store
            .update_with(|mut document| {
                let first_run = document
                    .get(FIRST_RUN_KEY)
                    .and_then(Value::as_bool)
                    .unwrap_or(true);
                if first_run {
                    document.insert(FIRST_RUN_KEY.to_string(), Value::Bool(false));
                }
                (document, first_run)
            })
            .await;

        match result {
            Ok((_, first_run)) => {
                if first_run {
                    info!("[tray:settings] First run detected");
                }
                first_run
            }
            Err(err) => {
                warn!("[tray:settings] Failed to read first-run flag: {err}");
                false
            }
        }
    }

    async fn stored(&self) -> Map<String, Value> {
        match self.store.load().await {
            Ok(document) => settings_object(&document),
            Err(err) => {
                warn!("[tray:settings] Failed to load settings, using defaults: {err}");
                Map::new()
            }
        }
    }
}

fn settings_object(document: &Map<String, Value>) -> Map<String, Value> {
    document
        .get(SETTINGS_KEY)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}
