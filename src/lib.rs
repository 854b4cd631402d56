//! Core of Ollama Tray Hero: a small chat front-end for a local model
//! server.
//!
//! A shell (tray icon, windows, global shortcut) owns one [`TrayRuntime`]
//! and talks to it only through [`commands`]. Settings and the conversation
//! transcript live in a single JSON document under the data directory.

pub mod chat;
pub mod commands;
pub mod events;
pub mod history;
pub mod logging;
pub mod models;
pub mod settings;
pub mod store;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use log::info;
use reqwest::Client;

use chat::ChatAdapter;
use events::EventHub;
use history::HistoryStore;
use models::ModelDirectory;
use settings::SettingsStore;
use store::DataStore;

/// Overrides the data directory, mainly for development and tests.
pub const DATA_DIR_ENV: &str = "OLLAMA_TRAY_HERO_HOME";

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub data_dir: PathBuf,
    /// Applies to establishing the connection only; generation time is not
    /// bounded.
    pub connect_timeout: Option<Duration>,
}

impl RuntimeConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
        }
    }

    pub fn from_env() -> Result<Self> {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|value| !value.is_empty()) {
            return Ok(Self::new(dir));
        }

        let mut dir = dirs::home_dir().ok_or_else(|| anyhow!("No home directory"))?;
        dir.push(".config");
        dir.push("ollama-tray-hero");
        Ok(Self::new(dir))
    }
}

/// The single long-lived adapter instance behind the shell.
#[derive(Clone)]
pub struct TrayRuntime {
    settings: SettingsStore,
    chat: Arc<ChatAdapter>,
    models: Arc<ModelDirectory>,
    events: Arc<EventHub>,
}

impl TrayRuntime {
    pub async fn initialize(config: RuntimeConfig) -> Result<Self> {
        let store = DataStore::new(&config.data_dir);
        info!("[tray] Using data file {}", store.path().display());

        let mut builder = Client::builder();
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder.build()?;

        let settings = SettingsStore::new(store.clone());
        let history = HistoryStore::load(store).await;
        let chat = ChatAdapter::new(client.clone(), settings.clone(), history);
        let models = ModelDirectory::new(client, settings.clone());

        Ok(Self {
            settings,
            chat: Arc::new(chat),
            models: Arc::new(models),
            events: Arc::new(EventHub::new()),
        })
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn chat(&self) -> &ChatAdapter {
        self.chat.as_ref()
    }

    pub fn models(&self) -> &ModelDirectory {
        self.models.as_ref()
    }

    pub fn events(&self) -> &EventHub {
        self.events.as_ref()
    }
}
