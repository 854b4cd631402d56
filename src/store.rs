use anyhow::Result;
use log::warn;
use serde_json::{Map, Value};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs, sync::Mutex};

pub const DOCUMENT_FILE_NAME: &str = "ollama-tray-hero-data.json";

pub const FIRST_RUN_KEY: &str = "firstRun";
pub const HISTORY_KEY: &str = "conversationHistory";
pub const SETTINGS_KEY: &str = "settings";

/// The single persisted JSON document shared by settings and history.
///
/// Every read-modify-write goes through one guard so a history append and a
/// settings write never interleave on disk.
#[derive(Clone)]
pub struct DataStore {
    path: PathBuf,
    guard: Arc<Mutex<()>>,
}

impl DataStore {
    pub fn new(data_dir: &Path) -> Self {
        std::fs::create_dir_all(data_dir).ok();
        Self {
            path: data_dir.join(DOCUMENT_FILE_NAME),
            guard: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<Map<String, Value>> {
        let _lock = self.guard.lock().await;
        self.read_document().await
    }

    /// Reads one top-level field, `None` when the document or field is absent.
    pub async fn field(&self, key: &str) -> Result<Option<Value>> {
        let mut document = self.load().await?;
        Ok(document.remove(key))
    }

    pub async fn update_with<R, F>(&self, f: F) -> Result<(Map<String, Value>, R)>
    where
        F: FnOnce(Map<String, Value>) -> (Map<String, Value>, R),
    {
        let _lock = self.guard.lock().await;

        let current = self.read_document().await?;
        let current_snapshot = current.clone();
        let (next, result) = f(current);

        if next != current_snapshot {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent).await.ok();
            }
            let bytes = serde_json::to_vec_pretty(&Value::Object(next.clone()))?;
            fs::write(&self.path, bytes).await?;
        }

        Ok((next, result))
    }

    /// Replaces one top-level field and persists the document.
    pub async fn put_field(&self, key: &str, value: Value) -> Result<()> {
        self.update_with(|mut document| {
            document.insert(key.to_string(), value);
            (document, ())
        })
        .await?;
        Ok(())
    }

    async fn read_document(&self) -> Result<Map<String, Value>> {
        match fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice::<Value>(&bytes) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(_) | Err(_) => {
                    warn!(
                        "[tray:store] {} is not a JSON object, starting from an empty document",
                        self.path.display()
                    );
                    Ok(Map::new())
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(err) => Err(err.into()),
        }
    }
}
