use log::{info, warn};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::settings::{SettingKey, SettingsStore, DEFAULT_MODEL};

#[derive(Debug, Default, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    #[serde(default)]
    name: Option<String>,
}

/// Lists the models installed on the model server.
pub struct ModelDirectory {
    client: Client,
    settings: SettingsStore,
}

impl ModelDirectory {
    pub fn new(client: Client, settings: SettingsStore) -> Self {
        Self { client, settings }
    }

    /// Model names sorted ascending. Failures yield an empty list.
    ///
    /// When models are found and no model has been picked yet (or the
    /// selection still equals the compiled default), the first name becomes
    /// the selected model.
    pub async fn list_models(&self) -> Vec<String> {
        let models = match self.fetch_models().await {
            Ok(models) => models,
            Err(err) => {
                warn!("[tray:models] Failed to fetch models: {err}");
                return Vec::new();
            }
        };

        if let Some(first) = models.first() {
            self.select_if_unset(first).await;
        }

        models
    }

    async fn fetch_models(&self) -> Result<Vec<String>, reqwest::Error> {
        let settings = self.settings.get().await;
        let url = format!("{}/api/tags", settings.api_base());

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            warn!(
                "[tray:models] Model server responded with status {}",
                response.status()
            );
        }

        let tags = response.json::<TagsResponse>().await?;
        Ok(sorted_names(tags))
    }

    async fn select_if_unset(&self, candidate: &str) {
        let result = self
            .settings
            .set_when(
                SettingKey::SelectedModel.as_str(),
                Value::String(candidate.to_string()),
                selection_is_replaceable,
            )
            .await;

        match result {
            Ok(true) => info!("[tray:models] Selected model {candidate}"),
            Ok(false) => {}
            Err(err) => warn!("[tray:models] Failed to store selected model: {err}"),
        }
    }
}

fn sorted_names(tags: TagsResponse) -> Vec<String> {
    let mut names: Vec<String> = tags
        .models
        .into_iter()
        .filter_map(|entry| entry.name)
        .collect();
    names.sort();
    names
}

// A user who explicitly picks the default model is indistinguishable from
// one who never picked, so that choice gets replaced too. Falsy stored values
// (null, false, 0, "") count as unset; a whitespace-only name does not.
fn selection_is_replaceable(current: Option<&Value>) -> bool {
    match current {
        None | Some(Value::Null) | Some(Value::Bool(false)) => true,
        Some(Value::Number(number)) => number.as_f64() == Some(0.0),
        Some(Value::String(model)) => model.is_empty() || model == DEFAULT_MODEL,
        Some(_) => false,
    }
}
