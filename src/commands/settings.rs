use log::{info, warn};
use serde_json::Value;

use crate::events::ShellEvent;
use crate::settings::{SettingKey, Settings};
use crate::TrayRuntime;

/// Load settings merged over the defaults.
pub async fn get_settings(runtime: &TrayRuntime) -> Settings {
    runtime.settings().get().await
}

/// Save one setting. Always reports success; a failed write is logged.
pub async fn save_setting(runtime: &TrayRuntime, key: &str, value: Value) -> bool {
    match runtime.settings().set(key, value).await {
        Ok(_) => {
            if SettingKey::from_key(key).is_some_and(SettingKey::requires_shell_effect) {
                info!("[tray:settings] {key} changed, shell state must be re-applied");
            }
        }
        Err(e) => warn!("[tray:settings] Failed to save {key}: {e}"),
    }

    runtime.events().emit(&ShellEvent::SettingsChanged {
        key: key.to_string(),
    });
    true
}

/// Models installed on the server, sorted; empty when it cannot be reached.
pub async fn get_available_models(runtime: &TrayRuntime) -> Vec<String> {
    runtime.models().list_models().await
}
