use crate::updater::{UpdateChannel, UpdateConfig, DEFAULT_UPDATE_ENDPOINT};
use serde_json::json;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tauri::Runtime;
use tauri_plugin_store::{JsonValue, Store, StoreBuilder};

const SETTINGS_STORE_FILE: &str = "clawx-settings.json";

pub const KEY_UPDATE_CHANNEL: &str = "updateChannel";
pub const KEY_AUTO_DOWNLOAD_UPDATE: &str = "autoDownloadUpdate";
pub const KEY_CHECK_UPDATES_ON_STARTUP: &str = "checkUpdatesOnStartup";
pub const KEY_UPDATE_ENDPOINT: &str = "updateEndpoint";

fn defaults() -> HashMap<String, JsonValue> {
  HashMap::from([
    (KEY_UPDATE_CHANNEL.to_string(), json!("stable")),
    (KEY_AUTO_DOWNLOAD_UPDATE.to_string(), json!(false)),
    (KEY_CHECK_UPDATES_ON_STARTUP.to_string(), json!(true)),
    (KEY_UPDATE_ENDPOINT.to_string(), json!(DEFAULT_UPDATE_ENDPOINT)),
  ])
}

#[derive(Clone)]
pub struct SettingsStore<R: Runtime> {
  store: Arc<Store<R>>,
}

impl<R: Runtime> SettingsStore<R> {
  pub fn new(app: &tauri::AppHandle<R>) -> tauri_plugin_store::Result<Self> {
    let store = StoreBuilder::new(app, SETTINGS_STORE_FILE)
      .defaults(defaults())
      .auto_save(Duration::from_millis(200))
      .build()?;
    Ok(Self { store })
  }

  pub fn get_bool(&self, key: &str, fallback: bool) -> bool {
    self
      .store
      .get(key)
      .and_then(|v| v.as_bool())
      .unwrap_or(fallback)
  }

  pub fn get_string(&self, key: &str) -> Option<String> {
    let v = self.store.get(key)?;
    let s = v.as_str()?.trim();
    if s.is_empty() {
      None
    } else {
      Some(s.to_string())
    }
  }

  pub fn set(&self, key: &str, value: impl Into<JsonValue>) {
    self.store.set(key.to_string(), value.into());
  }

  pub fn update_channel(&self) -> UpdateChannel {
    self
      .get_string(KEY_UPDATE_CHANNEL)
      .and_then(|s| s.parse().ok())
      .unwrap_or_default()
  }

  pub fn update_config(&self) -> UpdateConfig {
    UpdateConfig {
      channel: self.update_channel(),
      auto_download: self.get_bool(KEY_AUTO_DOWNLOAD_UPDATE, false),
    }
  }

  pub fn update_endpoint(&self) -> String {
    self
      .get_string(KEY_UPDATE_ENDPOINT)
      .unwrap_or_else(|| DEFAULT_UPDATE_ENDPOINT.to_string())
  }
}
