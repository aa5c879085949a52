use crate::commands;
use crate::logger;
use crate::notifications::notify_update_event;
use crate::paths;
use crate::secrets::{
  describe_store_error, CredentialStore, KeyringCipher, SecretCipher, KEYRING_USER_MASTER_KEY,
};
use crate::settings::{SettingsStore, KEY_CHECK_UPDATES_ON_STARTUP};
use crate::state::{AppState, Updater};
use crate::tray::{self, TrayUi};
use crate::updater::{
  StatusChange, TauriUpdateBackend, UpdateController, UpdateEvent, UpdateState,
  EVENT_STATUS_CHANGED,
};
use crate::validation::KeyValidator;
use crate::windows::{self, MAIN_WINDOW_LABEL};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tauri::{AppHandle, Emitter, Manager, Runtime, WindowEvent};

fn forward_update_changes<R: Runtime>(
  app: AppHandle<R>,
  tray: TrayUi<R>,
) -> impl Fn(&StatusChange) + Send + Sync + 'static {
  // Progress arrives per chunk; the tray only follows whole-percent steps.
  let shown_percent = AtomicU8::new(u8::MAX);
  move |change| {
    if let Err(e) = app.emit(EVENT_STATUS_CHANGED, change.feed_payload()) {
      tracing::warn!("failed to emit update status: {e}");
    }
    if let Some(channel) = change.event.channel() {
      let _ = app.emit(channel, change.event_payload());
    }
    let refresh_tray = match &change.event {
      UpdateEvent::Progress(progress) => {
        let percent = progress.percent.clamp(0.0, 100.0).round() as u8;
        shown_percent.swap(percent, Ordering::Relaxed) != percent
      }
      _ => true,
    };
    if refresh_tray {
      tray.update_status(&change.status);
    }
    notify_update_event(&app, &change.event, change.status.info.as_ref());
  }
}

/// Tray action: check, download or install depending on where the
/// controller is. Failures already reach the UI through the status feed.
fn run_update_action<R: Runtime>(updater: Updater<R>) {
  tauri::async_runtime::spawn(async move {
    let result = match updater.current_status().status {
      UpdateState::Available => updater.download_update().await.map(|_| ()),
      UpdateState::Downloaded => updater.install_update().await,
      _ => updater.check_for_updates().await.map(|_| ()),
    };
    if let Err(e) = result {
      tracing::debug!("tray update action finished with: {e}");
    }
  });
}

async fn open_credentials(dir: &std::path::Path) -> CredentialStore {
  let cipher: Arc<dyn SecretCipher> = Arc::new(KeyringCipher::new(KEYRING_USER_MASTER_KEY));
  match CredentialStore::open(dir, cipher.clone()).await {
    Ok(store) => store,
    Err(e) => {
      tracing::error!(
        "credential store unreadable, running with an in-memory store: {}",
        describe_store_error(&e)
      );
      CredentialStore::in_memory(cipher)
    }
  }
}

pub fn run() {
  tauri::Builder::default()
    .plugin(tauri_plugin_opener::init())
    .plugin(tauri_plugin_store::Builder::default().build())
    .plugin(tauri_plugin_notification::init())
    .plugin(tauri_plugin_updater::Builder::new().build())
    .invoke_handler(tauri::generate_handler![
      commands::providers::provider_list,
      commands::providers::provider_get,
      commands::providers::provider_save,
      commands::providers::provider_delete,
      commands::providers::provider_set_api_key,
      commands::providers::provider_delete_api_key,
      commands::providers::provider_has_api_key,
      commands::providers::provider_get_api_key,
      commands::providers::provider_set_default,
      commands::providers::provider_get_default,
      commands::providers::provider_validate_key,
      commands::providers::provider_encryption_mode,
      commands::updates::update_status,
      commands::updates::update_version,
      commands::updates::update_check,
      commands::updates::update_download,
      commands::updates::update_install,
      commands::updates::update_set_channel,
      commands::updates::update_set_auto_download,
      commands::logs::log_get_file_path,
      commands::logs::log_read_recent,
      commands::logs::log_open_dir,
      commands::openclaw::openclaw_get_status,
    ])
    .on_menu_event(|app, event| {
      let id = event.id().as_ref();
      match id {
        tray::ITEM_SHOW_WINDOW => {
          let _ = windows::show_main_window(app);
        }
        tray::ITEM_UPDATE_ACTION => {
          let updater = app.state::<AppState<tauri::Wry>>().updater.clone();
          run_update_action(updater);
        }
        tray::ITEM_OPEN_LOGS => {
          let log_dir = app.state::<AppState<tauri::Wry>>().log_dir.clone();
          commands::logs::open_log_dir(app, &log_dir);
        }
        tray::ITEM_QUIT => {
          app.exit(0);
        }
        _ => {}
      }
    })
    .on_window_event(|window, event| {
      if let WindowEvent::CloseRequested { api, .. } = event {
        if window.label() == MAIN_WINDOW_LABEL {
          let _ = window.hide();
          api.prevent_close();
        }
      }
    })
    .setup(|app| {
      let log_dir = paths::logs_dir();
      let file_logging = match logger::init(&log_dir) {
        Ok(_) => true,
        Err(e) => {
          eprintln!("file logging disabled: {e}");
          false
        }
      };
      tracing::info!("ClawX {} starting", app.package_info().version);

      let app_handle = app.handle().clone();
      let settings = SettingsStore::new(&app_handle)?;

      let data_dir = app
        .path()
        .app_data_dir()
        .unwrap_or_else(|_| paths::data_dir());
      paths::ensure_dir(&data_dir)?;
      let credentials = tauri::async_runtime::block_on(open_credentials(&data_dir));
      tracing::info!(
        "credential store ready ({:?})",
        credentials.encryption_mode()
      );

      let validator = KeyValidator::new()?;
      let tray = TrayUi::new(&app_handle)?;

      let backend = TauriUpdateBackend::new(app_handle.clone(), settings.update_endpoint());
      let updater = UpdateController::new(backend, settings.update_config());
      let update_feed =
        updater.subscribe(forward_update_changes(app_handle.clone(), tray.clone()));

      let state = AppState {
        settings: settings.clone(),
        credentials: Arc::new(credentials),
        validator: Arc::new(validator),
        updater: updater.clone(),
        tray,
        file_logging,
        log_dir,
        update_feed: Arc::new(update_feed),
      };

      if settings.get_bool(KEY_CHECK_UPDATES_ON_STARTUP, true) {
        tauri::async_runtime::spawn(async move {
          if let Err(e) = updater.check_for_updates().await {
            tracing::warn!("startup update check failed: {e}");
          }
        });
      }

      app.manage(state);
      Ok(())
    })
    .run(tauri::generate_context!())
    .expect("error while running tauri application");
}
