use crate::secrets::CredentialStore;
use crate::settings::SettingsStore;
use crate::tray::TrayUi;
use crate::updater::{Subscription, TauriUpdateBackend, UpdateController};
use crate::validation::KeyValidator;
use std::path::PathBuf;
use std::sync::Arc;

pub type Updater<R> = UpdateController<TauriUpdateBackend<R>>;

pub struct AppState<R: tauri::Runtime> {
    pub settings: SettingsStore<R>,
    pub credentials: Arc<CredentialStore>,
    pub validator: Arc<KeyValidator>,
    pub updater: Updater<R>,
    pub tray: TrayUi<R>,
    /// Logs go to the dated file under `log_dir` when set.
    pub file_logging: bool,
    pub log_dir: PathBuf,
    /// Forwards controller changes to the UI for the lifetime of the app.
    pub update_feed: Arc<Subscription>,
}

impl<R: tauri::Runtime> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            settings: self.settings.clone(),
            credentials: self.credentials.clone(),
            validator: self.validator.clone(),
            updater: self.updater.clone(),
            tray: self.tray.clone(),
            file_logging: self.file_logging,
            log_dir: self.log_dir.clone(),
            update_feed: self.update_feed.clone(),
        }
    }
}
