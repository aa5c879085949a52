use super::backend::{ChunkCallback, UpdateBackend, UpdateError};
use super::status::{UpdateChannel, UpdateInfo};
use tauri::{AppHandle, Runtime, Url};
use tauri_plugin_updater::{Update, UpdaterExt as _};
use tokio::sync::Mutex;

pub const DEFAULT_UPDATE_ENDPOINT: &str =
    "https://github.com/ValueCell-ai/ClawX/releases/latest/download/latest-{channel}.json";

struct Pending {
    update: Update,
    bytes: Option<Vec<u8>>,
}

/// [`UpdateBackend`] on top of `tauri-plugin-updater`.
pub struct TauriUpdateBackend<R: Runtime> {
    app: AppHandle<R>,
    endpoint_template: String,
    pending: Mutex<Option<Pending>>,
}

impl<R: Runtime> TauriUpdateBackend<R> {
    pub fn new(app: AppHandle<R>, endpoint_template: impl Into<String>) -> Self {
        Self {
            app,
            endpoint_template: endpoint_template.into(),
            pending: Mutex::new(None),
        }
    }

    fn endpoint(&self, channel: UpdateChannel) -> Result<Url, UpdateError> {
        let raw = self.endpoint_template.replace("{channel}", channel.as_str());
        Url::parse(&raw).map_err(|e| UpdateError::Backend(format!("invalid update endpoint: {e}")))
    }
}

fn backend_err(e: impl std::fmt::Display) -> UpdateError {
    UpdateError::Backend(e.to_string())
}

impl<R: Runtime> UpdateBackend for TauriUpdateBackend<R> {
    fn current_version(&self) -> String {
        self.app.package_info().version.to_string()
    }

    async fn check(&self, channel: UpdateChannel) -> Result<Option<UpdateInfo>, UpdateError> {
        let updater = self
            .app
            .updater_builder()
            .endpoints(vec![self.endpoint(channel)?])
            .map_err(backend_err)?
            .build()
            .map_err(backend_err)?;

        let found = updater.check().await.map_err(backend_err)?;
        let mut pending = self.pending.lock().await;
        let Some(update) = found else {
            *pending = None;
            return Ok(None);
        };

        let info = UpdateInfo {
            version: update.version.clone(),
            release_date: update.date.map(|d| d.to_string()),
            release_notes: update.body.clone(),
        };
        *pending = Some(Pending {
            update,
            bytes: None,
        });
        Ok(Some(info))
    }

    async fn download(&self, mut on_chunk: ChunkCallback) -> Result<(), UpdateError> {
        let update = {
            let pending = self.pending.lock().await;
            pending
                .as_ref()
                .map(|p| p.update.clone())
                .ok_or(UpdateError::NoUpdateAvailable)?
        };

        let bytes = update
            .download(move |chunk_len, content_length| on_chunk(chunk_len, content_length), || {})
            .await
            .map_err(backend_err)?;

        if let Some(pending) = self.pending.lock().await.as_mut() {
            pending.bytes = Some(bytes);
        }
        Ok(())
    }

    async fn install(&self) -> Result<(), UpdateError> {
        let pending = self.pending.lock().await.take();
        let Some(Pending {
            update,
            bytes: Some(bytes),
        }) = pending
        else {
            return Err(UpdateError::NotDownloaded);
        };

        update.install(bytes).map_err(backend_err)?;
        tracing::info!("update installed, restarting");
        self.app.restart()
    }
}
