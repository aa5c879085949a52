use super::status::{UpdateChannel, UpdateInfo};
use std::future::Future;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UpdateError {
    #[error("{0}")]
    Backend(String),
    #[error("no update is available to download")]
    NoUpdateAvailable,
    #[error("no update has been downloaded")]
    NotDownloaded,
}

/// Raw download callback: `(chunk_len, content_length)`.
pub type ChunkCallback = Box<dyn FnMut(usize, Option<u64>) + Send>;

/// Platform auto-update client driven by [`super::UpdateController`].
pub trait UpdateBackend: Send + Sync + 'static {
    fn current_version(&self) -> String;

    /// Looks for a newer release on `channel` and remembers it for
    /// [`UpdateBackend::download`].
    fn check(
        &self,
        channel: UpdateChannel,
    ) -> impl Future<Output = Result<Option<UpdateInfo>, UpdateError>> + Send;

    fn download(
        &self,
        on_chunk: ChunkCallback,
    ) -> impl Future<Output = Result<(), UpdateError>> + Send;

    /// Installs the downloaded release; implementations restart the process
    /// on success.
    fn install(&self) -> impl Future<Output = Result<(), UpdateError>> + Send;
}
