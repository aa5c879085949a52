use super::backend::{ChunkCallback, UpdateBackend, UpdateError};
use super::progress::ProgressTracker;
use super::status::{StatusChange, UpdateChannel, UpdateEvent, UpdateInfo, UpdateState, UpdateStatus};
use crate::redact::redact_secrets;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

pub type StatusCallback = Arc<dyn Fn(&StatusChange) + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateConfig {
    pub channel: UpdateChannel,
    pub auto_download: bool,
}

struct Shared {
    status: UpdateStatus,
    seq: u64,
    next_subscriber: u64,
    subscribers: Vec<(u64, StatusCallback)>,
    config: UpdateConfig,
}

/// Update status state machine over an [`UpdateBackend`].
///
/// Starting an operation is an atomic test-and-transition: a check while one
/// is in flight (or while an update is pending) starts nothing and reports
/// the current status, and the same holds for downloads.
pub struct UpdateController<B> {
    backend: Arc<B>,
    shared: Arc<Mutex<Shared>>,
}

impl<B> Clone for UpdateController<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            shared: self.shared.clone(),
        }
    }
}

/// Keeps a status callback registered until dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    shared: Weak<Mutex<Shared>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            let mut guard = lock(&shared);
            guard.subscribers.retain(|(id, _)| *id != self.id);
        }
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<B: UpdateBackend> UpdateController<B> {
    pub fn new(backend: B, config: UpdateConfig) -> Self {
        Self {
            backend: Arc::new(backend),
            shared: Arc::new(Mutex::new(Shared {
                status: UpdateStatus::default(),
                seq: 0,
                next_subscriber: 0,
                subscribers: Vec::new(),
                config,
            })),
        }
    }

    pub fn current_status(&self) -> UpdateStatus {
        lock(&self.shared).status.clone()
    }

    /// Sequence number of the last applied change (0 before any change).
    pub fn seq(&self) -> u64 {
        lock(&self.shared).seq
    }

    pub fn subscribe(&self, callback: impl Fn(&StatusChange) + Send + Sync + 'static) -> Subscription {
        let mut shared = lock(&self.shared);
        let id = shared.next_subscriber;
        shared.next_subscriber += 1;
        shared.subscribers.push((id, Arc::new(callback)));
        Subscription {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    pub fn version(&self) -> String {
        self.backend.current_version()
    }

    pub fn channel(&self) -> UpdateChannel {
        lock(&self.shared).config.channel
    }

    pub fn set_channel(&self, channel: UpdateChannel) {
        lock(&self.shared).config.channel = channel;
        tracing::info!(%channel, "update channel changed");
    }

    pub fn auto_download(&self) -> bool {
        lock(&self.shared).config.auto_download
    }

    pub fn set_auto_download(&self, enabled: bool) {
        lock(&self.shared).config.auto_download = enabled;
        tracing::info!(enabled, "update auto-download changed");
    }

    pub async fn check_for_updates(&self) -> Result<UpdateStatus, UpdateError> {
        if !self.dispatch(UpdateEvent::Checking) {
            return Ok(self.current_status());
        }

        let channel = self.channel();
        tracing::info!(%channel, "checking for updates");
        match self.backend.check(channel).await {
            Ok(Some(info)) => {
                tracing::info!(version = %info.version, "update available");
                self.dispatch(UpdateEvent::Available(info));
                if self.auto_download() {
                    return self.download_update().await;
                }
            }
            Ok(None) => {
                tracing::info!("no update available");
                self.dispatch(UpdateEvent::NotAvailable(Some(UpdateInfo {
                    version: self.version(),
                    release_date: None,
                    release_notes: None,
                })));
            }
            Err(e) => return Err(self.fail(e)),
        }
        Ok(self.current_status())
    }

    pub async fn download_update(&self) -> Result<UpdateStatus, UpdateError> {
        if !self.dispatch(UpdateEvent::DownloadStarted) {
            let current = self.current_status();
            return match current.status {
                UpdateState::Downloading | UpdateState::Downloaded => Ok(current),
                _ => Err(UpdateError::NoUpdateAvailable),
            };
        }

        tracing::info!("downloading update");
        let this = self.clone();
        let mut tracker = ProgressTracker::new();
        let on_chunk: ChunkCallback = Box::new(move |chunk_len, content_length| {
            let progress = tracker.record(chunk_len, content_length);
            this.dispatch(UpdateEvent::Progress(progress));
        });

        match self.backend.download(on_chunk).await {
            Ok(()) => {
                tracing::info!("update downloaded");
                self.dispatch(UpdateEvent::Downloaded(None));
                Ok(self.current_status())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    pub async fn install_update(&self) -> Result<(), UpdateError> {
        if self.current_status().status != UpdateState::Downloaded {
            return Err(UpdateError::NotDownloaded);
        }

        tracing::info!("installing update");
        self.backend.install().await.map_err(|e| self.fail(e))
    }

    fn fail(&self, e: UpdateError) -> UpdateError {
        let message = redact_secrets(&e.to_string()).into_owned();
        tracing::error!("updater error: {message}");
        self.dispatch(UpdateEvent::Error(message));
        e
    }

    fn dispatch(&self, event: UpdateEvent) -> bool {
        let (change, subscribers) = {
            let mut shared = lock(&self.shared);
            let Some(next) = shared.status.apply(&event) else {
                tracing::warn!(
                    from = shared.status.status.as_str(),
                    ?event,
                    "ignoring update event"
                );
                return false;
            };
            shared.seq += 1;
            shared.status = next.clone();
            let subscribers: Vec<StatusCallback> =
                shared.subscribers.iter().map(|(_, cb)| cb.clone()).collect();
            (
                StatusChange {
                    seq: shared.seq,
                    event,
                    status: next,
                },
                subscribers,
            )
        };

        // Callbacks may read the controller, so the lock is released first.
        for callback in subscribers {
            callback(&change);
        }
        true
    }
}
