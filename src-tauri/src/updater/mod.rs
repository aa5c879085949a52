mod backend;
mod controller;
mod progress;
mod status;
#[cfg(feature = "desktop")]
mod tauri_backend;

pub use backend::{ChunkCallback, UpdateBackend, UpdateError};
pub use controller::{StatusCallback, Subscription, UpdateConfig, UpdateController};
pub use progress::ProgressTracker;
pub use status::{
    ProgressInfo, StatusChange, UpdateChannel, UpdateEvent, UpdateInfo, UpdateState, UpdateStatus,
};
#[cfg(feature = "desktop")]
pub use tauri_backend::{TauriUpdateBackend, DEFAULT_UPDATE_ENDPOINT};

/// Whole-status feed; every change is published here.
pub const EVENT_STATUS_CHANGED: &str = "update:status-changed";
pub const EVENT_CHECKING: &str = "update:checking";
pub const EVENT_AVAILABLE: &str = "update:available";
pub const EVENT_NOT_AVAILABLE: &str = "update:not-available";
pub const EVENT_PROGRESS: &str = "update:progress";
pub const EVENT_DOWNLOADED: &str = "update:downloaded";
pub const EVENT_ERROR: &str = "update:error";
