#[cfg(feature = "desktop")]
mod app;
#[cfg(feature = "desktop")]
mod commands;
pub mod logger;
#[cfg(feature = "desktop")]
mod notifications;
pub mod paths;
pub mod redact;
pub mod secrets;
#[cfg(feature = "desktop")]
mod settings;
#[cfg(feature = "desktop")]
mod state;
pub mod store;
pub mod tray;
pub mod types;
pub mod updater;
pub mod validation;
#[cfg(feature = "desktop")]
mod windows;

#[cfg(feature = "desktop")]
pub fn run() {
    app::run();
}
