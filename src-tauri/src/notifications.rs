use crate::updater::{UpdateEvent, UpdateInfo};
use tauri::{AppHandle, Runtime};
use tauri_plugin_notification::NotificationExt as _;

fn notify<R: Runtime>(app: &AppHandle<R>, body: &str) {
    let _ = app
        .notification()
        .builder()
        .title("ClawX")
        .body(body)
        .show();
}

fn version_of(info: Option<&UpdateInfo>) -> String {
    info.map(|i| format!(" v{}", i.version.trim_start_matches('v')))
        .unwrap_or_default()
}

/// Desktop notification for the update events worth interrupting the user.
pub fn notify_update_event<R: Runtime>(
    app: &AppHandle<R>,
    event: &UpdateEvent,
    info: Option<&UpdateInfo>,
) {
    match event {
        UpdateEvent::Downloaded(_) => notify(
            app,
            &format!(
                "Update{} downloaded. Restart ClawX to install it.",
                version_of(info)
            ),
        ),
        UpdateEvent::Available(found) => notify(
            app,
            &format!(
                "Update{} is available.",
                version_of(Some(found))
            ),
        ),
        _ => {}
    }
}
