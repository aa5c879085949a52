use super::CommandResult;
use crate::redact::redact_secrets;
use crate::settings::{KEY_AUTO_DOWNLOAD_UPDATE, KEY_UPDATE_CHANNEL};
use crate::state::AppState;
use crate::types::{IpcErrorCode, IpcResult};
use crate::updater::{UpdateChannel, UpdateError, UpdateStatus};
use tauri::{Runtime, State};

fn updater_err<T>(e: UpdateError) -> IpcResult<T> {
    let code = match e {
        UpdateError::Backend(_) => IpcErrorCode::Updater,
        UpdateError::NoUpdateAvailable | UpdateError::NotDownloaded => IpcErrorCode::Validation,
    };
    IpcResult::err(code, redact_secrets(&e.to_string()).to_string())
}

#[tauri::command]
pub async fn update_status<R: Runtime>(
    state: State<'_, AppState<R>>,
) -> CommandResult<IpcResult<UpdateStatus>> {
    Ok(IpcResult::ok(state.updater.current_status()))
}

#[tauri::command]
pub async fn update_version<R: Runtime>(
    state: State<'_, AppState<R>>,
) -> CommandResult<IpcResult<String>> {
    Ok(IpcResult::ok(state.updater.version()))
}

#[tauri::command]
pub async fn update_check<R: Runtime>(
    state: State<'_, AppState<R>>,
) -> CommandResult<IpcResult<UpdateStatus>> {
    Ok(match state.updater.check_for_updates().await {
        Ok(status) => IpcResult::ok(status),
        Err(e) => updater_err(e),
    })
}

#[tauri::command]
pub async fn update_download<R: Runtime>(
    state: State<'_, AppState<R>>,
) -> CommandResult<IpcResult<UpdateStatus>> {
    Ok(match state.updater.download_update().await {
        Ok(status) => IpcResult::ok(status),
        Err(e) => updater_err(e),
    })
}

#[tauri::command]
pub async fn update_install<R: Runtime>(
    state: State<'_, AppState<R>>,
) -> CommandResult<IpcResult<()>> {
    Ok(match state.updater.install_update().await {
        Ok(()) => IpcResult::ok(()),
        Err(e) => updater_err(e),
    })
}

#[tauri::command]
pub async fn update_set_channel<R: Runtime>(
    state: State<'_, AppState<R>>,
    channel: String,
) -> CommandResult<IpcResult<()>> {
    let channel = match channel.parse::<UpdateChannel>() {
        Ok(channel) => channel,
        Err(message) => return Ok(IpcResult::err(IpcErrorCode::Validation, message)),
    };
    state.settings.set(KEY_UPDATE_CHANNEL, channel.as_str());
    state.updater.set_channel(channel);
    Ok(IpcResult::ok(()))
}

#[tauri::command]
pub async fn update_set_auto_download<R: Runtime>(
    state: State<'_, AppState<R>>,
    enable: bool,
) -> CommandResult<IpcResult<()>> {
    state.settings.set(KEY_AUTO_DOWNLOAD_UPDATE, enable);
    state.updater.set_auto_download(enable);
    Ok(IpcResult::ok(()))
}
