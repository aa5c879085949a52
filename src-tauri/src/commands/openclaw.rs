use super::CommandResult;
use crate::paths::{openclaw_status, OpenClawStatus};
use crate::types::{IpcErrorCode, IpcResult};
use tauri::{AppHandle, Manager, Runtime};

#[tauri::command]
pub async fn openclaw_get_status<R: Runtime>(
    app: AppHandle<R>,
) -> CommandResult<IpcResult<OpenClawStatus>> {
    Ok(match app.path().resource_dir() {
        Ok(dir) => IpcResult::ok(openclaw_status(&dir)),
        Err(e) => IpcResult::err(IpcErrorCode::Storage, e.to_string()),
    })
}
