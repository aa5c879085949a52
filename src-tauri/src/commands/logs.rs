use super::CommandResult;
use crate::logger::{current_log_file, read_recent_lines};
use crate::redact::redact_secrets;
use crate::state::AppState;
use crate::types::{IpcErrorCode, IpcResult};
use std::path::{Path, PathBuf};
use tauri::{AppHandle, Runtime, State};
use tauri_plugin_opener::OpenerExt as _;

const DEFAULT_RECENT_LINES: usize = 200;

fn active_log_file<R: Runtime>(state: &AppState<R>) -> Option<PathBuf> {
    state
        .file_logging
        .then(|| current_log_file(&state.log_dir))
}

pub fn open_log_dir<R: Runtime>(app: &AppHandle<R>, dir: &Path) {
    if let Err(e) = app
        .opener()
        .open_path(dir.to_string_lossy(), None::<&str>)
    {
        tracing::warn!("failed to open log directory: {e}");
    }
}

#[tauri::command]
pub async fn log_get_file_path<R: Runtime>(
    state: State<'_, AppState<R>>,
) -> CommandResult<IpcResult<Option<String>>> {
    Ok(IpcResult::ok(
        active_log_file(&state).map(|p| p.to_string_lossy().into_owned()),
    ))
}

#[tauri::command]
pub async fn log_read_recent<R: Runtime>(
    state: State<'_, AppState<R>>,
    max_lines: Option<usize>,
) -> CommandResult<IpcResult<Vec<String>>> {
    let Some(path) = active_log_file(&state) else {
        return Ok(IpcResult::ok(vec![]));
    };
    Ok(
        match read_recent_lines(&path, max_lines.unwrap_or(DEFAULT_RECENT_LINES)).await {
            Ok(lines) => IpcResult::ok(lines),
            Err(e) => IpcResult::err(
                IpcErrorCode::Storage,
                redact_secrets(&e.to_string()).to_string(),
            ),
        },
    )
}

#[tauri::command]
pub async fn log_open_dir<R: Runtime>(
    app: AppHandle<R>,
    state: State<'_, AppState<R>>,
) -> CommandResult<IpcResult<()>> {
    open_log_dir(&app, &state.log_dir);
    Ok(IpcResult::ok(()))
}
