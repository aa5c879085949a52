use super::formatters::{
    format_update_action_label, format_update_status_line, update_action_enabled,
};
use crate::updater::UpdateStatus;
use tauri::menu::{Menu, MenuItem, PredefinedMenuItem};
use tauri::{AppHandle, Runtime};

use super::{ITEM_OPEN_LOGS, ITEM_QUIT, ITEM_SHOW_WINDOW, ITEM_UPDATE_ACTION, ITEM_UPDATE_STATUS};

pub(super) fn build_menu<R: Runtime>(
    app: &AppHandle<R>,
    status: &UpdateStatus,
) -> tauri::Result<Menu<R>> {
    let show = MenuItem::with_id(app, ITEM_SHOW_WINDOW, "Show ClawX", true, None::<&str>)?;
    let update_status = MenuItem::with_id(
        app,
        ITEM_UPDATE_STATUS,
        format_update_status_line(status),
        false,
        None::<&str>,
    )?;
    let update_action = MenuItem::with_id(
        app,
        ITEM_UPDATE_ACTION,
        format_update_action_label(status),
        update_action_enabled(status),
        None::<&str>,
    )?;
    let open_logs = MenuItem::with_id(app, ITEM_OPEN_LOGS, "Open Logs Folder", true, None::<&str>)?;
    let quit = MenuItem::with_id(app, ITEM_QUIT, "Quit ClawX", true, Some("CmdOrCtrl+Q"))?;

    Menu::with_items(
        app,
        &[
            &show,
            &PredefinedMenuItem::separator(app)?,
            &update_status,
            &update_action,
            &PredefinedMenuItem::separator(app)?,
            &open_logs,
            &quit,
        ],
    )
}
