pub mod formatters;
#[cfg(feature = "desktop")]
mod menu_builder;

#[cfg(feature = "desktop")]
pub use ui::TrayUi;

pub const TRAY_ID: &str = "main";

pub const ITEM_SHOW_WINDOW: &str = "show_window";
pub const ITEM_UPDATE_STATUS: &str = "update_status";
pub const ITEM_UPDATE_ACTION: &str = "update_action";
pub const ITEM_OPEN_LOGS: &str = "open_logs";
pub const ITEM_QUIT: &str = "quit";

#[cfg(feature = "desktop")]
mod ui {
    use super::{formatters, menu_builder, TRAY_ID};
    use crate::updater::UpdateStatus;
    use tauri::tray::{MouseButton, MouseButtonState, TrayIcon, TrayIconBuilder, TrayIconEvent};
    use tauri::{AppHandle, Runtime};

    pub struct TrayUi<R: Runtime> {
        tray: TrayIcon<R>,
    }

    impl<R: Runtime> Clone for TrayUi<R> {
        fn clone(&self) -> Self {
            Self {
                tray: self.tray.clone(),
            }
        }
    }

    impl<R: Runtime> TrayUi<R> {
        pub fn new(app: &AppHandle<R>) -> tauri::Result<Self> {
            let status = UpdateStatus::default();
            let menu = menu_builder::build_menu(app, &status)?;

            let mut builder = TrayIconBuilder::with_id(TRAY_ID)
                .menu(&menu)
                .tooltip(formatters::format_tray_tooltip(&status))
                .show_menu_on_left_click(false)
                .on_tray_icon_event(|tray, event| {
                    if let TrayIconEvent::Click {
                        button: MouseButton::Left,
                        button_state: MouseButtonState::Up,
                        ..
                    } = event
                    {
                        let _ = crate::windows::show_main_window(tray.app_handle());
                    }
                });
            if let Some(icon) = app.default_window_icon() {
                builder = builder.icon(icon.clone());
            }

            let tray = builder.build(app)?;
            Ok(Self { tray })
        }

        pub fn update_status(&self, status: &UpdateStatus) {
            let app = self.tray.app_handle();
            if let Ok(menu) = menu_builder::build_menu(app, status) {
                let _ = self.tray.set_menu(Some(menu));
            }
            let _ = self
                .tray
                .set_tooltip(Some(formatters::format_tray_tooltip(status)));
        }
    }
}
