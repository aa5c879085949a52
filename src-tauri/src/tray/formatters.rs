use crate::updater::{UpdateState, UpdateStatus};

pub fn format_percent(percent: f64) -> String {
    if !percent.is_finite() {
        return "--%".to_string();
    }
    format!("{}%", percent.clamp(0.0, 100.0).round() as u8)
}

fn version_suffix(status: &UpdateStatus) -> String {
    status
        .info
        .as_ref()
        .map(|i| format!(" v{}", i.version.trim_start_matches('v')))
        .unwrap_or_default()
}

/// Text of the disabled status line in the tray menu.
pub fn format_update_status_line(status: &UpdateStatus) -> String {
    match status.status {
        UpdateState::Idle => "Updates: not checked yet".to_string(),
        UpdateState::Checking => "Checking for updates…".to_string(),
        UpdateState::Available => format!("Update available:{}", version_suffix(status)),
        UpdateState::NotAvailable => "ClawX is up to date".to_string(),
        UpdateState::Downloading => {
            let percent = status
                .progress
                .as_ref()
                .map(|p| format_percent(p.percent))
                .unwrap_or_else(|| "0%".to_string());
            format!("Downloading update{} ({percent})", version_suffix(status))
        }
        UpdateState::Downloaded => format!("Update ready to install:{}", version_suffix(status)),
        UpdateState::Error => "Update check failed".to_string(),
    }
}

/// Label of the actionable update item; the action follows the state.
pub fn format_update_action_label(status: &UpdateStatus) -> &'static str {
    match status.status {
        UpdateState::Available => "Download Update",
        UpdateState::Downloaded => "Restart to Update",
        UpdateState::Checking => "Checking for Updates…",
        UpdateState::Downloading => "Downloading Update…",
        UpdateState::Idle | UpdateState::NotAvailable | UpdateState::Error => {
            "Check for Updates…"
        }
    }
}

pub fn update_action_enabled(status: &UpdateStatus) -> bool {
    !matches!(status.status, UpdateState::Checking | UpdateState::Downloading)
}

pub fn format_tray_tooltip(status: &UpdateStatus) -> String {
    match status.status {
        UpdateState::Available | UpdateState::Downloaded => {
            format!("ClawX - {}", format_update_status_line(status))
        }
        _ => "ClawX".to_string(),
    }
}
