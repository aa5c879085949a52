use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateState {
    Idle,
    Checking,
    Available,
    NotAvailable,
    Downloading,
    Downloaded,
    Error,
}

impl UpdateState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Checking => "checking",
            Self::Available => "available",
            Self::NotAvailable => "not-available",
            Self::Downloading => "downloading",
            Self::Downloaded => "downloaded",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateChannel {
    #[default]
    Stable,
    Beta,
    Dev,
}

impl UpdateChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Beta => "beta",
            Self::Dev => "dev",
        }
    }
}

impl fmt::Display for UpdateChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "stable" => Ok(Self::Stable),
            "beta" => Ok(Self::Beta),
            "dev" => Ok(Self::Dev),
            other => Err(format!("unknown update channel: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInfo {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressInfo {
    pub total: u64,
    pub delta: u64,
    pub transferred: u64,
    pub percent: f64,
    pub bytes_per_second: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatus {
    pub status: UpdateState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<UpdateInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for UpdateStatus {
    fn default() -> Self {
        Self {
            status: UpdateState::Idle,
            info: None,
            progress: None,
            error: None,
        }
    }
}

/// Everything the controller can observe, from its own actions or the
/// backend.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateEvent {
    Checking,
    Available(UpdateInfo),
    NotAvailable(Option<UpdateInfo>),
    DownloadStarted,
    Progress(ProgressInfo),
    Downloaded(Option<UpdateInfo>),
    Error(String),
}

impl UpdateEvent {
    /// Dedicated UI channel for this event, on top of the whole-status feed.
    pub fn channel(&self) -> Option<&'static str> {
        match self {
            Self::Checking => Some(super::EVENT_CHECKING),
            Self::Available(_) => Some(super::EVENT_AVAILABLE),
            Self::NotAvailable(_) => Some(super::EVENT_NOT_AVAILABLE),
            Self::DownloadStarted => None,
            Self::Progress(_) => Some(super::EVENT_PROGRESS),
            Self::Downloaded(_) => Some(super::EVENT_DOWNLOADED),
            Self::Error(_) => Some(super::EVENT_ERROR),
        }
    }
}

impl UpdateStatus {
    /// Next status for `event`, or `None` when the event is not legal from
    /// the current state.
    pub fn apply(&self, event: &UpdateEvent) -> Option<UpdateStatus> {
        use UpdateState::*;

        let next = match (self.status, event) {
            (Idle | NotAvailable | Error, UpdateEvent::Checking) => UpdateStatus {
                status: Checking,
                ..UpdateStatus::default()
            },
            (Checking, UpdateEvent::Available(info)) => UpdateStatus {
                status: Available,
                info: Some(info.clone()),
                ..UpdateStatus::default()
            },
            (Checking, UpdateEvent::NotAvailable(info)) => UpdateStatus {
                status: NotAvailable,
                info: info.clone(),
                ..UpdateStatus::default()
            },
            (Available, UpdateEvent::DownloadStarted) => UpdateStatus {
                status: Downloading,
                info: self.info.clone(),
                ..UpdateStatus::default()
            },
            (Downloading, UpdateEvent::Progress(progress)) => UpdateStatus {
                status: Downloading,
                info: self.info.clone(),
                progress: Some(progress.clone()),
                error: None,
            },
            (Downloading, UpdateEvent::Downloaded(info)) => UpdateStatus {
                status: Downloaded,
                info: info.clone().or_else(|| self.info.clone()),
                progress: self.progress.clone(),
                error: None,
            },
            (_, UpdateEvent::Error(message)) => UpdateStatus {
                status: Error,
                info: self.info.clone(),
                progress: None,
                error: Some(message.clone()),
            },
            _ => return None,
        };
        Some(next)
    }
}

/// One entry of the status feed. `seq` increases by one per change so a
/// subscriber can detect gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub seq: u64,
    pub event: UpdateEvent,
    pub status: UpdateStatus,
}

impl StatusChange {
    /// Body of the whole-status feed message.
    pub fn feed_payload(&self) -> JsonValue {
        let mut payload = json!(self.status);
        payload["seq"] = json!(self.seq);
        payload
    }

    /// Body of the event-specific channel message.
    pub fn event_payload(&self) -> JsonValue {
        match &self.event {
            UpdateEvent::Checking | UpdateEvent::DownloadStarted => JsonValue::Null,
            UpdateEvent::Available(info) => json!(info),
            UpdateEvent::NotAvailable(info) => json!(info),
            UpdateEvent::Progress(progress) => json!(progress),
            UpdateEvent::Downloaded(_) => json!(self.status.info),
            UpdateEvent::Error(message) => json!({ "message": message }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(version: &str) -> UpdateInfo {
        UpdateInfo {
            version: version.to_string(),
            release_date: None,
            release_notes: None,
        }
    }

    fn progress(transferred: u64) -> ProgressInfo {
        ProgressInfo {
            total: 100,
            delta: 10,
            transferred,
            percent: transferred as f64,
            bytes_per_second: 10.0,
        }
    }

    fn at(state: UpdateState) -> UpdateStatus {
        UpdateStatus {
            status: state,
            info: Some(info("1.2.0")),
            progress: Some(progress(50)),
            error: None,
        }
    }

    #[test]
    fn check_is_only_legal_from_resting_states() {
        for state in [UpdateState::Idle, UpdateState::NotAvailable, UpdateState::Error] {
            let next = at(state).apply(&UpdateEvent::Checking).unwrap();
            assert_eq!(next, UpdateStatus {
                status: UpdateState::Checking,
                ..UpdateStatus::default()
            });
        }
        for state in [
            UpdateState::Checking,
            UpdateState::Available,
            UpdateState::Downloading,
            UpdateState::Downloaded,
        ] {
            assert!(at(state).apply(&UpdateEvent::Checking).is_none());
        }
    }

    #[test]
    fn available_never_carries_progress() {
        let next = UpdateStatus::default()
            .apply(&UpdateEvent::Checking)
            .unwrap()
            .apply(&UpdateEvent::Available(info("2.0.0")))
            .unwrap();
        assert_eq!(next.status, UpdateState::Available);
        assert_eq!(next.info, Some(info("2.0.0")));
        assert!(next.progress.is_none());
    }

    #[test]
    fn download_flow_replaces_progress_and_keeps_info() {
        let available = UpdateStatus {
            status: UpdateState::Available,
            info: Some(info("2.0.0")),
            ..UpdateStatus::default()
        };
        let downloading = available.apply(&UpdateEvent::DownloadStarted).unwrap();
        assert_eq!(downloading.status, UpdateState::Downloading);
        assert!(downloading.progress.is_none());

        let p1 = downloading.apply(&UpdateEvent::Progress(progress(10))).unwrap();
        let p2 = p1.apply(&UpdateEvent::Progress(progress(90))).unwrap();
        assert_eq!(p2.progress, Some(progress(90)));
        assert_eq!(p2.info, Some(info("2.0.0")));

        let done = p2.apply(&UpdateEvent::Downloaded(None)).unwrap();
        assert_eq!(done.status, UpdateState::Downloaded);
        assert_eq!(done.info, Some(info("2.0.0")));
    }

    #[test]
    fn failure_from_any_state_clears_progress() {
        for state in [
            UpdateState::Idle,
            UpdateState::Checking,
            UpdateState::Available,
            UpdateState::NotAvailable,
            UpdateState::Downloading,
            UpdateState::Downloaded,
            UpdateState::Error,
        ] {
            let next = at(state).apply(&UpdateEvent::Error("boom".to_string())).unwrap();
            assert_eq!(next.status, UpdateState::Error);
            assert_eq!(next.error.as_deref(), Some("boom"));
            assert!(next.progress.is_none());
        }
    }

    #[test]
    fn out_of_order_events_are_rejected() {
        assert!(UpdateStatus::default()
            .apply(&UpdateEvent::Progress(progress(1)))
            .is_none());
        assert!(UpdateStatus::default()
            .apply(&UpdateEvent::Available(info("1.0.0")))
            .is_none());
        assert!(at(UpdateState::Available)
            .apply(&UpdateEvent::Downloaded(None))
            .is_none());
    }

    #[test]
    fn status_serializes_for_the_ui() {
        let status = UpdateStatus {
            status: UpdateState::NotAvailable,
            info: None,
            progress: None,
            error: None,
        };
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            json!({ "status": "not-available" })
        );
        let value = serde_json::to_value(progress(5)).unwrap();
        assert_eq!(value["bytesPerSecond"], json!(10.0));
    }

    #[test]
    fn channel_parses_known_names() {
        assert_eq!("beta".parse::<UpdateChannel>(), Ok(UpdateChannel::Beta));
        assert!("nightly".parse::<UpdateChannel>().is_err());
        assert_eq!(UpdateChannel::default().to_string(), "stable");
    }

    #[test]
    fn feed_payload_carries_whole_status_and_seq() {
        let change = StatusChange {
            seq: 7,
            event: UpdateEvent::Error("offline".to_string()),
            status: UpdateStatus {
                status: UpdateState::Error,
                info: None,
                progress: None,
                error: Some("offline".to_string()),
            },
        };
        assert_eq!(
            change.feed_payload(),
            json!({ "status": "error", "error": "offline", "seq": 7 })
        );
        assert_eq!(change.event_payload(), json!({ "message": "offline" }));
    }

    #[test]
    fn downloaded_payload_uses_status_info() {
        let change = StatusChange {
            seq: 1,
            event: UpdateEvent::Downloaded(None),
            status: UpdateStatus {
                status: UpdateState::Downloaded,
                info: Some(info("3.0.0")),
                progress: None,
                error: None,
            },
        };
        assert_eq!(change.event_payload()["version"], json!("3.0.0"));
    }
}
