use super::status::ProgressInfo;
use std::time::{Duration, Instant};

/// Turns raw download chunks into UI progress records.
#[derive(Debug)]
pub struct ProgressTracker {
    started_at: Instant,
    transferred: u64,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::started_at(Instant::now())
    }

    pub fn started_at(started_at: Instant) -> Self {
        Self {
            started_at,
            transferred: 0,
        }
    }

    pub fn record(&mut self, chunk_len: usize, content_length: Option<u64>) -> ProgressInfo {
        self.record_at(chunk_len, content_length, Instant::now())
    }

    pub fn record_at(
        &mut self,
        chunk_len: usize,
        content_length: Option<u64>,
        now: Instant,
    ) -> ProgressInfo {
        let delta = chunk_len as u64;
        self.transferred = self.transferred.saturating_add(delta);

        let total = content_length.unwrap_or(0);
        let percent = if total == 0 {
            0.0
        } else {
            (self.transferred as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
        };

        let elapsed = now
            .saturating_duration_since(self.started_at)
            .max(Duration::from_millis(1));
        let bytes_per_second = self.transferred as f64 / elapsed.as_secs_f64();

        ProgressInfo {
            total,
            delta,
            transferred: self.transferred,
            percent,
            bytes_per_second,
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
