use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sessions at or below this length are discarded on stop.
pub const MIN_RECORDED_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FocusStatus {
    #[default]
    Idle,
    Running,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FocusState {
    pub status: FocusStatus,
    pub elapsed_secs: u64,
    pub started_at: Option<DateTime<Utc>>,
}

impl FocusState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.status == FocusStatus::Running
    }

    pub fn begin(&mut self, started_at: DateTime<Utc>) {
        *self = Self {
            status: FocusStatus::Running,
            elapsed_secs: 0,
            started_at: Some(started_at),
        };
    }

    /// Counts one second. Ignored unless running.
    pub fn tick(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.elapsed_secs = self.elapsed_secs.saturating_add(1);
        true
    }

    /// Returns to idle and hands back the elapsed seconds.
    pub fn finish(&mut self) -> u64 {
        let elapsed = self.elapsed_secs;
        *self = Self::default();
        elapsed
    }
}

/// Whole minutes worth recording for a session of `elapsed_secs`, or `None`
/// if the session was too short to keep.
pub fn recorded_minutes(elapsed_secs: u64) -> Option<u32> {
    if elapsed_secs <= MIN_RECORDED_SECS {
        return None;
    }
    Some(u32::try_from(elapsed_secs / 60).unwrap_or(u32::MAX))
}
