use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    /// Spawned, no cycle scheduled yet
    Idle,
    /// Waiting for the jittered deadline
    Scheduled,
    /// Pipeline executing on the blocking pool
    Running,
    /// Last run published
    Completed,
    /// Last run failed; a new cycle follows
    Errored,
    /// Superseded by a parameter change, or torn down
    Canceled,
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Scheduled => "scheduled",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Errored => "errored",
            Self::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

/// Snapshot of the recompute loop, published on every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleState {
    pub generation: u64,
    pub status: ScheduleStatus,
    /// Seconds until the next run, while Scheduled.
    pub next_run_eta_seconds: Option<u64>,
    pub last_error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ScheduleState {
    #[must_use]
    pub fn idle() -> Self {
        Self {
            generation: 0,
            status: ScheduleStatus::Idle,
            next_run_eta_seconds: None,
            last_error: None,
            updated_at: Utc::now(),
        }
    }

    /// Moves to `status` at `generation`, clearing the ETA.
    #[must_use]
    pub fn transition(&self, status: ScheduleStatus, generation: u64) -> Self {
        Self {
            generation,
            status,
            next_run_eta_seconds: None,
            last_error: self.last_error.clone(),
            updated_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn scheduled(&self, generation: u64, wait: Duration) -> Self {
        let mut next = self.transition(ScheduleStatus::Scheduled, generation);
        next.next_run_eta_seconds = Some(eta_seconds(wait));
        next
    }

    #[must_use]
    pub fn errored(&self, generation: u64, message: impl Into<String>) -> Self {
        let mut next = self.transition(ScheduleStatus::Errored, generation);
        next.last_error = Some(message.into());
        next
    }
}

impl Default for ScheduleState {
    fn default() -> Self {
        Self::idle()
    }
}

/// Whole seconds, rounded up so a pending run never reports 0 early.
fn eta_seconds(wait: Duration) -> u64 {
    let secs = wait.as_secs();
    if wait.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}
