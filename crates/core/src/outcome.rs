//! Observable outcome of a poll session.

use serde::{Deserialize, Serialize};

use crate::messages;
use crate::status::JobStatus;

/// Where a poll session currently stands.
///
/// `Idle` is the initial state of a fresh poller. `Submitting` and
/// `Polling` are active; the remaining four end a session and are only
/// left by starting a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PollOutcome {
    Idle,
    Submitting,
    Polling,
    Succeeded,
    Failed,
    /// The wall-clock budget ran out before a terminal status was seen.
    /// Inconclusive: the backend job may still finish.
    TimedOut,
    Cancelled,
}

impl PollOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::Polling => "polling",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
        }
    }

    /// A session in this state still owns timers and may change.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Submitting | Self::Polling)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed | Self::TimedOut | Self::Cancelled
        )
    }

    /// Map a terminal backend status onto the matching outcome.
    ///
    /// Returns `None` for non-terminal statuses.
    pub fn from_terminal_status(status: JobStatus) -> Option<Self> {
        if !status.is_terminal() {
            return None;
        }
        match status {
            JobStatus::Succeeded => Some(Self::Succeeded),
            _ => Some(Self::Failed),
        }
    }

    /// Default user-facing message for this outcome.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Idle => "",
            Self::Submitting | Self::Polling => messages::MSG_TESTING,
            Self::Succeeded => messages::MSG_SUCCEEDED,
            Self::Failed => messages::MSG_FAILED,
            Self::TimedOut => messages::MSG_TAKING_TOO_LONG,
            Self::Cancelled => messages::MSG_CANCELLED,
        }
    }
}

impl std::fmt::Display for PollOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
