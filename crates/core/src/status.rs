//! Backend-reported job status.

use serde::{Deserialize, Serialize};

/// Status of a job as reported by the backend on each status fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    /// Accepted but not yet executing.
    Pending,
    /// Executing; step results may be partial.
    Running,
    /// Finished and reported success.
    Succeeded,
    /// Finished and reported failure.
    Failed,
}

impl JobStatus {
    /// Return the string representation of a status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    /// `Succeeded` and `Failed` end the job; nothing follows them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
