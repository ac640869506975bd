//! Per-step results of a job and their classification.
//!
//! The backend reports an ordered list of [`StepResult`]s that grows as
//! the job executes. The poller stores the latest list verbatim; the
//! helpers here turn it into verdicts and progress for display. None of
//! them influence the poll state machine, which only follows the
//! backend-reported [`JobStatus`](crate::status::JobStatus).

use serde::{Deserialize, Serialize};

/// Highest progress value reported while the job is still running.
pub const MAX_RUNNING_PROGRESS: u8 = 99;

/// One discrete validation step within a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub name: String,
    /// A failure of this step fails the job as a whole.
    pub mandatory: bool,
    /// `None` while the step has not reported yet.
    pub passed: Option<bool>,
    pub message: Option<String>,
    pub error_log: Option<String>,
}

impl StepResult {
    pub fn new(name: impl Into<String>, mandatory: bool, passed: Option<bool>) -> Self {
        Self {
            name: name.into(),
            mandatory,
            passed,
            message: None,
            error_log: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_error_log(mut self, error_log: impl Into<String>) -> Self {
        self.error_log = Some(error_log.into());
        self
    }

    pub fn verdict(&self) -> StepVerdict {
        match (self.passed, self.mandatory) {
            (None, _) => StepVerdict::Pending,
            (Some(true), _) => StepVerdict::Passed,
            (Some(false), true) => StepVerdict::MandatoryFailure,
            (Some(false), false) => StepVerdict::OptionalFailure,
        }
    }
}

/// Display classification of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepVerdict {
    Passed,
    Pending,
    MandatoryFailure,
    /// Failed, but the job can still succeed without this step.
    OptionalFailure,
}

impl StepVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Pending => "pending",
            Self::MandatoryFailure => "failed",
            Self::OptionalFailure => "warning",
        }
    }
}

impl std::fmt::Display for StepVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict counts over a step sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepSummary {
    pub total: usize,
    pub passed: usize,
    pub pending: usize,
    pub mandatory_failures: usize,
    pub optional_failures: usize,
}

impl StepSummary {
    pub fn from_steps(steps: &[StepResult]) -> Self {
        steps.iter().fold(
            Self {
                total: steps.len(),
                ..Default::default()
            },
            |mut acc, step| {
                match step.verdict() {
                    StepVerdict::Passed => acc.passed += 1,
                    StepVerdict::Pending => acc.pending += 1,
                    StepVerdict::MandatoryFailure => acc.mandatory_failures += 1,
                    StepVerdict::OptionalFailure => acc.optional_failures += 1,
                }
                acc
            },
        )
    }

    pub fn has_mandatory_failure(&self) -> bool {
        self.mandatory_failures > 0
    }

    /// Steps that produced a verdict, pass or fail.
    pub fn reported(&self) -> usize {
        self.total - self.pending
    }
}

/// Progress of a running job in percent.
///
/// `expected` is the number of steps the job is known to run (from its
/// definition); without it the reported list's own length is used. The
/// result never reaches 100 because only a terminal status completes a
/// job.
pub fn progress_percent(steps: &[StepResult], expected: Option<usize>) -> u8 {
    let summary = StepSummary::from_steps(steps);
    let denominator = expected.unwrap_or(summary.total).max(summary.total);
    if denominator == 0 {
        return 0;
    }
    let percent = summary.reported() * 100 / denominator;
    (percent.min(MAX_RUNNING_PROGRESS as usize)) as u8
}
