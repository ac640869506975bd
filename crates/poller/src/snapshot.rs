//! The poller's observable session state.
//!
//! A [`PollSnapshot`] is the single authoritative record of a session.
//! Every transition goes through one of the `record_*` methods, which
//! refuse to touch a session that already ended; that guard is what
//! makes late timer or fetch callbacks harmless.

use chrono::{DateTime, Utc};
use jobwatch_core::messages;
use jobwatch_core::outcome::PollOutcome;
use jobwatch_core::status::JobStatus;
use jobwatch_core::steps::{progress_percent, StepResult, StepSummary};
use jobwatch_core::types::{JobHandle, SessionId};
use serde::Serialize;

/// Progress reported once a session has ended.
const COMPLETE_PROGRESS: u8 = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollSnapshot {
    /// `0` until the first `start`.
    pub session: SessionId,
    pub outcome: PollOutcome,
    pub handle: Option<JobHandle>,
    /// Status from the most recent successful fetch.
    pub status: Option<JobStatus>,
    /// Step list from the most recent successful fetch.
    pub steps: Vec<StepResult>,
    pub message: String,
    /// 0..=100; only an ended session reports 100.
    pub progress: u8,
    /// Number of steps the job is known to run, if the caller knew it.
    pub expected_steps: Option<usize>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Default for PollSnapshot {
    fn default() -> Self {
        Self {
            session: 0,
            outcome: PollOutcome::Idle,
            handle: None,
            status: None,
            steps: Vec::new(),
            message: String::new(),
            progress: 0,
            expected_steps: None,
            started_at: None,
            ended_at: None,
        }
    }
}

impl PollSnapshot {
    /// Fresh state of a session that is about to submit its job.
    pub fn begin(session: SessionId, expected_steps: Option<usize>) -> Self {
        Self {
            session,
            outcome: PollOutcome::Submitting,
            message: messages::MSG_TESTING.to_string(),
            expected_steps,
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    pub fn summary(&self) -> StepSummary {
        StepSummary::from_steps(&self.steps)
    }

    /// `Submitting -> Polling` once the job was accepted and triggered.
    pub fn record_submitted(&mut self, handle: JobHandle) -> bool {
        if self.outcome != PollOutcome::Submitting {
            return false;
        }
        self.handle = Some(handle);
        self.outcome = PollOutcome::Polling;
        true
    }

    /// `Submitting -> Failed` when the job never started.
    pub fn record_submission_failure(&mut self, cause: &str) -> bool {
        if self.outcome != PollOutcome::Submitting {
            return false;
        }
        self.finish(PollOutcome::Failed);
        self.message = messages::submission_failed(cause);
        true
    }

    /// Apply one status fetch.
    ///
    /// The step list is replaced before the status is evaluated, so the
    /// steps on display always belong to the status that ended the
    /// session. Returns the terminal outcome when this fetch ended it.
    pub fn record_report(
        &mut self,
        status: JobStatus,
        steps: Vec<StepResult>,
    ) -> Option<PollOutcome> {
        if self.outcome != PollOutcome::Polling {
            return None;
        }
        self.steps = steps;
        self.status = Some(status);

        match PollOutcome::from_terminal_status(status) {
            Some(outcome) => {
                self.finish(outcome);
                Some(outcome)
            }
            None => {
                self.progress = progress_percent(&self.steps, self.expected_steps);
                None
            }
        }
    }

    /// Budget elapsed while the session was still active.
    pub fn record_timeout(&mut self) -> bool {
        if !self.outcome.is_active() {
            return false;
        }
        self.finish(PollOutcome::TimedOut);
        true
    }

    /// The caller stopped watching. Steps stay as last recorded.
    pub fn record_cancel(&mut self) -> bool {
        if !self.outcome.is_active() {
            return false;
        }
        self.outcome = PollOutcome::Cancelled;
        self.message = PollOutcome::Cancelled.message().to_string();
        self.ended_at = Some(Utc::now());
        true
    }

    fn finish(&mut self, outcome: PollOutcome) {
        self.outcome = outcome;
        self.message = outcome.message().to_string();
        self.progress = COMPLETE_PROGRESS;
        self.ended_at = Some(Utc::now());
    }
}
