//! Rendering of poll results for the terminal.

use std::fmt::Write;

use jobwatch_core::outcome::PollOutcome;
use jobwatch_core::steps::StepVerdict;
use jobwatch_poller::events::PollerEvent;
use jobwatch_poller::snapshot::PollSnapshot;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

/// Exit code for bad arguments.
pub const EXIT_USAGE: u8 = 64;

/// Exit code when the test could not be started at all.
pub const EXIT_RUNTIME: u8 = 70;

/// Process exit code for a final outcome.
pub fn exit_code(outcome: PollOutcome) -> u8 {
    match outcome {
        PollOutcome::Succeeded => 0,
        PollOutcome::TimedOut => 2,
        PollOutcome::Cancelled => 130,
        PollOutcome::Failed | PollOutcome::Idle | PollOutcome::Submitting | PollOutcome::Polling => 1,
    }
}

/// Multi-line summary: outcome, message, then one line per step.
pub fn render(snap: &PollSnapshot) -> String {
    let mut out = String::new();

    let _ = write!(out, "Outcome: {}", snap.outcome);
    if let Some(ref handle) = snap.handle {
        let _ = write!(out, " (job {handle})");
    }
    out.push('\n');
    if !snap.message.is_empty() {
        let _ = writeln!(out, "{}", snap.message);
    }

    let width = snap.steps.iter().map(|s| s.name.len()).max().unwrap_or(0);
    for step in &snap.steps {
        let verdict = step.verdict();
        let _ = write!(
            out,
            "  [{:<7}] {:<width$}",
            verdict.as_str(),
            step.name,
            width = width
        );
        if !step.mandatory {
            out.push_str(" (optional)");
        }
        if let Some(ref message) = step.message {
            let _ = write!(out, "  {message}");
        }
        out.push('\n');
        if matches!(
            verdict,
            StepVerdict::MandatoryFailure | StepVerdict::OptionalFailure
        ) {
            if let Some(ref log) = step.error_log {
                for line in log.lines() {
                    let _ = writeln!(out, "      {line}");
                }
            }
        }
    }

    let summary = snap.summary();
    if summary.total > 0 {
        let _ = writeln!(
            out,
            "{} passed, {} failed, {} warnings, {} pending",
            summary.passed, summary.mandatory_failures, summary.optional_failures, summary.pending
        );
    }
    out
}

/// Log one poller event.
pub fn log_event(event: &PollerEvent) {
    match event {
        PollerEvent::SessionStarted { session } => {
            tracing::debug!(session, "Session started");
        }
        PollerEvent::JobSubmitted { session, handle } => {
            tracing::info!(session, handle = %handle, "Connection test submitted");
        }
        PollerEvent::StatusPolled {
            session,
            status,
            step_count,
            ..
        } => {
            tracing::info!(session, status = %status, step_count, "Connection test status");
        }
        PollerEvent::PollFailed { session, error, .. } => {
            tracing::warn!(session, error = %error, "Status check failed");
        }
        PollerEvent::SessionEnded { session, outcome } => {
            tracing::info!(session, outcome = %outcome, "Connection test finished");
        }
    }
}

/// Log events until every sender is gone; resolves to the number logged.
pub fn spawn_event_logger(mut events: broadcast::Receiver<PollerEvent>) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut logged = 0;
        loop {
            match events.recv().await {
                Ok(event) => {
                    log_event(&event);
                    logged += 1;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Event logger lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
        logged
    })
}
