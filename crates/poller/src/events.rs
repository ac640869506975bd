//! Lifecycle events emitted by the poller.
//!
//! Every event carries the session it belongs to so subscribers can
//! drop events from a session that has since been replaced.

use jobwatch_core::outcome::PollOutcome;
use jobwatch_core::status::JobStatus;
use jobwatch_core::types::{JobHandle, SessionId};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub enum PollerEvent {
    /// `start` reset the state and spawned a session task.
    SessionStarted { session: SessionId },

    /// The job was accepted and triggered; polling begins.
    JobSubmitted {
        session: SessionId,
        handle: JobHandle,
    },

    /// A status fetch succeeded.
    StatusPolled {
        session: SessionId,
        handle: JobHandle,
        status: JobStatus,
        step_count: usize,
    },

    /// A status fetch failed; the loop keeps going.
    PollFailed {
        session: SessionId,
        handle: JobHandle,
        /// Human-readable error description.
        error: String,
    },

    /// The session reached a terminal outcome.
    SessionEnded {
        session: SessionId,
        outcome: PollOutcome,
    },
}
