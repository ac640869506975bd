//! Domain model for observing long-running backend jobs.
//!
//! Holds the job specification and handle types, the backend status and
//! per-step result types, the poller's outcome enum, and the
//! user-facing status messages shared by every front-end.

pub mod error;
pub mod messages;
pub mod outcome;
pub mod spec;
pub mod status;
pub mod steps;
pub mod types;
