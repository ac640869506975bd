//! REST client for the catalog's automations-workflow endpoints.
//!
//! Implements the poller's [`JobSubmissionClient`] and [`JobStatusClient`]
//! on top of the HTTP API: a job is a `TEST_CONNECTION` workflow that is
//! created, triggered once, polled by id, and deleted when finished.
//!
//! [`JobSubmissionClient`]: jobwatch_poller::client::JobSubmissionClient
//! [`JobStatusClient`]: jobwatch_poller::client::JobStatusClient

pub mod api;
pub mod config;
pub mod jobs;
pub mod wire;
