//! Collaborator traits the poller drives.
//!
//! Both are transport-agnostic: the REST implementation lives in
//! `jobwatch-workflows`, tests supply scripted in-memory ones.

use async_trait::async_trait;
use jobwatch_core::spec::JobSpecification;
use jobwatch_core::status::JobStatus;
use jobwatch_core::steps::StepResult;
use jobwatch_core::types::JobHandle;

/// Errors from submitting or triggering a job. Terminal for a session.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    /// The specification was malformed or the backend refused it.
    #[error("job rejected: {0}")]
    Rejected(String),

    /// The request never produced a usable response.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors from a single status fetch. Recovered by the poll loop.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with something that is not a status report.
    #[error("invalid status response: {0}")]
    InvalidResponse(String),
}

/// Status and step results returned by one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatusReport {
    pub status: JobStatus,
    pub steps: Vec<StepResult>,
}

impl JobStatusReport {
    pub fn new(status: JobStatus, steps: Vec<StepResult>) -> Self {
        Self { status, steps }
    }
}

/// Creates jobs and starts their execution.
#[async_trait]
pub trait JobSubmissionClient: Send + Sync {
    /// Register a job and return its handle.
    async fn submit_job(&self, spec: &JobSpecification) -> Result<JobHandle, SubmissionError>;

    /// Start executing a submitted job. Called once per handle.
    async fn trigger_job(&self, handle: &JobHandle) -> Result<(), SubmissionError>;

    /// Drop the backend record of a finished job.
    async fn release_job(&self, _handle: &JobHandle) -> Result<(), SubmissionError> {
        Ok(())
    }
}

/// Reads the current state of a job.
#[async_trait]
pub trait JobStatusClient: Send + Sync {
    async fn fetch_job_status(&self, handle: &JobHandle) -> Result<JobStatusReport, FetchError>;
}
