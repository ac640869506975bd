//! Poller collaborator implementations backed by [`WorkflowApi`].

use async_trait::async_trait;
use jobwatch_core::spec::JobSpecification;
use jobwatch_core::types::JobHandle;
use jobwatch_poller::client::{
    FetchError, JobStatusClient, JobStatusReport, JobSubmissionClient, SubmissionError,
};

use crate::api::{WorkflowApi, WorkflowApiError};

impl From<WorkflowApiError> for SubmissionError {
    fn from(e: WorkflowApiError) -> Self {
        match e {
            WorkflowApiError::ApiError { .. }
            | WorkflowApiError::InvalidToken
            | WorkflowApiError::InvalidBaseUrl { .. } => SubmissionError::Rejected(e.to_string()),
            WorkflowApiError::Request(_) => SubmissionError::Transport(e.to_string()),
        }
    }
}

impl From<WorkflowApiError> for FetchError {
    fn from(e: WorkflowApiError) -> Self {
        match e {
            WorkflowApiError::Request(ref inner) if inner.is_decode() => {
                FetchError::InvalidResponse(e.to_string())
            }
            _ => FetchError::Transport(e.to_string()),
        }
    }
}

#[async_trait]
impl JobSubmissionClient for WorkflowApi {
    async fn submit_job(&self, spec: &JobSpecification) -> Result<JobHandle, SubmissionError> {
        let workflow = self.create_workflow(spec).await?;
        tracing::info!(
            workflow_id = %workflow.id,
            name = %spec.name,
            "Workflow created",
        );
        Ok(JobHandle::new(workflow.id))
    }

    async fn trigger_job(&self, handle: &JobHandle) -> Result<(), SubmissionError> {
        self.trigger_workflow(handle.as_str()).await?;
        tracing::debug!(workflow_id = %handle, "Workflow triggered");
        Ok(())
    }

    async fn release_job(&self, handle: &JobHandle) -> Result<(), SubmissionError> {
        self.delete_workflow(handle.as_str()).await?;
        tracing::debug!(workflow_id = %handle, "Workflow deleted");
        Ok(())
    }
}

#[async_trait]
impl JobStatusClient for WorkflowApi {
    async fn fetch_job_status(&self, handle: &JobHandle) -> Result<JobStatusReport, FetchError> {
        self.get_workflow(handle.as_str())
            .await?
            .into_report()
            .map_err(FetchError::InvalidResponse)
    }
}
