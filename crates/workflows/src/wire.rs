//! JSON shapes of the automations-workflow API and their mapping onto
//! the poller's domain types.

use jobwatch_core::spec::JobSpecification;
use jobwatch_core::status::JobStatus;
use jobwatch_core::steps::StepResult;
use jobwatch_poller::client::JobStatusReport;
use serde::{Deserialize, Serialize};

/// Workflow status strings reported by the backend.
pub const WORKFLOW_STATUS_PENDING: &str = "Pending";
pub const WORKFLOW_STATUS_RUNNING: &str = "Running";
pub const WORKFLOW_STATUS_SUCCESSFUL: &str = "Successful";
pub const WORKFLOW_STATUS_FAILED: &str = "Failed";

/// Body of `POST /api/v1/automations/workflows`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkflow<'a> {
    pub name: &'a str,
    pub workflow_type: &'a str,
    pub request: TestConnectionRequest<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConnectionRequest<'a> {
    pub connection: ConnectionConfig<'a>,
    pub service_type: &'a str,
    pub connection_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct ConnectionConfig<'a> {
    pub config: &'a serde_json::Value,
}

impl<'a> CreateWorkflow<'a> {
    pub fn from_spec(spec: &'a JobSpecification) -> Self {
        Self {
            name: &spec.name,
            workflow_type: &spec.job_type,
            request: TestConnectionRequest {
                connection: ConnectionConfig {
                    config: &spec.connection,
                },
                service_type: &spec.service_type,
                connection_type: &spec.connection_type,
                service_name: spec.service_name.as_deref(),
            },
        }
    }
}

/// A workflow as returned by create and get.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Test result, present once the workflow started producing output.
    #[serde(default)]
    pub response: Option<TestConnectionResult>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConnectionResult {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub steps: Vec<WireStep>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireStep {
    pub name: String,
    #[serde(default = "default_mandatory")]
    pub mandatory: bool,
    #[serde(default)]
    pub passed: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_log: Option<String>,
}

/// Expected steps of a connector's connection test.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConnectionDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDefinition {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_mandatory")]
    pub mandatory: bool,
}

fn default_mandatory() -> bool {
    true
}

impl From<WireStep> for StepResult {
    fn from(step: WireStep) -> Self {
        Self {
            name: step.name,
            mandatory: step.mandatory,
            passed: step.passed,
            message: step.message,
            error_log: step.error_log,
        }
    }
}

impl Workflow {
    /// Convert to the status report the poller consumes.
    ///
    /// A workflow that finished successfully but carries a failed test
    /// result is reported as [`JobStatus::Failed`]. Returns the raw status
    /// string when it is missing or unknown.
    pub fn into_report(self) -> Result<JobStatusReport, String> {
        let result_failed = self
            .response
            .as_ref()
            .and_then(|r| r.status.as_deref())
            .is_some_and(|s| s == WORKFLOW_STATUS_FAILED);

        let status = match self.status.as_deref() {
            Some(WORKFLOW_STATUS_PENDING) => JobStatus::Pending,
            Some(WORKFLOW_STATUS_RUNNING) => JobStatus::Running,
            Some(WORKFLOW_STATUS_FAILED) => JobStatus::Failed,
            Some(WORKFLOW_STATUS_SUCCESSFUL) if result_failed => JobStatus::Failed,
            Some(WORKFLOW_STATUS_SUCCESSFUL) => JobStatus::Succeeded,
            other => return Err(format!("unknown workflow status {other:?}")),
        };

        let steps = self
            .response
            .map(|r| r.steps.into_iter().map(StepResult::from).collect())
            .unwrap_or_default();

        Ok(JobStatusReport::new(status, steps))
    }
}
