//! Scripted in-memory job client shared by the poller integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use jobwatch_core::spec::JobSpecification;
use jobwatch_core::status::JobStatus;
use jobwatch_core::steps::StepResult;
use jobwatch_core::types::JobHandle;
use jobwatch_poller::client::{
    FetchError, JobStatusClient, JobStatusReport, JobSubmissionClient, SubmissionError,
};
use serde_json::json;

/// One scripted answer to `submit_job`.
struct Submission {
    delay: Duration,
    result: Result<JobHandle, SubmissionError>,
}

/// Job client whose answers are queued up front and whose calls are
/// recorded for assertions.
///
/// A handle with no queued status report answers `Running` with no steps,
/// so the poller keeps ticking until it is stopped some other way.
#[derive(Default)]
pub struct ScriptedClient {
    submissions: Mutex<VecDeque<Submission>>,
    failing_triggers: Mutex<Vec<String>>,
    reports: Mutex<HashMap<String, VecDeque<Result<JobStatusReport, FetchError>>>>,
    submitted: Mutex<Vec<String>>,
    triggered: Mutex<Vec<JobHandle>>,
    fetched: Mutex<Vec<JobHandle>>,
    released: Mutex<Vec<JobHandle>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit_ok(self, handle: &str) -> Self {
        self.submit_ok_after(handle, Duration::ZERO)
    }

    pub fn submit_ok_after(self, handle: &str, delay: Duration) -> Self {
        self.submissions.lock().unwrap().push_back(Submission {
            delay,
            result: Ok(JobHandle::new(handle)),
        });
        self
    }

    pub fn submit_err(self, error: SubmissionError) -> Self {
        self.submissions.lock().unwrap().push_back(Submission {
            delay: Duration::ZERO,
            result: Err(error),
        });
        self
    }

    pub fn fail_trigger(self, handle: &str) -> Self {
        self.failing_triggers.lock().unwrap().push(handle.to_string());
        self
    }

    pub fn report(self, handle: &str, status: JobStatus, steps: Vec<StepResult>) -> Self {
        self.push_report(handle, Ok(JobStatusReport::new(status, steps)))
    }

    pub fn fetch_error(self, handle: &str) -> Self {
        self.push_report(
            handle,
            Err(FetchError::Transport("connection reset by peer".into())),
        )
    }

    fn push_report(self, handle: &str, report: Result<JobStatusReport, FetchError>) -> Self {
        self.reports
            .lock()
            .unwrap()
            .entry(handle.to_string())
            .or_default()
            .push_back(report);
        self
    }

    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn triggered(&self) -> Vec<JobHandle> {
        self.triggered.lock().unwrap().clone()
    }

    pub fn fetched(&self) -> Vec<JobHandle> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetched.lock().unwrap().len()
    }

    pub fn released(&self) -> Vec<JobHandle> {
        self.released.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobSubmissionClient for ScriptedClient {
    async fn submit_job(&self, spec: &JobSpecification) -> Result<JobHandle, SubmissionError> {
        self.submitted.lock().unwrap().push(spec.name.clone());
        let next = self.submissions.lock().unwrap().pop_front();
        let Some(submission) = next else {
            return Err(SubmissionError::Rejected("no scripted submission".into()));
        };
        if !submission.delay.is_zero() {
            tokio::time::sleep(submission.delay).await;
        }
        submission.result
    }

    async fn trigger_job(&self, handle: &JobHandle) -> Result<(), SubmissionError> {
        self.triggered.lock().unwrap().push(handle.clone());
        if self
            .failing_triggers
            .lock()
            .unwrap()
            .iter()
            .any(|h| h == handle.as_str())
        {
            return Err(SubmissionError::Rejected(format!(
                "workflow {handle} could not be triggered"
            )));
        }
        Ok(())
    }

    async fn release_job(&self, handle: &JobHandle) -> Result<(), SubmissionError> {
        self.released.lock().unwrap().push(handle.clone());
        Ok(())
    }
}

#[async_trait]
impl JobStatusClient for ScriptedClient {
    async fn fetch_job_status(&self, handle: &JobHandle) -> Result<JobStatusReport, FetchError> {
        self.fetched.lock().unwrap().push(handle.clone());
        self.reports
            .lock()
            .unwrap()
            .get_mut(handle.as_str())
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(JobStatusReport::new(JobStatus::Running, Vec::new())))
    }
}

pub fn mysql_spec() -> JobSpecification {
    JobSpecification::test_connection(
        "Database",
        "Mysql",
        json!({ "type": "Mysql", "hostPort": "mysql:3306", "username": "catalog" }),
    )
}

pub fn passed(name: &str) -> StepResult {
    StepResult::new(name, true, Some(true))
}

pub fn failed_mandatory(name: &str) -> StepResult {
    StepResult::new(name, true, Some(false)).with_error_log("Access denied for user 'catalog'")
}
