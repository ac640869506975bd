//! REST API client for the automations-workflow HTTP endpoints.
//!
//! Wraps workflow creation, triggering, retrieval and deletion, plus the
//! test-connection definition lookup, using [`reqwest`].

use jobwatch_core::spec::JobSpecification;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Url;

use crate::config::WorkflowApiConfig;
use crate::wire::{CreateWorkflow, TestConnectionDefinition, Workflow};

const WORKFLOWS_PATH: [&str; 4] = ["api", "v1", "automations", "workflows"];
const DEFINITIONS_PATH: [&str; 5] = ["api", "v1", "services", "testConnectionDefinitions", "name"];

/// HTTP client for one catalog server.
#[derive(Debug, Clone)]
pub struct WorkflowApi {
    client: reqwest::Client,
    base_url: Url,
}

/// Errors from the workflow REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("Workflow API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body, usually the catalog's JSON error message.
        body: String,
    },

    /// The configured token is not a valid header value.
    #[error("Invalid API token")]
    InvalidToken,

    #[error("Invalid API base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl WorkflowApi {
    /// Create a client from configuration.
    pub fn new(config: &WorkflowApiConfig) -> Result<Self, WorkflowApiError> {
        let base_url = parse_base_url(&config.base_url)?;

        let mut headers = HeaderMap::new();
        if let Some(ref token) = config.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| WorkflowApiError::InvalidToken)?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self::with_client(client, base_url))
    }

    /// Create an API client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling across several pollers).
    pub fn with_client(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Create a workflow for the given job specification.
    ///
    /// Sends `POST /api/v1/automations/workflows`. The returned workflow
    /// carries the server-assigned `id`.
    pub async fn create_workflow(
        &self,
        spec: &JobSpecification,
    ) -> Result<Workflow, WorkflowApiError> {
        let response = self
            .client
            .post(self.endpoint(&WORKFLOWS_PATH, &[]))
            .json(&CreateWorkflow::from_spec(spec))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Start executing a created workflow.
    ///
    /// Sends `POST /api/v1/automations/workflows/trigger/{id}`.
    pub async fn trigger_workflow(&self, id: &str) -> Result<(), WorkflowApiError> {
        let response = self
            .client
            .post(self.endpoint(&WORKFLOWS_PATH, &["trigger", id]))
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Retrieve a workflow with its current status and test result.
    ///
    /// Sends `GET /api/v1/automations/workflows/{id}`.
    pub async fn get_workflow(&self, id: &str) -> Result<Workflow, WorkflowApiError> {
        let response = self
            .client
            .get(self.endpoint(&WORKFLOWS_PATH, &[id]))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Permanently delete a workflow.
    ///
    /// Sends `DELETE /api/v1/automations/workflows/{id}?hardDelete=true`.
    pub async fn delete_workflow(&self, id: &str) -> Result<(), WorkflowApiError> {
        let response = self
            .client
            .delete(self.endpoint(&WORKFLOWS_PATH, &[id]))
            .query(&[("hardDelete", "true")])
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Fetch the steps a connector's connection test runs.
    ///
    /// Sends `GET /api/v1/services/testConnectionDefinitions/name/{type}.testConnectionDefinition`.
    pub async fn get_test_connection_definition(
        &self,
        connection_type: &str,
    ) -> Result<TestConnectionDefinition, WorkflowApiError> {
        let fqn = format!("{connection_type}.testConnectionDefinition");
        let response = self
            .client
            .get(self.endpoint(&DEFINITIONS_PATH, &[&fqn]))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Base URL plus path segments, each segment percent-encoded.
    fn endpoint(&self, prefix: &[&str], rest: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Never fails: `parse_base_url` rejects cannot-be-a-base URLs.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(prefix).extend(rest);
        }
        url
    }

    /// Turn a non-2xx reply into [`WorkflowApiError::ApiError`], keeping
    /// the catalog's error text so rejections can be shown to the user.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, WorkflowApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        Err(WorkflowApiError::ApiError {
            status: status.as_u16(),
            body,
        })
    }

    /// Decode a workflow or definition body from a 2xx reply.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, WorkflowApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// For trigger and delete, whose reply bodies carry nothing we use.
    async fn check_status(response: reqwest::Response) -> Result<(), WorkflowApiError> {
        Self::ensure_success(response).await.map(drop)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, WorkflowApiError> {
    let invalid = |reason: String| WorkflowApiError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("not a hierarchical URL".into()));
    }
    Ok(url)
}
