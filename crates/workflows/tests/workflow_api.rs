//! Integration tests for the workflow REST client using wiremock.
//!
//! These tests verify:
//! - request paths, bodies and headers of each endpoint
//! - HTTP error mapping into submission and fetch errors
//! - a full poll session against a mocked server

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use jobwatch_core::outcome::PollOutcome;
use jobwatch_core::spec::JobSpecification;
use jobwatch_core::status::JobStatus;
use jobwatch_core::types::JobHandle;
use jobwatch_poller::client::{FetchError, JobStatusClient, JobSubmissionClient, SubmissionError};
use jobwatch_poller::config::PollerConfig;
use jobwatch_poller::poller::AsyncJobPoller;
use jobwatch_workflows::api::{WorkflowApi, WorkflowApiError};
use jobwatch_workflows::config::WorkflowApiConfig;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Test Helpers
// ============================================================================

fn test_api(server: &MockServer) -> WorkflowApi {
    WorkflowApi::new(&WorkflowApiConfig::new(server.uri())).unwrap()
}

fn spec() -> JobSpecification {
    JobSpecification::test_connection(
        "Database",
        "Mysql",
        json!({ "type": "Mysql", "hostPort": "mysql:3306" }),
    )
}

async fn mount_create(server: &MockServer, id: &str) {
    Mock::given(method("POST"))
        .and(path("/api/v1/automations/workflows"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": id,
            "name": "test-connection-mysql-1a2b3c4d",
            "status": "Pending"
        })))
        .mount(server)
        .await;
}

async fn mount_trigger(server: &MockServer, id: &str, status: u16) {
    Mock::given(method("POST"))
        .and(path(format!("/api/v1/automations/workflows/trigger/{id}")))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

// ============================================================================
// Endpoint Tests
// ============================================================================

#[tokio::test]
async fn submit_posts_workflow_and_returns_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/automations/workflows"))
        .and(body_partial_json(json!({
            "workflowType": "TEST_CONNECTION",
            "request": {
                "serviceType": "Database",
                "connectionType": "Mysql",
                "connection": { "config": { "hostPort": "mysql:3306" } }
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "wf-42" })))
        .expect(1)
        .mount(&server)
        .await;

    let handle = test_api(&server).submit_job(&spec()).await.unwrap();
    assert_eq!(handle, JobHandle::new("wf-42"));
}

#[tokio::test]
async fn submit_rejection_carries_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/automations/workflows"))
        .respond_with(ResponseTemplate::new(400).set_body_string("hostPort must not be null"))
        .mount(&server)
        .await;

    let err = test_api(&server).submit_job(&spec()).await.unwrap_err();
    assert_matches!(err, SubmissionError::Rejected(ref msg) if msg.contains("400") && msg.contains("hostPort"));
}

#[tokio::test]
async fn trigger_non_success_is_rejected() {
    let server = MockServer::start().await;
    mount_trigger(&server, "wf-1", 500).await;

    let err = test_api(&server)
        .trigger_job(&JobHandle::new("wf-1"))
        .await
        .unwrap_err();
    assert_matches!(err, SubmissionError::Rejected(_));
}

#[tokio::test]
async fn fetch_maps_workflow_to_report() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/automations/workflows/wf-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "wf-1",
            "status": "Running",
            "response": {
                "status": "Running",
                "steps": [{ "name": "CheckAccess", "mandatory": true, "passed": true }]
            }
        })))
        .mount(&server)
        .await;

    let report = test_api(&server)
        .fetch_job_status(&JobHandle::new("wf-1"))
        .await
        .unwrap();
    assert_eq!(report.status, JobStatus::Running);
    assert_eq!(report.steps.len(), 1);
    assert_eq!(report.steps[0].name, "CheckAccess");
}

#[tokio::test]
async fn fetch_unknown_status_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/automations/workflows/wf-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "wf-1", "status": "Paused" })),
        )
        .mount(&server)
        .await;

    let err = test_api(&server)
        .fetch_job_status(&JobHandle::new("wf-1"))
        .await
        .unwrap_err();
    assert_matches!(err, FetchError::InvalidResponse(_));
}

#[tokio::test]
async fn fetch_server_error_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/automations/workflows/wf-1"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = test_api(&server)
        .fetch_job_status(&JobHandle::new("wf-1"))
        .await
        .unwrap_err();
    assert_matches!(err, FetchError::Transport(ref msg) if msg.contains("503"));
}

#[tokio::test]
async fn release_hard_deletes_workflow() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/automations/workflows/wf-1"))
        .and(query_param("hardDelete", "true"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    test_api(&server)
        .release_job(&JobHandle::new("wf-1"))
        .await
        .unwrap();
}

#[tokio::test]
async fn token_is_sent_as_bearer_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/automations/workflows/wf-1"))
        .and(header("authorization", "Bearer secret-jwt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "wf-1", "status": "Pending" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = WorkflowApi::new(&WorkflowApiConfig::new(server.uri()).with_token("secret-jwt"))
        .unwrap();
    let report = api.fetch_job_status(&JobHandle::new("wf-1")).await.unwrap();
    assert_eq!(report.status, JobStatus::Pending);
}

#[tokio::test]
async fn invalid_token_is_reported() {
    let config = WorkflowApiConfig::new("http://localhost:8585").with_token("bad\ntoken");
    assert_matches!(WorkflowApi::new(&config), Err(WorkflowApiError::InvalidToken));
}

#[tokio::test]
async fn definition_lookup_uses_connection_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(
            "/api/v1/services/testConnectionDefinitions/name/Mysql.testConnectionDefinition",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Mysql",
            "steps": [
                { "name": "CheckAccess", "mandatory": true },
                { "name": "GetSchemas", "mandatory": true },
                { "name": "GetTables", "mandatory": true },
                { "name": "GetViews", "mandatory": false }
            ]
        })))
        .mount(&server)
        .await;

    let definition = test_api(&server)
        .get_test_connection_definition("Mysql")
        .await
        .unwrap();
    assert_eq!(definition.steps.len(), 4);
    assert!(!definition.steps[3].mandatory);
}

#[tokio::test]
async fn path_segments_are_percent_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/automations/workflows/team%2Fwf%201"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "team/wf 1", "status": "Running" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(
            "/api/v1/services/testConnectionDefinitions/name/My%20Sql%3F.testConnectionDefinition",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "My Sql?",
            "steps": [{ "name": "CheckAccess", "mandatory": true }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = test_api(&server);
    let report = api
        .fetch_job_status(&JobHandle::new("team/wf 1"))
        .await
        .unwrap();
    assert_eq!(report.status, JobStatus::Running);

    let definition = api.get_test_connection_definition("My Sql?").await.unwrap();
    assert_eq!(definition.steps.len(), 1);
}

#[tokio::test]
async fn base_url_path_prefix_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/catalog/api/v1/automations/workflows/trigger/wf-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let api = WorkflowApi::new(&WorkflowApiConfig::new(format!("{}/catalog/", server.uri())))
        .unwrap();
    api.trigger_job(&JobHandle::new("wf-1")).await.unwrap();
}

#[test]
fn unparseable_base_url_is_rejected() {
    let config = WorkflowApiConfig::new("not a url");
    assert_matches!(
        WorkflowApi::new(&config),
        Err(WorkflowApiError::InvalidBaseUrl { .. })
    );
}

// ============================================================================
// Full Session Tests
// ============================================================================

#[tokio::test]
async fn poller_drives_workflow_to_success_and_deletes_it() {
    let server = MockServer::start().await;
    mount_create(&server, "wf-7").await;
    mount_trigger(&server, "wf-7", 200).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/automations/workflows/wf-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "wf-7",
            "status": "Running",
            "response": {
                "status": "Running",
                "steps": [{ "name": "CheckAccess", "mandatory": true, "passed": true }]
            }
        })))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/automations/workflows/wf-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "wf-7",
            "status": "Successful",
            "response": {
                "status": "Successful",
                "steps": [
                    { "name": "CheckAccess", "mandatory": true, "passed": true },
                    { "name": "GetSchemas", "mandatory": true, "passed": true }
                ]
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/automations/workflows/wf-7"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let config = PollerConfig {
        poll_interval: Duration::from_millis(20),
        timeout: Duration::from_secs(10),
        release_on_completion: true,
    };
    let poller = AsyncJobPoller::with_client(Arc::new(test_api(&server)), config);

    poller.start(spec()).await;
    let snap = poller.wait_for_outcome().await;

    assert_eq!(snap.outcome, PollOutcome::Succeeded);
    assert_eq!(snap.handle, Some(JobHandle::new("wf-7")));
    assert_eq!(snap.steps.len(), 2);

    tokio::time::sleep(Duration::from_millis(200)).await;
    let requests = server.received_requests().await.unwrap();
    let gets = requests
        .iter()
        .filter(|r| r.method.as_str() == "GET")
        .count();
    let deletes = requests
        .iter()
        .filter(|r| r.method.as_str() == "DELETE")
        .count();
    assert_eq!(gets, 3);
    assert_eq!(deletes, 1);
}

#[tokio::test]
async fn poller_reports_failed_test_result() {
    let server = MockServer::start().await;
    mount_create(&server, "wf-8").await;
    mount_trigger(&server, "wf-8", 200).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/automations/workflows/wf-8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "wf-8",
            "status": "Successful",
            "response": {
                "status": "Failed",
                "steps": [{
                    "name": "CheckAccess",
                    "mandatory": true,
                    "passed": false,
                    "message": "Failed to connect",
                    "errorLog": "Access denied for user 'catalog'@'%'"
                }]
            }
        })))
        .mount(&server)
        .await;

    let config = PollerConfig {
        poll_interval: Duration::from_millis(20),
        timeout: Duration::from_secs(10),
        release_on_completion: false,
    };
    let poller = AsyncJobPoller::with_client(Arc::new(test_api(&server)), config);

    poller.start(spec()).await;
    let snap = poller.wait_for_outcome().await;

    assert_eq!(snap.outcome, PollOutcome::Failed);
    assert!(snap.summary().has_mandatory_failure());
}

#[tokio::test]
async fn poller_fails_when_trigger_is_refused() {
    let server = MockServer::start().await;
    mount_create(&server, "wf-9").await;
    mount_trigger(&server, "wf-9", 409).await;

    let poller = AsyncJobPoller::with_client(
        Arc::new(test_api(&server)),
        PollerConfig {
            poll_interval: Duration::from_millis(20),
            ..Default::default()
        },
    );

    poller.start(spec()).await;
    let snap = poller.wait_for_outcome().await;
    assert_eq!(snap.outcome, PollOutcome::Failed);
    assert!(snap.message.contains("409"), "{}", snap.message);

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.method.as_str() != "GET"));
}
