//! Job specifications submitted to the backend.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Job type used for connection tests.
pub const JOB_TYPE_TEST_CONNECTION: &str = "TEST_CONNECTION";

/// Prefix of generated connection-test job names.
const TEST_CONNECTION_NAME_PREFIX: &str = "test-connection";

/// Number of random hex characters appended to generated job names.
const NAME_SUFFIX_LEN: usize = 8;

/// What the backend should execute: a connection configuration plus the
/// type discriminator telling the backend how to interpret it.
///
/// Built by the caller right before submission and not modified after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpecification {
    /// Unique, human-readable job name.
    pub name: String,
    /// Kind of work, e.g. [`JOB_TYPE_TEST_CONNECTION`].
    pub job_type: String,
    /// Service category, e.g. `"Database"` or `"Dashboard"`.
    pub service_type: String,
    /// Connector discriminator, e.g. `"Mysql"`.
    pub connection_type: String,
    /// Existing service this connection belongs to, when editing one.
    pub service_name: Option<String>,
    /// Connector-specific configuration; must be a JSON object.
    pub connection: serde_json::Value,
}

impl JobSpecification {
    /// Build a connection-test specification with a generated name.
    pub fn test_connection(
        service_type: impl Into<String>,
        connection_type: impl Into<String>,
        connection: serde_json::Value,
    ) -> Self {
        let connection_type = connection_type.into();
        Self {
            name: test_connection_name(&connection_type),
            job_type: JOB_TYPE_TEST_CONNECTION.to_string(),
            service_type: service_type.into(),
            connection_type,
            service_name: None,
            connection,
        }
    }

    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }

    /// Check the specification before it is sent anywhere.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("job name must not be empty".into()));
        }
        if self.connection_type.trim().is_empty() {
            return Err(CoreError::Validation(
                "connection_type must not be empty".into(),
            ));
        }
        if !self.connection.is_object() {
            return Err(CoreError::Validation(format!(
                "connection config must be a JSON object, got {}",
                json_kind(&self.connection)
            )));
        }
        Ok(())
    }
}

/// Generate a unique job name such as `test-connection-mysql-1a2b3c4d`.
pub fn test_connection_name(connection_type: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{TEST_CONNECTION_NAME_PREFIX}-{}-{}",
        connection_type.to_lowercase(),
        &suffix[..NAME_SUFFIX_LEN]
    )
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
