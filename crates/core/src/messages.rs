//! User-facing status messages for connection tests.
//!
//! Shown by the presentation layer next to the step list.

/// Shown while the job is being submitted or polled.
pub const MSG_TESTING: &str = "Testing the connection. This may take up to two minutes.";

/// The backend reported success.
pub const MSG_SUCCEEDED: &str = "Connection test completed successfully.";

/// The backend reported failure, or the job could not be submitted.
pub const MSG_FAILED: &str = "Connection test failed. Review the failing steps for details.";

/// The wall-clock budget elapsed before the backend reported a result.
pub const MSG_TAKING_TOO_LONG: &str =
    "Connection test is taking longer than expected. It may still complete in the background.";

/// The user stopped watching the test.
pub const MSG_CANCELLED: &str = "Connection test was cancelled.";

/// Failure message for a job that never started, carrying the cause.
pub fn submission_failed(cause: &str) -> String {
    format!("Connection test could not be started: {cause}")
}
