use std::time::Duration;

use jobwatch_poller::config::ConfigError;

/// Default base URL of the catalog server.
pub const DEFAULT_API_URL: &str = "http://localhost:8585";

/// Default per-request HTTP timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the automations-workflow API.
#[derive(Debug, Clone)]
pub struct WorkflowApiConfig {
    /// Base URL without a trailing slash, e.g. `http://host:8585`.
    pub base_url: String,
    /// Bearer token sent with every request, if set.
    pub token: Option<String>,
    pub request_timeout: Duration,
}

impl Default for WorkflowApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl WorkflowApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            ..Default::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                 |
    /// |---------------------------------|-------------------------|
    /// | `JOBWATCH_API_URL`              | `http://localhost:8585` |
    /// | `JOBWATCH_API_TOKEN`            | unset                   |
    /// | `JOBWATCH_REQUEST_TIMEOUT_SECS` | `30`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("JOBWATCH_API_URL")
            .map(normalize_base_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: "JOBWATCH_API_URL",
                expected: "an http(s) URL",
                value: base_url,
            });
        }

        let token = lookup("JOBWATCH_API_TOKEN").filter(|t| !t.trim().is_empty());

        let request_timeout = match lookup("JOBWATCH_REQUEST_TIMEOUT_SECS") {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "JOBWATCH_REQUEST_TIMEOUT_SECS",
                        expected: "a positive integer",
                        value,
                    })
                }
            },
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        Ok(Self {
            base_url,
            token,
            request_timeout,
        })
    }
}

fn normalize_base_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}
