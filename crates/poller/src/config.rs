use std::time::Duration;

/// Default delay between two status fetches.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default wall-clock budget of one session.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Poller configuration.
///
/// Defaults match the interactive "test connection" flow; override via
/// environment variables with [`PollerConfig::from_env`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    /// Delay between status fetches (default: 2 s).
    pub poll_interval: Duration,
    /// Budget from `start` until the session gives up watching (default: 120 s).
    pub timeout: Duration,
    /// Ask the backend to drop the job once it reached a terminal status
    /// (default: `true`).
    pub release_on_completion: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            release_on_completion: true,
        }
    }
}

/// Errors produced while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

impl PollerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default |
    /// |----------------------------------|---------|
    /// | `JOBWATCH_POLL_INTERVAL_MS`      | `2000`  |
    /// | `JOBWATCH_TIMEOUT_SECS`          | `120`   |
    /// | `JOBWATCH_RELEASE_ON_COMPLETION` | `true`  |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("JOBWATCH_POLL_INTERVAL_MS") {
            config.poll_interval =
                Duration::from_millis(parse_positive(&value, "JOBWATCH_POLL_INTERVAL_MS")?);
        }
        if let Some(value) = lookup("JOBWATCH_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse_positive(&value, "JOBWATCH_TIMEOUT_SECS")?);
        }
        if let Some(value) = lookup("JOBWATCH_RELEASE_ON_COMPLETION") {
            config.release_on_completion = parse_bool(&value, "JOBWATCH_RELEASE_ON_COMPLETION")?;
        }

        Ok(config)
    }
}

fn parse_positive(value: &str, var: &'static str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid {
            var,
            expected: "a positive integer",
            value: value.to_string(),
        }),
    }
}

fn parse_bool(value: &str, var: &'static str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            expected: "a boolean",
            value: value.to_string(),
        }),
    }
}
