use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use jobwatch_cli::args::Args;
use jobwatch_cli::report::{self, EXIT_RUNTIME, EXIT_USAGE};
use jobwatch_core::outcome::PollOutcome;
use jobwatch_core::spec::JobSpecification;
use jobwatch_poller::config::PollerConfig;
use jobwatch_poller::poller::AsyncJobPoller;
use jobwatch_workflows::api::WorkflowApi;
use jobwatch_workflows::config::WorkflowApiConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "jobwatch_cli=info,jobwatch_poller=debug,jobwatch_workflows=info";

/// Upper bound on draining queued events once the poller is gone.
const EVENT_DRAIN_GRACE: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Usage errors exit 64, not clap's 2 (timed out).
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(EXIT_USAGE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(args).await {
        Ok(outcome) => ExitCode::from(report::exit_code(outcome)),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Connection test could not run");
            ExitCode::from(EXIT_RUNTIME)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<PollOutcome> {
    let raw = tokio::fs::read_to_string(&args.config_path)
        .await
        .with_context(|| format!("reading {}", args.config_path.display()))?;
    let connection: serde_json::Value =
        serde_json::from_str(&raw).context("parsing connection config")?;

    let mut spec =
        JobSpecification::test_connection(&args.service_type, &args.connection_type, connection);
    if let Some(name) = args.service_name {
        spec = spec.with_service_name(name);
    }
    spec.validate()?;

    let api_config = WorkflowApiConfig::from_env()?;
    let poller_config = PollerConfig::from_env()?;
    let api = Arc::new(WorkflowApi::new(&api_config)?);

    let expected_steps = match api
        .get_test_connection_definition(&spec.connection_type)
        .await
    {
        Ok(definition) => Some(definition.steps.len()),
        Err(e) => {
            tracing::warn!(
                connection_type = %spec.connection_type,
                error = %e,
                "No test connection definition, progress will follow reported steps",
            );
            None
        }
    };

    tracing::info!(
        api_url = %api.base_url(),
        timeout_secs = poller_config.timeout.as_secs(),
        "Testing connection",
    );

    let poller = AsyncJobPoller::with_client(api, poller_config);
    let event_logger = report::spawn_event_logger(poller.subscribe());

    poller.start_with_expected_steps(spec, expected_steps).await;

    let snapshot = tokio::select! {
        snapshot = poller.wait_for_outcome() => snapshot,
        _ = tokio::signal::ctrl_c() => {
            poller.cancel().await;
            poller.snapshot()
        }
    };

    // Lets a pending workflow cleanup finish before the process exits.
    poller.shutdown().await;
    drop(poller);
    if tokio::time::timeout(EVENT_DRAIN_GRACE, event_logger)
        .await
        .is_err()
    {
        tracing::debug!("Event logger still busy, exiting without it");
    }

    print!("{}", report::render(&snapshot));
    Ok(snapshot.outcome)
}
