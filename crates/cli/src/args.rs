use std::path::PathBuf;

use clap::Parser;

/// Run a catalog connection test and watch it until it finishes.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "jobwatch")]
#[command(version, about = "Run and watch a connection test workflow", long_about = None)]
pub struct Args {
    /// Service category, e.g. Database or Dashboard
    pub service_type: String,

    /// Connector type, e.g. Mysql
    pub connection_type: String,

    /// JSON file holding the connector configuration object
    pub config_path: PathBuf,

    /// Existing service to attach the test to
    pub service_name: Option<String>,
}
