pub mod env;
pub mod toml_config;

pub use env::RuntimeSettings;
pub use toml_config::LaunchConfig;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

/// Command-line options. Everything that shapes the launch itself comes
/// from the environment; these only tune how the orchestrator reports.
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Parser)]
#[command(name = "startup-orchestrator")]
#[command(about = "Install, migrate and launch the expense API in production")]
pub struct CliConfig {
    /// Path to the launch configuration file (defaults to ./launch.toml when present)
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage after each stage")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    /// Check the environment and print the plan without running anything
    #[arg(long)]
    pub dry_run: bool,

    /// Verify the deployment files are in place, print a JSON report and
    /// exit 0 when ready or 1 when not
    #[arg(long, conflicts_with = "dry_run")]
    pub check_ready: bool,
}
