use anyhow::Context;
use clap::Parser;
use startup_orchestrator::core::health::{exit_status_help, OverallStatus, DEFAULT_BASE_URL};
use startup_orchestrator::utils::{logger, validation::Validate};
use startup_orchestrator::{HealthMonitor, LaunchConfig, RuntimeSettings};

#[derive(Parser, Debug)]
#[command(name = "health-monitor")]
#[command(about = "Check a running expense API deployment and report its health as JSON")]
#[command(after_help = exit_status_help())]
struct Args {
    /// Base URL of the deployed API
    #[arg(long, env = "API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Launch configuration file providing the [health] section
    #[arg(short, long)]
    config: Option<String>,

    /// Per-request timeout in seconds, overriding the configuration
    #[arg(long)]
    timeout: Option<u64>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let settings = RuntimeSettings::from_process_env().context("invalid environment")?;
    logger::init_cli_logger(args.verbose, settings.log_level.as_deref(), args.json_logs);

    let mut config = LaunchConfig::load(args.config.as_deref())
        .context("failed to load launch configuration")?;
    if let Some(timeout) = args.timeout {
        config.health.timeout_seconds = timeout;
    }
    config.validate().context("invalid launch configuration")?;

    let monitor = HealthMonitor::new(&args.base_url, &config.health)
        .context("failed to build health monitor")?;
    let report = monitor.run_health_check().await;

    println!("{}", serde_json::to_string_pretty(&report)?);

    match report.overall_status {
        OverallStatus::Healthy => tracing::info!("✅ All systems healthy"),
        OverallStatus::Degraded => tracing::warn!("⚠️ Some systems degraded"),
        OverallStatus::Unhealthy => tracing::error!("❌ System unhealthy"),
    }

    std::process::exit(report.overall_status.exit_code());
}
