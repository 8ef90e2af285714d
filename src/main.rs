use clap::Parser;
use startup_orchestrator::core::readiness::check_readiness;
use startup_orchestrator::utils::{logger, validation::Validate};
use startup_orchestrator::{
    CliConfig, CommandInstaller, CommandMigrator, ExecLauncher, LaunchConfig, RuntimeSettings,
    StartupError, StartupOrchestrator,
};

// Single-threaded: the final step execs over this process.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // Settings come first: LOG_LEVEL drives the logger. Errors before the
    // logger exists still reach stderr through exit_with.
    let settings = RuntimeSettings::from_process_env().unwrap_or_else(|e| exit_with(&e));

    // 初始化日誌
    logger::init_cli_logger(cli.verbose, settings.log_level.as_deref(), cli.json_logs);

    tracing::info!("Starting startup-orchestrator");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }
    tracing::debug!(
        "Runtime settings: port={}, workers={}, process_manager={}",
        settings.port,
        settings.workers,
        settings.use_process_manager
    );

    let config = LaunchConfig::load(cli.config.as_deref())
        .and_then(|config| config.validate().map(|_| config))
        .unwrap_or_else(|e| exit_with(&e));

    if cli.check_ready {
        let report = check_readiness(&config.readiness, std::path::Path::new("."));
        println!("{}", serde_json::to_string_pretty(&report)?);
        std::process::exit(report.exit_code());
    }

    let orchestrator = StartupOrchestrator::new(
        CommandInstaller::new(config.install.0.clone()),
        CommandMigrator::new(config.migrate.0.clone()),
        ExecLauncher,
        settings,
        config,
    )
    .with_monitoring(cli.monitor);

    if cli.dry_run {
        let plan = orchestrator.dry_run();
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    match orchestrator.run().await {
        Ok(never) => match never {},
        Err(e) => exit_with(&e),
    }
}

fn exit_with(e: &StartupError) -> ! {
    tracing::error!(
        "❌ Startup aborted: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    std::process::exit(e.exit_code());
}
