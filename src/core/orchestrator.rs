use crate::config::{LaunchConfig, RuntimeSettings};
use crate::core::launch::resolve_launch_plan;
use crate::core::preflight::run_preflight;
use crate::domain::model::{LaunchPlan, PreflightReport, StartupPlan, StartupStage};
use crate::domain::ports::{DependencyInstaller, MigrationRunner, ProcessLauncher};
use crate::utils::error::Result;
use crate::utils::monitor::StageMonitor;
use std::convert::Infallible;
use std::time::Instant;

/// Drives the startup sequence:
/// environment check, dependency install, migration, server launch.
///
/// Install and migration failures abort immediately with the failing
/// command's status; the environment check only warns. A successful launch
/// replaces the process, so [`run`](Self::run) only ever returns an error.
pub struct StartupOrchestrator<I, M, L> {
    installer: I,
    migrator: M,
    launcher: L,
    settings: RuntimeSettings,
    config: LaunchConfig,
    monitor: StageMonitor,
}

impl<I, M, L> StartupOrchestrator<I, M, L>
where
    I: DependencyInstaller,
    M: MigrationRunner,
    L: ProcessLauncher,
{
    pub fn new(
        installer: I,
        migrator: M,
        launcher: L,
        settings: RuntimeSettings,
        config: LaunchConfig,
    ) -> Self {
        Self {
            installer,
            migrator,
            launcher,
            settings,
            config,
            monitor: StageMonitor::new(false),
        }
    }

    /// 啟用或禁用系統監控
    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor = StageMonitor::new(enabled);
        self
    }

    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    pub fn check_environment(&self) -> PreflightReport {
        run_preflight(&self.settings, &self.config.preflight, &self.config.server)
    }

    pub fn launch_plan(&self) -> LaunchPlan {
        resolve_launch_plan(&self.settings, &self.config.app, &self.config.server)
    }

    /// Resolve the whole sequence without installing, migrating or launching.
    pub fn dry_run(&self) -> StartupPlan {
        tracing::info!("🔍 Dry run: commands are resolved but not executed");
        StartupPlan {
            preflight: self.check_environment(),
            install: self.config.install.0.clone(),
            migrate: self.config.migrate.0.clone(),
            launch: self.launch_plan(),
        }
    }

    pub async fn run(&self) -> Result<Infallible> {
        tracing::info!("🏁 Starting {} startup sequence", self.config.app.name);

        let report = self.check_environment();
        if !report.is_clean() {
            tracing::warn!(
                "⚠️ {} finished with {} warning(s)",
                StartupStage::CheckEnvironment,
                report.warning_count()
            );
        }
        self.monitor.log_stats("Environment check");

        self.run_stage(
            StartupStage::InstallDependencies,
            self.installer.install_dependencies(),
        )
        .await?;

        self.run_stage(StartupStage::Migrate, self.migrator.run_migrations())
            .await?;

        let plan = self.launch_plan();
        tracing::info!("🚀 Launching ({:?}): {}", plan.mode, plan.command_line());
        Err(self.launcher.launch(&plan))
    }

    async fn run_stage<Fut>(&self, stage: StartupStage, step: Fut) -> Result<()>
    where
        Fut: std::future::Future<Output = Result<()>>,
    {
        tracing::info!("▶️ {}...", stage);
        let start = Instant::now();

        match step.await {
            Ok(()) => {
                tracing::info!("✅ {} completed in {:?}", stage, start.elapsed());
                self.monitor.log_stats(&stage.to_string());
                Ok(())
            }
            Err(e) => {
                tracing::error!("❌ {} failed after {:?}: {}", stage, start.elapsed(), e);
                Err(e)
            }
        }
    }
}
