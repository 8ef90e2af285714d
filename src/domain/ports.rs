use crate::domain::model::LaunchPlan;
use crate::utils::error::{Result, StartupError};
use async_trait::async_trait;

/// Installs the application's declared dependencies without a local cache.
#[async_trait]
pub trait DependencyInstaller: Send + Sync {
    async fn install_dependencies(&self) -> Result<()>;
}

/// Applies pending database migrations.
#[async_trait]
pub trait MigrationRunner: Send + Sync {
    async fn run_migrations(&self) -> Result<()>;
}

/// Hands the process over to the application server.
///
/// A successful launch never returns: the current process image is replaced.
/// Whatever comes back is the reason the handoff failed.
pub trait ProcessLauncher: Send + Sync {
    fn launch(&self, plan: &LaunchPlan) -> StartupError;
}
