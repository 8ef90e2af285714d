pub mod health;
pub mod launch;
pub mod orchestrator;
pub mod preflight;
pub mod readiness;

pub use crate::domain::model::{
    LaunchMode, LaunchPlan, PreflightReport, ReadinessReport, StartupStage,
};
pub use crate::domain::ports::{DependencyInstaller, MigrationRunner, ProcessLauncher};
pub use crate::utils::error::Result;
