pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use crate::adapters::{CommandInstaller, CommandMigrator, ExecLauncher};
pub use crate::config::{LaunchConfig, RuntimeSettings};
pub use crate::core::health::HealthMonitor;
pub use crate::core::orchestrator::StartupOrchestrator;
pub use crate::utils::error::{Result, StartupError};
