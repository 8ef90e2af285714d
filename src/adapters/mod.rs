// Adapters layer: concrete implementations of the startup ports over real processes.

pub mod process;

pub use process::{CommandInstaller, CommandMigrator, ExecLauncher};
