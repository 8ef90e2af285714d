//! Advisory environment checks run before any fatal stage.
//!
//! Nothing here can abort startup: every finding is logged as a warning and
//! collected into a [`PreflightReport`].

use crate::config::toml_config::{PreflightConfig, ServerConfig};
use crate::config::RuntimeSettings;
use crate::domain::model::PreflightReport;
use std::path::{Path, PathBuf};

pub fn run_preflight(
    settings: &RuntimeSettings,
    preflight: &PreflightConfig,
    server: &ServerConfig,
) -> PreflightReport {
    let mut report = PreflightReport::default();

    if !settings.is_environment(&preflight.expected_environment) {
        let actual = settings
            .environment
            .clone()
            .unwrap_or_else(|| "<unset>".to_string());
        tracing::warn!(
            "⚠️ ENVIRONMENT is '{}', expected '{}'; continuing anyway",
            actual,
            preflight.expected_environment
        );
        report.environment_mismatch = Some(actual);
    } else {
        tracing::info!("✅ Running in {} environment", preflight.expected_environment);
    }

    report.missing_vars = missing_vars(settings, &preflight.required_vars);
    if report.missing_vars.is_empty() {
        tracing::info!("✅ All application environment variables are set");
    } else {
        tracing::warn!(
            "⚠️ Application variables not set: {}",
            report.missing_vars.join(", ")
        );
    }

    for tool in &preflight.optional_tools {
        match find_on_path(tool) {
            Some(path) => tracing::info!("✅ {} available at {}", tool, path.display()),
            None => {
                tracing::warn!("⚠️ {} not found on PATH; dependent features will be disabled", tool);
                report.missing_tools.push(tool.clone());
            }
        }
    }

    let mut directories = vec![settings.upload_dir.clone()];
    directories.extend(preflight.directories.iter().cloned());
    for dir in directories {
        match std::fs::create_dir_all(&dir) {
            Ok(()) => {
                tracing::info!("📁 Directory ready: {}", dir);
                report.created_directories.push(dir);
            }
            Err(e) => {
                tracing::warn!("⚠️ Could not create directory {}: {}", dir, e);
                report.directory_failures.push(dir);
            }
        }
    }

    if settings.use_process_manager && !Path::new(&server.process_manager_config).exists() {
        tracing::warn!(
            "⚠️ Process manager configuration {} not found",
            server.process_manager_config
        );
        report
            .missing_artifacts
            .push(server.process_manager_config.clone());
    }

    report
}

pub fn missing_vars(settings: &RuntimeSettings, required: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|name| !settings.is_set(name))
        .cloned()
        .collect()
}

/// Locate an executable on `PATH`, the way a shell would.
pub fn find_on_path(program: &str) -> Option<PathBuf> {
    if program.contains(std::path::MAIN_SEPARATOR) {
        let path = PathBuf::from(program);
        return is_executable(&path).then_some(path);
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}
