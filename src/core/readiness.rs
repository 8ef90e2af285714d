//! Pre-deployment check that the release tree carries every artifact the
//! production launch relies on.

use crate::config::toml_config::ReadinessConfig;
use crate::domain::model::ReadinessReport;
use std::path::Path;

/// Checks `config` against the tree rooted at `root`. Missing required files
/// or env files make the report not ready; missing templates only warn.
pub fn check_readiness(config: &ReadinessConfig, root: &Path) -> ReadinessReport {
    let mut report = ReadinessReport::default();

    tracing::info!("📋 Checking production files under {}", root.display());
    for file in &config.required_files {
        if root.join(file).exists() {
            tracing::info!("✅ {}", file);
            report.present_files.push(file.clone());
        } else {
            tracing::error!("❌ {} - MISSING", file);
            report.missing_files.push(file.clone());
        }
    }
    if !report.missing_files.is_empty() {
        tracing::error!("❌ Missing {} required files", report.missing_files.len());
    }

    for file in &config.env_files {
        if root.join(file).exists() {
            tracing::info!("✅ {} file exists", file);
        } else {
            tracing::error!("❌ {} file missing", file);
            report.missing_env_files.push(file.clone());
        }
    }

    for file in &config.env_templates {
        if !root.join(file).exists() {
            tracing::warn!("⚠️ {} template missing", file);
            report.missing_templates.push(file.clone());
        }
    }

    if report.is_ready() {
        tracing::info!("🎉 Production readiness: PASSED");
    } else {
        tracing::error!("❌ Production readiness: FAILED");
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(required: &[&str], env: &[&str], templates: &[&str]) -> ReadinessConfig {
        let owned = |items: &[&str]| -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        };
        ReadinessConfig {
            required_files: owned(required),
            env_files: owned(env),
            env_templates: owned(templates),
        }
    }

    #[test]
    fn test_reports_present_and_missing_files() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("Dockerfile"), "FROM python:3.11").unwrap();
        std::fs::write(root.path().join(".env"), "SECRET_KEY=x").unwrap();

        let report = check_readiness(
            &config(&["Dockerfile", "gunicorn.conf.py"], &[".env"], &[]),
            root.path(),
        );

        assert_eq!(report.present_files, vec!["Dockerfile"]);
        assert_eq!(report.missing_files, vec!["gunicorn.conf.py"]);
        assert!(!report.is_ready());
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_missing_env_file_fails_but_template_only_warns() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join("app/core")).unwrap();
        std::fs::write(root.path().join("app/core/config.py"), "").unwrap();

        let without_env = check_readiness(
            &config(&["app/core/config.py"], &[".env"], &[".env.production"]),
            root.path(),
        );
        assert_eq!(without_env.missing_env_files, vec![".env"]);
        assert_eq!(without_env.missing_templates, vec![".env.production"]);
        assert!(!without_env.is_ready());

        std::fs::write(root.path().join(".env"), "").unwrap();
        let with_env = check_readiness(
            &config(&["app/core/config.py"], &[".env"], &[".env.production"]),
            root.path(),
        );
        assert!(with_env.is_ready());
        assert_eq!(with_env.missing_templates, vec![".env.production"]);
    }
}
