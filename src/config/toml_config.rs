use crate::domain::model::CommandSpec;
use crate::utils::error::{Result, StartupError};
use crate::utils::validation::{
    validate_env_var_name, validate_non_empty_string, validate_path, validate_range, validate_url,
    Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "launch.toml";

/// Launch configuration. Every section is optional and falls back to the
/// production defaults of the expense API deployment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    pub app: AppConfig,
    pub install: InstallConfig,
    pub migrate: MigrateConfig,
    pub server: ServerConfig,
    pub preflight: PreflightConfig,
    pub health: HealthConfig,
    pub readiness: ReadinessConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub module: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "expense_system_api".to_string(),
            module: "app.main:app".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstallConfig(pub CommandSpec);

impl Default for InstallConfig {
    fn default() -> Self {
        Self(CommandSpec::new(
            "pip",
            ["install", "--no-cache-dir", "-r", "requirements.txt"],
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MigrateConfig(pub CommandSpec);

impl Default for MigrateConfig {
    fn default() -> Self {
        Self(CommandSpec::new("python", ["migrate_production.py"]))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub direct_program: String,
    pub process_manager_program: String,
    pub process_manager_config: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            direct_program: "uvicorn".to_string(),
            process_manager_program: "gunicorn".to_string(),
            process_manager_config: "gunicorn.conf.py".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreflightConfig {
    pub expected_environment: String,
    pub required_vars: Vec<String>,
    pub optional_tools: Vec<String>,
    pub directories: Vec<String>,
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            expected_environment: "production".to_string(),
            required_vars: ["DATABASE_URL", "SECRET_KEY", "EMAIL_USER", "EMAIL_PASSWORD"]
                .into_iter()
                .map(String::from)
                .collect(),
            optional_tools: vec!["tesseract".to_string()],
            directories: vec!["logs".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalApi {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub timeout_seconds: u64,
    pub external_apis: Vec<ExternalApi>,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            external_apis: vec![
                ExternalApi {
                    name: "exchange_rate_api".to_string(),
                    url: "https://api.exchangerate-api.com/v4/latest/USD".to_string(),
                },
                ExternalApi {
                    name: "countries_api".to_string(),
                    url: "https://restcountries.com/v3.1/all?fields=name,currencies&limit=1"
                        .to_string(),
                },
            ],
        }
    }
}

/// Deployment artifacts checked by `--check-ready`, relative to the
/// working directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    pub required_files: Vec<String>,
    /// Missing ones fail the check.
    pub env_files: Vec<String>,
    /// Missing ones only warn.
    pub env_templates: Vec<String>,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        };
        Self {
            required_files: strings(&[
                "app/main.py",
                "app/core/config.py",
                "app/core/database.py",
                "requirements.txt",
                "Dockerfile",
                "docker-compose.yml",
                "gunicorn.conf.py",
                "production_startup.py",
                "migrate_production.py",
                "health_monitor.py",
                ".env.production",
                "PRODUCTION_DEPLOYMENT.md",
                "RENDER_DEPLOYMENT.md",
            ]),
            env_files: strings(&[".env"]),
            env_templates: strings(&[".env.production"]),
        }
    }
}

impl LaunchConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(StartupError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Load `path`, or the built-in defaults when `path` is the implicit
    /// default location and no such file exists.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(explicit) => Self::from_file(explicit),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(DEFAULT_CONFIG_PATH),
            None => {
                tracing::debug!("No {} found, using built-in defaults", DEFAULT_CONFIG_PATH);
                Ok(Self::default())
            }
        }
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| StartupError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATABASE_URL})；未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| StartupError::config(e.to_string()))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("app.module", &self.app.module)?;
        validate_command("install", &self.install.0)?;
        validate_command("migrate", &self.migrate.0)?;

        // pip keeps a wheel cache unless told otherwise
        let install = &self.install.0;
        if matches!(install.program.as_str(), "pip" | "pip3")
            && !install.args.iter().any(|a| a == "--no-cache-dir")
        {
            return Err(StartupError::InvalidConfigValueError {
                field: "install.args".to_string(),
                value: install.args.join(" "),
                reason: "pip installs must pass --no-cache-dir".to_string(),
            });
        }

        validate_non_empty_string("server.host", &self.server.host)?;
        validate_non_empty_string("server.direct_program", &self.server.direct_program)?;
        validate_non_empty_string(
            "server.process_manager_program",
            &self.server.process_manager_program,
        )?;
        validate_path(
            "server.process_manager_config",
            &self.server.process_manager_config,
        )?;

        for name in &self.preflight.required_vars {
            validate_env_var_name("preflight.required_vars", name)?;
        }
        for dir in &self.preflight.directories {
            validate_path("preflight.directories", dir)?;
        }

        validate_range("health.timeout_seconds", self.health.timeout_seconds, 1, 300)?;
        for api in &self.health.external_apis {
            validate_non_empty_string("health.external_apis.name", &api.name)?;
            validate_url("health.external_apis.url", &api.url)?;
        }

        let readiness = &self.readiness;
        for (field, paths) in [
            ("readiness.required_files", &readiness.required_files),
            ("readiness.env_files", &readiness.env_files),
            ("readiness.env_templates", &readiness.env_templates),
        ] {
            for path in paths {
                validate_path(field, path)?;
            }
        }

        Ok(())
    }
}

fn validate_command(section: &str, spec: &CommandSpec) -> Result<()> {
    validate_non_empty_string(&format!("{}.program", section), &spec.program)?;
    if let Some(timeout) = spec.timeout_seconds {
        crate::utils::validation::validate_positive_number(
            &format!("{}.timeout_seconds", section),
            timeout as usize,
            1,
        )?;
    }
    if let Some(dir) = &spec.working_dir {
        validate_path(&format!("{}.working_dir", section), dir)?;
    }
    Ok(())
}

impl Validate for LaunchConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = LaunchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.install.0.command_line(),
            "pip install --no-cache-dir -r requirements.txt"
        );
        assert_eq!(config.migrate.0.command_line(), "python migrate_production.py");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.health.external_apis.len(), 2);
        assert_eq!(config.readiness.required_files.len(), 13);
        assert_eq!(config.readiness.env_files, vec![".env"]);
    }

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = LaunchConfig::from_toml_str("").unwrap();
        assert_eq!(config, LaunchConfig::default());
    }

    #[test]
    fn test_parse_partial_toml_config() {
        let toml_content = r#"
[app]
module = "service.asgi:application"

[migrate]
program = "alembic"
args = ["upgrade", "head"]
timeout_seconds = 120

[server]
process_manager_config = "deploy/gunicorn.conf.py"

[preflight]
required_vars = ["DATABASE_URL"]
optional_tools = []
"#;

        let config = LaunchConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.app.module, "service.asgi:application");
        assert_eq!(config.app.name, "expense_system_api");
        assert_eq!(config.migrate.0.command_line(), "alembic upgrade head");
        assert_eq!(config.migrate.0.timeout_seconds, Some(120));
        assert_eq!(config.server.process_manager_config, "deploy/gunicorn.conf.py");
        assert_eq!(config.server.direct_program, "uvicorn");
        assert_eq!(config.preflight.required_vars, vec!["DATABASE_URL"]);
        assert!(config.preflight.optional_tools.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("LAUNCH_TEST_REQUIREMENTS", "requirements/prod.txt");

        let toml_content = r#"
[install]
program = "pip"
args = ["install", "--no-cache-dir", "-r", "${LAUNCH_TEST_REQUIREMENTS}"]

[migrate]
program = "python"
args = ["${LAUNCH_TEST_UNSET_VARIABLE}"]
"#;

        let config = LaunchConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.install.0.args[3], "requirements/prod.txt");
        assert_eq!(config.migrate.0.args[0], "${LAUNCH_TEST_UNSET_VARIABLE}");

        std::env::remove_var("LAUNCH_TEST_REQUIREMENTS");
    }

    #[test]
    fn test_pip_without_no_cache_dir_is_rejected() {
        let toml_content = r#"
[install]
program = "pip"
args = ["install", "-r", "requirements.txt"]
"#;
        let config = LaunchConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_rejects_bad_values() {
        let bad_url = r#"
[[health.external_apis]]
name = "rates"
url = "not-a-url"
"#;
        assert!(LaunchConfig::from_toml_str(bad_url).unwrap().validate().is_err());

        let bad_var = r#"
[preflight]
required_vars = ["SECRET-KEY"]
"#;
        assert!(LaunchConfig::from_toml_str(bad_var).unwrap().validate().is_err());

        let zero_timeout = r#"
[migrate]
program = "python"
timeout_seconds = 0
"#;
        assert!(LaunchConfig::from_toml_str(zero_timeout).unwrap().validate().is_err());

        let empty_path = r#"
[readiness]
required_files = ["Dockerfile", ""]
"#;
        assert!(LaunchConfig::from_toml_str(empty_path).unwrap().validate().is_err());
    }

    #[test]
    fn test_sample_deploy_config_matches_defaults() {
        let sample = include_str!("../../deploy/launch.toml");
        let config = LaunchConfig::from_toml_str(sample).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config, LaunchConfig::default());
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        assert!(LaunchConfig::from_toml_str("[server\nhost = ").is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[app]
name = "file-test"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = LaunchConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.app.name, "file-test");

        let explicit = LaunchConfig::load(temp_file.path().to_str()).unwrap();
        assert_eq!(explicit.app.name, "file-test");
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        assert!(LaunchConfig::load(Some("/nonexistent/launch.toml")).is_err());
    }
}
