use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Stages of the startup sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartupStage {
    CheckEnvironment,
    InstallDependencies,
    Migrate,
    Launch,
}

impl fmt::Display for StartupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StartupStage::CheckEnvironment => "Environment check",
            StartupStage::InstallDependencies => "Dependency installation",
            StartupStage::Migrate => "Database migration",
            StartupStage::Launch => "Server launch",
        };
        f.write_str(name)
    }
}

/// An external command run by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    pub working_dir: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl CommandSpec {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            env: HashMap::new(),
            working_dir: None,
            timeout_seconds: None,
        }
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchMode {
    /// Multi-worker server driven by a separate configuration artifact.
    ProcessManaged,
    /// ASGI server with host, port and workers given inline.
    Direct,
}

/// The command that replaces the orchestrator process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchPlan {
    pub mode: LaunchMode,
    pub program: String,
    pub args: Vec<String>,
}

impl LaunchPlan {
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Value following `flag` in the argument list.
    pub fn arg_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

/// Findings of the advisory environment check. Never fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreflightReport {
    pub environment_mismatch: Option<String>,
    pub missing_vars: Vec<String>,
    pub missing_tools: Vec<String>,
    pub created_directories: Vec<String>,
    pub directory_failures: Vec<String>,
    pub missing_artifacts: Vec<String>,
}

impl PreflightReport {
    pub fn warning_count(&self) -> usize {
        usize::from(self.environment_mismatch.is_some())
            + self.missing_vars.len()
            + self.missing_tools.len()
            + self.directory_failures.len()
            + self.missing_artifacts.len()
    }

    pub fn is_clean(&self) -> bool {
        self.warning_count() == 0
    }
}

/// Outcome of the deployment readiness check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReadinessReport {
    pub present_files: Vec<String>,
    pub missing_files: Vec<String>,
    pub missing_env_files: Vec<String>,
    /// Missing templates are reported but do not fail the check.
    pub missing_templates: Vec<String>,
}

impl ReadinessReport {
    pub fn is_ready(&self) -> bool {
        self.missing_files.is_empty() && self.missing_env_files.is_empty()
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_ready() {
            0
        } else {
            1
        }
    }
}

/// Everything a run would do, resolved but not executed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartupPlan {
    pub preflight: PreflightReport,
    pub install: CommandSpec,
    pub migrate: CommandSpec,
    pub launch: LaunchPlan,
}
