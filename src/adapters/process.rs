use crate::domain::model::{CommandSpec, LaunchPlan, StartupStage};
use crate::domain::ports::{DependencyInstaller, MigrationRunner, ProcessLauncher};
use crate::utils::error::{Result, StartupError};
use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;

/// Exit code of a finished child, shell style: signal deaths become `128 + signal`.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

/// Run one blocking step to completion, streaming its output to ours.
pub async fn run_command(stage: StartupStage, spec: &CommandSpec) -> Result<()> {
    tracing::info!("$ {}", spec.command_line());

    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .envs(&spec.env)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);
    if let Some(dir) = &spec.working_dir {
        command.current_dir(dir);
    }

    let mut child = command.spawn().map_err(|source| StartupError::StepSpawnError {
        stage,
        program: spec.program.clone(),
        source,
    })?;

    let status = match spec.timeout_seconds {
        Some(seconds) => {
            match tokio::time::timeout(Duration::from_secs(seconds), child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    // kill_on_drop would do it too, but only once the child is dropped
                    if let Err(e) = child.kill().await {
                        tracing::warn!("Failed to kill timed out {}: {}", spec.program, e);
                    }
                    return Err(StartupError::StepTimeout { stage, seconds });
                }
            }
        }
        None => child.wait().await?,
    };

    if status.success() {
        Ok(())
    } else {
        Err(StartupError::StepFailed {
            stage,
            status: exit_code(status),
        })
    }
}

#[derive(Debug, Clone)]
pub struct CommandInstaller {
    spec: CommandSpec,
}

impl CommandInstaller {
    pub fn new(spec: CommandSpec) -> Self {
        Self { spec }
    }
}

#[async_trait]
impl DependencyInstaller for CommandInstaller {
    async fn install_dependencies(&self) -> Result<()> {
        run_command(StartupStage::InstallDependencies, &self.spec).await
    }
}

#[derive(Debug, Clone)]
pub struct CommandMigrator {
    spec: CommandSpec,
}

impl CommandMigrator {
    pub fn new(spec: CommandSpec) -> Self {
        Self { spec }
    }
}

#[async_trait]
impl MigrationRunner for CommandMigrator {
    async fn run_migrations(&self) -> Result<()> {
        run_command(StartupStage::Migrate, &self.spec).await
    }
}

/// Replaces the current process with the server.
///
/// On unix this is `execvp`; elsewhere the server runs as a child and its
/// exit, whatever the status, is reported as an unexpected termination.
#[derive(Debug, Clone, Default)]
pub struct ExecLauncher;

impl ProcessLauncher for ExecLauncher {
    #[cfg(unix)]
    fn launch(&self, plan: &LaunchPlan) -> StartupError {
        use std::os::unix::process::CommandExt;

        let source = std::process::Command::new(&plan.program)
            .args(&plan.args)
            .exec();
        StartupError::LaunchError {
            program: plan.program.clone(),
            source,
        }
    }

    #[cfg(not(unix))]
    fn launch(&self, plan: &LaunchPlan) -> StartupError {
        match std::process::Command::new(&plan.program)
            .args(&plan.args)
            .status()
        {
            Ok(status) => StartupError::UnexpectedTermination {
                program: plan.program.clone(),
                status: exit_code(status),
            },
            Err(source) => StartupError::LaunchError {
                program: plan.program.clone(),
                source,
            },
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("sh", ["-c", script])
    }

    #[tokio::test]
    async fn test_successful_command() {
        assert!(run_command(StartupStage::Migrate, &sh("exit 0")).await.is_ok());
    }

    #[tokio::test]
    async fn test_nonzero_status_is_propagated() {
        let err = run_command(StartupStage::Migrate, &sh("exit 7")).await.unwrap_err();
        match err {
            StartupError::StepFailed { stage, status } => {
                assert_eq!(stage, StartupStage::Migrate);
                assert_eq!(status, 7);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_signal_death_maps_to_128_plus_signal() {
        let err = run_command(StartupStage::InstallDependencies, &sh("kill -TERM $$"))
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 128 + 15);
    }

    #[tokio::test]
    async fn test_missing_program() {
        let spec = CommandSpec::new("definitely-not-a-real-binary-4b1d", Vec::<String>::new());
        let err = run_command(StartupStage::InstallDependencies, &spec)
            .await
            .unwrap_err();
        assert!(matches!(err, StartupError::StepSpawnError { .. }));
        assert_eq!(err.exit_code(), 127);
    }

    #[tokio::test]
    async fn test_timeout_kills_the_step() {
        let mut spec = sh("sleep 5");
        spec.timeout_seconds = Some(1);
        let err = run_command(StartupStage::Migrate, &spec).await.unwrap_err();
        assert!(matches!(err, StartupError::StepTimeout { seconds: 1, .. }));
    }

    #[tokio::test]
    async fn test_env_and_working_dir_are_applied() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut spec = sh(r#"[ "$MARKER" = "migrate" ] && [ "$(pwd -P)" = "$EXPECTED_DIR" ]"#);
        let canonical = dir.path().canonicalize().unwrap();
        spec.env.insert("MARKER".to_string(), "migrate".to_string());
        spec.env
            .insert("EXPECTED_DIR".to_string(), canonical.to_string_lossy().into_owned());
        spec.working_dir = Some(dir.path().to_string_lossy().into_owned());

        assert!(run_command(StartupStage::Migrate, &spec).await.is_ok());
    }

    #[test]
    fn test_exec_of_missing_program_returns_error() {
        let plan = LaunchPlan {
            mode: crate::domain::model::LaunchMode::Direct,
            program: "definitely-not-a-real-binary-4b1d".to_string(),
            args: vec![],
        };
        let err = ExecLauncher.launch(&plan);
        assert!(matches!(err, StartupError::LaunchError { .. }));
        assert_eq!(err.exit_code(), 127);
    }
}
