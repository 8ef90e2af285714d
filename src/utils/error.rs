use crate::domain::model::StartupStage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Health check request failed: {0}")]
    HealthCheckError(#[from] reqwest::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{stage} could not be started ({program}): {source}")]
    StepSpawnError {
        stage: StartupStage,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage} failed with exit status {status}")]
    StepFailed { stage: StartupStage, status: i32 },

    #[error("{stage} timed out after {seconds}s")]
    StepTimeout { stage: StartupStage, seconds: u64 },

    #[error("Failed to launch '{program}': {source}")]
    LaunchError {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server process '{program}' exited with status {status}")]
    UnexpectedTermination { program: String, status: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Dependencies,
    Migration,
    Launch,
    Network,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl StartupError {
    pub fn config(message: impl Into<String>) -> Self {
        StartupError::ConfigError {
            message: message.into(),
        }
    }

    /// The stage a step error belongs to, if any.
    pub fn stage(&self) -> Option<StartupStage> {
        match self {
            StartupError::StepSpawnError { stage, .. }
            | StartupError::StepFailed { stage, .. }
            | StartupError::StepTimeout { stage, .. } => Some(*stage),
            StartupError::LaunchError { .. } | StartupError::UnexpectedTermination { .. } => {
                Some(StartupStage::Launch)
            }
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            StartupError::ConfigError { .. }
            | StartupError::ConfigValidationError { .. }
            | StartupError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            StartupError::HealthCheckError(_) => ErrorCategory::Network,
            StartupError::IoError(_) => ErrorCategory::System,
            _ => match self.stage() {
                Some(StartupStage::InstallDependencies) => ErrorCategory::Dependencies,
                Some(StartupStage::Migrate) => ErrorCategory::Migration,
                Some(StartupStage::Launch) => ErrorCategory::Launch,
                _ => ErrorCategory::System,
            },
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Dependencies => ErrorSeverity::High,
            ErrorCategory::Migration | ErrorCategory::Launch | ErrorCategory::System => {
                ErrorSeverity::Critical
            }
        }
    }

    /// Process exit status to terminate with. Step failures propagate the
    /// child's own status, shell conventions cover the rest.
    pub fn exit_code(&self) -> i32 {
        match self {
            StartupError::StepFailed { status, .. }
            | StartupError::UnexpectedTermination { status, .. } => {
                if *status == 0 {
                    1
                } else {
                    *status
                }
            }
            StartupError::StepTimeout { .. } => 124,
            StartupError::StepSpawnError { source, .. } | StartupError::LaunchError { source, .. } => {
                match source.kind() {
                    std::io::ErrorKind::NotFound => 127,
                    std::io::ErrorKind::PermissionDenied => 126,
                    _ => 1,
                }
            }
            _ if self.category() == ErrorCategory::Configuration => 2,
            _ => 1,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            StartupError::StepSpawnError { program, .. } | StartupError::LaunchError { program, .. } => {
                format!("Make sure '{}' is installed and available on PATH", program)
            }
            StartupError::StepTimeout { stage, .. } => {
                format!("Check what {} is waiting on, or raise its timeout_seconds", stage)
            }
            StartupError::StepFailed { stage, .. } => match stage {
                StartupStage::InstallDependencies => {
                    "Check the dependency manifest and package index availability".to_string()
                }
                StartupStage::Migrate => {
                    "Check DATABASE_URL and that the database accepts connections".to_string()
                }
                _ => "Inspect the deployment logs above for the failing command".to_string(),
            },
            StartupError::UnexpectedTermination { .. } => {
                "Inspect the server output; the platform will restart the service".to_string()
            }
            StartupError::HealthCheckError(_) => {
                "Verify the API base URL and that the service is reachable".to_string()
            }
            _ if self.category() == ErrorCategory::Configuration => {
                "Fix the environment variables or launch configuration file and retry".to_string()
            }
            _ => "Check file permissions and available disk space".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid startup configuration: {}", self),
            ErrorCategory::Dependencies => format!("Dependency installation failed: {}", self),
            ErrorCategory::Migration => format!("Database migration failed: {}", self),
            ErrorCategory::Launch => format!("Server launch failed: {}", self),
            ErrorCategory::Network => format!("Health check failed: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, StartupError>;
