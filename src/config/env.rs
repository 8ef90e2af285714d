use crate::utils::error::{Result, StartupError};
use crate::utils::validation::{validate_path, validate_positive_number, Validate};
use std::collections::HashMap;
use std::ffi::OsString;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_WORKERS: u32 = 4;
pub const DEFAULT_UPLOAD_DIR: &str = "/tmp/uploads";

const TYPED_VARS: &[&str] = &["PORT", "WORKERS"];

/// Typed view of the process environment, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeSettings {
    pub environment: Option<String>,
    pub port: u16,
    pub workers: u32,
    pub use_process_manager: bool,
    pub upload_dir: String,
    pub log_level: Option<String>,
    vars: HashMap<String, String>,
}

impl RuntimeSettings {
    /// Snapshot the current process environment.
    pub fn from_process_env() -> Result<Self> {
        Self::from_os_vars(std::env::vars_os())
    }

    /// Non-UTF-8 entries are skipped, except for the typed variables, where
    /// they are rejected like any other malformed value.
    pub fn from_os_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let mut utf8 = HashMap::new();
        for (key, value) in vars {
            let Ok(key) = key.into_string() else { continue };
            match value.into_string() {
                Ok(value) => {
                    utf8.insert(key, value);
                }
                Err(raw) if TYPED_VARS.contains(&key.as_str()) => {
                    return Err(StartupError::InvalidConfigValueError {
                        field: key,
                        value: raw.to_string_lossy().into_owned(),
                        reason: "value is not valid UTF-8".to_string(),
                    });
                }
                Err(_) => {}
            }
        }
        Self::from_vars(utf8)
    }

    /// Build settings from an explicit variable map. Empty values count as unset.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let lookup = |name: &str| {
            vars.get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let port = match lookup("PORT") {
            Some(raw) => parse_number::<u16>("PORT", &raw)?,
            None => DEFAULT_PORT,
        };
        let workers = match lookup("WORKERS") {
            Some(raw) => parse_number::<u32>("WORKERS", &raw)?,
            None => DEFAULT_WORKERS,
        };

        let upload_dir = lookup("UPLOAD_DIR").unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string());
        let log_level = lookup("LOG_LEVEL");

        let settings = Self {
            environment: vars.get("ENVIRONMENT").cloned(),
            port,
            workers,
            // Only the exact literal enables the process manager.
            use_process_manager: vars.get("USE_GUNICORN").map(String::as_str) == Some("true"),
            upload_dir,
            log_level,
            vars,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Raw value of a variable, if set.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Whether a variable is set to a non-empty value.
    pub fn is_set(&self, name: &str) -> bool {
        self.var(name).is_some_and(|v| !v.trim().is_empty())
    }

    pub fn is_environment(&self, expected: &str) -> bool {
        self.environment.as_deref() == Some(expected)
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| StartupError::InvalidConfigValueError {
            field: field.to_string(),
            value: raw.to_string(),
            reason: format!("expected an integer: {}", e),
        })
}

impl Validate for RuntimeSettings {
    fn validate(&self) -> Result<()> {
        validate_positive_number("PORT", usize::from(self.port), 1)?;
        validate_positive_number("WORKERS", self.workers as usize, 1)?;
        validate_path("UPLOAD_DIR", &self.upload_dir)?;
        Ok(())
    }
}
