use crate::utils::error::{Result, StartupError};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl ToString, reason: impl Into<String>) -> StartupError {
    StartupError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(invalid(
                field_name,
                url_str,
                format!("Unsupported URL scheme: {}", scheme),
            )),
        },
        Err(e) => Err(invalid(field_name, url_str, format!("Invalid URL format: {}", e))),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

/// Environment variable names: letters, digits and underscores, not starting with a digit.
pub fn validate_env_var_name(field_name: &str, name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if !valid {
        return Err(invalid(field_name, name, "Not a valid environment variable name"));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("api_base_url", "https://example.com").is_ok());
        assert!(validate_url("api_base_url", "http://localhost:8000").is_ok());
        assert!(validate_url("api_base_url", "").is_err());
        assert!(validate_url("api_base_url", "invalid-url").is_err());
        assert!(validate_url("api_base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("WORKERS", 4, 1).is_ok());
        assert!(validate_positive_number("WORKERS", 0, 1).is_err());
    }

    #[test]
    fn test_validate_env_var_name() {
        assert!(validate_env_var_name("required_vars", "DATABASE_URL").is_ok());
        assert!(validate_env_var_name("required_vars", "_PRIVATE").is_ok());
        assert!(validate_env_var_name("required_vars", "1ST").is_err());
        assert!(validate_env_var_name("required_vars", "SECRET-KEY").is_err());
        assert!(validate_env_var_name("required_vars", "").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("health.timeout_seconds", 10, 1, 300).is_ok());
        assert!(validate_range("health.timeout_seconds", 0, 1, 300).is_err());
    }
}
