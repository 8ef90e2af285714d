use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Map Python-style level names (as used by `LOG_LEVEL`) to tracing directives.
pub fn normalize_level(level: &str) -> Option<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" | "warning" => Some("warn"),
        "error" | "critical" | "fatal" => Some("error"),
        "off" => Some("off"),
        _ => None,
    }
}

/// Filter directive used when `RUST_LOG` is not set.
pub fn default_directive(verbose: bool, log_level: Option<&str>) -> String {
    if verbose {
        return "startup_orchestrator=debug,info".to_string();
    }
    match log_level.and_then(normalize_level) {
        Some(level) => level.to_string(),
        None => "info".to_string(),
    }
}

pub fn init_cli_logger(verbose: bool, log_level: Option<&str>, json: bool) {
    let directive = default_directive(verbose, log_level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        // platform log collectors parse one JSON object per line
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .json(),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .compact(),
            )
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_level_names() {
        assert_eq!(normalize_level("WARNING"), Some("warn"));
        assert_eq!(normalize_level("CRITICAL"), Some("error"));
        assert_eq!(normalize_level("Info"), Some("info"));
        assert_eq!(normalize_level("loud"), None);
    }

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false, None), "info");
        assert_eq!(default_directive(false, Some("WARNING")), "warn");
        assert_eq!(default_directive(false, Some("bogus")), "info");
        assert_eq!(default_directive(true, Some("WARNING")), "startup_orchestrator=debug,info");
    }
}
