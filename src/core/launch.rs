use crate::config::toml_config::{AppConfig, ServerConfig};
use crate::config::RuntimeSettings;
use crate::domain::model::{LaunchMode, LaunchPlan};

/// Pick the server command for this environment.
///
/// The process-managed launch reads binding and worker count from its own
/// configuration artifact; the direct launch names them inline.
pub fn resolve_launch_plan(
    settings: &RuntimeSettings,
    app: &AppConfig,
    server: &ServerConfig,
) -> LaunchPlan {
    if settings.use_process_manager {
        LaunchPlan {
            mode: LaunchMode::ProcessManaged,
            program: server.process_manager_program.clone(),
            args: vec![
                "-c".to_string(),
                server.process_manager_config.clone(),
                app.module.clone(),
            ],
        }
    } else {
        LaunchPlan {
            mode: LaunchMode::Direct,
            program: server.direct_program.clone(),
            args: vec![
                app.module.clone(),
                "--host".to_string(),
                server.host.clone(),
                "--port".to_string(),
                settings.port.to_string(),
                "--workers".to_string(),
                settings.workers.to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> RuntimeSettings {
        RuntimeSettings::from_vars(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        )
        .unwrap()
    }

    #[test]
    fn test_direct_launch_with_defaults() {
        let plan = resolve_launch_plan(&settings(&[]), &AppConfig::default(), &ServerConfig::default());
        assert_eq!(plan.mode, LaunchMode::Direct);
        assert_eq!(
            plan.command_line(),
            "uvicorn app.main:app --host 0.0.0.0 --port 8000 --workers 4"
        );
    }

    #[test]
    fn test_direct_launch_uses_port_and_workers() {
        let plan = resolve_launch_plan(
            &settings(&[("PORT", "9000"), ("WORKERS", "2"), ("USE_GUNICORN", "false")]),
            &AppConfig::default(),
            &ServerConfig::default(),
        );
        assert_eq!(plan.mode, LaunchMode::Direct);
        assert_eq!(plan.arg_value("--host"), Some("0.0.0.0"));
        assert_eq!(plan.arg_value("--port"), Some("9000"));
        assert_eq!(plan.arg_value("--workers"), Some("2"));
    }

    #[test]
    fn test_process_managed_launch() {
        let plan = resolve_launch_plan(
            &settings(&[("USE_GUNICORN", "true"), ("PORT", "9000")]),
            &AppConfig::default(),
            &ServerConfig::default(),
        );
        assert_eq!(plan.mode, LaunchMode::ProcessManaged);
        assert_eq!(plan.command_line(), "gunicorn -c gunicorn.conf.py app.main:app");
        assert_eq!(plan.arg_value("--port"), None);
    }
}
