//! Post-launch health probing of a running deployment.

use crate::config::toml_config::{ExternalApi, HealthConfig};
use crate::utils::error::Result;
use crate::utils::validation::validate_url;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComponentHealth {
    fn healthy() -> Self {
        Self {
            status: ComponentStatus::Healthy,
            response_time: None,
            data: None,
            message: None,
            error: None,
        }
    }

    fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            status: ComponentStatus::Unhealthy,
            error: Some(error.into()),
            ..Self::healthy()
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == ComponentStatus::Healthy
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl OverallStatus {
    pub const ALL: [OverallStatus; 3] = [
        OverallStatus::Healthy,
        OverallStatus::Degraded,
        OverallStatus::Unhealthy,
    ];

    pub fn exit_code(&self) -> i32 {
        match self {
            OverallStatus::Healthy => 0,
            OverallStatus::Degraded => 1,
            OverallStatus::Unhealthy => 2,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            OverallStatus::Healthy => "healthy: every component responded as expected",
            OverallStatus::Degraded => {
                "degraded: the API is up but the database or an external API failed"
            }
            OverallStatus::Unhealthy => "unhealthy: the API health endpoint is down or erroring",
        }
    }
}

/// Exit status table appended to the health monitor's `--help`.
pub fn exit_status_help() -> String {
    let mut help = String::from("Exit status:\n");
    for status in OverallStatus::ALL {
        help.push_str(&format!("  {}  {}\n", status.exit_code(), status.description()));
    }
    help
}

#[derive(Debug, Clone, Serialize)]
pub struct Components {
    pub api: ComponentHealth,
    pub database: ComponentHealth,
    pub external_apis: BTreeMap<String, ComponentHealth>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub timestamp: DateTime<Utc>,
    pub total_check_time: f64,
    pub overall_status: OverallStatus,
    pub components: Components,
}

impl Components {
    /// The API itself being down is unhealthy; anything else failing is degraded.
    pub fn overall_status(&self) -> OverallStatus {
        if !self.api.is_healthy() {
            OverallStatus::Unhealthy
        } else if !self.database.is_healthy()
            || self.external_apis.values().any(|c| !c.is_healthy())
        {
            OverallStatus::Degraded
        } else {
            OverallStatus::Healthy
        }
    }
}

pub struct HealthMonitor {
    client: Client,
    base_url: String,
    external_apis: Vec<ExternalApi>,
}

impl HealthMonitor {
    pub fn new(base_url: &str, config: &HealthConfig) -> Result<Self> {
        validate_url("api_base_url", base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("startup-orchestrator-health/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            external_apis: config.external_apis.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn check_api_health(&self) -> ComponentHealth {
        let url = format!("{}/health", self.base_url);
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => return ComponentHealth::unhealthy(e.to_string()),
        };

        if response.status() != StatusCode::OK {
            return ComponentHealth::unhealthy(format!("HTTP {}", response.status().as_u16()));
        }

        let response_time = response
            .headers()
            .get("X-Process-Time")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        match response.json::<serde_json::Value>().await {
            Ok(data) => ComponentHealth {
                response_time: Some(response_time),
                data: Some(data),
                ..ComponentHealth::healthy()
            },
            Err(e) => ComponentHealth::unhealthy(format!("invalid health payload: {}", e)),
        }
    }

    /// An authenticated endpoint rejecting a bogus token proves the API
    /// reached its user store.
    pub async fn check_database_connectivity(&self) -> ComponentHealth {
        let url = format!("{}/api/users/me", self.base_url);
        match self
            .client
            .get(&url)
            .bearer_auth("invalid")
            .send()
            .await
        {
            Ok(response)
                if matches!(
                    response.status(),
                    StatusCode::UNAUTHORIZED | StatusCode::UNPROCESSABLE_ENTITY
                ) =>
            {
                ComponentHealth {
                    message: Some("Database accessible".to_string()),
                    ..ComponentHealth::healthy()
                }
            }
            Ok(response) => ComponentHealth::unhealthy(format!(
                "Unexpected status: {}",
                response.status().as_u16()
            )),
            Err(e) => ComponentHealth::unhealthy(e.to_string()),
        }
    }

    pub async fn check_external_apis(&self) -> BTreeMap<String, ComponentHealth> {
        let checks = self
            .external_apis
            .iter()
            .map(|api| {
                let client = self.client.clone();
                let url = api.url.clone();
                let handle = tokio::spawn(async move {
                    match client.get(&url).send().await {
                        Ok(response) if response.status() == StatusCode::OK => {
                            ComponentHealth::healthy()
                        }
                        Ok(response) => ComponentHealth::unhealthy(format!(
                            "HTTP {}",
                            response.status().as_u16()
                        )),
                        Err(e) => ComponentHealth::unhealthy(e.to_string()),
                    }
                });
                (api.name.clone(), handle)
            })
            .collect();

        collect_checks(checks).await
    }

    pub async fn run_health_check(&self) -> HealthReport {
        tracing::info!("🏥 Starting health check against {}", self.base_url);
        let start = Instant::now();

        let (api, database, external_apis) = tokio::join!(
            self.check_api_health(),
            self.check_database_connectivity(),
            self.check_external_apis(),
        );

        let components = Components {
            api,
            database,
            external_apis,
        };
        let elapsed = start.elapsed().as_secs_f64();

        HealthReport {
            timestamp: Utc::now(),
            total_check_time: (elapsed * 100.0).round() / 100.0,
            overall_status: components.overall_status(),
            components,
        }
    }
}

/// Every configured name ends up in the map; a task that panicked or was
/// cancelled counts as unhealthy.
async fn collect_checks(
    checks: Vec<(String, JoinHandle<ComponentHealth>)>,
) -> BTreeMap<String, ComponentHealth> {
    let mut results = BTreeMap::new();
    for (name, handle) in checks {
        let health = match handle.await {
            Ok(health) => health,
            Err(e) => {
                tracing::warn!("External API check for {} failed to complete: {}", name, e);
                ComponentHealth::unhealthy(e.to_string())
            }
        };
        results.insert(name, health);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn components(api: bool, db: bool, external: &[bool]) -> Components {
        let status = |ok: bool| {
            if ok {
                ComponentHealth::healthy()
            } else {
                ComponentHealth::unhealthy("down")
            }
        };
        Components {
            api: status(api),
            database: status(db),
            external_apis: external
                .iter()
                .enumerate()
                .map(|(i, ok)| (format!("api_{}", i), status(*ok)))
                .collect(),
        }
    }

    #[test]
    fn test_overall_status() {
        assert_eq!(components(true, true, &[true, true]).overall_status(), OverallStatus::Healthy);
        assert_eq!(components(true, false, &[true]).overall_status(), OverallStatus::Degraded);
        assert_eq!(components(true, true, &[true, false]).overall_status(), OverallStatus::Degraded);
        assert_eq!(components(false, true, &[]).overall_status(), OverallStatus::Unhealthy);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(OverallStatus::Healthy.exit_code(), 0);
        assert_eq!(OverallStatus::Degraded.exit_code(), 1);
        assert_eq!(OverallStatus::Unhealthy.exit_code(), 2);
    }

    #[test]
    fn test_exit_status_help_documents_every_code() {
        let help = exit_status_help();
        assert!(help.contains("0  healthy"));
        assert!(help.contains("1  degraded"));
        assert!(help.contains("2  unhealthy: the API health endpoint is down"));
    }

    #[tokio::test]
    async fn test_failed_check_task_is_reported_unhealthy() {
        let ok = tokio::spawn(async { ComponentHealth::healthy() });
        let panicked = tokio::spawn(async {
            if true {
                panic!("connection pool poisoned");
            }
            ComponentHealth::healthy()
        });

        let external_apis = collect_checks(vec![
            ("payments".to_string(), ok),
            ("ocr".to_string(), panicked),
        ])
        .await;

        assert_eq!(external_apis.len(), 2);
        assert!(external_apis["payments"].is_healthy());
        assert!(!external_apis["ocr"].is_healthy());
        assert!(external_apis["ocr"].error.is_some());

        let components = Components {
            api: ComponentHealth::healthy(),
            database: ComponentHealth::healthy(),
            external_apis,
        };
        assert_eq!(components.overall_status(), OverallStatus::Degraded);
    }

    #[test]
    fn test_component_serialization_skips_empty_fields() {
        let json = serde_json::to_value(ComponentHealth::unhealthy("HTTP 503")).unwrap();
        assert_eq!(json, serde_json::json!({"status": "unhealthy", "error": "HTTP 503"}));
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(HealthMonitor::new("localhost:8000", &HealthConfig::default()).is_err());
        let monitor = HealthMonitor::new("http://localhost:8000/", &HealthConfig::default()).unwrap();
        assert_eq!(monitor.base_url(), "http://localhost:8000");
    }
}
