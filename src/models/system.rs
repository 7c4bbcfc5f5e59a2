use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetrics {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    /// Root filesystem usage as reported by `df`, e.g. `"42%"`.
    pub disk_usage: String,
    pub sampled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemOverview {
    pub projects: Vec<super::ProjectOverview>,
    pub system_metrics: SystemMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployOutcome {
    pub message: String,
    pub output: String,
    pub errors: Option<String>,
    pub truncated: bool,
}

/// Raw text from the service manager; not parsed further.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatusText {
    pub service: String,
    pub text: String,
    pub state: ServiceExit,
}

/// Exit classification of a `systemctl status` query (LSB status codes).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServiceExit {
    Running,
    NotRunning,
    Unknown,
}

impl ServiceExit {
    pub fn from_exit_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => ServiceExit::Running,
            Some(1..=3) => ServiceExit::NotRunning,
            _ => ServiceExit::Unknown,
        }
    }
}
