use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One process-manager entry, derived fresh on every query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStatus {
    pub name: String,
    pub status: ProcessState,
    pub uptime: Option<DateTime<Utc>>,
    pub restart_count: u32,
    pub cpu_percent: f64,
    pub memory_bytes: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProcessState {
    Online,
    Stopped,
    Errored,
    Unknown,
}

impl From<&str> for ProcessState {
    fn from(raw: &str) -> Self {
        match raw {
            "online" => ProcessState::Online,
            "stopped" => ProcessState::Stopped,
            "errored" => ProcessState::Errored,
            _ => ProcessState::Unknown,
        }
    }
}

/// The declared processes of one project that the process manager knows about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectProcesses {
    pub processes: Vec<ProcessStatus>,
    pub online: usize,
    pub total: usize,
}

impl ProjectProcesses {
    pub fn from_processes(processes: Vec<ProcessStatus>) -> Self {
        let online = processes
            .iter()
            .filter(|p| p.status == ProcessState::Online)
            .count();
        let total = processes.len();
        Self {
            processes,
            online,
            total,
        }
    }

    pub fn overall(&self) -> OverallState {
        if self.total > 0 && self.online == self.total {
            OverallState::Online
        } else {
            OverallState::Partial
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OverallState {
    Online,
    Partial,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOverview {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: OverallState,
    pub online: usize,
    pub total: usize,
    pub services: usize,
}
