use crate::utils::Identifier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// One self-hosted application as declared in the registry.
///
/// Loaded once at start and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Identifier,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub pm2_processes: BTreeSet<Identifier>,
    #[serde(default)]
    pub systemd_services: BTreeSet<Identifier>,
    #[serde(default)]
    pub ports: Vec<u16>,
    pub log_paths: LogPaths,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub health_check_url: Option<String>,
    #[serde(default)]
    pub is_remote: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub remote_host: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogPaths {
    /// Directory the process manager writes per-process logs into.
    pub pm2: PathBuf,
    pub deployment: PathBuf,
    pub webhook: PathBuf,
}

impl Project {
    pub fn declares_process(&self, name: &Identifier) -> bool {
        self.pm2_processes.contains(name)
    }

    pub fn declares_service(&self, name: &Identifier) -> bool {
        self.systemd_services.contains(name)
    }

    /// `<pm2 log dir>/<process>-error.log`
    pub fn error_log_path(&self, process: &Identifier) -> PathBuf {
        self.log_paths.pm2.join(format!("{}-error.log", process))
    }
}
