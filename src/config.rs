use crate::error::{FleetError, Result};
use crate::models::Project;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "FLEET_DECK_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_apps_root")]
    pub apps_root: PathBuf,
    #[serde(default = "default_allowed_log_roots")]
    pub allowed_log_roots: Vec<PathBuf>,
    #[serde(default = "default_audit_log")]
    pub audit_log: PathBuf,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub binaries: Binaries,
    #[serde(default = "default_vpn_container")]
    pub vpn_container: String,
    #[serde(default = "default_vpn_log_lines")]
    pub vpn_log_lines: usize,
    #[serde(default)]
    pub operators: Vec<OperatorEntry>,
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub query_timeout_secs: u64,
    pub control_timeout_secs: u64,
    pub remote_timeout_secs: u64,
    pub deploy_timeout_secs: u64,
    pub max_output_bytes: usize,
    pub health_timeout_secs: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            query_timeout_secs: 10,
            control_timeout_secs: 30,
            remote_timeout_secs: 10,
            deploy_timeout_secs: 300,
            max_output_bytes: 10 * 1024 * 1024,
            health_timeout_secs: 5,
        }
    }
}

impl Limits {
    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }
}

/// Program names or absolute paths of every external tool the core spawns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Binaries {
    pub pm2: String,
    pub systemctl: String,
    pub journalctl: String,
    pub sudo: String,
    pub ssh: String,
    pub bash: String,
    pub docker: String,
}

impl Default for Binaries {
    fn default() -> Self {
        Self {
            pm2: "pm2".to_string(),
            systemctl: "systemctl".to_string(),
            journalctl: "journalctl".to_string(),
            sudo: "sudo".to_string(),
            ssh: "ssh".to_string(),
            bash: "bash".to_string(),
            docker: "docker".to_string(),
        }
    }
}

/// A bearer token accepted by the bundled static identity verifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorEntry {
    pub token: String,
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

fn default_apps_root() -> PathBuf {
    PathBuf::from("/home/apps")
}

fn default_allowed_log_roots() -> Vec<PathBuf> {
    vec![PathBuf::from("/home/apps/")]
}

fn default_audit_log() -> PathBuf {
    PathBuf::from("logs").join("audit.log")
}

fn default_vpn_container() -> String {
    "gluetun".to_string()
}

fn default_vpn_log_lines() -> usize {
    100
}

impl AppConfig {
    /// `~/.fleet-deck/config.json`
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir()
            .ok_or_else(|| FleetError::Config("cannot resolve home directory".to_string()))?;
        Ok(home.join(".fleet-deck").join("config.json"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FleetError::Config(format!(
                "config file {} does not exist",
                path.display()
            )));
        }

        let content = fs::read_to_string(path).map_err(|e| FleetError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_json(&content)
            .map_err(|e| FleetError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json(content: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}
