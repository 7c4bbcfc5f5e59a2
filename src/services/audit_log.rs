use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Pm2Start,
    Pm2Stop,
    Pm2Restart,
    ServiceStart,
    ServiceStop,
    ServiceRestart,
    Deploy,
    DeploySuccess,
    DeployFailed,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Pm2Start => "PM2_START",
            AuditAction::Pm2Stop => "PM2_STOP",
            AuditAction::Pm2Restart => "PM2_RESTART",
            AuditAction::ServiceStart => "SERVICE_START",
            AuditAction::ServiceStop => "SERVICE_STOP",
            AuditAction::ServiceRestart => "SERVICE_RESTART",
            AuditAction::Deploy => "DEPLOY",
            AuditAction::DeploySuccess => "DEPLOY_SUCCESS",
            AuditAction::DeployFailed => "DEPLOY_FAILED",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the audit file.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    pub action: AuditAction,
    pub details: String,
}

impl AuditRecord {
    pub fn new(actor: impl Into<String>, action: AuditAction, details: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            actor: actor.into(),
            action,
            details: details.into(),
        }
    }

    /// `[<timestamp>] [<actor>] <ACTION> - <details>`. Embedded newlines in
    /// the actor and the details are flattened so a record always stays on
    /// one line.
    pub fn to_line(&self) -> String {
        format!(
            "[{}] [{}] {} - {}\n",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            flatten(&self.actor),
            self.action,
            flatten(&self.details)
        )
    }
}

fn flatten(field: &str) -> String {
    field.replace(['\r', '\n'], " ")
}

/// Append-only, best-effort audit trail.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: write errors go to the diagnostic log only.
    pub async fn record(&self, actor: &str, action: AuditAction, details: impl Into<String>) {
        let record = AuditRecord::new(actor, action, details);
        if let Err(e) = self.append(&record).await {
            warn!(
                path = %self.path.display(),
                action = %record.action,
                error = %e,
                "audit write failed"
            );
        }
    }

    async fn append(&self, record: &AuditRecord) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(record.to_line().as_bytes()).await?;
        file.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn line_format() {
        let record = AuditRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap(),
            actor: "ops@example.com".to_string(),
            action: AuditAction::ServiceRestart,
            details: "Service: webhook,\nproject: demosite".to_string(),
        };
        assert_eq!(
            record.to_line(),
            concat!(
                "[2024-03-01T08:30:00.000Z] [ops@example.com] SERVICE_RESTART - ",
                "Service: webhook, project: demosite\n"
            )
        );
    }

    #[tokio::test]
    async fn actor_cannot_forge_a_second_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let audit = AuditLog::new(&path);

        let forged = "mallory\r\n[2024-01-01T00:00:00.000Z] [admin@example.com] DEPLOY";
        audit.record(forged, AuditAction::Pm2Stop, "Process: x").await;

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.starts_with('['));
        let flattened = "[mallory  [2024-01-01T00:00:00.000Z] [admin@example.com] DEPLOY]";
        assert!(content.contains(flattened));
        assert!(content.contains("PM2_STOP - Process: x"));
    }

    #[tokio::test]
    async fn appends_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("audit.log");
        let audit = AuditLog::new(&path);

        audit.record("ops@example.com", AuditAction::Deploy, "Project: wordsearch").await;
        audit
            .record("ops@example.com", AuditAction::DeploySuccess, "Project: wordsearch")
            .await;

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("] [ops@example.com] DEPLOY - Project: wordsearch"));
        assert!(lines[1].contains("DEPLOY_SUCCESS"));
    }

    #[tokio::test]
    async fn unwritable_destination_does_not_fail() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let audit = AuditLog::new(blocker.join("audit.log"));
        audit.record("ops", AuditAction::Pm2Stop, "Process: x").await;
        assert!(!blocker.join("audit.log").exists());
    }

    #[test]
    fn action_tags_serialize_as_written() {
        assert_eq!(
            serde_json::to_string(&AuditAction::Pm2Restart).unwrap(),
            "\"PM2_RESTART\""
        );
        assert_eq!(AuditAction::DeployFailed.to_string(), "DEPLOY_FAILED");
    }
}
