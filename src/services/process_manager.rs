use crate::error::{FleetError, Result};
use crate::models::{ProcessState, ProcessStatus, Project, ProjectProcesses};
use crate::services::executor::{CommandClass, CommandRunner, CommandSpec};
use crate::utils::Identifier;
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_LOG_LINES: usize = 100;
pub const MAX_LOG_LINES: usize = 1000;

/// Clamps a requested line count into `[1, MAX_LOG_LINES]`.
pub fn clamp_lines(requested: Option<usize>) -> usize {
    requested
        .unwrap_or(DEFAULT_LOG_LINES)
        .clamp(1, MAX_LOG_LINES)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessAction {
    Start,
    Stop,
    Restart,
}

impl ProcessAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessAction::Start => "start",
            ProcessAction::Stop => "stop",
            ProcessAction::Restart => "restart",
        }
    }
}

#[derive(Debug, Deserialize)]
struct Pm2Entry {
    name: String,
    pm2_env: Pm2Env,
    #[serde(default)]
    monit: Pm2Monit,
}

#[derive(Debug, Deserialize)]
struct Pm2Env {
    status: String,
    #[serde(default)]
    pm_uptime: Option<i64>,
    #[serde(default)]
    restart_time: u32,
}

#[derive(Debug, Default, Deserialize)]
struct Pm2Monit {
    #[serde(default)]
    cpu: f64,
    #[serde(default)]
    memory: u64,
}

impl From<Pm2Entry> for ProcessStatus {
    fn from(entry: Pm2Entry) -> Self {
        ProcessStatus {
            name: entry.name,
            status: ProcessState::from(entry.pm2_env.status.as_str()),
            uptime: entry
                .pm2_env
                .pm_uptime
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
            restart_count: entry.pm2_env.restart_time,
            cpu_percent: entry.monit.cpu,
            memory_bytes: entry.monit.memory,
        }
    }
}

/// Deserializes `pm2 jlist` output.
pub fn parse_listing(raw: &str) -> Result<Vec<ProcessStatus>> {
    let entries: Vec<Pm2Entry> =
        serde_json::from_str(raw.trim()).map_err(|e| FleetError::parse("process listing", e))?;
    Ok(entries.into_iter().map(ProcessStatus::from).collect())
}

/// Keeps exactly the entries whose name the project declares.
pub fn filter_for_project(all: &[ProcessStatus], project: &Project) -> ProjectProcesses {
    let processes = all
        .iter()
        .filter(|p| project.pm2_processes.contains(p.name.as_str()))
        .cloned()
        .collect();
    ProjectProcesses::from_processes(processes)
}

/// Client for the pm2 process manager.
pub struct ProcessManager {
    runner: Arc<dyn CommandRunner>,
    pm2: String,
}

impl ProcessManager {
    pub fn new(runner: Arc<dyn CommandRunner>, pm2: impl Into<String>) -> Self {
        Self {
            runner,
            pm2: pm2.into(),
        }
    }

    /// Full listing of every supervised process.
    pub async fn list(&self) -> Result<Vec<ProcessStatus>> {
        let output = self
            .runner
            .run(CommandSpec::new(&self.pm2, CommandClass::Query).arg("jlist"))
            .await?;
        let processes = parse_listing(&output.stdout)?;
        debug!(count = processes.len(), "pm2 listing parsed");
        Ok(processes)
    }

    pub async fn project_status(&self, project: &Project) -> Result<ProjectProcesses> {
        let all = self.list().await?;
        Ok(filter_for_project(&all, project))
    }

    /// Runs `pm2 <action> <name>` for a process the project declares.
    pub async fn control(
        &self,
        project: &Project,
        name: &str,
        action: ProcessAction,
    ) -> Result<String> {
        let process = Self::declared(project, name)?;
        info!(project = %project.id, process = %process, action = action.as_str(), "pm2 control");
        let output = self
            .runner
            .run(
                CommandSpec::new(&self.pm2, CommandClass::Control)
                    .args([action.as_str(), process.as_str()]),
            )
            .await?;
        Ok(output.stdout)
    }

    pub async fn logs(
        &self,
        project: &Project,
        name: &str,
        lines: Option<usize>,
    ) -> Result<String> {
        let process = Self::declared(project, name)?;
        let lines = clamp_lines(lines);
        let output = self
            .runner
            .run(CommandSpec::new(&self.pm2, CommandClass::Query).args([
                "logs".to_string(),
                process.to_string(),
                "--lines".to_string(),
                lines.to_string(),
                "--nostream".to_string(),
            ]))
            .await?;
        Ok(output.stdout)
    }

    /// Sanitize, then check membership in the project's declared set.
    pub fn declared(project: &Project, name: &str) -> Result<Identifier> {
        let process = Identifier::new(name)?;
        if !project.declares_process(&process) {
            return Err(FleetError::validation(format!(
                "process '{}' is not declared by project '{}'",
                process, project.id
            )));
        }
        Ok(process)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::fixtures::project;
    use crate::services::executor::testing::RecordingRunner;

    const LISTING: &str = r#"[
        {"name": "apps-dev", "pm_id": 0,
         "pm2_env": {"status": "online", "pm_uptime": 1704067200000, "restart_time": 2},
         "monit": {"cpu": 1.5, "memory": 104857600}},
        {"name": "wordsearch", "pm_id": 1,
         "pm2_env": {"status": "stopped", "pm_uptime": 1704067200000, "restart_time": 0},
         "monit": {"cpu": 0, "memory": 0}},
        {"name": "as-builts-dev", "pm_id": 2,
         "pm2_env": {"status": "errored", "restart_time": 15},
         "monit": {"cpu": 0, "memory": 0}},
        {"name": "as-builts-prod", "pm_id": 3,
         "pm2_env": {"status": "launching", "pm_uptime": 1704067200000, "restart_time": 1},
         "monit": {"cpu": 12.25, "memory": 2048}}
    ]"#;

    #[test]
    fn parses_listing_fields() {
        let processes = parse_listing(LISTING).unwrap();
        assert_eq!(processes.len(), 4);
        let first = &processes[0];
        assert_eq!(first.name, "apps-dev");
        assert_eq!(first.status, ProcessState::Online);
        assert_eq!(first.restart_count, 2);
        assert_eq!(first.memory_bytes, 104857600);
        assert_eq!(
            first.uptime.unwrap().to_rfc3339(),
            "2024-01-01T00:00:00+00:00"
        );
        assert_eq!(processes[2].status, ProcessState::Errored);
        assert!(processes[2].uptime.is_none());
        assert_eq!(processes[3].status, ProcessState::Unknown);
    }

    #[test]
    fn malformed_listing_is_parse_error() {
        let malformed = [
            "not json",
            "{}",
            r#"[{"name": "x"}]"#,
            r#"[{"pm2_env": {"status": "online"}}]"#,
        ];
        for raw in malformed {
            assert_eq!(parse_listing(raw).unwrap_err().kind(), "parse", "{raw}");
        }
    }

    #[test]
    fn filters_to_declared_names_exactly() {
        let all = parse_listing(LISTING).unwrap();
        let as_builts = project(
            "as-builts",
            &["as-builts-dev", "as-builts-prod", "As-Builts-Stage"],
            &[],
        );
        let summary = filter_for_project(&all, &as_builts);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.online, 0);

        let demosite = project("demosite", &["apps-dev"], &[]);
        let summary = filter_for_project(&all, &demosite);
        assert_eq!((summary.online, summary.total), (1, 1));

        let case_mismatch = project("other", &["Apps-Dev"], &[]);
        assert_eq!(filter_for_project(&all, &case_mismatch).total, 0);
    }

    #[tokio::test]
    async fn project_status_queries_jlist() {
        let runner = Arc::new(RecordingRunner::new());
        runner.respond_stdout(LISTING);
        let manager = ProcessManager::new(runner.clone(), "pm2");

        let summary = manager
            .project_status(&project("demosite", &["apps-dev"], &[]))
            .await
            .unwrap();
        assert_eq!(summary.online, 1);

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].display(), "pm2 jlist");
    }

    #[tokio::test]
    async fn repeated_status_queries_are_identical() {
        let runner = Arc::new(RecordingRunner::new());
        runner.respond_stdout(LISTING).respond_stdout(LISTING);
        let manager = ProcessManager::new(runner, "pm2");
        let demosite = project("demosite", &["apps-dev"], &[]);

        let first = manager.project_status(&demosite).await.unwrap();
        let second = manager.project_status(&demosite).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn listing_command_failure_propagates() {
        let runner = Arc::new(RecordingRunner::new());
        runner.respond(Err(FleetError::ExternalCommand {
            command: "pm2 jlist".to_string(),
            code: Some(1),
            stdout: String::new(),
            stderr: "pm2: daemon not running".to_string(),
        }));
        let manager = ProcessManager::new(runner, "pm2");
        assert_eq!(manager.list().await.unwrap_err().kind(), "external_command");
    }

    #[tokio::test]
    async fn control_rejects_undeclared_or_invalid_names_without_running() {
        let runner = Arc::new(RecordingRunner::new());
        let manager = ProcessManager::new(runner.clone(), "pm2");
        let demosite = project("demosite", &["apps-dev"], &[]);

        for name in ["wordsearch", "apps-dev; reboot", ""] {
            let err = manager
                .control(&demosite, name, ProcessAction::Restart)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), "validation");
        }
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn control_and_logs_build_argv() {
        let runner = Arc::new(RecordingRunner::new());
        let manager = ProcessManager::new(runner.clone(), "/usr/local/bin/pm2");
        let demosite = project("demosite", &["apps-dev"], &[]);

        manager
            .control(&demosite, "apps-dev", ProcessAction::Stop)
            .await
            .unwrap();
        manager.logs(&demosite, "apps-dev", Some(5000)).await.unwrap();

        let calls = runner.calls();
        assert_eq!(calls[0].args, vec!["stop", "apps-dev"]);
        assert_eq!(calls[0].class, CommandClass::Control);
        assert_eq!(
            calls[1].display(),
            "/usr/local/bin/pm2 logs apps-dev --lines 1000 --nostream"
        );
    }

    #[test]
    fn clamps_line_counts() {
        assert_eq!(clamp_lines(None), 100);
        assert_eq!(clamp_lines(Some(0)), 1);
        assert_eq!(clamp_lines(Some(250)), 250);
        assert_eq!(clamp_lines(Some(100_000)), 1000);
    }
}
