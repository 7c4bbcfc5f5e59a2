use crate::error::{FleetError, Result};
use crate::models::{Project, ServiceExit, ServiceStatusText};
use crate::services::executor::{CommandClass, CommandRunner, CommandSpec};
use crate::services::process_manager::clamp_lines;
use crate::utils::Identifier;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// State-changing systemd verbs. Status is a query and goes through
/// `ServiceController::status` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceAction {
    Start,
    Stop,
    Restart,
}

impl ServiceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceAction::Start => "start",
            ServiceAction::Stop => "stop",
            ServiceAction::Restart => "restart",
        }
    }

    fn past_tense(&self) -> &'static str {
        match self {
            ServiceAction::Start => "started",
            ServiceAction::Stop => "stopped",
            ServiceAction::Restart => "restarted",
        }
    }
}

/// Maps named actions onto systemd invocations for declared services.
pub struct ServiceController {
    runner: Arc<dyn CommandRunner>,
    systemctl: String,
    journalctl: String,
}

impl ServiceController {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        systemctl: impl Into<String>,
        journalctl: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            systemctl: systemctl.into(),
            journalctl: journalctl.into(),
        }
    }

    /// `systemctl status` output verbatim. A non-zero exit only means the
    /// unit is not running and still yields the text.
    pub async fn status(&self, project: &Project, name: &str) -> Result<ServiceStatusText> {
        let service = Self::declared(project, name)?;
        let output = self
            .runner
            .run(
                CommandSpec::new(&self.systemctl, CommandClass::Query)
                    .args(["status", service.as_str()])
                    .accept_any_exit(),
            )
            .await?;

        let text = if output.stdout.is_empty() {
            output.stderr
        } else {
            output.stdout
        };
        Ok(ServiceStatusText {
            service: service.to_string(),
            text,
            state: ServiceExit::from_exit_code(output.exit_code),
        })
    }

    /// start / stop / restart under elevated privilege. Returns a
    /// confirmation, not the raw command output.
    pub async fn control(
        &self,
        project: &Project,
        name: &str,
        action: ServiceAction,
    ) -> Result<String> {
        let service = Self::declared(project, name)?;
        info!(
            project = %project.id,
            service = %service,
            action = action.as_str(),
            "service control"
        );
        self.runner
            .run(
                CommandSpec::new(&self.systemctl, CommandClass::Control)
                    .args([action.as_str(), service.as_str()])
                    .elevated(),
            )
            .await?;
        Ok(format!("Service {} {} successfully", service, action.past_tense()))
    }

    pub async fn restart(&self, project: &Project, name: &str) -> Result<String> {
        self.control(project, name, ServiceAction::Restart).await
    }

    /// `journalctl -u <name> -n <lines> --no-pager`, verbatim.
    pub async fn logs(
        &self,
        project: &Project,
        name: &str,
        lines: Option<usize>,
    ) -> Result<String> {
        let service = Self::declared(project, name)?;
        let lines = clamp_lines(lines);
        let output = self
            .runner
            .run(CommandSpec::new(&self.journalctl, CommandClass::Query).args([
                "-u".to_string(),
                service.to_string(),
                "-n".to_string(),
                lines.to_string(),
                "--no-pager".to_string(),
            ]))
            .await?;
        Ok(output.stdout)
    }

    fn declared(project: &Project, name: &str) -> Result<Identifier> {
        let service = Identifier::new(name)?;
        if !project.declares_service(&service) {
            return Err(FleetError::validation(format!(
                "service '{}' is not declared by project '{}'",
                service, project.id
            )));
        }
        Ok(service)
    }
}
