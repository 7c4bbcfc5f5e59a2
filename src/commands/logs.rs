use crate::error::{FleetError, Result};
use crate::models::{LogFileInfo, WebhookStatus};
use crate::services::log_parser::webhook_status;
use crate::services::ProcessManager;
use crate::state::AppContext;
use chrono::Utc;
use tracing::warn;

pub async fn get_deployment_log(
    ctx: &AppContext,
    project_id: &str,
    lines: Option<usize>,
) -> Result<String> {
    let project = ctx.registry.get(project_id)?;
    ctx.log_reader
        .tail(&project.log_paths.deployment, lines)
        .await
}

/// Tail of `<pm2 log dir>/<process>-error.log` for a declared process.
pub async fn get_error_log(
    ctx: &AppContext,
    project_id: &str,
    process: &str,
    lines: Option<usize>,
) -> Result<String> {
    let project = ctx.registry.get(project_id)?;
    let process = ProcessManager::declared(project, process)?;
    ctx.log_reader
        .tail(&project.error_log_path(&process), lines)
        .await
}

pub async fn list_log_files(ctx: &AppContext, project_id: &str) -> Result<Vec<LogFileInfo>> {
    let project = ctx.registry.get(project_id)?;
    ctx.log_reader.list_log_files(&project.log_paths.pm2).await
}

/// An unreadable log means "no activity seen", not a failure. A path outside
/// the allowed roots is still reported.
pub async fn get_webhook_status(ctx: &AppContext, project_id: &str) -> Result<WebhookStatus> {
    let project = ctx.registry.get(project_id)?;
    match ctx.log_reader.read(&project.log_paths.webhook).await {
        Ok(content) => Ok(webhook_status(&content, Utc::now())),
        Err(e @ FleetError::AccessDenied { .. }) => Err(e),
        Err(e) => {
            warn!(project = %project.id, error = %e, "webhook log unreadable, reporting offline");
            Ok(WebhookStatus::default())
        }
    }
}
