use crate::auth::Actor;
use crate::error::Result;
use crate::models::ServiceStatusText;
use crate::services::{AuditAction, ServiceAction};
use crate::state::AppContext;

pub async fn get_service_status(
    ctx: &AppContext,
    project_id: &str,
    name: &str,
) -> Result<ServiceStatusText> {
    let project = ctx.registry.get(project_id)?;
    ctx.service_controller.status(project, name).await
}

pub async fn start_service(
    ctx: &AppContext,
    actor: &Actor,
    project_id: &str,
    name: &str,
) -> Result<String> {
    control(ctx, actor, project_id, name, ServiceAction::Start).await
}

pub async fn stop_service(
    ctx: &AppContext,
    actor: &Actor,
    project_id: &str,
    name: &str,
) -> Result<String> {
    control(ctx, actor, project_id, name, ServiceAction::Stop).await
}

pub async fn restart_service(
    ctx: &AppContext,
    actor: &Actor,
    project_id: &str,
    name: &str,
) -> Result<String> {
    control(ctx, actor, project_id, name, ServiceAction::Restart).await
}

pub async fn get_service_logs(
    ctx: &AppContext,
    project_id: &str,
    name: &str,
    lines: Option<usize>,
) -> Result<String> {
    let project = ctx.registry.get(project_id)?;
    ctx.service_controller.logs(project, name, lines).await
}

async fn control(
    ctx: &AppContext,
    actor: &Actor,
    project_id: &str,
    name: &str,
    action: ServiceAction,
) -> Result<String> {
    let project = ctx.registry.get(project_id)?;
    let message = ctx.service_controller.control(project, name, action).await?;

    let tag = match action {
        ServiceAction::Start => AuditAction::ServiceStart,
        ServiceAction::Stop => AuditAction::ServiceStop,
        ServiceAction::Restart => AuditAction::ServiceRestart,
    };
    ctx.audit_log
        .record(
            actor.audit_name(),
            tag,
            format!("Service: {}, Project: {}", name, project.id),
        )
        .await;
    Ok(message)
}
