use crate::auth::Actor;
use crate::error::Result;
use crate::models::DeployOutcome;
use crate::services::AuditAction;
use crate::state::AppContext;

/// Runs the project's deploy script; the attempt and its result are both
/// audited.
pub async fn deploy_project(
    ctx: &AppContext,
    actor: &Actor,
    project_id: &str,
) -> Result<DeployOutcome> {
    let project = ctx.registry.get(project_id)?;
    let who = actor.audit_name();

    // a missing script is reported before anything is audited
    ctx.deployer.script(project).await?;

    ctx.audit_log
        .record(
            who,
            AuditAction::Deploy,
            format!("Project: {} - Deployment initiated", project.id),
        )
        .await;

    match ctx.deployer.deploy(project).await {
        Ok(outcome) => {
            ctx.audit_log
                .record(who, AuditAction::DeploySuccess, format!("Project: {}", project.id))
                .await;
            Ok(outcome)
        }
        Err(e) => {
            ctx.audit_log
                .record(
                    who,
                    AuditAction::DeployFailed,
                    format!("Project: {} - {}", project.id, e),
                )
                .await;
            Err(e)
        }
    }
}
