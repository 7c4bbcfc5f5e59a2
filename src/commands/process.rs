use crate::auth::Actor;
use crate::error::Result;
use crate::models::ProjectProcesses;
use crate::services::{AuditAction, ProcessAction};
use crate::state::AppContext;

pub async fn get_process_status(ctx: &AppContext, project_id: &str) -> Result<ProjectProcesses> {
    let project = ctx.registry.get(project_id)?;
    ctx.process_manager.project_status(project).await
}

pub async fn start_process(
    ctx: &AppContext,
    actor: &Actor,
    project_id: &str,
    name: &str,
) -> Result<String> {
    control(ctx, actor, project_id, name, ProcessAction::Start).await
}

pub async fn stop_process(
    ctx: &AppContext,
    actor: &Actor,
    project_id: &str,
    name: &str,
) -> Result<String> {
    control(ctx, actor, project_id, name, ProcessAction::Stop).await
}

pub async fn restart_process(
    ctx: &AppContext,
    actor: &Actor,
    project_id: &str,
    name: &str,
) -> Result<String> {
    control(ctx, actor, project_id, name, ProcessAction::Restart).await
}

pub async fn get_process_logs(
    ctx: &AppContext,
    project_id: &str,
    name: &str,
    lines: Option<usize>,
) -> Result<String> {
    let project = ctx.registry.get(project_id)?;
    ctx.process_manager.logs(project, name, lines).await
}

async fn control(
    ctx: &AppContext,
    actor: &Actor,
    project_id: &str,
    name: &str,
    action: ProcessAction,
) -> Result<String> {
    let project = ctx.registry.get(project_id)?;
    let output = ctx.process_manager.control(project, name, action).await?;

    let tag = match action {
        ProcessAction::Start => AuditAction::Pm2Start,
        ProcessAction::Stop => AuditAction::Pm2Stop,
        ProcessAction::Restart => AuditAction::Pm2Restart,
    };
    ctx.audit_log
        .record(
            actor.audit_name(),
            tag,
            format!("Process: {}, Project: {}", name, project.id),
        )
        .await;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::fixtures::project;
    use crate::state::testing::context;

    fn admin() -> Actor {
        Actor {
            uid: "u1".to_string(),
            email: "ops@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn restart_is_audited() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, runner) = context(dir.path(), vec![project("demosite", &["apps-dev"], &[])]);

        restart_process(&ctx, &admin(), "demosite", "apps-dev")
            .await
            .unwrap();

        assert_eq!(runner.calls()[0].display(), "pm2 restart apps-dev");
        let audit = std::fs::read_to_string(dir.path().join("audit.log")).unwrap();
        assert!(
            audit.contains("[ops@example.com] PM2_RESTART - Process: apps-dev, Project: demosite")
        );
    }

    #[tokio::test]
    async fn rejected_control_is_not_audited() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, runner) = context(dir.path(), vec![project("demosite", &["apps-dev"], &[])]);

        let err = stop_process(&ctx, &admin(), "demosite", "wordsearch")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert!(runner.calls().is_empty());
        assert!(!dir.path().join("audit.log").exists());
    }

    #[tokio::test]
    async fn unknown_project_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _) = context(dir.path(), vec![]);
        let err = get_process_status(&ctx, "ghost").await.unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }
}
