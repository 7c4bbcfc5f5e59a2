use crate::error::Result;
use crate::models::{ProjectOverview, SystemMetrics, SystemOverview};
use crate::services::process_manager::filter_for_project;
use crate::state::AppContext;

pub async fn get_metrics(ctx: &AppContext) -> Result<SystemMetrics> {
    ctx.metrics.sample().await
}

/// One process listing and one metrics sample, shared by every project.
pub async fn get_overview(ctx: &AppContext) -> Result<SystemOverview> {
    let (all, system_metrics) =
        tokio::try_join!(ctx.process_manager.list(), ctx.metrics.sample())?;

    let projects = ctx
        .registry
        .all()
        .iter()
        .map(|project| {
            let summary = filter_for_project(&all, project);
            ProjectOverview {
                id: project.id.to_string(),
                name: project.name.clone(),
                description: project.description.clone(),
                status: summary.overall(),
                online: summary.online,
                total: summary.total,
                services: project.systemd_services.len(),
            }
        })
        .collect();

    Ok(SystemOverview {
        projects,
        system_metrics,
    })
}
