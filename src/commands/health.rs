use crate::error::{FleetError, Result};
use crate::models::HealthReport;
use crate::state::AppContext;

pub async fn check_health(ctx: &AppContext, project_id: &str) -> Result<HealthReport> {
    let project = ctx.registry.get(project_id)?;
    let url = project.health_check_url.as_deref().ok_or_else(|| {
        FleetError::validation(format!(
            "no health check URL configured for project '{}'",
            project.id
        ))
    })?;
    Ok(ctx.health_prober.probe(url).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::fixtures::project;
    use crate::state::testing::context;

    #[tokio::test]
    async fn project_without_url_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _) = context(dir.path(), vec![project("niko-tv", &[], &[])]);
        let err = check_health(&ctx, "niko-tv").await.unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[tokio::test]
    async fn unreachable_url_reports_unhealthy() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = project("niko-tv", &[], &[]);
        p.health_check_url = Some("http://127.0.0.1:1/".to_string());
        let (ctx, _) = context(dir.path(), vec![p]);

        let report = check_health(&ctx, "niko-tv").await.unwrap();
        assert!(!report.healthy);
        assert!(report.error.is_some());
    }
}
