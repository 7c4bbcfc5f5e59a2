use crate::error::Result;
use crate::models::VpnStatus;
use crate::state::AppContext;

pub async fn get_vpn_status(ctx: &AppContext, project_id: &str) -> Result<VpnStatus> {
    let project = ctx.registry.get(project_id)?;
    ctx.remote_shell
        .vpn_status(
            project,
            &ctx.config.apps_root,
            &ctx.config.vpn_container,
            ctx.config.vpn_log_lines,
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::fixtures::project;
    use crate::state::testing::context;

    #[tokio::test]
    async fn uses_configured_container_and_line_count() {
        let dir = tempfile::tempdir().unwrap();
        let project_dir = dir.path().join("scraper");
        std::fs::create_dir(&project_dir).unwrap();
        std::fs::write(
            project_dir.join(".env.deployment"),
            "SSH_KEY=/k\nREMOTE_USER=deploy\nREMOTE_HOST=10.0.0.5\nREMOTE_PATH=/srv/scraper\n",
        )
        .unwrap();

        let mut scraper = project("scraper", &[], &[]);
        scraper.is_remote = true;
        let (ctx, runner) = context(dir.path(), vec![scraper]);
        runner.respond_stdout("healthy!\n");

        let status = get_vpn_status(&ctx, "scraper").await.unwrap();
        assert!(status.healthy);
        assert!(!status.connected);

        let call = &runner.calls()[0];
        assert_eq!(call.program, "ssh");
        assert!(call.args.contains(&"deploy@10.0.0.5".to_string()));
        assert!(call.args.last().unwrap().ends_with("--tail 100 gluetun"));
    }
}
