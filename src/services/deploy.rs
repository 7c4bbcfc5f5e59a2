use crate::error::{FleetError, Result};
use crate::models::{DeployOutcome, Project};
use crate::services::executor::{CommandClass, CommandRunner, CommandSpec};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub const DEPLOY_SCRIPT: &str = "deploy.sh";

/// Runs a project's own `deploy.sh` from its directory under the apps root.
pub struct Deployer {
    runner: Arc<dyn CommandRunner>,
    bash: String,
    apps_root: PathBuf,
}

impl Deployer {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        bash: impl Into<String>,
        apps_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            bash: bash.into(),
            apps_root: apps_root.into(),
        }
    }

    pub fn project_dir(&self, project: &Project) -> PathBuf {
        self.apps_root.join(project.id.as_str())
    }

    /// Path of the project's deploy script, `NotFound` if there is none.
    pub async fn script(&self, project: &Project) -> Result<PathBuf> {
        let script = self.project_dir(project).join(DEPLOY_SCRIPT);
        match tokio::fs::metadata(&script).await {
            Ok(meta) if meta.is_file() => Ok(script),
            _ => Err(FleetError::not_found(format!(
                "deploy script {}",
                script.display()
            ))),
        }
    }

    pub async fn deploy(&self, project: &Project) -> Result<DeployOutcome> {
        self.script(project).await?;
        let dir = self.project_dir(project);

        info!(project = %project.id, dir = %dir.display(), "running deployment script");
        let output = self
            .runner
            .run(
                CommandSpec::new(&self.bash, CommandClass::Deploy)
                    .arg(DEPLOY_SCRIPT)
                    .current_dir(&dir),
            )
            .await?;

        Ok(DeployOutcome {
            message: format!("Deployment for {} completed successfully", project.name),
            errors: (!output.stderr.is_empty()).then(|| output.stderr.clone()),
            output: output.stdout,
            truncated: output.truncated,
        })
    }
}
