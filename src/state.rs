use crate::config::AppConfig;
use crate::error::Result;
use crate::services::{
    AuditLog, CommandRunner, Deployer, ExecutorLimits, HealthProber, LogReader, MetricsCollector,
    ProcessManager, ProjectRegistry, RemoteShell, ServiceController, SystemExecutor,
};
use std::sync::Arc;

/// Everything a handler needs, built once at start and passed by reference.
pub struct AppContext {
    pub config: AppConfig,
    pub registry: ProjectRegistry,
    pub process_manager: ProcessManager,
    pub service_controller: ServiceController,
    pub log_reader: LogReader,
    pub health_prober: HealthProber,
    pub audit_log: AuditLog,
    pub remote_shell: RemoteShell,
    pub deployer: Deployer,
    pub metrics: MetricsCollector,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Result<Self> {
        let runner = Arc::new(SystemExecutor::new(
            ExecutorLimits::from(&config.limits),
            config.binaries.sudo.clone(),
        ));
        Self::with_runner(config, runner)
    }

    /// Wires every component onto one shared runner.
    pub fn with_runner(config: AppConfig, runner: Arc<dyn CommandRunner>) -> Result<Self> {
        let registry = ProjectRegistry::new(config.projects.clone())?;
        let bins = &config.binaries;

        Ok(Self {
            process_manager: ProcessManager::new(runner.clone(), bins.pm2.clone()),
            service_controller: ServiceController::new(
                runner.clone(),
                bins.systemctl.clone(),
                bins.journalctl.clone(),
            ),
            log_reader: LogReader::new(config.allowed_log_roots.clone()),
            health_prober: HealthProber::new(config.limits.health_timeout())?,
            audit_log: AuditLog::new(config.audit_log.clone()),
            remote_shell: RemoteShell::new(runner.clone(), bins.ssh.clone(), bins.docker.clone()),
            deployer: Deployer::new(runner.clone(), bins.bash.clone(), config.apps_root.clone()),
            metrics: MetricsCollector::new(runner),
            registry,
            config,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::models::Project;
    use crate::services::executor::testing::RecordingRunner;
    use std::path::Path;

    /// A context over `RecordingRunner` whose log roots and audit file live
    /// under `root`.
    pub fn context(root: &Path, projects: Vec<Project>) -> (AppContext, Arc<RecordingRunner>) {
        let mut config = AppConfig::from_json(r#"{"projects": []}"#).unwrap();
        config.apps_root = root.to_path_buf();
        config.allowed_log_roots = vec![root.to_path_buf()];
        config.audit_log = root.join("audit.log");
        config.projects = projects;

        let runner = Arc::new(RecordingRunner::new());
        let ctx = AppContext::with_runner(config, runner.clone()).unwrap();
        (ctx, runner)
    }
}
