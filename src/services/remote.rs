use crate::error::{FleetError, Result};
use crate::models::{Project, VpnStatus};
use crate::services::executor::{CommandClass, CommandRunner, CommandSpec};
use crate::services::log_parser::parse_vpn_status;
use crate::utils::join_quoted;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub const DEPLOYMENT_ENV_FILE: &str = ".env.deployment";

/// ssh reserves this exit status for its own failures (unreachable host,
/// rejected key).
const SSH_FAILURE: i32 = 255;

/// Where a remote-hosted project actually runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub ssh_key: PathBuf,
    pub user: String,
    pub host: String,
    pub path: String,
}

impl RemoteTarget {
    /// Parses `KEY=VALUE` lines. Blank lines, `#` comments and surrounding
    /// quotes on values are tolerated.
    pub fn from_env(content: &str) -> Result<Self> {
        let vars: HashMap<&str, &str> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| (key.trim(), unquote(value.trim())))
            .collect();

        let required = |key: &str| -> Result<String> {
            vars.get(key)
                .filter(|value| !value.is_empty())
                .map(|value| value.to_string())
                .ok_or_else(|| {
                    FleetError::Config(format!("{} is missing {}", DEPLOYMENT_ENV_FILE, key))
                })
        };

        Ok(Self {
            ssh_key: PathBuf::from(required("SSH_KEY")?),
            user: required("REMOTE_USER")?,
            host: required("REMOTE_HOST")?,
            path: required("REMOTE_PATH")?,
        })
    }

    pub async fn load(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(DEPLOYMENT_ENV_FILE);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    FleetError::not_found(format!("deployment config {}", path.display()))
                }
                _ => FleetError::Read {
                    path: path.clone(),
                    source: e,
                },
            })?;
        Self::from_env(&content)
    }

    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// Runs fixed command templates on remote hosts over ssh.
pub struct RemoteShell {
    runner: Arc<dyn CommandRunner>,
    ssh: String,
    docker: String,
}

impl RemoteShell {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        ssh: impl Into<String>,
        docker: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            ssh: ssh.into(),
            docker: docker.into(),
        }
    }

    /// Every remote word is quoted on its own; nothing is interpolated into
    /// a larger shell string.
    pub fn ssh_spec<I, S>(&self, target: &RemoteTarget, remote_argv: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        CommandSpec::new(&self.ssh, CommandClass::Remote)
            .arg("-i")
            .arg(target.ssh_key.to_string_lossy())
            .args(["-o", "BatchMode=yes", "-o", "ConnectTimeout=5"])
            .arg(target.destination())
            .arg("--")
            .arg(join_quoted(remote_argv))
    }

    pub async fn run<I, S>(&self, target: &RemoteTarget, remote_argv: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let spec = self.ssh_spec(target, remote_argv);
        debug!(host = %target.host, command = %spec.display(), "remote command");
        match self.runner.run(spec).await {
            Ok(output) => Ok(output.stdout),
            Err(FleetError::ExternalCommand {
                code: Some(SSH_FAILURE),
                stderr,
                ..
            }) => Err(FleetError::Network(format!(
                "ssh to {} failed: {}",
                target.host,
                stderr.trim()
            ))),
            Err(e) => Err(e),
        }
    }

    /// Last `lines` lines of the tunnel container's compose logs.
    pub async fn vpn_logs(
        &self,
        target: &RemoteTarget,
        container: &str,
        lines: usize,
    ) -> Result<String> {
        let lines = lines.to_string();
        self.run(
            target,
            [
                self.docker.as_str(),
                "compose",
                "--project-directory",
                target.path.as_str(),
                "logs",
                "--no-color",
                "--tail",
                lines.as_str(),
                container,
            ],
        )
        .await
    }

    /// VPN state of a remote project, scraped from its tunnel logs.
    pub async fn vpn_status(
        &self,
        project: &Project,
        apps_root: &Path,
        container: &str,
        lines: usize,
    ) -> Result<VpnStatus> {
        if !project.is_remote {
            return Err(FleetError::validation(format!(
                "VPN status is only available for remote projects, '{}' is local",
                project.id
            )));
        }
        let target = RemoteTarget::load(&apps_root.join(project.id.as_str())).await?;
        let logs = self.vpn_logs(&target, container, lines).await?;
        let status = parse_vpn_status(&logs);
        info!(
            project = %project.id,
            connected = status.connected,
            healthy = status.healthy,
            "vpn status"
        );
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::fixtures::project;
    use crate::services::executor::testing::RecordingRunner;

    const ENV: &str = r#"
# deployment target
SSH_KEY=/home/deploy/.ssh/id_ed25519
REMOTE_USER=deploy
REMOTE_HOST="vpn-box.example.net"
REMOTE_PATH='/srv/scraper'
"#;

    fn remote_project() -> Project {
        let mut scraper = project("scraper", &[], &[]);
        scraper.is_remote = true;
        scraper
    }

    #[test]
    fn parses_deployment_env() {
        let target = RemoteTarget::from_env(ENV).unwrap();
        assert_eq!(target.ssh_key, PathBuf::from("/home/deploy/.ssh/id_ed25519"));
        assert_eq!(target.destination(), "deploy@vpn-box.example.net");
        assert_eq!(target.path, "/srv/scraper");
    }

    #[test]
    fn missing_key_is_config_error() {
        let err = RemoteTarget::from_env("SSH_KEY=/k\nREMOTE_USER=u\nREMOTE_HOST=h\n").unwrap_err();
        assert_eq!(err.kind(), "config");
        assert!(err.to_string().contains("REMOTE_PATH"));
    }

    #[test]
    fn ssh_argv_quotes_remote_words() {
        let shell = RemoteShell::new(Arc::new(RecordingRunner::new()), "ssh", "docker");
        let mut target = RemoteTarget::from_env(ENV).unwrap();
        target.path = "/srv/my app".to_string();

        let spec = shell.ssh_spec(
            &target,
            ["docker", "compose", "--project-directory", target.path.as_str()],
        );
        assert_eq!(spec.class, CommandClass::Remote);
        assert_eq!(
            spec.args,
            vec![
                "-i",
                "/home/deploy/.ssh/id_ed25519",
                "-o",
                "BatchMode=yes",
                "-o",
                "ConnectTimeout=5",
                "deploy@vpn-box.example.net",
                "--",
                "docker compose --project-directory '/srv/my app'",
            ]
        );
    }

    #[tokio::test]
    async fn vpn_status_requires_remote_project() {
        let runner = Arc::new(RecordingRunner::new());
        let shell = RemoteShell::new(runner.clone(), "ssh", "docker");
        let local = project("wordsearch", &["wordsearch"], &[]);

        let err = shell
            .vpn_status(&local, Path::new("/nonexistent"), "gluetun", 100)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn vpn_status_parses_remote_logs() {
        let apps_root = tempfile::tempdir().unwrap();
        let project_dir = apps_root.path().join("scraper");
        std::fs::create_dir(&project_dir).unwrap();
        std::fs::write(project_dir.join(DEPLOYMENT_ENV_FILE), ENV).unwrap();

        let runner = Arc::new(RecordingRunner::new());
        runner.respond_stdout(
            "gluetun | Initialization Sequence Completed\n\
             gluetun | Public IP address is 1.2.3.4 (US, California, Los Angeles)\n",
        );
        let shell = RemoteShell::new(runner.clone(), "ssh", "docker");

        let status = shell
            .vpn_status(&remote_project(), apps_root.path(), "gluetun", 100)
            .await
            .unwrap();
        assert!(status.connected);
        assert_eq!(status.city.as_deref(), Some("Los Angeles"));

        let calls = runner.calls();
        assert_eq!(
            calls[0].args.last().unwrap(),
            "docker compose --project-directory /srv/scraper logs --no-color --tail 100 gluetun"
        );
    }

    #[tokio::test]
    async fn ssh_connection_failure_is_network_error() {
        let apps_root = tempfile::tempdir().unwrap();
        let project_dir = apps_root.path().join("scraper");
        std::fs::create_dir(&project_dir).unwrap();
        std::fs::write(project_dir.join(DEPLOYMENT_ENV_FILE), ENV).unwrap();

        let runner = Arc::new(RecordingRunner::new());
        runner.respond(Err(FleetError::ExternalCommand {
            command: "ssh".to_string(),
            code: Some(255),
            stdout: String::new(),
            stderr: "ssh: connect to host vpn-box.example.net port 22: Connection refused\n"
                .to_string(),
        }));
        let shell = RemoteShell::new(runner, "ssh", "docker");

        let err = shell
            .vpn_status(&remote_project(), apps_root.path(), "gluetun", 100)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "network");
    }

    #[tokio::test]
    async fn missing_env_file_is_not_found() {
        let apps_root = tempfile::tempdir().unwrap();
        let shell = RemoteShell::new(Arc::new(RecordingRunner::new()), "ssh", "docker");
        let err = shell
            .vpn_status(&remote_project(), apps_root.path(), "gluetun", 100)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }
}
