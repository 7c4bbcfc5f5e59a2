use crate::config::Limits;
use crate::error::{FleetError, Result};
use crate::utils::{kill_process_group, kill_process_tree};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};
use uuid::Uuid;

/// Operation class of an invocation; selects its timeout ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandClass {
    /// Status, listing and log queries.
    Query,
    /// start / stop / restart.
    Control,
    /// Anything carried over ssh.
    Remote,
    /// Deployment scripts.
    Deploy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitPolicy {
    RequireSuccess,
    /// Non-zero exit is a valid answer (e.g. `systemctl status` of a stopped unit).
    AcceptAny,
}

/// A fixed program plus an argv array. Never passed through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub class: CommandClass,
    pub exit_policy: ExitPolicy,
    pub elevated: bool,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, class: CommandClass) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            class,
            exit_policy: ExitPolicy::RequireSuccess,
            elevated: false,
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn accept_any_exit(mut self) -> Self {
        self.exit_policy = ExitPolicy::AcceptAny;
        self
    }

    pub fn elevated(mut self) -> Self {
        self.elevated = true;
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Human-readable rendering for logs and error messages.
    pub fn display(&self) -> String {
        let mut rendered = self.program.clone();
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        rendered
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    /// Either stream hit the output ceiling and was cut.
    pub truncated: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Seam between the components and real process spawning.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, spec: CommandSpec) -> Result<CommandOutput>;
}

#[derive(Debug, Clone)]
pub struct ExecutorLimits {
    pub query_timeout: Duration,
    pub control_timeout: Duration,
    pub remote_timeout: Duration,
    pub deploy_timeout: Duration,
    pub max_output_bytes: usize,
}

impl ExecutorLimits {
    pub fn timeout_for(&self, class: CommandClass) -> Duration {
        match class {
            CommandClass::Query => self.query_timeout,
            CommandClass::Control => self.control_timeout,
            CommandClass::Remote => self.remote_timeout,
            CommandClass::Deploy => self.deploy_timeout,
        }
    }
}

impl From<&Limits> for ExecutorLimits {
    fn from(limits: &Limits) -> Self {
        Self {
            query_timeout: Duration::from_secs(limits.query_timeout_secs),
            control_timeout: Duration::from_secs(limits.control_timeout_secs),
            remote_timeout: Duration::from_secs(limits.remote_timeout_secs),
            deploy_timeout: Duration::from_secs(limits.deploy_timeout_secs),
            max_output_bytes: limits.max_output_bytes,
        }
    }
}

/// Spawns real child processes with a timeout and an output ceiling.
pub struct SystemExecutor {
    limits: ExecutorLimits,
    sudo: String,
}

impl SystemExecutor {
    pub fn new(limits: ExecutorLimits, sudo: impl Into<String>) -> Self {
        Self {
            limits,
            sudo: sudo.into(),
        }
    }

    /// Elevated specs run as `sudo -n <program> <args..>`; `-n` makes a
    /// missing sudoers rule fail instead of prompting.
    fn resolve(&self, spec: &CommandSpec) -> (String, Vec<String>) {
        if spec.elevated {
            let mut args = Vec::with_capacity(spec.args.len() + 2);
            args.push("-n".to_string());
            args.push(spec.program.clone());
            args.extend(spec.args.iter().cloned());
            (self.sudo.clone(), args)
        } else {
            (spec.program.clone(), spec.args.clone())
        }
    }
}

#[async_trait]
impl CommandRunner for SystemExecutor {
    async fn run(&self, spec: CommandSpec) -> Result<CommandOutput> {
        let invocation = Uuid::new_v4();
        let rendered = spec.display();
        let ceiling = self.limits.timeout_for(spec.class);
        let limit = self.limits.max_output_bytes;
        let (program, args) = self.resolve(&spec);

        let mut command = Command::new(&program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // own group, so a timeout can reach backgrounded descendants too
        #[cfg(unix)]
        command.process_group(0);
        if let Some(dir) = &spec.cwd {
            command.current_dir(dir);
        }

        debug!(
            %invocation,
            command = %rendered,
            elevated = spec.elevated,
            timeout_secs = ceiling.as_secs(),
            "spawning"
        );
        let started = Instant::now();
        let mut child = command
            .spawn()
            .map_err(|e| spawn_error(&program, &rendered, e))?;
        let pid = child.id();
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        let outcome = tokio::time::timeout(ceiling, async {
            let (stdout, stderr) = tokio::join!(
                read_capped(stdout_pipe, limit),
                read_capped(stderr_pipe, limit)
            );
            let status = child.wait().await;
            (stdout, stderr, status)
        })
        .await;

        let (stdout, stderr, status) = match outcome {
            Ok(finished) => finished,
            Err(_) => {
                warn!(%invocation, command = %rendered, "timed out, killing process tree");
                if let Some(pid) = pid {
                    kill_process_tree(pid).await;
                    // the child leads its group, so pgid == pid
                    kill_process_group(pid).await;
                }
                let _ = child.start_kill();
                let _ = child.wait().await;
                return Err(FleetError::Timeout {
                    command: rendered,
                    after: ceiling,
                });
            }
        };

        let (stdout, stdout_truncated) = stdout?;
        let (stderr, stderr_truncated) = stderr?;
        let status = status?;

        let output = CommandOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_code: status.code(),
            truncated: stdout_truncated || stderr_truncated,
        };
        debug!(
            %invocation,
            exit_code = ?output.exit_code,
            truncated = output.truncated,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "finished"
        );
        if output.truncated {
            warn!(
                %invocation,
                command = %rendered,
                limit,
                "output exceeded ceiling and was truncated"
            );
        }

        if output.success() || spec.exit_policy == ExitPolicy::AcceptAny {
            return Ok(output);
        }

        if spec.elevated && is_privilege_refusal(&output.stderr) {
            return Err(FleetError::Permission {
                command: rendered,
                detail: output.stderr.trim().to_string(),
            });
        }

        Err(FleetError::ExternalCommand {
            command: rendered,
            code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Reads a pipe to EOF, keeping at most `limit` bytes. Keeps draining past
/// the limit so the child never blocks on a full pipe.
async fn read_capped<R>(pipe: Option<R>, limit: usize) -> std::io::Result<(Vec<u8>, bool)>
where
    R: AsyncRead + Unpin,
{
    let mut captured = Vec::new();
    let mut truncated = false;
    let Some(mut pipe) = pipe else {
        return Ok((captured, truncated));
    };

    let mut chunk = [0u8; 8192];
    loop {
        let read = pipe.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        let room = limit.saturating_sub(captured.len());
        if read > room {
            captured.extend_from_slice(&chunk[..room]);
            truncated = true;
        } else {
            captured.extend_from_slice(&chunk[..read]);
        }
    }
    Ok((captured, truncated))
}

fn spawn_error(program: &str, rendered: &str, err: std::io::Error) -> FleetError {
    match err.kind() {
        ErrorKind::NotFound => FleetError::not_found(format!("program '{}'", program)),
        ErrorKind::PermissionDenied => FleetError::Permission {
            command: rendered.to_string(),
            detail: err.to_string(),
        },
        _ => FleetError::Io(err),
    }
}

fn is_privilege_refusal(stderr: &str) -> bool {
    let lowered = stderr.to_lowercase();
    [
        "a password is required",
        "is not in the sudoers file",
        "is not allowed to execute",
        "access denied",
        "interactive authentication required",
    ]
    .iter()
    .any(|marker| lowered.contains(marker))
}
