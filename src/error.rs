use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FleetError>;

/// Every failure surfaced to a caller of the core.
///
/// The only failure that never reaches a caller is an audit-log write error,
/// which is logged and dropped inside `AuditLog`.
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("access to {} is not allowed", path.display())]
    AccessDenied { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("insufficient privilege for `{command}`: {detail}")]
    Permission { command: String, detail: String },

    #[error("`{command}` timed out after {}s", after.as_secs_f64())]
    Timeout { command: String, after: Duration },

    #[error("`{command}` failed{}: {}", exit_suffix(*code), stderr.trim())]
    ExternalCommand {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to parse {what}: {message}")]
    Parse { what: String, message: String },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn exit_suffix(code: Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {}", code),
        None => " (terminated by signal)".to_string(),
    }
}

impl FleetError {
    pub fn validation(message: impl Into<String>) -> Self {
        FleetError::Validation(message.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        FleetError::NotFound {
            resource: resource.into(),
        }
    }

    pub fn parse(what: impl Into<String>, message: impl ToString) -> Self {
        FleetError::Parse {
            what: what.into(),
            message: message.to_string(),
        }
    }

    /// Stable tag a request handler can map onto a response status.
    pub fn kind(&self) -> &'static str {
        match self {
            FleetError::Validation(_) => "validation",
            FleetError::NotFound { .. } => "not_found",
            FleetError::AccessDenied { .. } => "access_denied",
            FleetError::Read { .. } => "read",
            FleetError::Permission { .. } => "permission",
            FleetError::Timeout { .. } => "timeout",
            FleetError::ExternalCommand { .. } => "external_command",
            FleetError::Network(_) => "network",
            FleetError::Parse { .. } => "parse",
            FleetError::Unauthorized(_) => "unauthorized",
            FleetError::Forbidden(_) => "forbidden",
            FleetError::Config(_) => "config",
            FleetError::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_command_message_carries_exit_code_and_stderr() {
        let err = FleetError::ExternalCommand {
            command: "pm2 jlist".to_string(),
            code: Some(3),
            stdout: String::new(),
            stderr: "daemon not running\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "`pm2 jlist` failed with exit code 3: daemon not running"
        );
        assert_eq!(err.kind(), "external_command");
    }

    #[test]
    fn timeout_message_reports_ceiling() {
        let err = FleetError::Timeout {
            command: "bash deploy.sh".to_string(),
            after: Duration::from_secs(300),
        };
        assert_eq!(err.to_string(), "`bash deploy.sh` timed out after 300s");
    }
}
