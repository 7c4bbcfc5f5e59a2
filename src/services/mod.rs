pub mod audit_log;
pub mod deploy;
pub mod executor;
pub mod health_prober;
pub mod log_parser;
pub mod log_reader;
pub mod metrics;
pub mod process_manager;
pub mod project_registry;
pub mod remote;
pub mod service_controller;

pub use audit_log::{AuditAction, AuditLog, AuditRecord};
pub use deploy::Deployer;
pub use executor::{
    CommandClass, CommandOutput, CommandRunner, CommandSpec, ExecutorLimits, ExitPolicy,
    SystemExecutor,
};
pub use health_prober::HealthProber;
pub use log_reader::LogReader;
pub use metrics::MetricsCollector;
pub use process_manager::{ProcessAction, ProcessManager};
pub use project_registry::ProjectRegistry;
pub use remote::{RemoteShell, RemoteTarget};
pub use service_controller::{ServiceAction, ServiceController};
