use clap::{Parser, Subcommand, ValueEnum};
use fleet_deck::auth::{authorize_admin, Actor, StaticOperators};
use fleet_deck::commands;
use fleet_deck::config::{AppConfig, CONFIG_ENV};
use fleet_deck::{AppContext, FleetError, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Inspect and control self-hosted applications",
    long_about = None
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Operator bearer token
    #[arg(short, long, env = "FLEET_DECK_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every registered project
    Projects,
    /// Show one project
    Project { id: String },
    /// Process manager status of a project's declared processes
    Processes { project: String },
    /// start / stop / restart a declared process
    Pm2 {
        action: Pm2Action,
        project: String,
        name: String,
    },
    /// Recent process manager log output
    Pm2Logs {
        project: String,
        name: String,
        #[arg(short, long)]
        lines: Option<usize>,
    },
    /// status / start / stop / restart a declared systemd service
    Service {
        action: SystemdAction,
        project: String,
        name: String,
    },
    /// Recent journal output of a declared service
    ServiceLogs {
        project: String,
        name: String,
        #[arg(short, long)]
        lines: Option<usize>,
    },
    /// Tail of the deployment log
    DeployLog {
        project: String,
        #[arg(short, long)]
        lines: Option<usize>,
    },
    /// Tail of a process's error log
    ErrorLog {
        project: String,
        process: String,
        #[arg(short, long)]
        lines: Option<usize>,
    },
    /// `.log` files in the project's process log directory
    LogFiles { project: String },
    /// Webhook liveness from its activity log
    Webhook { project: String },
    /// Probe the project's health endpoint
    Health { project: String },
    /// Tunnel state of a remote project
    Vpn { project: String },
    /// Run the project's deploy script
    Deploy { project: String },
    /// Host CPU, memory and disk usage
    Metrics,
    /// All projects plus host metrics
    Overview,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Pm2Action {
    Start,
    Stop,
    Restart,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SystemdAction {
    Status,
    Start,
    Stop,
    Restart,
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fleet_deck=info"));

    // stdout carries the JSON result
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| FleetError::parse("command result", e))
}

async fn dispatch(ctx: &AppContext, actor: &Actor, command: Command) -> Result<Value> {
    match command {
        Command::Projects => to_json(commands::list_projects(ctx)),
        Command::Project { id } => to_json(commands::get_project(ctx, &id)?),
        Command::Processes { project } => {
            to_json(commands::get_process_status(ctx, &project).await?)
        }
        Command::Pm2 {
            action,
            project,
            name,
        } => {
            let output = match action {
                Pm2Action::Start => commands::start_process(ctx, actor, &project, &name).await?,
                Pm2Action::Stop => commands::stop_process(ctx, actor, &project, &name).await?,
                Pm2Action::Restart => commands::restart_process(ctx, actor, &project, &name).await?,
            };
            Ok(json!({ "output": output }))
        }
        Command::Pm2Logs {
            project,
            name,
            lines,
        } => Ok(json!({ "logs": commands::get_process_logs(ctx, &project, &name, lines).await? })),
        Command::Service {
            action,
            project,
            name,
        } => {
            let message = match action {
                SystemdAction::Status => {
                    return to_json(commands::get_service_status(ctx, &project, &name).await?)
                }
                SystemdAction::Start => {
                    commands::start_service(ctx, actor, &project, &name).await?
                }
                SystemdAction::Stop => commands::stop_service(ctx, actor, &project, &name).await?,
                SystemdAction::Restart => {
                    commands::restart_service(ctx, actor, &project, &name).await?
                }
            };
            Ok(json!({ "message": message }))
        }
        Command::ServiceLogs {
            project,
            name,
            lines,
        } => Ok(json!({ "logs": commands::get_service_logs(ctx, &project, &name, lines).await? })),
        Command::DeployLog { project, lines } => {
            Ok(json!({ "logs": commands::get_deployment_log(ctx, &project, lines).await? }))
        }
        Command::ErrorLog {
            project,
            process,
            lines,
        } => Ok(json!({ "logs": commands::get_error_log(ctx, &project, &process, lines).await? })),
        Command::LogFiles { project } => to_json(commands::list_log_files(ctx, &project).await?),
        Command::Webhook { project } => to_json(commands::get_webhook_status(ctx, &project).await?),
        Command::Health { project } => to_json(commands::check_health(ctx, &project).await?),
        Command::Vpn { project } => to_json(commands::get_vpn_status(ctx, &project).await?),
        Command::Deploy { project } => {
            to_json(commands::deploy_project(ctx, actor, &project).await?)
        }
        Command::Metrics => to_json(commands::get_metrics(ctx).await?),
        Command::Overview => to_json(commands::get_overview(ctx).await?),
    }
}

async fn run(cli: Cli) -> Result<Value> {
    let config_path = match cli.config {
        Some(path) => path,
        None => AppConfig::default_path()?,
    };
    let config = AppConfig::load(&config_path)?;
    info!("Configuration loaded from {}", config_path.display());

    let operators = StaticOperators::new(&config.operators);
    let actor = authorize_admin(cli.token.as_deref(), &operators, &operators).await?;

    let ctx = AppContext::new(config)?;
    dispatch(&ctx, &actor, cli.command).await
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let (body, code) = match run(cli).await {
        Ok(data) => (json!({ "success": true, "data": data }), ExitCode::SUCCESS),
        Err(e) => {
            error!(kind = e.kind(), "{}", e);
            (
                json!({ "success": false, "kind": e.kind(), "error": e.to_string() }),
                ExitCode::FAILURE,
            )
        }
    };

    match serde_json::to_string_pretty(&body) {
        Ok(rendered) => println!("{}", rendered),
        Err(e) => {
            error!("failed to render result: {}", e);
            return ExitCode::FAILURE;
        }
    }
    code
}
