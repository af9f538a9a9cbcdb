use crate::demo::{run_demo, run_roster_check, DemoArgs, RosterCheckArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use pto_scheduler::config::AppConfig;
use pto_scheduler::error::AppError;
use std::path::PathBuf;
use std::time::Duration;

/// Leave scheduling for shift-based staff: PTO submissions, seniority waitlists and approvals.
#[derive(Parser, Debug)]
#[command(name = "pto-scheduler", version)]
struct Cli {
    /// Defaults to `serve` when omitted.
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the leave request API over HTTP
    Serve(ServeArgs),
    /// Work with staff roster CSV exports
    #[command(subcommand)]
    Roster(RosterCommand),
    /// Walk a holiday slot from full to waitlisted to approved using in-memory stores
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum RosterCommand {
    /// Parse a roster export and summarise staff per shift
    Check(RosterCheckArgs),
}

impl Command {
    async fn execute(self) -> Result<(), AppError> {
        match self {
            Self::Serve(args) => server::run(args).await,
            Self::Roster(RosterCommand::Check(args)) => run_roster_check(args),
            Self::Demo(args) => run_demo(args),
        }
    }
}

/// Flags that win over the `APP_*` and `PTO_*` environment.
#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Bind address
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Listen port
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Seed the staff directory from this roster export
    #[arg(long, value_name = "CSV")]
    pub(crate) roster_csv: Option<PathBuf>,
    /// Milliseconds to wait on a contended (date, shift) slot before answering busy
    #[arg(long, value_name = "MS")]
    pub(crate) lock_timeout_ms: Option<u64>,
}

impl ServeArgs {
    pub(crate) fn apply_to(self, config: &mut AppConfig) {
        let Self {
            host,
            port,
            roster_csv,
            lock_timeout_ms,
        } = self;

        if let Some(host) = host {
            config.server.host = host;
        }
        if let Some(port) = port {
            config.server.port = port;
        }
        if roster_csv.is_some() {
            config.scheduling.staff_roster_csv = roster_csv;
        }
        if let Some(ms) = lock_timeout_ms {
            config.scheduling.slot_lock_timeout = Duration::from_millis(ms);
        }
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    Cli::parse()
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()))
        .execute()
        .await
}
