//! toolgate CLI - Main entry point

mod cli;
mod history;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use toolgate_core::ToolRunner;
use toolgate_foundation::{GatewayConfig, JsonStore, PermissionTable};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// toolgate - permission-gated tool runner (files, commands, HTTP)
#[derive(Parser, Debug)]
#[command(name = "toolgate")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Load configuration from this file only (skips the layered lookup)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Working directory for relative paths (overrides sandbox.workingDir)
    #[arg(short, long, global = true)]
    working_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Call a tool and print the result JSON
    Call {
        /// Tool name, or `-` to read `{"tool": .., "args": {"user_id": ..}}` from stdin
        tool: String,

        /// Principal the call is attributed to
        #[arg(short, long)]
        user: Option<String>,

        /// Tool arguments as a JSON object
        #[arg(short, long)]
        args: Option<String>,
    },
    /// List registered tools
    Tools {
        /// Print input schemas as JSON
        #[arg(long)]
        schema: bool,
    },
    /// Show (or change) principal capabilities
    Perms {
        /// Principal to show; all principals when omitted
        principal: Option<String>,

        /// Grant a capability and save to .toolgate/permissions.json
        #[arg(long, requires = "principal")]
        grant: Option<String>,

        /// Revoke a capability and save to .toolgate/permissions.json
        #[arg(long, requires = "principal")]
        revoke: Option<String>,
    },
    /// Inspect file snapshots
    History {
        #[command(subcommand)]
        command: history::HistoryCommand,
    },
    /// Show recorded tool calls (persisted with audit.dbPath)
    Audit {
        /// Filter by principal
        #[arg(short, long)]
        user: Option<String>,

        /// Filter by tool name
        #[arg(short, long)]
        tool: Option<String>,

        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging (stdout은 결과 JSON 전용)
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let (config, store) = load_config(&args)?;
    let runner = ToolRunner::from_config(config)?;

    match args.command {
        Command::Call { tool, user, args } => cli::run_call(&runner, &tool, user, args).await,
        Command::Tools { schema } => cli::list_tools(&runner, schema),
        Command::Perms {
            principal,
            grant,
            revoke,
        } => cli::permissions(&runner, &store, principal, grant, revoke),
        Command::History { command } => history::run(&runner, command).await,
        Command::Audit { user, tool, limit } => cli::audit(&runner, user, tool, limit).await,
    }
}

/// 설정 로드 + 저장된 권한 테이블 병합
fn load_config(args: &Args) -> anyhow::Result<(GatewayConfig, JsonStore)> {
    let cwd = match &args.working_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };

    let mut config = match &args.config {
        Some(path) => GatewayConfig::load_from(path)?,
        None => GatewayConfig::load(&cwd)?,
    };
    if args.working_dir.is_some() || config.sandbox.working_dir.is_none() {
        config.sandbox.working_dir = Some(cwd.clone());
    }

    let store = JsonStore::project(&cwd);
    if let Some(saved) = PermissionTable::load(&store)? {
        tracing::debug!(path = %store.base_dir().display(), "Loaded saved permissions");
        config.permissions.merge(saved);
    }

    Ok((config, store))
}
