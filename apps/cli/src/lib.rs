//! # Tally CLI Library
//!
//! Everything behind the `tally` binary.
//!
//! ## Module Organization
//! ```text
//! tally_cli/
//! ├── lib.rs          ◄─── You are here (startup & dispatch)
//! ├── cli.rs          ◄─── clap argument definitions
//! ├── state.rs        ◄─── AppContext: config, database, service, views
//! ├── commands/       ◄─── One module per command group
//! └── error.rs        ◄─── CliError, error codes, exit statuses
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. Initialize logging ─── tracing-subscriber, RUST_LOG or default     │
//! │                                                                         │
//! │  2. Load config ───────── file ▶ TALLY_* env ▶ --db flag ▶ validate    │
//! │                                                                         │
//! │  3. `config ...` ──────── handled here, no database                    │
//! │                                                                         │
//! │  4. Open database ─────── SQLite, WAL, migrations                      │
//! │                                                                         │
//! │  5. Dispatch command                                                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod state;

use tally_live::TallyConfig;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

pub use cli::{Cli, Command};
pub use error::{CliError, CliResult, ErrorCode};
pub use state::AppContext;

use commands::Output;

/// Runs one command.
pub async fn run(cli: Cli) -> CliResult<()> {
    init_tracing();

    let mut config = TallyConfig::load(cli.config.clone())?;
    if let Some(db) = &cli.db {
        config.store.database_path = db.clone();
    }
    let out = Output { json: cli.json };

    if let Command::Config { action } = cli.command {
        return commands::config::run(&config, cli.config, action, out);
    }

    let ctx = AppContext::open(config).await?;
    info!("Starting tally");

    let result = dispatch(&ctx, cli.command, out).await;
    ctx.db.close().await;
    debug!("Database closed");
    result
}

async fn dispatch(ctx: &AppContext, command: Command, out: Output) -> CliResult<()> {
    match command {
        Command::Location { action } => commands::location::run(ctx, action, out).await,
        Command::Mint { count } => commands::item::mint(ctx, count, out).await,
        Command::Assign(args) => commands::item::assign(ctx, args, out).await,
        Command::Show { code } => commands::item::show(ctx, &code, out).await,
        Command::Search { term } => commands::item::search(ctx, &term, out).await,
        Command::Counts => commands::item::counts(ctx, out).await,
        Command::Sheet(args) => commands::sheet::run(ctx, args, out).await,
        Command::Config { action } => {
            commands::config::run(&ctx.config, None, action, out)
        }
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tally_live=trace` - Trace one crate
/// - Default: `info,tally=debug,sqlx=warn`
///
/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tally=debug,sqlx=warn"));

    // A subscriber may already be installed (tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
