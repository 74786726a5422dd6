//! CLI probe for the gigboard core.
//!
//! Without a subcommand it prints ping/version. Set `GIGBOARD_LOG_DIR` to an
//! absolute path to enable file logging.

use clap::{Parser, Subcommand};
use gigboard_core::{
    commission_for, default_log_level, init_logging, system_clock, CoreConfig, KvProjectRepository,
    RecurrenceEngine, RecurrenceScheduler, SqliteKvStore,
};
use std::error::Error;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

/// Gigboard task, recurrence and commission tooling
#[derive(Parser, Debug)]
#[command(name = "gigboard_cli")]
#[command(version)]
#[command(disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Print the commission split for an amount
    Quote {
        /// Amount in cents
        #[arg(value_name = "AMOUNT_CENTS")]
        amount_cents: u64,

        /// JSON config whose commission tiers replace the defaults
        #[arg(long, value_name = "CONFIG")]
        config: Option<PathBuf>,
    },

    /// Run one recurrence sweep against a store
    Sweep {
        #[arg(value_name = "DB_PATH")]
        db_path: PathBuf,
    },

    /// Sweep on the configured interval until Enter or EOF
    Run {
        #[arg(value_name = "DB_PATH")]
        db_path: PathBuf,

        /// JSON config file
        #[arg(value_name = "CONFIG")]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Ok(log_dir) = std::env::var("GIGBOARD_LOG_DIR") {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Option<Command>) -> Result<(), Box<dyn Error>> {
    match command {
        None => {
            println!("gigboard_core ping={}", gigboard_core::ping());
            println!("gigboard_core version={}", gigboard_core::core_version());
        }
        Some(Command::Quote {
            amount_cents,
            config,
        }) => {
            let quote = match config {
                Some(path) => CoreConfig::load(path)?
                    .commission_tiers
                    .quote(amount_cents)
                    .ok_or("commission schedule has no tier for this amount")?,
                None => commission_for(amount_cents),
            };
            println!(
                "tier={} rate_bps={} amount_cents={} fee_cents={} payout_cents={}",
                quote.tier, quote.rate_bps, quote.amount_cents, quote.fee_cents, quote.payout_cents
            );
        }
        Some(Command::Sweep { db_path }) => {
            let store = SqliteKvStore::open(&db_path)?;
            let engine = RecurrenceEngine::new(KvProjectRepository::new(store));
            let report = engine.sweep(system_clock())?;
            println!(
                "projects_scanned={} tasks_reset={} projects_written={}",
                report.projects_scanned, report.tasks_reset, report.projects_written
            );
        }
        Some(Command::Run { db_path, config }) => {
            let config = load_config(config.as_deref())?;
            let store = SqliteKvStore::open(&db_path)?;
            let engine = Arc::new(RecurrenceEngine::new(KvProjectRepository::new(store)));
            let handle = RecurrenceScheduler::start(engine, config.sweep_interval())?;
            println!(
                "sweeping every {}s; press Enter to stop",
                config.sweep_interval_secs
            );
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            handle.stop();
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<CoreConfig, Box<dyn Error>> {
    Ok(match path {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    })
}
