mod commands;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tidemark_common::Version;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tidemark", version, about = "Apply and revert versioned schema migrations")]
pub struct Cli {
    /// Config file (YAML or TOML). Defaults to ./tidemark.{yml,yaml,toml}.
    #[arg(long, short, global = true, env = "TIDEMARK_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database holding the version ledger.
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Migrations directory.
    #[arg(long, global = true)]
    pub path: Option<PathBuf>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Migrate to VERSION, or apply everything pending. `0` reverts everything.
    Migrate { version: Option<Version> },
    /// Apply pending migrations, optionally stopping at a version.
    Up {
        #[arg(long)]
        to: Option<Version>,
    },
    /// Revert applied migrations, optionally stopping at a version.
    Down {
        #[arg(long)]
        to: Option<Version>,
    },
    /// Move forward to VERSION, or by a number of steps (default 1).
    Forward {
        #[arg(conflicts_with = "steps")]
        version: Option<Version>,
        #[arg(long)]
        steps: Option<usize>,
    },
    /// Revert the most recent migration(s).
    Rollback {
        #[arg(long, default_value_t = 1)]
        steps: usize,
    },
    /// List every migration and whether it is applied.
    Status,
    /// List migrations that have not been applied yet.
    Pending,
    /// Print the current version.
    Version,
    /// Create a new migration file.
    New {
        name: String,
        /// Number the file `last + 1` instead of with a timestamp.
        #[arg(long)]
        sequential: bool,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match commands::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            let code = e
                .downcast_ref::<tidemark_common::Error>()
                .map(|e| e.exit_code())
                .unwrap_or(1);
            ExitCode::from(code as u8)
        }
    }
}
