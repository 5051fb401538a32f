//! quota-token: inspect and drive Quota HUD token state from a terminal.
//!
//! Operates on the file-backed stores under `~/.quota-hud/` (or `--root`).
//! Grace windows live only as long as this process, so `watch` is the way to
//! see them decay after an action.
//!
//! ## Subcommands
//!
//! - `status`: derived state, hint and window snapshot
//! - `set`, `clear`, `migrate`, `clear-plaintext`: credential actions
//! - `watch`: poll and print every state change

mod commands;
mod logging;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use quota_core::StorageConfig;

use commands::Action;

#[derive(Parser)]
#[command(name = "quota-token")]
#[command(about = "Quota HUD token state inspector")]
#[command(version)]
struct Cli {
    /// Data directory (defaults to ~/.quota-hud)
    #[arg(long, global = true, value_name = "PATH")]
    root: Option<PathBuf>,

    /// Keep polling for this many milliseconds after an action
    #[arg(long, global = true, value_name = "MS")]
    follow_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the derived token state
    Status {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Store a token in secure storage and remove any plaintext copy
    Set {
        #[arg(value_name = "TOKEN")]
        token: String,
    },

    /// Remove the token from secure storage
    Clear,

    /// Move the plaintext token into secure storage
    Migrate {
        /// Leave the plaintext setting in place
        #[arg(long)]
        keep: bool,
    },

    /// Remove the plaintext copy, keeping the secure token
    ClearPlaintext,

    /// Poll and print state changes
    Watch {
        #[arg(long, default_value_t = 10_000, value_name = "MS")]
        duration_ms: u64,

        #[arg(long, default_value_t = 250, value_name = "MS")]
        interval_ms: u64,
    },
}

const FOLLOW_INTERVAL_MS: u64 = 100;

fn main() {
    let cli = Cli::parse();

    let storage = match cli.root {
        Some(root) => StorageConfig::with_root(root),
        None => match StorageConfig::new() {
            Ok(storage) => storage,
            Err(err) => {
                eprintln!("quota-token: {}", err);
                std::process::exit(1);
            }
        },
    };
    let _logging_guard = logging::init(&storage);

    let mut reconciler = commands::open(&storage);

    let action = match cli.command {
        Commands::Status { json } => {
            let output = if json {
                commands::render_status_json(&reconciler)
            } else {
                Ok(commands::render_status(&reconciler))
            };
            match output {
                Ok(text) => println!("{}", text),
                Err(err) => fail(err),
            }
            return;
        }
        Commands::Watch {
            duration_ms,
            interval_ms,
        } => {
            follow(&reconciler, duration_ms, interval_ms);
            return;
        }
        Commands::Set { token } => Action::Set(token),
        Commands::Clear => Action::Clear,
        Commands::Migrate { keep } => Action::Migrate {
            keep_plaintext: keep,
        },
        Commands::ClearPlaintext => Action::ClearPlaintext,
    };

    match commands::run_action(&mut reconciler, action) {
        Ok(text) => println!("{}", text),
        Err(err) => fail(err),
    }

    if let Some(duration_ms) = cli.follow_ms {
        follow(&reconciler, duration_ms, FOLLOW_INTERVAL_MS);
    }
}

fn follow(reconciler: &commands::Reconciler, duration_ms: u64, interval_ms: u64) {
    let mut stdout = std::io::stdout().lock();
    if let Err(err) = commands::watch(
        reconciler,
        Duration::from_millis(duration_ms),
        Duration::from_millis(interval_ms),
        &mut stdout,
    ) {
        tracing::warn!(error = %err, "quota-token watch output failed");
    }
}

fn fail(err: quota_core::TokenError) -> ! {
    tracing::error!(error = %err, "quota-token failed");
    eprintln!("quota-token: {}", err);
    std::process::exit(1);
}
