//! LedgerKV Command Line Tool
//!
//! Replays a transaction log into a fresh store and applies one operation.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use ledgerkv::{Backend, Config, Engine, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// LedgerKV CLI
#[derive(Parser, Debug)]
#[command(name = "ledgerkv")]
#[command(about = "Key-value store backed by a replayable transaction log")]
#[command(version)]
struct Args {
    /// Log backend
    #[arg(short, long, value_enum, default_value = "binary")]
    backend: BackendArg,

    /// Log file (or SQLite database) path
    #[arg(short, long, default_value = "./transaction.log")]
    path: PathBuf,

    /// Append queue capacity
    #[arg(short, long, default_value = "16")]
    queue_capacity: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    Text,
    Binary,
    Sqlite,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Set a key
    Put { key: String, value: String },

    /// Print a key's value
    Get { key: String },

    /// Remove a key
    Delete { key: String },

    /// Replay the log and print the resulting store
    Dump,

    /// Print the persisted events in order
    Events,
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ledgerkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::debug!("LedgerKV v{}", ledgerkv::VERSION);

    match execute(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(args: Args) -> Result<()> {
    let backend = match args.backend {
        BackendArg::Text => Backend::TextFile(args.path),
        BackendArg::Binary => Backend::BinaryFile(args.path),
        BackendArg::Sqlite => Backend::Sqlite(args.path),
    };

    let config = Config::builder()
        .backend(backend)
        .queue_capacity(args.queue_capacity)
        .build();

    if let Command::Events = args.command {
        // Raw history only: no replay, no writer
        let logger = ledgerkv::open_logger(&config)?;
        for event in logger.read_events()? {
            let event = event?;
            println!("{}\t{}\t{}\t{}", event.id, event.kind, event.key, event.value);
        }
        return Ok(());
    }

    let engine = Engine::open(config)?;

    match args.command {
        Command::Put { key, value } => {
            engine.put(&key, &value)?;
        }
        Command::Get { key } => {
            println!("{}", engine.get(&key)?);
        }
        Command::Delete { key } => {
            let previous = engine.delete(&key)?;
            tracing::info!(key = %key, previous = %previous, "deleted");
        }
        Command::Dump => {
            let mut entries: Vec<_> = engine.store().snapshot().into_iter().collect();
            entries.sort();
            for (key, value) in entries {
                println!("{}\t{}", key, value);
            }
            println!("# last id: {}", engine.last_id());
        }
        Command::Events => {}
    }

    engine.close()
}
