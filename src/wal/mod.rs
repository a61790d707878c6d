//! Transaction Log Module
//!
//! Provides durability through append-only logging of store mutations.
//!
//! ## Responsibilities
//! - Queue mutations for a single background writer (bounded, FIFO)
//! - Assign strictly increasing event ids, starting at 1
//! - Stream persisted history back in id order for replay
//! - Surface the first write failure exactly once; the writer never restarts
//!
//! ## Backends
//! ```text
//! ┌──────────────────┬──────────────────────────────────────────┐
//! │ TextFileLogger   │ id \t type \t key \t value \n            │
//! ├──────────────────┼──────────────────────────────────────────┤
//! │ BinaryFileLogger │ Len (4, LE) │ bincode payload            │
//! ├──────────────────┼──────────────────────────────────────────┤
//! │ SqliteLogger     │ transactions(sequence, event_type, ...)  │
//! └──────────────────┴──────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//! construct (medium open) → `read_events` (replay) → `run` → `write_*` ...
//!
//! Reading while the same instance is appending is unsupported: a pass sees
//! whatever prefix of the medium exists when it gets there. It never lowers
//! the last id and never holds a lock the append worker needs.

mod binary;
pub mod frame;
mod reader;
mod sqlite;
pub mod text;
mod writer;

use crossbeam::channel::Receiver;

use crate::config::{Backend, Config};
use crate::error::{LedgerError, Result};

pub use binary::BinaryFileLogger;
pub use reader::EventStream;
pub use sqlite::{ensure_schema, SqliteLogger, TABLE_NAME};
pub use text::TextFileLogger;

/// Common contract of every log backend
pub trait TransactionLogger: Send + Sync {
    /// Queue a put for durable append. Blocks only while the queue is full.
    ///
    /// Fails with `NotRunning` before [`run`](Self::run) and with
    /// `WriterStopped` once the worker has died.
    fn write_put(&self, key: &str, value: &str) -> Result<()>;

    /// Queue a delete for durable append
    fn write_delete(&self, key: &str) -> Result<()>;

    /// Start the append worker. A second call fails with `AlreadyStarted`.
    fn run(&mut self) -> Result<()>;

    /// Stream every persisted event from the beginning of the medium.
    ///
    /// Raises [`last_id`](Self::last_id) to the highest id read, never
    /// lowers it, so a later `run` continues the numbering. Dropping the
    /// stream early still finishes the scan.
    fn read_events(&self) -> Result<EventStream>;

    /// Last id assigned so far (0 if none)
    fn last_id(&self) -> u64;

    /// Terminal error signal. At most one error is ever delivered.
    fn errors(&self) -> Receiver<LedgerError>;

    fn is_running(&self) -> bool;

    /// Drain the queue, stop the worker and report its terminal error if it
    /// was not already taken from [`errors`](Self::errors)
    fn close(&mut self) -> Result<()>;
}

/// Construct the backend selected by the config
pub fn open_logger(config: &Config) -> Result<Box<dyn TransactionLogger>> {
    config.validate()?;

    let logger: Box<dyn TransactionLogger> = match &config.backend {
        Backend::TextFile(path) => Box::new(TextFileLogger::with_options(
            path,
            config.queue_capacity,
            config.sync_strategy,
        )?),
        Backend::BinaryFile(path) => Box::new(BinaryFileLogger::with_options(
            path,
            config.queue_capacity,
            config.max_frame_size,
            config.sync_strategy,
        )?),
        Backend::Sqlite(path) => {
            let conn = rusqlite::Connection::open(path).map_err(|e| {
                LedgerError::SchemaSetup(format!("error opening {}: {}", path.display(), e))
            })?;
            Box::new(SqliteLogger::from_connection(conn, config.queue_capacity)?)
        }
        Backend::SqliteInMemory => {
            let conn = rusqlite::Connection::open_in_memory().map_err(|e| {
                LedgerError::SchemaSetup(format!("error opening in-memory db: {}", e))
            })?;
            Box::new(SqliteLogger::from_connection(conn, config.queue_capacity)?)
        }
    };

    Ok(logger)
}
