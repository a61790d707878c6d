//! Relational backend
//!
//! Events live in a SQLite table whose auto-incrementing `sequence` column
//! doubles as the event id:
//!
//! ```sql
//! CREATE TABLE transactions (
//!     sequence   INTEGER PRIMARY KEY AUTOINCREMENT,
//!     event_type INTEGER NOT NULL,
//!     key        TEXT NOT NULL,
//!     value      TEXT
//! );
//! ```

use std::path::Path;
use std::sync::Arc;

use crossbeam::channel::Receiver;
use parking_lot::Mutex;
use rusqlite::{params, Connection};

use crate::config::DEFAULT_QUEUE_CAPACITY;
use crate::error::{LedgerError, Result};
use crate::event::{Event, EventKind};
use super::reader::EventStream;
use super::writer::{Appender, EventSink};
use super::TransactionLogger;

const BACKEND: &str = "sqlite";

/// Name of the event table
pub const TABLE_NAME: &str = "transactions";

const CREATE_TABLE_SQL: &str = "CREATE TABLE transactions (
    sequence   INTEGER PRIMARY KEY AUTOINCREMENT,
    event_type INTEGER NOT NULL,
    key        TEXT NOT NULL,
    value      TEXT
)";

const INSERT_SQL: &str = "INSERT INTO transactions (event_type, key, value) VALUES (?1, ?2, ?3)";

const SELECT_SQL: &str =
    "SELECT sequence, event_type, key, value FROM transactions ORDER BY sequence";

/// Transaction logger backed by a SQLite table
pub struct SqliteLogger {
    conn: Arc<Mutex<Connection>>,
    appender: Appender<SqliteSink>,
}

struct SqliteSink {
    conn: Arc<Mutex<Connection>>,
}

impl EventSink for SqliteSink {
    /// The database assigns the id; the worker's proposal is ignored
    fn append(&mut self, event: &Event) -> Result<u64> {
        let conn = self.conn.lock();
        conn.execute(INSERT_SQL, params![event.kind.code(), event.key, event.value])
            .map_err(|e| LedgerError::Durability(format!("error inserting event: {}", e)))?;

        let rowid = conn.last_insert_rowid();
        u64::try_from(rowid)
            .map_err(|_| LedgerError::Durability(format!("negative sequence assigned: {}", rowid)))
    }
}

impl SqliteLogger {
    /// Open or create a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            LedgerError::SchemaSetup(format!("error opening {}: {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), "opened sqlite transaction log");
        Self::from_connection(conn, DEFAULT_QUEUE_CAPACITY)
    }

    /// Private in-memory database, gone when the logger is dropped
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| LedgerError::SchemaSetup(format!("error opening in-memory db: {}", e)))?;
        Self::from_connection(conn, DEFAULT_QUEUE_CAPACITY)
    }

    /// Wrap an existing connection, creating the event table if needed
    pub fn from_connection(conn: Connection, queue_capacity: usize) -> Result<Self> {
        ensure_schema(&conn)?;
        let conn = Arc::new(Mutex::new(conn));
        let sink = SqliteSink {
            conn: Arc::clone(&conn),
        };

        Ok(Self {
            conn,
            appender: Appender::new(BACKEND, sink, queue_capacity),
        })
    }

    /// Run a closure against the underlying connection
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> T) -> T {
        f(&self.conn.lock())
    }
}

fn table_exists(conn: &Connection) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        [TABLE_NAME],
        |row| row.get(0),
    )
}

/// Verify the event table exists and create it when absent
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    let exists = table_exists(conn).map_err(|e| {
        LedgerError::SchemaSetup(format!("error verifying table {}: {}", TABLE_NAME, e))
    })?;

    if !exists {
        conn.execute_batch(CREATE_TABLE_SQL).map_err(|e| {
            LedgerError::SchemaSetup(format!("error creating table {}: {}", TABLE_NAME, e))
        })?;
        tracing::info!(table = TABLE_NAME, "created transaction table");
    }

    Ok(())
}

impl TransactionLogger for SqliteLogger {
    fn write_put(&self, key: &str, value: &str) -> Result<()> {
        self.appender.enqueue(Event::put(key, value))
    }

    fn write_delete(&self, key: &str) -> Result<()> {
        self.appender.enqueue(Event::delete(key))
    }

    fn run(&mut self) -> Result<()> {
        self.appender.run()
    }

    fn read_events(&self) -> Result<EventStream> {
        let conn = Arc::clone(&self.conn);

        EventStream::spawn(BACKEND, self.appender.last_id_handle(), move |guard| {
            // Copy the rows out; the lock is never held across a handover.
            let rows = {
                let conn = conn.lock();
                let mut stmt = conn.prepare(SELECT_SQL)?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, u32>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, Option<String>>(3)?,
                        ))
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            };

            for (sequence, code, key, value) in rows {
                let id = u64::try_from(sequence).map_err(|_| {
                    LedgerError::Corruption(format!("negative sequence: {}", sequence))
                })?;

                guard.emit(Event {
                    id,
                    kind: EventKind::from_code(code)?,
                    key,
                    value: value.unwrap_or_default(),
                })?;
            }
            Ok(())
        })
    }

    fn last_id(&self) -> u64 {
        self.appender.last_id()
    }

    fn errors(&self) -> Receiver<LedgerError> {
        self.appender.errors()
    }

    fn is_running(&self) -> bool {
        self.appender.is_running()
    }

    fn close(&mut self) -> Result<()> {
        self.appender.close()
    }
}
