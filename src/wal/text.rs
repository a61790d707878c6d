//! Text file backend
//!
//! ## File Format
//! ```text
//! id \t event_type \t key \t value \n
//! ```
//! One event per line, `event_type` 0 = Put, 1 = Delete, value empty for
//! deletes. Nothing is escaped, so keys containing a tab or a newline and
//! values containing a newline are refused at the queue with a
//! `Serialization` error. Tabs inside values are fine.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crossbeam::channel::Receiver;

use crate::config::{WalSyncStrategy, DEFAULT_QUEUE_CAPACITY};
use crate::error::{LedgerError, Result};
use crate::event::{Event, EventKind};
use super::reader::EventStream;
use super::writer::{Appender, EventSink, SyncTracker};
use super::TransactionLogger;

const BACKEND: &str = "text";

/// Transaction logger writing tab-separated lines
pub struct TextFileLogger {
    path: PathBuf,
    appender: Appender<TextSink>,
}

struct TextSink {
    writer: BufWriter<File>,
    sync: SyncTracker,
}

impl TextSink {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;
        self.sync.after_write(self.writer.get_ref())
    }
}

impl EventSink for TextSink {
    fn append(&mut self, event: &Event) -> Result<u64> {
        self.write_line(&format_line(event)).map_err(|e| {
            LedgerError::Durability(format!("error writing event {}: {}", event.id, e))
        })?;
        Ok(event.id)
    }
}

impl TextFileLogger {
    /// Open or create a log file with default queue and sync settings
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_options(path, DEFAULT_QUEUE_CAPACITY, WalSyncStrategy::FlushOnly)
    }

    pub fn with_options(
        path: impl AsRef<Path>,
        queue_capacity: usize,
        sync_strategy: WalSyncStrategy,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)?;

        tracing::debug!(path = %path.display(), "opened text transaction log");

        let sink = TextSink {
            writer: BufWriter::new(file),
            sync: SyncTracker::new(sync_strategy),
        };

        Ok(Self {
            path,
            appender: Appender::new(BACKEND, sink, queue_capacity),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TransactionLogger for TextFileLogger {
    fn write_put(&self, key: &str, value: &str) -> Result<()> {
        check_representable(key, value)?;
        self.appender.enqueue(Event::put(key, value))
    }

    fn write_delete(&self, key: &str) -> Result<()> {
        check_representable(key, "")?;
        self.appender.enqueue(Event::delete(key))
    }

    fn run(&mut self) -> Result<()> {
        self.appender.run()
    }

    fn read_events(&self) -> Result<EventStream> {
        let path = self.path.clone();
        EventStream::spawn(BACKEND, self.appender.last_id_handle(), move |guard| {
            // Separate handle so the append position is never disturbed
            let mut reader = BufReader::new(File::open(&path)?);
            let mut line = String::new();
            let mut line_no = 0u64;

            loop {
                line.clear();
                let read = reader.read_line(&mut line).map_err(|e| match e.kind() {
                    io::ErrorKind::InvalidData => {
                        LedgerError::Corruption(format!("line {}: invalid UTF-8", line_no + 1))
                    }
                    _ => LedgerError::Io(e),
                })?;
                if read == 0 {
                    return Ok(());
                }
                line_no += 1;

                let Some(content) = line.strip_suffix('\n') else {
                    return Err(LedgerError::Corruption(format!(
                        "line {}: truncated final line",
                        line_no
                    )));
                };

                let event = parse_line(content).map_err(|e| match e {
                    LedgerError::Corruption(msg) => {
                        LedgerError::Corruption(format!("line {}: {}", line_no, msg))
                    }
                    other => other,
                })?;

                guard.emit(event)?;
            }
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

/// Refuse fields that would not survive a round trip through one line
pub fn check_representable(key: &str, value: &str) -> Result<()> {
    if key.contains(['\t', '\n']) {
        return Err(LedgerError::Serialization(format!(
            "key {:?} contains a tab or newline",
            key
        )));
    }
    if value.contains('\n') {
        return Err(LedgerError::Serialization(format!(
            "value for key {:?} contains a newline",
            key
        )));
    }
    Ok(())
}

/// Render one event as a newline-terminated log line
pub fn format_line(event: &Event) -> String {
    format!(
        "{}\t{}\t{}\t{}\n",
        event.id,
        event.kind.code(),
        event.key,
        event.value
    )
}

/// Parse one log line without its trailing newline.
///
/// Delete lines may omit the value field.
pub fn parse_line(line: &str) -> Result<Event> {
    let mut fields = line.splitn(4, '\t');

    let id_field = fields.next().unwrap_or_default();
    let id = id_field
        .parse::<u64>()
        .map_err(|_| LedgerError::Corruption(format!("invalid event id: {:?}", id_field)))?;

    let kind_field = fields
        .next()
        .ok_or_else(|| LedgerError::Corruption("missing event type".to_string()))?;
    let code = kind_field
        .parse::<u32>()
        .map_err(|_| LedgerError::Corruption(format!("invalid event type: {:?}", kind_field)))?;
    let kind = EventKind::from_code(code)?;

    let key = fields
        .next()
        .ok_or_else(|| LedgerError::Corruption("missing key".to_string()))?;

    let value = match (kind, fields.next()) {
        (EventKind::Put, None) => {
            return Err(LedgerError::Corruption("put event without value".to_string()))
        }
        (_, value) => value.unwrap_or_default(),
    };

    Ok(Event {
        id,
        kind,
        key: key.to_string(),
        value: value.to_string(),
    })
}
