//! Binary file backend
//!
//! Appends length-prefixed frames (see [`super::frame`]) through a buffered
//! writer, flushing after every frame.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crossbeam::channel::Receiver;

use crate::config::{WalSyncStrategy, DEFAULT_MAX_FRAME_SIZE, DEFAULT_QUEUE_CAPACITY};
use crate::error::{LedgerError, Result};
use crate::event::Event;
use super::frame::{decode_payload, encode_frame, read_frame};
use super::reader::EventStream;
use super::writer::{Appender, EventSink, SyncTracker};
use super::TransactionLogger;

const BACKEND: &str = "binary";

/// Transaction logger writing length-prefixed binary frames
pub struct BinaryFileLogger {
    path: PathBuf,
    max_frame_size: usize,
    appender: Appender<BinarySink>,
}

struct BinarySink {
    writer: BufWriter<File>,
    max_frame_size: usize,
    sync: SyncTracker,
}

impl BinarySink {
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.writer.write_all(frame)?;
        self.writer.flush()?;
        self.sync.after_write(self.writer.get_ref())
    }
}

impl EventSink for BinarySink {
    fn append(&mut self, event: &Event) -> Result<u64> {
        // An oversized frame would make the whole log unreadable, so it is
        // rejected before anything reaches the file.
        let frame = encode_frame(event, self.max_frame_size)?;
        self.write_frame(&frame).map_err(|e| {
            LedgerError::Durability(format!("error writing event {}: {}", event.id, e))
        })?;
        Ok(event.id)
    }
}

impl BinaryFileLogger {
    /// Open or create a log file with default settings
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_options(
            path,
            DEFAULT_QUEUE_CAPACITY,
            DEFAULT_MAX_FRAME_SIZE,
            WalSyncStrategy::FlushOnly,
        )
    }

    pub fn with_options(
        path: impl AsRef<Path>,
        queue_capacity: usize,
        max_frame_size: usize,
        sync_strategy: WalSyncStrategy,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)?;

        tracing::debug!(path = %path.display(), max_frame_size, "opened binary transaction log");

        let sink = BinarySink {
            writer: BufWriter::new(file),
            max_frame_size,
            sync: SyncTracker::new(sync_strategy),
        };

        Ok(Self {
            path,
            max_frame_size,
            appender: Appender::new(BACKEND, sink, queue_capacity),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl TransactionLogger for BinaryFileLogger {
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
        let path = self.path.clone();
        let max_frame_size = self.max_frame_size;

        EventStream::spawn(BACKEND, self.appender.last_id_handle(), move |guard| {
            let mut reader = BufReader::new(File::open(&path)?);
            while let Some(payload) = read_frame(&mut reader, max_frame_size)? {
                let event = decode_payload(&payload)?;
                guard.emit(event)?;
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
