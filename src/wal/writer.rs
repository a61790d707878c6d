//! Append worker
//!
//! The single background writer shared by every backend. Producers push
//! events onto a bounded queue; the worker assigns ids, hands each event to
//! the backend's sink and records the id it was stored under.

use std::fs::File;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, Receiver, Sender};

use crate::config::WalSyncStrategy;
use crate::error::{LedgerError, Result};
use crate::event::Event;

/// Destination of the append worker. Owned exclusively by the worker thread
/// once the logger is running.
pub(crate) trait EventSink: Send + 'static {
    /// Persist one event and return the id it was stored under
    fn append(&mut self, event: &Event) -> Result<u64>;
}

enum State<S> {
    /// Constructed, medium open, no queue yet
    Idle(S),

    Running {
        sender: Sender<Event>,
        handle: JoinHandle<()>,
    },

    /// Closed, or the worker could not be spawned
    Stopped,
}

/// Queue, id counter and worker handle of one logger instance
pub(crate) struct Appender<S: EventSink> {
    backend: &'static str,
    state: State<S>,
    queue_capacity: usize,

    /// Advanced by the worker; read passes may only raise it
    last_id: Arc<AtomicU64>,

    /// Single-slot terminal error channel
    error_tx: Sender<LedgerError>,
    error_rx: Receiver<LedgerError>,
}

impl<S: EventSink> Appender<S> {
    pub fn new(backend: &'static str, sink: S, queue_capacity: usize) -> Self {
        let (error_tx, error_rx) = bounded(1);
        Self {
            backend,
            state: State::Idle(sink),
            queue_capacity: queue_capacity.max(1),
            last_id: Arc::new(AtomicU64::new(0)),
            error_tx,
            error_rx,
        }
    }

    pub fn last_id(&self) -> u64 {
        self.last_id.load(Ordering::Acquire)
    }

    /// Shared counter, handed to read passes so they can seed it
    pub fn last_id_handle(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.last_id)
    }

    pub fn errors(&self) -> Receiver<LedgerError> {
        self.error_rx.clone()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running { .. })
    }

    /// Queue an event for the worker. Blocks while the queue is full.
    pub fn enqueue(&self, event: Event) -> Result<()> {
        match &self.state {
            State::Running { sender, .. } => {
                sender.send(event).map_err(|_| LedgerError::WriterStopped)
            }
            State::Idle(_) | State::Stopped => Err(LedgerError::NotRunning),
        }
    }

    /// Create the queue and start the worker. Call once.
    pub fn run(&mut self) -> Result<()> {
        let sink = match std::mem::replace(&mut self.state, State::Stopped) {
            State::Idle(sink) => sink,
            other => {
                self.state = other;
                return Err(LedgerError::AlreadyStarted);
            }
        };

        let (sender, receiver) = bounded(self.queue_capacity);
        let last_id = Arc::clone(&self.last_id);
        let errors = self.error_tx.clone();
        let backend = self.backend;

        let handle = thread::Builder::new()
            .name(format!("{}-append", backend))
            .spawn(move || append_loop(backend, sink, receiver, last_id, errors))?;

        tracing::debug!(
            backend,
            queue_capacity = self.queue_capacity,
            last_id = self.last_id(),
            "append worker started"
        );

        self.state = State::Running { sender, handle };
        Ok(())
    }

    /// Stop accepting events, let the worker drain the queue and join it.
    ///
    /// Returns the worker's terminal error if nobody has taken it from the
    /// error channel yet.
    pub fn close(&mut self) -> Result<()> {
        if let State::Running { sender, handle } = std::mem::replace(&mut self.state, State::Stopped) {
            drop(sender);
            if handle.join().is_err() {
                return Err(LedgerError::Durability(format!(
                    "{} append worker panicked",
                    self.backend
                )));
            }
            tracing::debug!(backend = self.backend, last_id = self.last_id(), "append worker joined");
        }

        match self.error_rx.try_recv() {
            Ok(err) => Err(err),
            Err(_) => Ok(()),
        }
    }
}

fn append_loop<S: EventSink>(
    backend: &'static str,
    mut sink: S,
    receiver: Receiver<Event>,
    last_id: Arc<AtomicU64>,
    errors: Sender<LedgerError>,
) {
    for event in receiver.iter() {
        let next = last_id.load(Ordering::Acquire) + 1;
        match sink.append(&event.with_id(next)) {
            Ok(assigned) => last_id.store(assigned, Ordering::Release),
            Err(err) => {
                let err = match err {
                    LedgerError::Durability(_) | LedgerError::FrameTooLarge { .. } => err,
                    other => LedgerError::Durability(other.to_string()),
                };
                tracing::error!(backend, id = next, error = %err, "append failed, worker stopping");
                // Receiver is dropped on return: later producers see WriterStopped.
                let _ = errors.try_send(err);
                return;
            }
        }
    }
}

/// Tracks when a file backend must fsync
#[derive(Debug)]
pub(crate) struct SyncTracker {
    strategy: WalSyncStrategy,
    uncommitted: usize,
}

impl SyncTracker {
    pub fn new(strategy: WalSyncStrategy) -> Self {
        Self {
            strategy,
            uncommitted: 0,
        }
    }

    /// Call after each flushed event
    pub fn after_write(&mut self, file: &File) -> io::Result<()> {
        match self.strategy {
            WalSyncStrategy::FlushOnly => Ok(()),
            WalSyncStrategy::EveryWrite => file.sync_data(),
            WalSyncStrategy::EveryNEntries { count } => {
                self.uncommitted += 1;
                if self.uncommitted >= count {
                    file.sync_data()?;
                    self.uncommitted = 0;
                }
                Ok(())
            }
        }
    }
}
