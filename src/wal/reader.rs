//! Event streams
//!
//! A read pass runs on its own thread and hands events over a rendezvous
//! channel, so the consumer always sees every event that precedes an error
//! before it sees the error.
//!
//! A pass only ever raises the logger's last id. When the consumer drops the
//! stream early the scan still walks to the end of the medium, and the drop
//! waits for it, so a later `run` continues after the highest persisted id.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, never, select, Receiver, Sender};

use crate::error::{LedgerError, Result};
use crate::event::Event;

/// Lazy, forward-only, single-pass sequence of persisted events in id order.
///
/// Either iterate it (`Iterator<Item = Result<Event>>`) or select over the
/// raw [`events`](Self::events) and [`errors`](Self::errors) receivers. At
/// most one error is ever delivered and it ends the stream. Dropping the
/// stream detaches the consumer and blocks until the scan has finished
/// advancing the last id.
pub struct EventStream {
    events: Receiver<Event>,
    errors: Receiver<LedgerError>,
    finished: bool,
    scan: Option<JoinHandle<()>>,
}

impl EventStream {
    /// Start a read pass. `scan` walks the medium from the beginning and
    /// passes each decoded event to the guard.
    pub(crate) fn spawn<F>(backend: &'static str, last_id: Arc<AtomicU64>, scan: F) -> Result<Self>
    where
        F: FnOnce(&mut SequenceGuard) -> Result<()> + Send + 'static,
    {
        let (event_tx, events) = bounded(0);
        let (error_tx, errors) = bounded(1);

        let handle = thread::Builder::new()
            .name(format!("{}-read", backend))
            .spawn(move || {
                let mut guard = SequenceGuard {
                    high_water: 0,
                    emitted: 0,
                    last_id,
                    sender: Some(event_tx),
                };

                match scan(&mut guard) {
                    Ok(()) => {
                        tracing::debug!(
                            backend,
                            events = guard.emitted,
                            last_id = guard.high_water,
                            "read pass finished"
                        );
                    }
                    Err(err) => {
                        tracing::warn!(
                            backend,
                            events = guard.emitted,
                            error = %err,
                            "read pass aborted"
                        );
                        let _ = error_tx.send(err);
                    }
                }
            })?;

        Ok(Self {
            events,
            errors,
            finished: false,
            scan: Some(handle),
        })
    }

    pub fn events(&self) -> &Receiver<Event> {
        &self.events
    }

    pub fn errors(&self) -> &Receiver<LedgerError> {
        &self.errors
    }
}

impl Iterator for EventStream {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        select! {
            recv(self.events) -> msg => match msg {
                Ok(event) => Some(Ok(event)),
                Err(_) => {
                    // Events closed: the scan is over, an error may still follow.
                    self.finished = true;
                    self.errors.recv().ok().map(Err)
                }
            },
            recv(self.errors) -> msg => {
                self.finished = true;
                msg.ok().map(Err)
            }
        }
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        // Release the rendezvous first so a blocked scan can detach.
        drop(std::mem::replace(&mut self.events, never()));
        if let Some(handle) = self.scan.take() {
            let _ = handle.join();
        }
    }
}

/// Enforces strictly increasing ids within one read pass and forwards the
/// accepted events to the stream
pub(crate) struct SequenceGuard {
    high_water: u64,
    emitted: u64,
    last_id: Arc<AtomicU64>,

    /// `None` once the consumer has dropped the stream
    sender: Option<Sender<Event>>,
}

impl SequenceGuard {
    /// Validate an event, raise the last id and hand the event over. After
    /// the consumer has gone, events are still validated and counted
    /// towards the last id but no longer sent.
    pub fn emit(&mut self, event: Event) -> Result<()> {
        if event.id <= self.high_water {
            return Err(LedgerError::SequenceViolation {
                previous: self.high_water,
                found: event.id,
            });
        }

        self.high_water = event.id;
        self.last_id.fetch_max(event.id, Ordering::AcqRel);

        if let Some(sender) = &self.sender {
            if sender.send(event).is_err() {
                self.sender = None;
            } else {
                self.emitted += 1;
            }
        }
        Ok(())
    }
}
