//! Startup replay
//!
//! Rebuilds the store from the log, then switches the logger into live
//! append mode. Replay always finishes before `run`, so replayed and live
//! events never interleave.

use crate::error::{LedgerError, Result};
use crate::event::EventKind;
use crate::store::KvStore;
use crate::wal::TransactionLogger;

/// Result of a replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Number of events applied to the store
    pub events_applied: u64,

    pub puts: u64,

    pub deletes: u64,

    /// Deletes of keys that were not in the store (tolerated)
    pub missing_deletes: u64,

    /// Id of the last replayed event (0 for an empty log)
    pub last_id: u64,
}

/// Replay every persisted event into `store`, then start the logger.
///
/// Any read error aborts initialization and leaves the logger stopped. The
/// store keeps whatever was applied before the error; there is no rollback.
pub fn initialize<L>(logger: &mut L, store: &KvStore) -> Result<ReplayStats>
where
    L: TransactionLogger + ?Sized,
{
    if logger.is_running() {
        return Err(LedgerError::AlreadyStarted);
    }

    let mut stats = ReplayStats::default();

    for event in logger.read_events()? {
        let event = match event {
            Ok(event) => event,
            Err(err) => {
                tracing::error!(
                    applied = stats.events_applied,
                    last_id = stats.last_id,
                    error = %err,
                    "replay aborted"
                );
                return Err(err);
            }
        };

        match event.kind {
            EventKind::Put => {
                store.put(event.key, event.value);
                stats.puts += 1;
            }
            EventKind::Delete => {
                if store.delete(&event.key).is_err() {
                    tracing::warn!(id = event.id, key = %event.key, "replayed delete of absent key");
                    stats.missing_deletes += 1;
                }
                stats.deletes += 1;
            }
        }

        stats.events_applied += 1;
        stats.last_id = event.id;
    }

    tracing::info!(
        events = stats.events_applied,
        puts = stats.puts,
        deletes = stats.deletes,
        missing_deletes = stats.missing_deletes,
        last_id = stats.last_id,
        keys = store.len(),
        "replay complete"
    );

    logger.run()?;
    Ok(stats)
}
