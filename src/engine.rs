//! Engine Module
//!
//! The request-facing layer that pairs the store with its transaction log.
//!
//! ## Responsibilities
//! - Replay the log into a fresh store before serving anything
//! - Apply each mutation to the store, then queue it on the log
//! - Expose the log's terminal error so callers can stop serving

use crossbeam::channel::Receiver;

use crate::config::Config;
use crate::error::{LedgerError, Result};
use crate::replay::{self, ReplayStats};
use crate::store::KvStore;
use crate::wal::{self, TransactionLogger};

/// Store plus transaction log, ready to serve once opened
///
/// ## Ordering
/// Mutations hit the store first and the log second. A crash between the two
/// loses durability of that one operation. Deletes of absent keys fail with
/// `KeyNotFound` and are not logged.
///
/// `Engine` is `Send + Sync`; share it across request threads with an `Arc`.
pub struct Engine {
    config: Config,
    store: KvStore,
    logger: Box<dyn TransactionLogger>,
    replay_stats: ReplayStats,
}

impl Engine {
    /// Open the configured backend, replay it and start appending
    pub fn open(config: Config) -> Result<Self> {
        let logger = wal::open_logger(&config)?;
        Self::with_logger(config, logger)
    }

    /// Use an already constructed logger (must not be running yet)
    pub fn with_logger(config: Config, mut logger: Box<dyn TransactionLogger>) -> Result<Self> {
        let store = KvStore::new();
        let replay_stats = replay::initialize(logger.as_mut(), &store)?;

        Ok(Self {
            config,
            store,
            logger,
            replay_stats,
        })
    }

    pub fn get(&self, key: &str) -> Result<String> {
        self.store.get(key)
    }

    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        self.store.put(key, value);
        self.logger.write_put(key, value)
    }

    /// Remove a key, returning its previous value
    pub fn delete(&self, key: &str) -> Result<String> {
        let previous = self.store.delete(key)?;
        self.logger.write_delete(key)?;
        Ok(previous)
    }

    /// Terminal error signal of the log
    pub fn errors(&self) -> Receiver<LedgerError> {
        self.logger.errors()
    }

    /// Last id the log has persisted
    pub fn last_id(&self) -> u64 {
        self.logger.last_id()
    }

    /// Drain pending log writes and stop the writer
    pub fn close(mut self) -> Result<()> {
        self.logger.close()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn store(&self) -> &KvStore {
        &self.store
    }

    pub fn replay_stats(&self) -> ReplayStats {
        self.replay_stats
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
