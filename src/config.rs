//! Configuration for LedgerKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Default capacity of the append queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Default maximum binary frame payload (16 MB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Main configuration for a LedgerKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Log Backend Configuration
    // -------------------------------------------------------------------------
    /// Which durable medium backs the transaction log
    pub backend: Backend,

    /// Capacity of the bounded append queue. Producers block when it is full.
    pub queue_capacity: usize,

    /// Largest payload a binary frame may carry, checked on read and write
    pub max_frame_size: usize,

    /// How often file backends fsync
    pub sync_strategy: WalSyncStrategy,
}

/// Durable medium for the transaction log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Tab-separated text, one event per line
    TextFile(PathBuf),

    /// Length-prefixed binary frames
    BinaryFile(PathBuf),

    /// SQLite database file holding a `transactions` table
    Sqlite(PathBuf),

    /// Private in-memory SQLite database (lost on drop)
    SqliteInMemory,
}

/// WAL sync strategy for file backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// Flush user-space buffers after every event, leave fsync to the OS
    FlushOnly,

    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::BinaryFile(PathBuf::from("./transaction.log")),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            sync_strategy: WalSyncStrategy::FlushOnly,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check values that would otherwise fail later in less obvious ways
    pub fn validate(&self) -> crate::Result<()> {
        if self.queue_capacity == 0 {
            return Err(crate::LedgerError::Config(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.max_frame_size == 0 || self.max_frame_size > u32::MAX as usize {
            return Err(crate::LedgerError::Config(format!(
                "max_frame_size must be in 1..={}",
                u32::MAX
            )));
        }
        if let WalSyncStrategy::EveryNEntries { count: 0 } = self.sync_strategy {
            return Err(crate::LedgerError::Config(
                "EveryNEntries count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the log backend
    pub fn backend(mut self, backend: Backend) -> Self {
        self.config.backend = backend;
        self
    }

    /// Set the append queue capacity
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Set the maximum binary frame size (in bytes)
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.config.max_frame_size = size;
        self
    }

    /// Set the WAL sync strategy
    pub fn sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
