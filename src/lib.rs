//! # LedgerKV
//!
//! An in-memory key-value store made durable by a transaction log:
//! - Pluggable log backends (text file, binary frames, SQLite table)
//! - Asynchronous single-writer append with strictly increasing ids
//! - Startup replay that rebuilds the store before any new write
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Request Layer                            │
//! │                (Engine: put / get / delete)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   KvStore   │          │ Transaction │
//!   │  (RwLock)   │◄─replay──│   Logger    │
//!   └─────────────┘          └──────┬──────┘
//!                                   │ bounded queue
//!                                   ▼
//!                           ┌─────────────┐
//!                           │ Append      │
//!                           │ Worker      │
//!                           └──────┬──────┘
//!                                  ▼
//!                      text / binary / sqlite
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod event;

pub mod store;
pub mod wal;
pub mod replay;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{LedgerError, Result};
pub use config::{Backend, Config, WalSyncStrategy};
pub use event::{Event, EventKind};
pub use store::KvStore;
pub use wal::{open_logger, EventStream, TransactionLogger};
pub use replay::{initialize, ReplayStats};
pub use engine::Engine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of LedgerKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
