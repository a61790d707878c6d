//! Store Module
//!
//! In-memory key-value map populated by log replay and by request handlers.
//!
//! ## Responsibilities
//! - Insert-or-overwrite puts, deletes that fail on absent keys
//! - Concurrent readers, exclusive writers
//! - Never built from the log directly: it only ever receives applied events
//!
//! ## Data Structure Choice
//! `HashMap` wrapped in a parking_lot `RwLock`:
//! - No key ordering is promised, so no need for a BTreeMap
//! - Readers run concurrently with each other, never with a writer

mod table;

pub use table::KvStore;
