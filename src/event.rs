//! Event definitions
//!
//! A single logged mutation of the key-value store.

use std::fmt;

use crate::error::{LedgerError, Result};

/// Kind of mutation recorded by an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Put,
    Delete,
}

impl EventKind {
    /// Integer code used by every on-disk format (0 = Put, 1 = Delete)
    pub fn code(self) -> u32 {
        match self {
            EventKind::Put => 0,
            EventKind::Delete => 1,
        }
    }

    /// Parse an on-disk integer code
    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            0 => Ok(EventKind::Put),
            1 => Ok(EventKind::Delete),
            other => Err(LedgerError::Corruption(format!(
                "unknown event type: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Put => f.write_str("PUT"),
            EventKind::Delete => f.write_str("DELETE"),
        }
    }
}

/// A single entry in the transaction log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Sequence number. Strictly increasing within one log, starting at 1.
    /// Zero until the append worker assigns it.
    pub id: u64,

    pub kind: EventKind,

    pub key: String,

    /// Empty for deletes
    pub value: String,
}

impl Event {
    /// A put event with no id assigned yet
    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: 0,
            kind: EventKind::Put,
            key: key.into(),
            value: value.into(),
        }
    }

    /// A delete event with no id assigned yet
    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            id: 0,
            kind: EventKind::Delete,
            key: key.into(),
            value: String::new(),
        }
    }

    /// Same event carrying the given id
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }
}
