//! Tests for KvStore
//!
//! These tests verify:
//! - Put/Get/Delete semantics
//! - Distinguished not-found errors
//! - Concurrent readers and writers

use std::sync::Arc;
use std::thread;

use ledgerkv::{KvStore, LedgerError};

// =============================================================================
// Basic Operations
// =============================================================================

#[test]
fn test_new_store_is_empty() {
    let store = KvStore::new();

    assert!(store.is_empty());
    assert_eq!(store.len(), 0);
}

#[test]
fn test_put_and_get() {
    let store = KvStore::new();

    store.put("hello", "world");

    assert_eq!(store.get("hello").unwrap(), "world");
    assert_eq!(store.len(), 1);
}

#[test]
fn test_put_overwrites() {
    let store = KvStore::new();

    store.put("key", "v1");
    store.put("key", "v2");

    assert_eq!(store.get("key").unwrap(), "v2");
    assert_eq!(store.len(), 1);
}

#[test]
fn test_get_missing_key() {
    let store = KvStore::new();

    match store.get("world") {
        Err(LedgerError::KeyNotFound(key)) => assert_eq!(key, "world"),
        other => panic!("Expected KeyNotFound, got {:?}", other),
    }
}

#[test]
fn test_delete_returns_previous_value() {
    let store = KvStore::new();
    store.put("hello", "world");

    let previous = store.delete("hello").unwrap();

    assert_eq!(previous, "world");
    assert!(!store.contains_key("hello"));
    assert!(store.is_empty());
}

#[test]
fn test_delete_missing_key() {
    let store = KvStore::new();
    store.put("hello", "world");

    let result = store.delete("world");

    assert!(matches!(result, Err(LedgerError::KeyNotFound(_))));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_empty_key_and_value() {
    let store = KvStore::new();

    store.put("", "");

    assert_eq!(store.get("").unwrap(), "");
}

#[test]
fn test_snapshot_is_a_copy() {
    let store = KvStore::new();
    store.put("a", "1");

    let snapshot = store.snapshot();
    store.put("b", "2");

    assert_eq!(snapshot.len(), 1);
    assert_eq!(store.len(), 2);
}

// =============================================================================
// Concurrent Access Tests
// =============================================================================

#[test]
fn test_concurrent_reads() {
    let store = Arc::new(KvStore::new());
    store.put("key", "value");

    let mut handles = vec![];

    for _ in 0..10 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for _ in 0..100 {
                assert_eq!(store.get("key").unwrap(), "value");
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_concurrent_writes() {
    let store = Arc::new(KvStore::new());

    let mut handles = vec![];

    for i in 0..10 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for j in 0..10 {
                store.put(format!("key{}_{}", i, j), format!("value{}_{}", i, j));
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), 100);
    assert_eq!(store.get("key3_7").unwrap(), "value3_7");
}
