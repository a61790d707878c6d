//! Tests for Engine
//!
//! These tests verify:
//! - Basic get/put/delete through the request layer
//! - State survives close and reopen for every backend
//! - Not-found deletes are not logged
//! - Shared access from many threads
//! - Config validation and backend selection

use std::path::Path;
use std::sync::Arc;
use std::thread;

use ledgerkv::{open_logger, Backend, Config, Engine, LedgerError, WalSyncStrategy};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn backends(dir: &Path) -> Vec<Backend> {
    vec![
        Backend::TextFile(dir.join("log.txt")),
        Backend::BinaryFile(dir.join("log.bin")),
        Backend::Sqlite(dir.join("log.db")),
    ]
}

fn config(backend: Backend) -> Config {
    Config::builder().backend(backend).build()
}

// =============================================================================
// Basic Operations
// =============================================================================

#[test]
fn test_engine_basic_operations() {
    let engine = Engine::open(config(Backend::SqliteInMemory)).unwrap();

    engine.put("hello", "world").unwrap();
    assert_eq!(engine.get("hello").unwrap(), "world");

    assert_eq!(engine.delete("hello").unwrap(), "world");
    assert!(matches!(engine.get("hello"), Err(LedgerError::KeyNotFound(_))));

    engine.close().unwrap();
}

#[test]
fn test_delete_missing_key_is_not_logged() {
    let temp = TempDir::new().unwrap();
    let backend = Backend::TextFile(temp.path().join("log.txt"));

    let engine = Engine::open(config(backend.clone())).unwrap();
    engine.put("a", "1").unwrap();
    assert!(matches!(engine.delete("missing"), Err(LedgerError::KeyNotFound(_))));
    engine.close().unwrap();

    let reopened = Engine::open(config(backend)).unwrap();
    assert_eq!(reopened.replay_stats().events_applied, 1);
    assert_eq!(reopened.last_id(), 1);
    reopened.close().unwrap();
}

// =============================================================================
// Recovery Tests
// =============================================================================

#[test]
fn test_engine_recovers_state() {
    let temp = TempDir::new().unwrap();

    for backend in backends(temp.path()) {
        {
            let engine = Engine::open(config(backend.clone())).unwrap();
            engine.put("a", "1").unwrap();
            engine.put("b", "2").unwrap();
            engine.put("a", "3").unwrap();
            engine.delete("b").unwrap();
            engine.close().unwrap();
        }

        let engine = Engine::open(config(backend.clone())).unwrap();
        assert_eq!(engine.get("a").unwrap(), "3", "{:?}", backend);
        assert!(matches!(engine.get("b"), Err(LedgerError::KeyNotFound(_))));
        assert_eq!(engine.store().len(), 1);
        assert_eq!(engine.last_id(), 4);

        engine.put("c", "4").unwrap();
        engine.close().unwrap();

        let engine = Engine::open(config(backend.clone())).unwrap();
        assert_eq!(engine.get("c").unwrap(), "4");
        assert_eq!(engine.replay_stats().last_id, 5);
        engine.close().unwrap();
    }
}

#[test]
fn test_corrupt_log_fails_open() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("log.txt");
    std::fs::write(&path, "1\t0\ta\t1\n1\t0\tb\t2\n").unwrap();

    let result = Engine::open(config(Backend::TextFile(path)));

    assert!(matches!(result, Err(LedgerError::SequenceViolation { .. })));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_shared_engine_across_threads() {
    let temp = TempDir::new().unwrap();
    let backend = Backend::BinaryFile(temp.path().join("log.bin"));
    let engine = Arc::new(Engine::open(config(backend.clone())).unwrap());

    let mut handles = vec![];
    for t in 0..8 {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            for j in 0..50 {
                let key = format!("k{}_{}", t, j);
                engine.put(&key, "v").unwrap();
                assert_eq!(engine.get(&key).unwrap(), "v");
                if j % 5 == 0 {
                    engine.delete(&key).unwrap();
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let expected = engine.store().snapshot();
    let engine = match Arc::try_unwrap(engine) {
        Ok(engine) => engine,
        Err(_) => panic!("engine still shared"),
    };
    engine.close().unwrap();

    let reopened = Engine::open(config(backend)).unwrap();
    assert_eq!(reopened.store().snapshot(), expected);
    assert_eq!(reopened.store().len(), 8 * 40);
    assert_eq!(reopened.last_id(), 8 * 60);
    reopened.close().unwrap();
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_config_defaults() {
    let config = Config::default();

    assert_eq!(config.queue_capacity, 16);
    assert_eq!(config.sync_strategy, WalSyncStrategy::FlushOnly);
    assert!(matches!(config.backend, Backend::BinaryFile(_)));
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_config_rejected() {
    let zero_queue = Config::builder()
        .backend(Backend::SqliteInMemory)
        .queue_capacity(0)
        .build();
    assert!(matches!(open_logger(&zero_queue), Err(LedgerError::Config(_))));

    let zero_frame = Config::builder().max_frame_size(0).build();
    assert!(matches!(zero_frame.validate(), Err(LedgerError::Config(_))));

    let zero_sync = Config::builder()
        .sync_strategy(WalSyncStrategy::EveryNEntries { count: 0 })
        .build();
    assert!(matches!(zero_sync.validate(), Err(LedgerError::Config(_))));
}

#[test]
fn test_open_logger_selects_backend() {
    let temp = TempDir::new().unwrap();

    for backend in backends(temp.path()) {
        let mut logger = open_logger(&config(backend.clone())).unwrap();
        logger.run().unwrap();
        logger.write_put("k", "v").unwrap();
        logger.close().unwrap();
        assert_eq!(logger.last_id(), 1, "{:?}", backend);
    }

    assert!(temp.path().join("log.txt").exists());
    assert!(temp.path().join("log.bin").exists());
    assert!(temp.path().join("log.db").exists());
}
