//! Shared helpers for integration tests

#![allow(dead_code)]

use std::collections::HashMap;

use ledgerkv::{Event, EventKind, Result, TransactionLogger};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Probability of emitting a delete while the map has keys
const DELETE_PROBABILITY: f64 = 0.4;
const MAX_KEY_LEN: usize = 50;
const MAX_VALUE_LEN: usize = 500;

fn random_string(rng: &mut StdRng, max_len: usize) -> String {
    let len = rng.gen_range(1..=max_len);
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Random puts and deletes of present keys, plus the map they produce
/// when applied in order to an empty store
pub fn generate_events(count: usize, seed: u64) -> (Vec<Event>, HashMap<String, String>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut expected: HashMap<String, String> = HashMap::new();
    let mut live_keys: Vec<String> = Vec::new();
    let mut events = Vec::with_capacity(count);

    for _ in 0..count {
        if !live_keys.is_empty() && rng.gen_bool(DELETE_PROBABILITY) {
            let key = live_keys.swap_remove(rng.gen_range(0..live_keys.len()));
            expected.remove(&key);
            events.push(Event::delete(key));
        } else {
            let key = random_string(&mut rng, MAX_KEY_LEN);
            let value = random_string(&mut rng, MAX_VALUE_LEN);
            if expected.insert(key.clone(), value.clone()).is_none() {
                live_keys.push(key.clone());
            }
            events.push(Event::put(key, value));
        }
    }

    (events, expected)
}

/// Queue every event on a running logger
pub fn write_events<L: TransactionLogger + ?Sized>(logger: &L, events: &[Event]) {
    for event in events {
        match event.kind {
            EventKind::Put => logger.write_put(&event.key, &event.value).unwrap(),
            EventKind::Delete => logger.write_delete(&event.key).unwrap(),
        }
    }
}

/// Read the whole log, failing the test on any read error
pub fn read_all<L: TransactionLogger + ?Sized>(logger: &L) -> Vec<Event> {
    logger
        .read_events()
        .unwrap()
        .collect::<Result<Vec<_>>>()
        .unwrap()
}

/// Read the log up to its first error
pub fn read_until_error<L: TransactionLogger + ?Sized>(
    logger: &L,
) -> (Vec<Event>, Option<ledgerkv::LedgerError>) {
    let mut events = Vec::new();
    for item in logger.read_events().unwrap() {
        match item {
            Ok(event) => events.push(event),
            Err(err) => return (events, Some(err)),
        }
    }
    (events, None)
}

/// Apply events to a plain map the way replay applies them to the store
pub fn rebuild(events: &[Event]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for event in events {
        match event.kind {
            EventKind::Put => {
                map.insert(event.key.clone(), event.value.clone());
            }
            EventKind::Delete => {
                map.remove(&event.key);
            }
        }
    }
    map
}

pub fn ids(events: &[Event]) -> Vec<u64> {
    events.iter().map(|e| e.id).collect()
}
