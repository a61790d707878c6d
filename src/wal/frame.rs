//! Binary frame codec
//!
//! ## Frame Format
//! ```text
//! ┌──────────────┬──────────────────────────────────────┐
//! │ Len (4, LE)  │ Payload (Len bytes)                  │
//! └──────────────┴──────────────────────────────────────┘
//! ```
//! The payload is a bincode record (fixed-width little-endian integers,
//! strings as u64 length + UTF-8 bytes):
//! `{id: u64, event_type: u32, key: string, value: string}`.

use std::io::{ErrorKind, Read};

use bincode::Options;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::event::{Event, EventKind};

/// Size of the little-endian length prefix
pub const LENGTH_PREFIX_SIZE: usize = 4;

#[derive(Serialize, Deserialize)]
struct FrameRecord {
    id: u64,
    event_type: u32,
    key: String,
    value: String,
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
}

/// Encode an event as a frame payload (no length prefix)
pub fn encode_payload(event: &Event) -> Result<Vec<u8>> {
    let record = FrameRecord {
        id: event.id,
        event_type: event.kind.code(),
        key: event.key.clone(),
        value: event.value.clone(),
    };
    codec()
        .serialize(&record)
        .map_err(|e| LedgerError::Serialization(format!("error encoding event {}: {}", event.id, e)))
}

/// Decode a frame payload. The whole slice must be one record.
pub fn decode_payload(payload: &[u8]) -> Result<Event> {
    let record: FrameRecord = codec()
        .with_limit(payload.len() as u64)
        .deserialize(payload)
        .map_err(|e| LedgerError::Corruption(format!("error decoding frame payload: {}", e)))?;

    Ok(Event {
        id: record.id,
        kind: EventKind::from_code(record.event_type)?,
        key: record.key,
        value: record.value,
    })
}

/// Build a complete frame, refusing payloads over `max_frame_size`
pub fn encode_frame(event: &Event, max_frame_size: usize) -> Result<Bytes> {
    let payload = encode_payload(event)?;
    if payload.len() > max_frame_size {
        return Err(LedgerError::FrameTooLarge {
            len: payload.len(),
            max: max_frame_size,
        });
    }

    let mut frame = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    frame.put_u32_le(payload.len() as u32);
    frame.put_slice(&payload);
    Ok(frame.freeze())
}

/// Read the next frame payload.
///
/// - `Ok(None)`: end of stream exactly at a frame boundary
/// - partial prefix or payload: `Corruption`
/// - declared length over `max_frame_size`: `FrameTooLarge`, nothing allocated
pub fn read_frame<R: Read>(reader: &mut R, max_frame_size: usize) -> Result<Option<Vec<u8>>> {
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    let mut filled = 0;
    while filled < LENGTH_PREFIX_SIZE {
        match reader.read(&mut prefix[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    if filled == 0 {
        return Ok(None);
    }
    if filled < LENGTH_PREFIX_SIZE {
        return Err(LedgerError::Corruption(format!(
            "truncated length prefix: {} of {} bytes",
            filled, LENGTH_PREFIX_SIZE
        )));
    }

    let len = (&prefix[..]).get_u32_le() as usize;
    if len > max_frame_size {
        return Err(LedgerError::FrameTooLarge {
            len,
            max: max_frame_size,
        });
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => LedgerError::Corruption(format!(
            "truncated frame payload: expected {} bytes",
            len
        )),
        _ => LedgerError::Io(e),
    })?;

    Ok(Some(payload))
}
