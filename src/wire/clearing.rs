//! Clearing feed decoding.
//!
//! Header: `magic:u64, length:u16, seq_num:u32, msg_type:u8` (15 bytes). The
//! magic constant is `0x12345678`.

use crate::types::Side;

pub const HEADER_LEN: usize = 15;
pub const MAGIC: u64 = 0x12345678;

const MSG_HEARTBEAT: u8 = 0;
const MSG_FILL: u8 = 1;

const FILL_BODY_LEN: usize = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearingHeader {
    pub seq_num: u32,
    pub msg_type: u8,
}

/// A decoded clearing event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearingEvent {
    Heartbeat,
    Fill { client_id: u32, symbol: u32, quantity: u32, price: i32, side: Side },
    /// Any message type outside `{0, 1}`: no effect on clearing state, carried
    /// only so the caller can still feed the header's sequence number to its
    /// `SequenceTracker` (unknown types are skipped, not treated as malformed).
    Ignored(u8),
}

/// Decodes one framed clearing datagram. See [`crate::wire::md::decode`] for
/// the shared decode contract (reject on short/bad-magic input, skip unknown
/// types, no allocation beyond the returned event).
pub fn decode(data: &[u8]) -> Option<(ClearingHeader, ClearingEvent)> {
    if data.len() < HEADER_LEN {
        return None;
    }

    let magic = u64::from_le_bytes(data[0..8].try_into().unwrap());
    if magic != MAGIC {
        return None;
    }

    let seq_num = u32::from_le_bytes(data[10..14].try_into().unwrap());
    let msg_type = data[14];
    let header = ClearingHeader { seq_num, msg_type };
    let body = &data[HEADER_LEN..];

    let event = match msg_type {
        MSG_HEARTBEAT => ClearingEvent::Heartbeat,
        MSG_FILL => {
            if body.len() < FILL_BODY_LEN {
                return None;
            }
            let client_id = u32::from_le_bytes(body[0..4].try_into().unwrap());
            let symbol = u32::from_le_bytes(body[4..8].try_into().unwrap());
            let quantity = u32::from_le_bytes(body[8..12].try_into().unwrap());
            let price = i32::from_le_bytes(body[12..16].try_into().unwrap());
            let side = Side::from_wire(body[16])?;
            ClearingEvent::Fill { client_id, symbol, quantity, price, side }
        }
        other => ClearingEvent::Ignored(other),
    };

    Some((header, event))
}
