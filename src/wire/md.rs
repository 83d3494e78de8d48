//! Market data feed decoding.
//!
//! Header: `magic:u64, length:u16, seq_num:u32, timestamp:u64, msg_type:u8` (23
//! bytes). The magic constant is the ASCII bytes `GOIRISH!` read as a
//! little-endian `u64`.

use crate::types::Side;

pub const HEADER_LEN: usize = 23;
pub const MAGIC: u64 = u64::from_le_bytes(*b"GOIRISH!");

const MSG_HEARTBEAT: u8 = 0;
const MSG_NEW_ORDER: u8 = 1;
const MSG_DELETE_ORDER: u8 = 2;
const MSG_MODIFY_ORDER: u8 = 3;

const NEW_ORDER_BODY_LEN: usize = 22;
const DELETE_ORDER_BODY_LEN: usize = 8;
const MODIFY_ORDER_BODY_LEN: usize = 17;

/// Header fields common to every market-data message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MdHeader {
    pub seq_num: u32,
    pub timestamp: u64,
    pub msg_type: u8,
}

/// A decoded market-data event relevant to order book maintenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MdEvent {
    Heartbeat,
    NewOrder { order_id: u64, symbol: u32, side: Side, quantity: u32, price: i32 },
    DeleteOrder { order_id: u64 },
    ModifyOrder { order_id: u64, side: Side, quantity: u32, price: i32 },
    /// Trade/summary/snapshot-info (types 4-6) and any unrecognized type: no
    /// effect on the book, carried only so a caller can observe the raw type.
    Ignored(u8),
}

/// Decodes one framed market-data datagram, returning the header's sequence
/// number alongside the event (so the caller can feed a `SequenceTracker`
/// even for events it otherwise ignores).
///
/// Returns `None` if the datagram is shorter than the header, the magic
/// number doesn't match, or the datagram is shorter than the full body for
/// its declared message type.
pub fn decode(data: &[u8]) -> Option<(MdHeader, MdEvent)> {
    if data.len() < HEADER_LEN {
        return None;
    }

    let magic = u64::from_le_bytes(data[0..8].try_into().unwrap());
    if magic != MAGIC {
        return None;
    }

    let seq_num = u32::from_le_bytes(data[10..14].try_into().unwrap());
    let timestamp = u64::from_le_bytes(data[14..22].try_into().unwrap());
    let msg_type = data[22];
    let header = MdHeader { seq_num, timestamp, msg_type };
    let body = &data[HEADER_LEN..];

    let event = match msg_type {
        MSG_HEARTBEAT => MdEvent::Heartbeat,
        MSG_NEW_ORDER => {
            if body.len() < NEW_ORDER_BODY_LEN {
                return None;
            }
            let order_id = u64::from_le_bytes(body[0..8].try_into().unwrap());
            let symbol = u32::from_le_bytes(body[8..12].try_into().unwrap());
            let side = Side::from_wire(body[12])?;
            let quantity = u32::from_le_bytes(body[13..17].try_into().unwrap());
            let price = i32::from_le_bytes(body[17..21].try_into().unwrap());
            // body[21] is `flags`, unused by book maintenance.
            MdEvent::NewOrder { order_id, symbol, side, quantity, price }
        }
        MSG_DELETE_ORDER => {
            if body.len() < DELETE_ORDER_BODY_LEN {
                return None;
            }
            let order_id = u64::from_le_bytes(body[0..8].try_into().unwrap());
            MdEvent::DeleteOrder { order_id }
        }
        MSG_MODIFY_ORDER => {
            if body.len() < MODIFY_ORDER_BODY_LEN {
                return None;
            }
            let order_id = u64::from_le_bytes(body[0..8].try_into().unwrap());
            let side = Side::from_wire(body[8])?;
            let quantity = u32::from_le_bytes(body[9..13].try_into().unwrap());
            let price = i32::from_le_bytes(body[13..17].try_into().unwrap());
            MdEvent::ModifyOrder { order_id, side, quantity, price }
        }
        other => MdEvent::Ignored(other),
    };

    Some((header, event))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(seq_num: u32, timestamp: u64, msg_type: u8) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // length, unused by the decoder
        buf.extend_from_slice(&seq_num.to_le_bytes());
        buf.extend_from_slice(&timestamp.to_le_bytes());
        buf.push(msg_type);
        buf
    }

    #[test]
    fn rejects_short_header() {
        assert_eq!(decode(&[0u8; 10]), None);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut buf = header_bytes(1, 0, MSG_HEARTBEAT);
        buf[0] = 0xFF;
        assert_eq!(decode(&buf), None);
    }

    #[test]
    fn decodes_heartbeat() {
        let buf = header_bytes(1, 1000, MSG_HEARTBEAT);
        let (header, event) = decode(&buf).unwrap();
        assert_eq!(header.seq_num, 1);
        assert_eq!(event, MdEvent::Heartbeat);
    }

    #[test]
    fn decodes_new_order() {
        let mut buf = header_bytes(2, 0, MSG_NEW_ORDER);
        buf.extend_from_slice(&7u64.to_le_bytes()); // order_id
        buf.extend_from_slice(&3u32.to_le_bytes()); // symbol
        buf.push(1); // side = buy
        buf.extend_from_slice(&5u32.to_le_bytes()); // quantity
        buf.extend_from_slice(&50i32.to_le_bytes()); // price
        buf.push(0); // flags

        let (_, event) = decode(&buf).unwrap();
        assert_eq!(
            event,
            MdEvent::NewOrder { order_id: 7, symbol: 3, side: Side::Buy, quantity: 5, price: 50 }
        );
    }

    #[test]
    fn rejects_new_order_with_truncated_body() {
        let mut buf = header_bytes(2, 0, MSG_NEW_ORDER);
        buf.extend_from_slice(&7u64.to_le_bytes());
        assert_eq!(decode(&buf), None);
    }

    #[test]
    fn decodes_delete_order() {
        let mut buf = header_bytes(3, 0, MSG_DELETE_ORDER);
        buf.extend_from_slice(&42u64.to_le_bytes());
        let (_, event) = decode(&buf).unwrap();
        assert_eq!(event, MdEvent::DeleteOrder { order_id: 42 });
    }

    #[test]
    fn decodes_modify_order() {
        let mut buf = header_bytes(4, 0, MSG_MODIFY_ORDER);
        buf.extend_from_slice(&1u64.to_le_bytes());
        buf.push(1); // side = buy
        buf.extend_from_slice(&4u32.to_le_bytes());
        buf.extend_from_slice(&52i32.to_le_bytes());
        let (_, event) = decode(&buf).unwrap();
        assert_eq!(
            event,
            MdEvent::ModifyOrder { order_id: 1, side: Side::Buy, quantity: 4, price: 52 }
        );
    }

    #[test]
    fn unknown_msg_type_decodes_as_ignored() {
        let buf = header_bytes(5, 0, 200);
        let (_, event) = decode(&buf).unwrap();
        assert_eq!(event, MdEvent::Ignored(200));
    }

    #[test]
    fn trade_and_summary_types_decode_as_ignored() {
        for msg_type in [4u8, 5, 6] {
            let buf = header_bytes(6, 0, msg_type);
            let (_, event) = decode(&buf).unwrap();
            assert_eq!(event, MdEvent::Ignored(msg_type));
        }
    }
}
