//! Shared value types used across the wire, book, and clearing layers.

use serde::Serialize;

/// Order/fill side as carried on the wire: `1` = buy, `2` = sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Decodes a wire-format side byte. Any other value is not a valid side.
    pub fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Side::Buy),
            2 => Some(Side::Sell),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_sides() {
        assert_eq!(Side::from_wire(1), Some(Side::Buy));
        assert_eq!(Side::from_wire(2), Some(Side::Sell));
    }

    #[test]
    fn rejects_unknown_side_byte() {
        assert_eq!(Side::from_wire(0), None);
        assert_eq!(Side::from_wire(3), None);
    }
}
