//! Static symbol table.
//!
//! Symbol ids, tickers, display names, and tick sizes are a fixed, compile-time
//! table — there is no runtime symbol registration in this service. One symbol
//! id is distinguished as the ETF; a fixed ordered list of the others is its
//! underlying basket.

use serde::Serialize;

/// A tradable instrument known to the service.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Symbol {
    pub id: u32,
    pub ticker: &'static str,
    pub name: &'static str,
    pub tick_size: i32,
}

/// The full symbol table, in id order.
pub static SYMBOLS: &[Symbol] = &[
    Symbol { id: 1, ticker: "GOLD", name: "Gold", tick_size: 10 },
    Symbol { id: 2, ticker: "BLUE", name: "Blue", tick_size: 5 },
    Symbol { id: 3, ticker: "KNAN", name: "Keenan Hall", tick_size: 5 },
    Symbol { id: 4, ticker: "STED", name: "St. Edward's Hall", tick_size: 5 },
    Symbol { id: 5, ticker: "FISH", name: "Fisher Hall", tick_size: 5 },
    Symbol { id: 6, ticker: "DILN", name: "Dillon Hall", tick_size: 5 },
    Symbol { id: 7, ticker: "SORN", name: "Sorin Hall", tick_size: 5 },
    Symbol { id: 8, ticker: "RYAN", name: "Ryan Hall", tick_size: 5 },
    Symbol { id: 9, ticker: "LYON", name: "Lyons Hall", tick_size: 5 },
    Symbol { id: 10, ticker: "WLSH", name: "Walsh Hall", tick_size: 5 },
    Symbol { id: 11, ticker: "LEWI", name: "Lewis Hall", tick_size: 5 },
    Symbol { id: 12, ticker: "BDIN", name: "Badin Hall", tick_size: 5 },
    Symbol { id: 13, ticker: "UNDY", name: "Notre Dame Dorm ETF", tick_size: 10 },
];

/// Symbol id of the ETF.
pub const ETF_SYMBOL: u32 = 13;

/// Symbol ids making up one ETF basket unit, in the order deficits are reported.
pub static UNDERLYING_SYMBOLS: &[u32] = &[3, 4, 5, 6, 7, 8, 9, 10, 11, 12];

/// Looks up a symbol by id.
pub fn find(id: u32) -> Option<&'static Symbol> {
    SYMBOLS.iter().find(|s| s.id == id)
}

/// Ticker string for a symbol id, or a synthetic `SYM<id>` placeholder if unknown.
pub fn ticker(id: u32) -> String {
    find(id).map(|s| s.ticker.to_string()).unwrap_or_else(|| format!("SYM{id}"))
}
