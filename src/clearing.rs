//! Clearing store (component B): tracks raw fill-derived positions, PnL, and
//! volume per `(client_id, symbol)`, fed by the clearing multicast listener.
//!
//! Grounded on `clearing_client.py`'s `ClearingClient`: positions accumulate
//! signed quantity, PnL accumulates signed notional (sell proceeds minus buy
//! cost), and volume accumulates unsigned quantity traded.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::types::Side;

/// Running totals for one `(client_id, symbol)` pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClearingTally {
    pub position: i64,
    total_buy: i64,
    total_sell: i64,
    pub raw_pnl: i64,
    pub volume: i64,
}

/// Thread-safe store of clearing-derived positions for every client.
///
/// A single `RwLock` guards the whole map. It is never locked together with
/// the order book. When both this store and the ETF ledger are needed, the
/// ledger is acquired first.
#[derive(Debug, Default)]
pub struct ClearingStore {
    tallies: RwLock<HashMap<(u32, u32), ClearingTally>>,
}

impl ClearingStore {
    pub fn new() -> Self {
        Self { tallies: RwLock::new(HashMap::new()) }
    }

    /// Applies one fill, updating position, accumulated notional, raw PnL,
    /// and volume for the `(client_id, symbol)` pair.
    pub async fn apply_fill(&self, client_id: u32, symbol: u32, quantity: u32, price: i32, side: Side) {
        let mut tallies = self.tallies.write().await;
        let tally = tallies.entry((client_id, symbol)).or_default();
        let notional = i64::from(quantity) * i64::from(price);
        match side {
            Side::Buy => {
                tally.position += i64::from(quantity);
                tally.total_buy += notional;
            }
            Side::Sell => {
                tally.position -= i64::from(quantity);
                tally.total_sell += notional;
            }
        }
        tally.volume += i64::from(quantity);
        tally.raw_pnl = tally.total_sell - tally.total_buy;
    }

    /// Raw clearing position for one client/symbol (0 if never traded).
    pub async fn position(&self, client_id: u32, symbol: u32) -> i64 {
        self.tallies.read().await.get(&(client_id, symbol)).map(|t| t.position).unwrap_or(0)
    }

    /// A snapshot of every tally currently tracked.
    pub async fn snapshot(&self) -> HashMap<(u32, u32), ClearingTally> {
        self.tallies.read().await.clone()
    }

    /// Every client id with at least one recorded tally.
    pub async fn client_ids(&self) -> std::collections::HashSet<u32> {
        self.tallies.read().await.keys().map(|(client_id, _)| *client_id).collect()
    }
}
