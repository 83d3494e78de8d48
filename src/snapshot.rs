//! Snapshot fanout (component E): composes a dashboard frame from the order
//! book, clearing store, and ETF ledger, and broadcasts it to WebSocket
//! subscribers on a fixed cadence.
//!
//! The book, clearing, and ledger locks are acquired independently and in a
//! fixed order (`C → B → D`), each released before the next is taken —
//! never all three held at once.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use crate::book::OrderBook;
use crate::clearing::ClearingStore;
use crate::etf::EtfLedger;
use crate::symbols;

/// Fee charged per unit of volume traded, subtracted from mark-to-market PnL.
/// Retained verbatim from the source; not exposed as configuration (see
/// DESIGN.md's Open Question resolution).
const FEE_PER_SHARE: f64 = 0.05;

#[derive(Debug, Clone, Serialize)]
pub struct SymbolQuote {
    pub symbol: u32,
    pub best_bid: i32,
    pub best_ask: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PositionRow {
    pub client_id: u32,
    pub symbol: u32,
    pub position: i64,
    pub pnl: f64,
    pub volume: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub timestamp: u64,
    pub snapshot: Vec<SymbolQuote>,
    pub positions: Vec<PositionRow>,
}

/// Composes one dashboard frame. Acquires the book, clearing, and ledger
/// locks independently and in that order, per the fixed `C → B → D`
/// composition discipline — the result is a loosely consistent cut, which is
/// acceptable at the broadcaster's ~100ms cadence.
pub async fn compose_frame(book: &OrderBook, clearing: &ClearingStore, etf: &EtfLedger) -> Frame {
    let mut quotes = Vec::with_capacity(symbols::SYMBOLS.len());
    for symbol in symbols::SYMBOLS {
        let bbo = book.bbo(symbol.id).await;
        quotes.push(SymbolQuote { symbol: symbol.id, best_bid: bbo.best_bid, best_ask: bbo.best_ask });
    }
    let bbo_by_symbol: HashMap<u32, (i32, i32)> =
        quotes.iter().map(|q| (q.symbol, (q.best_bid, q.best_ask))).collect();

    let tallies = clearing.snapshot().await;
    let adjustments = etf.snapshot_adjustments().await;

    let mut client_ids: HashSet<u32> = tallies.keys().map(|&(client_id, _)| client_id).collect();
    client_ids.extend(adjustments.keys().map(|&(client_id, _)| client_id));

    let mut positions = Vec::new();
    for client_id in client_ids {
        for symbol in symbols::SYMBOLS {
            let tally = tallies.get(&(client_id, symbol.id)).copied().unwrap_or_default();
            let adjustment = adjustments.get(&(client_id, symbol.id)).copied().unwrap_or(0);
            let position = tally.position + adjustment;

            let (best_bid, best_ask) = bbo_by_symbol.get(&symbol.id).copied().unwrap_or((0, 0));
            let mut pnl = tally.raw_pnl as f64;
            if position > 0 && best_bid > 0 {
                pnl += f64::from(best_bid) * position as f64;
            } else if position < 0 && best_ask > 0 {
                pnl += f64::from(best_ask) * position as f64;
            }
            pnl -= FEE_PER_SHARE * tally.volume as f64;

            if position != 0 || pnl != 0.0 || tally.volume != 0 {
                positions.push(PositionRow { client_id, symbol: symbol.id, position, pnl, volume: tally.volume });
            }
        }
    }

    Frame {
        timestamp: now_nanos(),
        snapshot: quotes,
        positions,
    }
}

fn now_nanos() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// A single WebSocket subscriber's outgoing queue. Bounded so a slow reader
/// can't apply back-pressure to the broadcaster; on overflow the subscriber
/// is disconnected rather than blocking everyone else.
const SUBSCRIBER_QUEUE_DEPTH: usize = 8;

pub type SubscriberId = u64;

/// Registry of live WebSocket subscribers, fanned out to from the
/// broadcaster task.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    next_id: std::sync::atomic::AtomicU64,
    subscribers: RwLock<HashMap<SubscriberId, mpsc::Sender<String>>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self { next_id: std::sync::atomic::AtomicU64::new(1), subscribers: RwLock::new(HashMap::new()) }
    }

    /// Registers a new subscriber and returns its id plus the receiving end
    /// of its bounded queue.
    pub async fn register(&self) -> (SubscriberId, mpsc::Receiver<String>) {
        let id = self.next_id.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE_DEPTH);
        self.subscribers.write().await.insert(id, tx);
        (id, rx)
    }

    pub async fn unregister(&self, id: SubscriberId) {
        self.subscribers.write().await.remove(&id);
    }

    /// Sends `payload` to every subscriber. A subscriber whose queue is full
    /// or whose receiver has dropped is removed rather than retried.
    pub async fn broadcast(&self, payload: &str) {
        let senders: Vec<(SubscriberId, mpsc::Sender<String>)> =
            self.subscribers.read().await.iter().map(|(&id, tx)| (id, tx.clone())).collect();

        let mut gone = Vec::new();
        for (id, tx) in senders {
            if tx.try_send(payload.to_string()).is_err() {
                gone.push(id);
            }
        }
        if !gone.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for id in gone {
                debug!(subscriber_id = id, "dropping unresponsive subscriber");
                subscribers.remove(&id);
            }
        }
    }
}
