//! Order book (component C): per-symbol price ladders rebuilt from the
//! market-data multicast feed, used only to derive best bid/offer.
//!
//! Grounded on `md_client.py`'s `MDClient`: resting orders are tracked by
//! order id so deletes and modifies can find what quantity to remove from
//! the ladder; a price level with zero remaining quantity is dropped rather
//! than kept at zero (mirrors the Python `del` on underflow). This is a
//! single `RwLock` over the whole book, never locked together with the
//! clearing store (B) or ETF ledger (D).

use std::collections::{BTreeMap, HashMap};

use tokio::sync::RwLock;

use crate::types::Side;

#[derive(Debug, Clone, Copy)]
struct RestingOrder {
    symbol: u32,
    side: Side,
    quantity: u32,
    price: i32,
}

/// Bid/ask ladders for one symbol. Bids are keyed ascending by price (best
/// bid is the last entry); asks are keyed ascending by price (best ask is
/// the first entry).
#[derive(Debug, Default)]
struct SymbolBook {
    bids: BTreeMap<i32, i64>,
    asks: BTreeMap<i32, i64>,
}

impl SymbolBook {
    fn add(&mut self, side: Side, price: i32, quantity: u32) {
        let ladder = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        *ladder.entry(price).or_insert(0) += i64::from(quantity);
    }

    fn remove(&mut self, side: Side, price: i32, quantity: u32) {
        let ladder = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        if let Some(remaining) = ladder.get_mut(&price) {
            *remaining -= i64::from(quantity);
            if *remaining <= 0 {
                ladder.remove(&price);
            }
        }
    }

    fn best_bid(&self) -> Option<(i32, i64)> {
        self.bids.iter().next_back().map(|(&p, &q)| (p, q))
    }

    fn best_ask(&self) -> Option<(i32, i64)> {
        self.asks.iter().next().map(|(&p, &q)| (p, q))
    }
}

/// Best bid/offer for one symbol, zeroed when a side is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bbo {
    pub best_bid: i32,
    pub bid_qty: i64,
    pub best_ask: i32,
    pub ask_qty: i64,
}

#[derive(Debug, Default)]
struct BookState {
    orders: HashMap<u64, RestingOrder>,
    books: HashMap<u32, SymbolBook>,
}

/// The live order book, maintained from new/delete/modify market-data events.
#[derive(Debug, Default)]
pub struct OrderBook {
    state: RwLock<BookState>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self { state: RwLock::new(BookState::default()) }
    }

    pub async fn new_order(&self, order_id: u64, symbol: u32, side: Side, quantity: u32, price: i32) {
        let mut state = self.state.write().await;
        state.orders.insert(order_id, RestingOrder { symbol, side, quantity, price });
        state.books.entry(symbol).or_default().add(side, price, quantity);
    }

    pub async fn delete_order(&self, order_id: u64) {
        let mut state = self.state.write().await;
        if let Some(order) = state.orders.remove(&order_id) {
            if let Some(book) = state.books.get_mut(&order.symbol) {
                book.remove(order.side, order.price, order.quantity);
            }
        }
    }

    pub async fn modify_order(&self, order_id: u64, side: Side, quantity: u32, price: i32) {
        let mut state = self.state.write().await;
        let Some(order) = state.orders.get(&order_id).copied() else { return };
        if let Some(book) = state.books.get_mut(&order.symbol) {
            book.remove(order.side, order.price, order.quantity);
            book.add(side, price, quantity);
        }
        state.orders.insert(order_id, RestingOrder { symbol: order.symbol, side, quantity, price });
    }

    /// Best bid/offer for one symbol. Missing sides report price 0, qty 0.
    pub async fn bbo(&self, symbol: u32) -> Bbo {
        let state = self.state.read().await;
        let Some(book) = state.books.get(&symbol) else { return Bbo::default() };
        let (best_bid, bid_qty) = book.best_bid().unwrap_or((0, 0));
        let (best_ask, ask_qty) = book.best_ask().unwrap_or((0, 0));
        Bbo { best_bid, bid_qty, best_ask, ask_qty }
    }
}
