//! ETF ledger (component D): create/redeem adjustments layered on top of the
//! clearing store's raw positions.
//!
//! Grounded on `position_ledger.py`'s `PositionLedger`. Adjustments are kept
//! separately from clearing positions so that `effective_position = clearing
//! position + adjustment`; create/redeem mutate only the adjustment side and
//! are applied atomically under one lock, checked against the *effective*
//! position so a client can't create/redeem past what they actually hold.
//!
//! Lock nesting order is fixed: this ledger's lock is always acquired before
//! the clearing store's, never the reverse, and the order book lock is never
//! held alongside either.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::clearing::ClearingStore;
use crate::symbols::{self, ETF_SYMBOL, UNDERLYING_SYMBOLS};

/// A single line of an insufficient-position rejection, in basket order.
#[derive(Debug, Clone, Serialize)]
pub struct Deficit {
    pub ticker: String,
    pub have: i64,
    pub need: i64,
}

#[derive(Debug, Error)]
pub enum EtfError {
    #[error("amount must be positive")]
    NonPositiveAmount,

    #[error("insufficient positions")]
    Insufficient { deficits: Vec<Deficit> },
}

/// One audited create/redeem action.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryRecord {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub client_id: u32,
    pub amount: i64,
}

#[derive(Debug, Default)]
struct LedgerState {
    adjustments: HashMap<(u32, u32), i64>,
    history: Vec<HistoryRecord>,
}

/// `clearing position + adjustment`, reading the adjustment out of an
/// already-held ledger state guard rather than re-acquiring the lock — used
/// by `create`/`redeem` so the whole check-then-apply body runs under one
/// continuously-held write lock (D → B nesting, never the reverse).
async fn effective_position_locked(
    state: &LedgerState,
    clearing: &ClearingStore,
    client_id: u32,
    symbol: u32,
) -> i64 {
    let clearing_pos = clearing.position(client_id, symbol).await;
    let adjustment = state.adjustments.get(&(client_id, symbol)).copied().unwrap_or(0);
    clearing_pos + adjustment
}

/// The ETF create/redeem ledger, D in the component lock order.
#[derive(Debug, Default)]
pub struct EtfLedger {
    state: RwLock<LedgerState>,
}

impl EtfLedger {
    pub fn new() -> Self {
        Self { state: RwLock::new(LedgerState::default()) }
    }

    /// `clearing position + adjustment` for one client/symbol.
    pub async fn effective_position(&self, clearing: &ClearingStore, client_id: u32, symbol: u32) -> i64 {
        let state = self.state.read().await;
        effective_position_locked(&state, clearing, client_id, symbol).await
    }

    /// Every non-zero effective position held by one client, keyed by symbol id.
    pub async fn all_positions(&self, clearing: &ClearingStore, client_id: u32) -> HashMap<u32, i64> {
        let mut result = HashMap::new();
        for symbol in symbols::SYMBOLS {
            let pos = self.effective_position(clearing, client_id, symbol.id).await;
            if pos != 0 {
                result.insert(symbol.id, pos);
            }
        }
        result
    }

    /// Exchanges `amount` shares of every underlying symbol for `amount`
    /// shares of the ETF. Fails atomically (no partial adjustment) if any
    /// underlying is short; the error lists every short underlying, in
    /// basket order.
    ///
    /// The write lock is acquired once and held across both the sufficiency
    /// check and the adjustment apply, so the two appear as one step to any
    /// concurrent `create`/`redeem`/`effective_position` caller (§4.D, §5);
    /// positions are read through the held guard, never through
    /// `effective_position`, which would re-acquire this same lock.
    pub async fn create(&self, clearing: &ClearingStore, client_id: u32, amount: i64) -> Result<(), EtfError> {
        if amount <= 0 {
            return Err(EtfError::NonPositiveAmount);
        }

        let mut state = self.state.write().await;

        let mut deficits = Vec::new();
        for &symbol in UNDERLYING_SYMBOLS {
            let pos = effective_position_locked(&state, clearing, client_id, symbol).await;
            if pos < amount {
                deficits.push(Deficit { ticker: symbols::ticker(symbol), have: pos, need: amount });
            }
        }
        if !deficits.is_empty() {
            return Err(EtfError::Insufficient { deficits });
        }

        for &symbol in UNDERLYING_SYMBOLS {
            *state.adjustments.entry((client_id, symbol)).or_insert(0) -= amount;
        }
        *state.adjustments.entry((client_id, ETF_SYMBOL)).or_insert(0) += amount;
        state.history.push(HistoryRecord { kind: "CREATE", client_id, amount });
        Ok(())
    }

    /// Exchanges `amount` shares of the ETF back into `amount` shares of
    /// every underlying symbol. See [`Self::create`] for the locking
    /// discipline shared by both operations.
    pub async fn redeem(&self, clearing: &ClearingStore, client_id: u32, amount: i64) -> Result<(), EtfError> {
        if amount <= 0 {
            return Err(EtfError::NonPositiveAmount);
        }

        let mut state = self.state.write().await;

        let undy_pos = effective_position_locked(&state, clearing, client_id, ETF_SYMBOL).await;
        if undy_pos < amount {
            return Err(EtfError::Insufficient {
                deficits: vec![Deficit { ticker: symbols::ticker(ETF_SYMBOL), have: undy_pos, need: amount }],
            });
        }

        *state.adjustments.entry((client_id, ETF_SYMBOL)).or_insert(0) -= amount;
        for &symbol in UNDERLYING_SYMBOLS {
            *state.adjustments.entry((client_id, symbol)).or_insert(0) += amount;
        }
        state.history.push(HistoryRecord { kind: "REDEEM", client_id, amount });
        Ok(())
    }

    /// The full create/redeem audit trail, oldest first.
    pub async fn history(&self) -> Vec<HistoryRecord> {
        self.state.read().await.history.clone()
    }

    /// A snapshot of every `(client_id, symbol)` adjustment currently tracked,
    /// for composing dashboard frames alongside the clearing store.
    pub async fn snapshot_adjustments(&self) -> HashMap<(u32, u32), i64> {
        self.state.read().await.adjustments.clone()
    }

    /// Every client id with at least one recorded adjustment.
    pub async fn client_ids(&self) -> std::collections::HashSet<u32> {
        self.state.read().await.adjustments.keys().map(|&(client_id, _)| client_id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_debits_underlyings_and_credits_etf() {
        let clearing = ClearingStore::new();
        for &symbol in UNDERLYING_SYMBOLS {
            clearing.apply_fill(1, symbol, 10, 100, crate::types::Side::Buy).await;
        }
        let ledger = EtfLedger::new();

        ledger.create(&clearing, 1, 5).await.unwrap();

        assert_eq!(ledger.effective_position(&clearing, 1, ETF_SYMBOL).await, 5);
        for &symbol in UNDERLYING_SYMBOLS {
            assert_eq!(ledger.effective_position(&clearing, 1, symbol).await, 5);
        }
    }

    #[tokio::test]
    async fn create_fails_atomically_when_any_underlying_is_short() {
        let clearing = ClearingStore::new();
        // only fund the first underlying; leave the rest at zero
        clearing.apply_fill(1, UNDERLYING_SYMBOLS[0], 100, 100, crate::types::Side::Buy).await;
        let ledger = EtfLedger::new();

        let err = ledger.create(&clearing, 1, 5).await.unwrap_err();
        match err {
            EtfError::Insufficient { deficits } => {
                assert_eq!(deficits.len(), UNDERLYING_SYMBOLS.len() - 1);
            }
            _ => panic!("expected Insufficient"),
        }
        // no partial adjustment applied
        assert_eq!(ledger.effective_position(&clearing, 1, ETF_SYMBOL).await, 0);
        assert_eq!(ledger.effective_position(&clearing, 1, UNDERLYING_SYMBOLS[0]).await, 100);
    }

    #[tokio::test]
    async fn redeem_reverses_create() {
        let clearing = ClearingStore::new();
        for &symbol in UNDERLYING_SYMBOLS {
            clearing.apply_fill(1, symbol, 10, 100, crate::types::Side::Buy).await;
        }
        let ledger = EtfLedger::new();
        ledger.create(&clearing, 1, 5).await.unwrap();
        ledger.redeem(&clearing, 1, 5).await.unwrap();

        assert_eq!(ledger.effective_position(&clearing, 1, ETF_SYMBOL).await, 0);
        for &symbol in UNDERLYING_SYMBOLS {
            assert_eq!(ledger.effective_position(&clearing, 1, symbol).await, 10);
        }
    }

    #[tokio::test]
    async fn redeem_without_etf_shares_fails() {
        let clearing = ClearingStore::new();
        let ledger = EtfLedger::new();
        let err = ledger.redeem(&clearing, 1, 3).await.unwrap_err();
        match err {
            EtfError::Insufficient { deficits } => assert_eq!(deficits[0].ticker, "UNDY"),
            _ => panic!("expected Insufficient"),
        }
    }

    #[tokio::test]
    async fn non_positive_amount_rejected_for_both_operations() {
        let clearing = ClearingStore::new();
        let ledger = EtfLedger::new();
        assert!(matches!(ledger.create(&clearing, 1, 0).await, Err(EtfError::NonPositiveAmount)));
        assert!(matches!(ledger.redeem(&clearing, 1, -1).await, Err(EtfError::NonPositiveAmount)));
    }

    #[tokio::test]
    async fn concurrent_creates_cannot_double_spend_the_same_underlyings() {
        let clearing = ClearingStore::new();
        // fund exactly enough for one create of 10, not two
        for &symbol in UNDERLYING_SYMBOLS {
            clearing.apply_fill(1, symbol, 10, 100, crate::types::Side::Buy).await;
        }
        let ledger = EtfLedger::new();

        let (first, second) =
            tokio::join!(ledger.create(&clearing, 1, 10), ledger.create(&clearing, 1, 10));
        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(outcomes.iter().filter(|r| r.is_err()).count(), 1);

        // underlyings never go negative: only one create's worth was ever debited
        for &symbol in UNDERLYING_SYMBOLS {
            assert_eq!(ledger.effective_position(&clearing, 1, symbol).await, 0);
        }
        assert_eq!(ledger.effective_position(&clearing, 1, ETF_SYMBOL).await, 10);
    }

    #[tokio::test]
    async fn history_records_both_kinds_in_order() {
        let clearing = ClearingStore::new();
        for &symbol in UNDERLYING_SYMBOLS {
            clearing.apply_fill(1, symbol, 10, 100, crate::types::Side::Buy).await;
        }
        let ledger = EtfLedger::new();
        ledger.create(&clearing, 1, 3).await.unwrap();
        ledger.redeem(&clearing, 1, 3).await.unwrap();

        let history = ledger.history().await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].kind, "CREATE");
        assert_eq!(history[1].kind, "REDEEM");
    }
}
