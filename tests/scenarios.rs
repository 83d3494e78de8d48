//! End-to-end scenarios driving the component stack directly (no sockets or
//! HTTP server involved — these exercise the same code paths the receivers
//! and handlers call).

use etf_service::book::OrderBook;
use etf_service::clearing::ClearingStore;
use etf_service::etf::{EtfError, EtfLedger};
use etf_service::snapshot::compose_frame;
use etf_service::symbols::{ETF_SYMBOL, UNDERLYING_SYMBOLS};
use etf_service::types::Side;

/// S1 — a single fill followed by a position/PnL/volume query.
#[tokio::test]
async fn s1_simple_fill_then_query() {
    let clearing = ClearingStore::new();
    clearing.apply_fill(7, 1, 10, 100, Side::Buy).await;

    assert_eq!(clearing.position(7, 1).await, 10);
    let tally = clearing.snapshot().await[&(7, 1)];
    assert_eq!(tally.raw_pnl, -1000);
    assert_eq!(tally.volume, 10);
}

/// S2 — order book maintenance across NEW/MODIFY/DELETE.
#[tokio::test]
async fn s2_order_book_maintenance() {
    let book = OrderBook::new();
    book.new_order(1, 3, Side::Buy, 5, 50).await;
    book.new_order(2, 3, Side::Buy, 3, 52).await;
    book.modify_order(1, Side::Buy, 4, 52).await;
    book.delete_order(2).await;

    let bbo = book.bbo(3).await;
    assert_eq!(bbo.best_bid, 52);
    assert_eq!(bbo.bid_qty, 4);
    assert_eq!(bbo.best_ask, 0);
    assert_eq!(bbo.ask_qty, 0);
}

async fn fund_underlyings(clearing: &ClearingStore, client_id: u32, amount: i64) {
    for &symbol in UNDERLYING_SYMBOLS {
        clearing.apply_fill(client_id, symbol, amount as u32, 0, Side::Buy).await;
    }
}

/// S3 — ETF create happy path.
#[tokio::test]
async fn s3_etf_create_happy_path() {
    let clearing = ClearingStore::new();
    let etf = EtfLedger::new();
    fund_underlyings(&clearing, 9, 10).await;

    etf.create(&clearing, 9, 3).await.unwrap();

    assert_eq!(etf.effective_position(&clearing, 9, ETF_SYMBOL).await, 3);
    for &symbol in UNDERLYING_SYMBOLS {
        assert_eq!(etf.effective_position(&clearing, 9, symbol).await, 7);
    }
}

/// S4 — ETF create rejected when one underlying is short, with no partial
/// adjustment and a message naming only the deficient ticker.
#[tokio::test]
async fn s4_etf_create_insufficient() {
    let clearing = ClearingStore::new();
    let etf = EtfLedger::new();
    fund_underlyings(&clearing, 9, 10).await;
    // drain the first underlying down to 1
    let short_symbol = UNDERLYING_SYMBOLS[0];
    clearing.apply_fill(9, short_symbol, 9, 0, Side::Sell).await;

    let err = etf.create(&clearing, 9, 3).await.unwrap_err();
    match err {
        EtfError::Insufficient { deficits } => {
            assert_eq!(deficits.len(), 1);
            assert_eq!(etf_service::symbols::find(short_symbol).unwrap().ticker, deficits[0].ticker);
        }
        _ => panic!("expected Insufficient"),
    }

    // no adjustment applied anywhere
    assert_eq!(etf.effective_position(&clearing, 9, ETF_SYMBOL).await, 0);
    for &symbol in UNDERLYING_SYMBOLS {
        let expected = if symbol == short_symbol { 1 } else { 10 };
        assert_eq!(etf.effective_position(&clearing, 9, symbol).await, expected);
    }
}

/// S5 — redeem round-trip restores every underlying and records both
/// history entries in order.
#[tokio::test]
async fn s5_redeem_round_trip() {
    let clearing = ClearingStore::new();
    let etf = EtfLedger::new();
    fund_underlyings(&clearing, 9, 10).await;

    etf.create(&clearing, 9, 3).await.unwrap();
    etf.redeem(&clearing, 9, 3).await.unwrap();

    assert_eq!(etf.effective_position(&clearing, 9, ETF_SYMBOL).await, 0);
    for &symbol in UNDERLYING_SYMBOLS {
        assert_eq!(etf.effective_position(&clearing, 9, symbol).await, 10);
    }

    let history = etf.history().await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].kind, "CREATE");
    assert_eq!(history[0].amount, 3);
    assert_eq!(history[1].kind, "REDEEM");
    assert_eq!(history[1].amount, 3);
}

/// S6 — dashboard frame mark-to-market for a synthetic ETF position.
#[tokio::test]
async fn s6_dashboard_frame() {
    let clearing = ClearingStore::new();
    let etf = EtfLedger::new();
    let book = OrderBook::new();

    fund_underlyings(&clearing, 9, 10).await;
    etf.create(&clearing, 9, 3).await.unwrap();

    for symbol in etf_service::symbols::SYMBOLS {
        book.new_order(u64::from(symbol.id) * 2, symbol.id, Side::Buy, 100, 90).await;
        book.new_order(u64::from(symbol.id) * 2 + 1, symbol.id, Side::Sell, 100, 110).await;
    }

    let frame = compose_frame(&book, &clearing, &etf).await;
    let row = frame.positions.iter().find(|r| r.client_id == 9 && r.symbol == ETF_SYMBOL).unwrap();
    assert_eq!(row.position, 3);
    assert_eq!(row.volume, 0);
    assert_eq!(row.pnl, 270.0);
}

/// Property 6 — a sequence gap doesn't change final state relative to an
/// ungapped replay of the messages that did arrive; the tracker still
/// reports the gap but never drops a message on account of it.
#[tokio::test]
async fn sequence_gap_does_not_lose_state() {
    use etf_service::wire::SequenceTracker;

    let mut gapped = SequenceTracker::new();
    let mut ungapped = SequenceTracker::new();

    // gapped stream skips seq 2
    assert_eq!(gapped.observe(1), None);
    assert_eq!(gapped.observe(3), Some(1));

    // ungapped replay of exactly what arrived (1, then 3)
    assert_eq!(ungapped.observe(1), None);
    ungapped.observe(3);

    // both trackers converge on the same cursor afterward
    assert_eq!(gapped.observe(4), ungapped.observe(4));
}
