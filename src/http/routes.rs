//! REST handlers for the `/health`, `/symbols`, `/positions`, `/create`,
//! `/redeem`, and `/history` endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::book::OrderBook;
use crate::clearing::ClearingStore;
use crate::etf::EtfLedger;
use crate::snapshot::SubscriberRegistry;
use crate::symbols::{self, ETF_SYMBOL, UNDERLYING_SYMBOLS};

use super::error::{HandlerError, HandlerResult};

/// Shared handles injected into every request handler. Constructed once by
/// [`crate::service::Service`] and cloned cheaply (each field is an `Arc`).
#[derive(Clone)]
pub struct AppState {
    pub book: Arc<OrderBook>,
    pub clearing: Arc<ClearingStore>,
    pub etf: Arc<EtfLedger>,
    pub subscribers: Arc<SubscriberRegistry>,
}

#[derive(Serialize)]
pub struct HealthBody {
    status: &'static str,
    service: &'static str,
}

pub async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok", service: "etf_service" })
}

#[derive(Serialize)]
pub struct SymbolsBody {
    symbols: &'static [symbols::Symbol],
    etf_symbol: u32,
    underlying_symbols: &'static [u32],
}

pub async fn symbols_table() -> Json<SymbolsBody> {
    Json(SymbolsBody { symbols: symbols::SYMBOLS, etf_symbol: ETF_SYMBOL, underlying_symbols: UNDERLYING_SYMBOLS })
}

#[derive(Serialize)]
pub struct PositionsBody {
    client_id: u32,
    positions: std::collections::HashMap<String, i64>,
}

pub async fn positions(
    State(state): State<AppState>,
    Path(client_id): Path<u32>,
) -> Json<PositionsBody> {
    let raw = state.etf.all_positions(&state.clearing, client_id).await;
    let positions = raw.into_iter().map(|(symbol, qty)| (symbols::ticker(symbol), qty)).collect();
    Json(PositionsBody { client_id, positions })
}

#[derive(Serialize)]
pub struct PositionBody {
    client_id: u32,
    symbol: u32,
    ticker: String,
    position: i64,
}

pub async fn position_for_symbol(
    State(state): State<AppState>,
    Path((client_id, symbol)): Path<(u32, u32)>,
) -> Json<PositionBody> {
    let position = state.etf.effective_position(&state.clearing, client_id, symbol).await;
    Json(PositionBody { client_id, symbol, ticker: symbols::ticker(symbol), position })
}

#[derive(Deserialize)]
pub struct BasketRequest {
    client_id: Option<u32>,
    amount: Option<i64>,
}

#[derive(Serialize)]
pub struct BasketResponse {
    success: bool,
    message: String,
    undy_balance: i64,
}

fn validate_basket_request(req: &BasketRequest) -> HandlerResult<(u32, i64)> {
    let client_id = req.client_id.ok_or_else(|| HandlerError::Validation("Missing client_id".to_string()))?;
    let amount = req.amount.ok_or_else(|| HandlerError::Validation("Missing amount".to_string()))?;
    if amount <= 0 {
        return Err(HandlerError::Validation("Amount must be positive".to_string()));
    }
    Ok((client_id, amount))
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<BasketRequest>,
) -> HandlerResult<Json<BasketResponse>> {
    let (client_id, amount) = validate_basket_request(&req)?;
    state.etf.create(&state.clearing, client_id, amount).await?;
    let undy_balance = state.etf.effective_position(&state.clearing, client_id, ETF_SYMBOL).await;
    Ok(Json(BasketResponse {
        success: true,
        message: format!("Created {amount} UNDY from underlying positions"),
        undy_balance,
    }))
}

pub async fn redeem(
    State(state): State<AppState>,
    Json(req): Json<BasketRequest>,
) -> HandlerResult<Json<BasketResponse>> {
    let (client_id, amount) = validate_basket_request(&req)?;
    state.etf.redeem(&state.clearing, client_id, amount).await?;
    let undy_balance = state.etf.effective_position(&state.clearing, client_id, ETF_SYMBOL).await;
    Ok(Json(BasketResponse {
        success: true,
        message: format!("Redeemed {amount} UNDY to underlying positions"),
        undy_balance,
    }))
}

#[derive(Serialize)]
pub struct HistoryBody {
    history: Vec<crate::etf::HistoryRecord>,
}

pub async fn history(State(state): State<AppState>) -> Json<HistoryBody> {
    Json(HistoryBody { history: state.etf.history().await })
}
