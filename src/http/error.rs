//! REST error handling.
//!
//! Converts [`crate::etf::EtfError`] and request-validation failures into a
//! `400 Bad Request` with `{success: false, message: ...}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::etf::EtfError;

/// A handler-level error, mapped to `400 Bad Request` in every case — the
/// REST surface has no server-side failure mode beyond input rejection.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Etf(#[from] EtfError),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let message = match &self {
            HandlerError::Validation(msg) => msg.clone(),
            HandlerError::Etf(EtfError::NonPositiveAmount) => "Amount must be positive".to_string(),
            HandlerError::Etf(EtfError::Insufficient { deficits }) => {
                let parts: Vec<String> =
                    deficits.iter().map(|d| format!("{}: have {}, need {}", d.ticker, d.have, d.need)).collect();
                format!("Insufficient positions: {}", parts.join(", "))
            }
        };
        (StatusCode::BAD_REQUEST, Json(ErrorBody { success: false, message })).into_response()
    }
}

pub type HandlerResult<T> = std::result::Result<T, HandlerError>;
