//! Top-level error type.
//!
//! Decoder-level errors (malformed frames, sequence gaps) never reach here —
//! they are confined to the `wire` module and reported through `tracing`. This
//! type covers everything that can cross a module boundary as a `Result`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    Etf(#[from] crate::etf::EtfError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
