use actix_web::ResponseError;
use actix_web::http::StatusCode;
use thiserror::Error;

/// Internal invariant broken; unreachable for a ledger built with `Ledger::new`.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("chain is empty: the genesis block is missing")]
    EmptyChain,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MiningError {
    #[error("mining was cancelled")]
    Cancelled,

    #[error("mining exceeded its time budget")]
    TimedOut,
}

/// Why a peer was left out of a consensus sweep.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("peer answered with HTTP {0}")]
    Status(u16),

    #[error("malformed chain response: {0}")]
    Malformed(String),
}

/// Rejected client input. Never mutates node state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("missing value for `nodes`: please supply a list of peer addresses")]
    MissingNodes,

    #[error("invalid peer address {0:?}")]
    InvalidAddress(String),
}

#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Mining(#[from] MiningError),

    #[error("invariant violation: {0}")]
    Invariant(#[from] LedgerError),

    #[error("blocking task failed: {0}")]
    Blocking(String),
}

impl ResponseError for NodeError {
    fn status_code(&self) -> StatusCode {
        match self {
            NodeError::Validation(_) => StatusCode::BAD_REQUEST,
            NodeError::Mining(_) => StatusCode::SERVICE_UNAVAILABLE,
            NodeError::Invariant(_) | NodeError::Blocking(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
