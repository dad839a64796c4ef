//! Brokerage abstraction: bars, quotes, positions, fill activity, orders and equity.

use crate::domain::{Bar, Decimal, Fill, Side, Symbol, TimeInForce, TimeNs};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod alpaca;
pub mod mock;

pub use alpaca::AlpacaBrokerage;
pub use mock::MockBrokerage;

/// Latest top-of-book quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub ask_price: Decimal,
}

/// Open position as reported by the brokerage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// Symbol as the brokerage reports it (may be the compact form).
    pub symbol: String,
    pub quantity: Decimal,
}

/// A market order request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub symbol: Symbol,
    pub quantity: Decimal,
    pub side: Side,
    pub time_in_force: TimeInForce,
}

/// Acknowledgement for a submitted order. No fill confirmation is implied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAck {
    pub order_id: String,
    pub client_order_id: String,
    pub status: String,
}

/// Brokerage collaborator used by the cycle evaluator.
///
/// Implementations do not retry; any failure surfaces to the caller.
#[async_trait]
pub trait Brokerage: Send + Sync + fmt::Debug {
    /// Bars for `symbol` at `timeframe` (e.g. "1Min") starting at `since`, time-ascending.
    async fn get_bars(
        &self,
        symbol: &Symbol,
        timeframe: &str,
        since: TimeNs,
    ) -> Result<Vec<Bar>, BrokerageError>;

    async fn get_latest_quote(&self, symbol: &Symbol) -> Result<Quote, BrokerageError>;

    async fn list_positions(&self) -> Result<Vec<Position>, BrokerageError>;

    /// Complete fill activity for the account across all symbols,
    /// newest-first as delivered.
    async fn get_fills(&self) -> Result<Vec<Fill>, BrokerageError>;

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderAck, BrokerageError>;

    async fn get_equity(&self) -> Result<Decimal, BrokerageError>;
}

/// Net quantity held in `symbol`, zero when no position is open.
pub async fn position_size(
    brokerage: &dyn Brokerage,
    symbol: &Symbol,
) -> Result<Decimal, BrokerageError> {
    let positions = brokerage.list_positions().await?;
    Ok(positions
        .iter()
        .find(|p| symbol.matches(&p.symbol))
        .map(|p| p.quantity)
        .unwrap_or_else(Decimal::zero))
}

/// Error type for brokerage operations.
#[derive(Debug, Clone)]
pub enum BrokerageError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// Non-success HTTP status
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON or malformed response)
    ParseError(String),
    Other(String),
}

impl fmt::Display for BrokerageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrokerageError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            BrokerageError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            BrokerageError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            BrokerageError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BrokerageError {}
