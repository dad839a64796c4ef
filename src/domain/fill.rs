//! Fill type representing a single brokerage execution.

use crate::domain::{Decimal, Side, TimeNs};
use serde::{Deserialize, Serialize};

/// A single trade fill/execution as reported by the brokerage's activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    /// Brokerage activity id. Absent for fills built outside the feed.
    pub activity_id: Option<String>,
    /// Asset symbol as the feed reports it, e.g. `BTC/USD` or `BTCUSD`.
    pub symbol: String,
    /// Execution price per unit.
    pub price: Decimal,
    pub side: Side,
    /// Quantity executed.
    pub quantity: Decimal,
    /// Execution time in nanoseconds since Unix epoch.
    pub time: TimeNs,
}

impl Fill {
    pub fn new(symbol: &str, price: Decimal, side: Side, quantity: Decimal, time: TimeNs) -> Self {
        Fill {
            activity_id: None,
            symbol: symbol.to_string(),
            price,
            side,
            quantity,
            time,
        }
    }

    /// Attach the brokerage's activity id.
    pub fn with_activity_id(mut self, activity_id: &str) -> Self {
        self.activity_id = Some(activity_id.to_string());
        self
    }
}
