//! The per-cycle result handed back to the invoker.

use crate::datasource::{OrderAck, OrderRequest};
use crate::domain::{Decimal, Symbol, TimeNs};
use crate::engine::{Action, Signals};
use serde::Serialize;

/// Submitted order with the brokerage's acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReport {
    #[serde(flatten)]
    pub request: OrderRequest,
    #[serde(flatten)]
    pub ack: OrderAck,
}

/// Inputs and outcome of one evaluation. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationCycle {
    pub symbol: Symbol,
    pub evaluated_at: TimeNs,
    pub signals: Option<Signals>,
    pub action: Action,
    /// Rule that chose the action; absent on hold.
    pub rule: Option<String>,
    pub order: Option<OrderReport>,
    /// Position size after the cycle, re-queried after any order.
    pub resulting_position: Option<Decimal>,
    pub latest_close: Option<Decimal>,
    pub ask: Option<Decimal>,
    pub equity: Decimal,
    /// Open lot cost bases, oldest first, after the action was applied.
    pub lots: Vec<Decimal>,
    pub open_lot_count: i64,
    pub stale: bool,
    pub no_action_count: u64,
    pub error: Option<String>,
}

impl EvaluationCycle {
    /// Result for a cycle that stopped at the history gate.
    pub fn insufficient_history(
        symbol: Symbol,
        evaluated_at: TimeNs,
        equity: Decimal,
        available: usize,
        required: usize,
        no_action_count: u64,
    ) -> Self {
        Self {
            symbol,
            evaluated_at,
            signals: None,
            action: Action::None,
            rule: None,
            order: None,
            resulting_position: None,
            latest_close: None,
            ask: None,
            equity,
            lots: Vec::new(),
            open_lot_count: 0,
            stale: false,
            no_action_count,
            error: Some(format!(
                "insufficient data: waiting for {} bars, have {}",
                required, available
            )),
        }
    }

    pub fn is_waiting_for_data(&self) -> bool {
        self.signals.is_none() && self.error.is_some()
    }
}
