//! Mock brokerage for testing without network calls.

use super::{Brokerage, BrokerageError, OrderAck, OrderRequest, Position, Quote};
use crate::domain::{Bar, Decimal, Fill, Side, Symbol, TimeNs};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MockState {
    bars: Vec<Bar>,
    post_order_bars: Option<Vec<Bar>>,
    ask: Decimal,
    positions: Vec<Position>,
    fills: Vec<Fill>,
    equity: Decimal,
    orders: Vec<OrderRequest>,
    fail_with: Option<BrokerageError>,
}

/// In-memory brokerage returning predefined data.
///
/// Submitted orders are recorded and move the matching position so a
/// post-order position query sees the fill. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockBrokerage {
    state: Arc<Mutex<MockState>>,
}

impl MockBrokerage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the data from the others.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with_bars(self, bars: Vec<Bar>) -> Self {
        self.lock().bars = bars;
        self
    }

    /// Bars served once any order has been submitted.
    pub fn with_post_order_bars(self, bars: Vec<Bar>) -> Self {
        self.lock().post_order_bars = Some(bars);
        self
    }

    pub fn with_ask(self, ask: Decimal) -> Self {
        self.lock().ask = ask;
        self
    }

    pub fn with_position(self, symbol: &str, quantity: Decimal) -> Self {
        self.lock().positions.push(Position {
            symbol: symbol.to_string(),
            quantity,
        });
        self
    }

    /// Fills in newest-first order, as the activity feed delivers them.
    pub fn with_fills(self, fills: Vec<Fill>) -> Self {
        self.lock().fills = fills;
        self
    }

    pub fn with_equity(self, equity: Decimal) -> Self {
        self.lock().equity = equity;
        self
    }

    /// Make every call fail with `error`.
    pub fn failing_with(self, error: BrokerageError) -> Self {
        self.lock().fail_with = Some(error);
        self
    }

    pub fn set_equity(&self, equity: Decimal) {
        self.lock().equity = equity;
    }

    /// Orders submitted so far, oldest first.
    pub fn orders(&self) -> Vec<OrderRequest> {
        self.lock().orders.clone()
    }

    fn check_failure(&self) -> Result<(), BrokerageError> {
        match &self.lock().fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Brokerage for MockBrokerage {
    async fn get_bars(
        &self,
        _symbol: &Symbol,
        _timeframe: &str,
        since: TimeNs,
    ) -> Result<Vec<Bar>, BrokerageError> {
        self.check_failure()?;
        let state = self.lock();
        let bars = match (&state.post_order_bars, state.orders.is_empty()) {
            (Some(after), false) => after,
            _ => &state.bars,
        };
        Ok(bars.iter().filter(|b| b.time >= since).copied().collect())
    }

    async fn get_latest_quote(&self, _symbol: &Symbol) -> Result<Quote, BrokerageError> {
        self.check_failure()?;
        Ok(Quote {
            ask_price: self.lock().ask,
        })
    }

    async fn list_positions(&self) -> Result<Vec<Position>, BrokerageError> {
        self.check_failure()?;
        Ok(self.lock().positions.clone())
    }

    async fn get_fills(&self) -> Result<Vec<Fill>, BrokerageError> {
        self.check_failure()?;
        Ok(self.lock().fills.clone())
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderAck, BrokerageError> {
        self.check_failure()?;
        let mut state = self.lock();
        let delta = match order.side {
            Side::Buy => order.quantity,
            Side::Sell => -order.quantity,
        };
        match state
            .positions
            .iter_mut()
            .find(|p| order.symbol.matches(&p.symbol))
        {
            Some(position) => position.quantity += delta,
            None => state.positions.push(Position {
                symbol: order.symbol.compact(),
                quantity: delta,
            }),
        }
        state.orders.push(order.clone());

        let n = state.orders.len();
        Ok(OrderAck {
            order_id: format!("mock-{}", n),
            client_order_id: format!("mock-client-{}", n),
            status: "accepted".to_string(),
        })
    }

    async fn get_equity(&self) -> Result<Decimal, BrokerageError> {
        self.check_failure()?;
        Ok(self.lock().equity)
    }
}
