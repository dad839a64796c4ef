//! Price bars and the per-cycle close series.

use crate::domain::{Decimal, TimeNs};
use serde::{Deserialize, Serialize};

/// One closed bar. Only the close matters to the signal engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub time: TimeNs,
    pub close: Decimal,
}

/// Time-ascending bars fetched for one evaluation cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceSeries {
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Build a series, sorting by time so callers may pass bars in any order.
    pub fn new(mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.time);
        Self { bars }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn latest_close(&self) -> Option<Decimal> {
        self.bars.last().map(|b| b.close)
    }

    /// Closes as floats for the indicator library.
    pub fn closes_f64(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close.to_f64()).collect()
    }
}

impl From<Vec<Bar>> for PriceSeries {
    fn from(bars: Vec<Bar>) -> Self {
        Self::new(bars)
    }
}
