//! Boolean trading signals computed from one cycle's snapshot.
//!
//! Every function is pure. Undefined indicator values (warmup, NaN) make the
//! dependent signal false.

use super::indicators::{latest, Bands, Series};
use crate::domain::Decimal;
use serde::{Deserialize, Serialize};

/// Everything the signal evaluator reads for one cycle.
#[derive(Debug, Clone)]
pub struct SignalInputs<'a> {
    /// Current net position size for the traded symbol.
    pub position: Decimal,
    pub equity: Decimal,
    /// Latest best ask.
    pub ask: Decimal,
    pub fast_ma: &'a Series,
    pub slow_ma: &'a Series,
    pub bands: &'a Bands,
    pub latest_close: Decimal,
    /// Cost basis of the most recently opened lot.
    pub last_lot_cost: Decimal,
    pub stale: bool,
    pub quantity_per_trade: Decimal,
    /// Fractional margin over cost required to take profit (0.004 = 0.4%).
    pub profit_margin: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signals {
    pub can_buy: bool,
    pub can_sell: bool,
    pub trend_up: bool,
    pub oversold: bool,
    pub overbought: bool,
    pub profit_take: bool,
    pub stale: bool,
}

/// Whether another unit can be bought with the account's equity.
///
/// Above one unit, equity is spread over the position plus the new unit.
pub fn can_buy(position: Decimal, unit: Decimal, equity: Decimal, ask: Decimal) -> bool {
    if position > unit {
        equity / (position + unit) > ask
    } else {
        equity > ask
    }
}

pub fn can_sell(position: Decimal, unit: Decimal) -> bool {
    position > unit
}

/// Fast moving average above the slow one at the latest sample.
pub fn trend_up(fast_ma: &[Option<f64>], slow_ma: &[Option<f64>]) -> bool {
    match (latest(fast_ma), latest(slow_ma)) {
        (Some(fast), Some(slow)) => fast > slow,
        _ => false,
    }
}

pub fn oversold(latest_close: Decimal, bands: &Bands) -> bool {
    latest(&bands.lower).is_some_and(|lower| latest_close.to_f64() < lower)
}

pub fn overbought(latest_close: Decimal, bands: &Bands) -> bool {
    latest(&bands.upper).is_some_and(|upper| latest_close.to_f64() > upper)
}

pub fn profit_take(latest_close: Decimal, last_lot_cost: Decimal, margin: Decimal) -> bool {
    latest_close > last_lot_cost * (Decimal::one() + margin)
}

pub fn evaluate_signals(inputs: &SignalInputs<'_>) -> Signals {
    Signals {
        can_buy: can_buy(
            inputs.position,
            inputs.quantity_per_trade,
            inputs.equity,
            inputs.ask,
        ),
        can_sell: can_sell(inputs.position, inputs.quantity_per_trade),
        trend_up: trend_up(inputs.fast_ma, inputs.slow_ma),
        oversold: oversold(inputs.latest_close, inputs.bands),
        overbought: overbought(inputs.latest_close, inputs.bands),
        profit_take: profit_take(
            inputs.latest_close,
            inputs.last_lot_cost,
            inputs.profit_margin,
        ),
        stale: inputs.stale,
    }
}
