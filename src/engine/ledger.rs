use crate::domain::{Decimal, Fill, Side, TimeNs};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::warn;

/// One unit of open exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    pub cost_basis: Decimal,
    pub opened_at: TimeNs,
    /// Break-even placeholder standing in for an empty fill history.
    pub synthetic: bool,
}

impl Lot {
    pub fn new(cost_basis: Decimal, opened_at: TimeNs) -> Self {
        Self {
            cost_basis,
            opened_at,
            synthetic: false,
        }
    }

    fn placeholder(reference_price: Decimal, now: TimeNs) -> Self {
        Self {
            cost_basis: reference_price,
            opened_at: now,
            synthetic: true,
        }
    }
}

/// Open lots derived from the brokerage fill history.
///
/// Recomputed every cycle; nothing here is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotLedger {
    lots: Vec<Lot>,
    open_lot_count: i64,
    net_quantity: Decimal,
    stale_after_ns: i64,
    stale: bool,
}

impl LotLedger {
    /// Rebuild the open-lot view from oldest-first fills.
    ///
    /// `open_lot_count = floor((buys - sells) / quantity_per_trade)`. The most
    /// recent `open_lot_count` buy fills are the open lots. A negative count
    /// (sells exceed buys) drops that many buy fills from the head instead of
    /// producing an empty set. With no fills at all, a single placeholder lot
    /// priced at `reference_price` is synthesized so profit-take compares
    /// against break-even.
    pub fn reconstruct(
        fills: &[Fill],
        quantity_per_trade: Decimal,
        now: TimeNs,
        stale_after_ms: i64,
        reference_price: Option<Decimal>,
    ) -> Self {
        let stale_after_ns = stale_after_ms.saturating_mul(TimeNs::NANOS_PER_MS);

        if fills.is_empty() {
            let lots = reference_price
                .map(|px| vec![Lot::placeholder(px, now)])
                .unwrap_or_default();
            return Self {
                lots,
                open_lot_count: 0,
                net_quantity: Decimal::zero(),
                stale_after_ns,
                stale: false,
            };
        }

        let mut buys = Vec::new();
        let mut total_buy = Decimal::zero();
        let mut total_sell = Decimal::zero();
        for fill in fills {
            match fill.side {
                Side::Buy => {
                    buys.push(Lot::new(fill.price, fill.time));
                    total_buy += fill.quantity;
                }
                Side::Sell => total_sell += fill.quantity,
            }
        }

        let net_quantity = total_buy - total_sell;
        let open_lot_count = net_quantity
            .floor_div_int(quantity_per_trade)
            .unwrap_or_else(|| {
                warn!(
                    "Cannot size lots with quantity_per_trade={}; treating as flat",
                    quantity_per_trade
                );
                0
            });

        if open_lot_count < 0 {
            warn!(
                "Sells exceed buys (net {}); open lot count {} slices from the head",
                net_quantity, open_lot_count
            );
        }

        let mut ledger = Self {
            lots: slice_open_lots(buys, open_lot_count),
            open_lot_count,
            net_quantity,
            stale_after_ns,
            stale: false,
        };
        ledger.recompute_staleness(now);
        ledger
    }

    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    pub fn cost_bases(&self) -> Vec<Decimal> {
        self.lots.iter().map(|l| l.cost_basis).collect()
    }

    pub fn open_lot_count(&self) -> i64 {
        self.open_lot_count
    }

    /// Net filled quantity (buys minus sells) at reconstruction time.
    pub fn net_quantity(&self) -> Decimal {
        self.net_quantity
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Cost basis of the most recently opened lot, or `fallback` with no lots.
    pub fn most_recent_cost(&self, fallback: Decimal) -> Decimal {
        self.lots.last().map(|l| l.cost_basis).unwrap_or(fallback)
    }

    /// Record a newly bought lot. Replaces any break-even placeholder.
    pub fn open_lot(&mut self, lot: Lot, now: TimeNs) {
        self.lots.retain(|l| !l.synthetic);
        self.lots.push(lot);
        self.open_lot_count += 1;
        self.recompute_staleness(now);
    }

    /// Drop the most recently opened lot after a sell.
    pub fn close_most_recent(&mut self, now: TimeNs) -> Option<Lot> {
        let closed = self.lots.pop();
        if closed.is_some_and(|l| !l.synthetic) {
            self.open_lot_count -= 1;
        }
        self.recompute_staleness(now);
        closed
    }

    /// Stale when lots are open and the oldest one has been held past the limit.
    ///
    /// Age is taken from the oldest open lot (`first()`, lots are kept
    /// oldest-first), not the most recent one. Some write-ups of the
    /// reconstruction steps say "last"; the lot-age definition of staleness
    /// says oldest, and this follows the latter.
    fn recompute_staleness(&mut self, now: TimeNs) {
        self.stale = self.open_lot_count > 0
            && self
                .lots
                .first()
                .is_some_and(|oldest| now.nanos_since(oldest.opened_at) > self.stale_after_ns);
    }
}

fn slice_open_lots(buys: Vec<Lot>, open_lot_count: i64) -> Vec<Lot> {
    let len = buys.len();
    match open_lot_count.cmp(&0) {
        Ordering::Greater => {
            let n = usize::try_from(open_lot_count).unwrap_or(usize::MAX).min(len);
            buys[len - n..].to_vec()
        }
        Ordering::Equal => Vec::new(),
        Ordering::Less => {
            let skip = usize::try_from(open_lot_count.unsigned_abs()).unwrap_or(usize::MAX);
            buys.into_iter().skip(skip).collect()
        }
    }
}
