//! Fill history preparation.
//!
//! The activity feed delivers fills newest-first for every asset on the
//! account; the ledger consumes one symbol's fills oldest-first.

use crate::domain::{Fill, Symbol};
use std::collections::HashSet;

/// Reverse a newest-first fill list into oldest-first order.
///
/// Delivery order is trusted as-is; fills are not re-sorted by timestamp,
/// so same-timestamp partial fills keep the brokerage's relative order.
pub fn into_chronological(mut newest_first: Vec<Fill>) -> Vec<Fill> {
    newest_first.reverse();
    newest_first
}

/// Keep only the fills for `symbol`, in delivery order.
pub fn fills_for_symbol(fills: Vec<Fill>, symbol: &Symbol) -> Vec<Fill> {
    fills
        .into_iter()
        .filter(|f| symbol.matches(&f.symbol))
        .collect()
}

/// Drop records repeated under the same activity id, keeping the first.
///
/// Fills without an id are never collapsed: identical partial fills are
/// separate executions.
pub fn dedupe_fills(fills: Vec<Fill>) -> Vec<Fill> {
    let mut seen = HashSet::new();
    fills
        .into_iter()
        .filter(|f| match &f.activity_id {
            Some(id) => seen.insert(id.clone()),
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decimal, Side, TimeNs};

    fn make_fill(symbol: &str, time: i64) -> Fill {
        Fill::new(
            symbol,
            Decimal::from_str_canonical("100").unwrap(),
            Side::Buy,
            Decimal::from_str_canonical("0.5").unwrap(),
            TimeNs::new(time),
        )
    }

    fn with_id(id: &str, time: i64) -> Fill {
        make_fill("BTC/USD", time).with_activity_id(id)
    }

    #[test]
    fn test_into_chronological_reverses() {
        let fills = vec![with_id("c", 3), with_id("b", 2), with_id("a", 1)];
        let ordered = into_chronological(fills);
        let ids: Vec<&str> = ordered
            .iter()
            .filter_map(|f| f.activity_id.as_deref())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_dedupe_keeps_first_by_activity_id() {
        let fills = vec![with_id("a", 1), with_id("b", 2), with_id("a", 1)];
        let deduped = dedupe_fills(fills);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].activity_id.as_deref(), Some("a"));
        assert_eq!(deduped[1].activity_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_dedupe_keeps_identical_fills_without_id() {
        let fills = vec![make_fill("BTC/USD", 1), make_fill("BTC/USD", 1)];
        assert_eq!(dedupe_fills(fills).len(), 2);
    }

    #[test]
    fn test_fills_for_symbol() {
        let fills = vec![
            make_fill("BTCUSD", 3),
            make_fill("ETH/USD", 2),
            make_fill("BTC/USD", 1),
        ];
        let btc = fills_for_symbol(fills, &Symbol::new("BTC/USD".to_string()));
        let times: Vec<i64> = btc.iter().map(|f| f.time.as_i64()).collect();
        assert_eq!(times, vec![3, 1]);
    }
}
