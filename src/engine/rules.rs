//! Ordered decision rules. First matching rule wins; no match means hold.

use super::signals::Signals;
use crate::domain::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Buy,
    Sell,
    #[default]
    None,
}

/// A named predicate over one cycle's signals and the current position.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub action: Action,
    pub predicate: fn(&Signals, Decimal) -> bool,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("action", &self.action)
            .finish()
    }
}

impl Rule {
    pub fn matches(&self, signals: &Signals, position: Decimal) -> bool {
        (self.predicate)(signals, position)
    }
}

/// Enter on an uptrend unless the price is stretched above the upper band.
pub fn buy_on_uptrend(s: &Signals, position: Decimal) -> bool {
    !position.is_negative() && s.can_buy && s.trend_up && (s.oversold || !s.overbought)
}

/// Exit a stale lot, or take profit once the trend turns, unless the price
/// is already below the lower band.
pub fn sell_on_exit(s: &Signals, position: Decimal) -> bool {
    !position.is_negative()
        && (s.stale || (s.can_sell && !s.trend_up && s.profit_take))
        && (s.overbought || !s.oversold)
}

pub const RULE_TABLE: [Rule; 2] = [
    Rule {
        name: "buy_on_uptrend",
        action: Action::Buy,
        predicate: buy_on_uptrend,
    },
    Rule {
        name: "sell_on_exit",
        action: Action::Sell,
        predicate: sell_on_exit,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub action: Action,
    /// Name of the matching rule; `None` on hold.
    pub rule: Option<&'static str>,
}

pub fn decide(signals: &Signals, position: Decimal) -> Decision {
    decide_with(&RULE_TABLE, signals, position)
}

pub fn decide_with(rules: &[Rule], signals: &Signals, position: Decimal) -> Decision {
    rules
        .iter()
        .find(|rule| rule.matches(signals, position))
        .map(|rule| Decision {
            action: rule.action,
            rule: Some(rule.name),
        })
        .unwrap_or(Decision {
            action: Action::None,
            rule: None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn all_snapshots() -> Vec<Signals> {
        (0u8..128)
            .map(|bits| Signals {
                can_buy: bits & 1 != 0,
                can_sell: bits & 2 != 0,
                trend_up: bits & 4 != 0,
                oversold: bits & 8 != 0,
                overbought: bits & 16 != 0,
                profit_take: bits & 32 != 0,
                stale: bits & 64 != 0,
            })
            .collect()
    }

    #[test]
    fn test_buy_rule() {
        let s = Signals {
            can_buy: true,
            trend_up: true,
            ..Default::default()
        };
        let decision = decide(&s, d("0"));
        assert_eq!(decision.action, Action::Buy);
        assert_eq!(decision.rule, Some("buy_on_uptrend"));
    }

    #[test]
    fn test_buy_blocked_when_overbought_without_oversold() {
        let s = Signals {
            can_buy: true,
            trend_up: true,
            overbought: true,
            ..Default::default()
        };
        assert_eq!(decide(&s, d("0")).action, Action::None);
    }

    #[test]
    fn test_stale_forces_sell() {
        let s = Signals {
            stale: true,
            ..Default::default()
        };
        let decision = decide(&s, d("0.5"));
        assert_eq!(decision.action, Action::Sell);
        assert_eq!(decision.rule, Some("sell_on_exit"));
    }

    #[test]
    fn test_profit_take_requires_downtrend_and_sell_capacity() {
        let s = Signals {
            can_sell: true,
            profit_take: true,
            ..Default::default()
        };
        assert_eq!(decide(&s, d("1")).action, Action::Sell);

        let no_capacity = Signals {
            can_sell: false,
            ..s
        };
        assert_eq!(decide(&no_capacity, d("1")).action, Action::None);
    }

    #[test]
    fn test_sell_blocked_when_oversold() {
        let s = Signals {
            stale: true,
            oversold: true,
            ..Default::default()
        };
        assert_eq!(decide(&s, d("1")).action, Action::None);

        let both = Signals {
            overbought: true,
            ..s
        };
        assert_eq!(decide(&both, d("1")).action, Action::Sell);
    }

    #[test]
    fn test_negative_position_always_holds() {
        for s in all_snapshots() {
            assert_eq!(decide(&s, d("-0.5")).action, Action::None);
        }
    }

    #[test]
    fn test_buy_takes_precedence_over_sell() {
        let s = Signals {
            can_buy: true,
            trend_up: true,
            stale: true,
            ..Default::default()
        };
        assert!(buy_on_uptrend(&s, d("1")));
        assert!(sell_on_exit(&s, d("1")));
        assert_eq!(decide(&s, d("1")).action, Action::Buy);
    }

    #[test]
    fn test_at_most_one_action_per_snapshot() {
        for s in all_snapshots() {
            let decision = decide(&s, d("1"));
            let expected = if buy_on_uptrend(&s, d("1")) {
                Action::Buy
            } else if sell_on_exit(&s, d("1")) {
                Action::Sell
            } else {
                Action::None
            };
            assert_eq!(decision.action, expected);
        }
    }

    #[test]
    fn test_empty_table_holds() {
        let decision = decide_with(&[], &Signals::default(), d("0"));
        assert_eq!(decision.action, Action::None);
        assert_eq!(decision.rule, None);
    }
}
