//! Pure computation: indicators, lot ledger, signals and the decision rules.
//!
//! Nothing in here performs I/O; the cycle orchestration feeds it snapshots.

pub mod indicators;
pub mod ledger;
pub mod rules;
pub mod signals;

pub use indicators::{rolling_bands, rolling_mean, rolling_std, BandMultipliers, Bands, IndicatorError};
pub use ledger::{Lot, LotLedger};
pub use rules::{decide, Action, Decision, Rule, RULE_TABLE};
pub use signals::{evaluate_signals, SignalInputs, Signals};
