//! Domain types for the signal engine.
//!
//! This module provides:
//! - Lossless numeric handling via Decimal wrapper
//! - Domain primitives: TimeNs, Symbol, Side, TimeInForce
//! - Fill and Bar records as delivered by the brokerage
//! - Symbol filtering and chronological ordering for the fill history

pub mod bar;
pub mod decimal;
pub mod fill;
pub mod ordering;
pub mod primitives;

pub use bar::{Bar, PriceSeries};
pub use decimal::Decimal;
pub use fill::Fill;
pub use ordering::{dedupe_fills, fills_for_symbol, into_chronological};
pub use primitives::{Side, Symbol, TimeInForce, TimeNs};
