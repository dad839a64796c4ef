pub mod api;
pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::{Config, StrategyConfig};
pub use datasource::{AlpacaBrokerage, Brokerage, BrokerageError, MockBrokerage};
pub use domain::{Bar, Decimal, Fill, PriceSeries, Side, Symbol, TimeInForce, TimeNs};
pub use engine::{Action, Lot, LotLedger, Signals};
pub use error::AppError;
pub use orchestration::{CycleError, CycleSettings, EvaluationCycle, Evaluator, TradingContext};
