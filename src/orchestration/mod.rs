pub mod context;
pub mod evaluator;
pub mod report;

pub use context::{CycleSettings, TradingContext};
pub use evaluator::{CycleError, Evaluator};
pub use report::{EvaluationCycle, OrderReport};
