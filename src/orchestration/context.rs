use crate::config::{Config, StrategyConfig};
use crate::datasource::{Brokerage, BrokerageError};
use crate::domain::{Decimal, Symbol, TimeNs};
use tracing::info;

/// Account snapshot held for the evaluator's lifetime.
///
/// Equity is read once and only refreshed when the owner asks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingContext {
    pub equity: Decimal,
    pub loaded_at: TimeNs,
}

impl TradingContext {
    pub fn new(equity: Decimal, loaded_at: TimeNs) -> Self {
        Self { equity, loaded_at }
    }

    pub async fn load(brokerage: &dyn Brokerage) -> Result<Self, BrokerageError> {
        let equity = brokerage.get_equity().await?;
        info!("Loaded account equity {}", equity);
        Ok(Self::new(equity, TimeNs::now()))
    }
}

/// Market and strategy settings for one traded symbol.
#[derive(Debug, Clone)]
pub struct CycleSettings {
    pub symbol: Symbol,
    pub bar_timeframe: String,
    pub bar_lookback_ms: i64,
    pub strategy: StrategyConfig,
}

impl CycleSettings {
    pub fn new(symbol: Symbol, strategy: StrategyConfig) -> Self {
        Self {
            symbol,
            bar_timeframe: "1Min".to_string(),
            bar_lookback_ms: 86_400_000,
            strategy,
        }
    }
}

impl From<&Config> for CycleSettings {
    fn from(config: &Config) -> Self {
        Self {
            symbol: config.symbol.clone(),
            bar_timeframe: config.bar_timeframe.clone(),
            bar_lookback_ms: config.bar_lookback_ms,
            strategy: config.strategy.clone(),
        }
    }
}
