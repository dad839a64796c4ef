use crate::domain::{Decimal, Symbol};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub run_mode: RunMode,
    pub broker_api_url: String,
    pub market_data_url: String,
    pub api_key_id: String,
    pub api_secret_key: String,
    pub symbol: Symbol,
    pub bar_timeframe: String,
    pub bar_lookback_ms: i64,
    pub strategy: StrategyConfig,
    pub poll_interval_ms: u64,
}

/// Trading parameters consumed by the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub quantity_per_trade: Decimal,
    /// 0.004 means the close must exceed lot cost by 0.4%.
    pub profit_margin: Decimal,
    pub stale_after_ms: i64,
    pub min_history: usize,
    pub fast_window: usize,
    pub slow_window: usize,
    pub band_window: usize,
    pub band_multiplier: f64,
    pub settlement_delay_ms: u64,
    pub hold_delay_ms: u64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            quantity_per_trade: Decimal::new(rust_decimal::Decimal::new(5, 1)),
            profit_margin: Decimal::new(rust_decimal::Decimal::new(4, 3)),
            stale_after_ms: 2 * 86_400_000,
            min_history: 20,
            fast_window: 5,
            slow_window: 20,
            band_window: 20,
            band_multiplier: 2.0,
            settlement_delay_ms: 2_000,
            hold_delay_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Serve the evaluate endpoint over HTTP.
    Server,
    /// Evaluate on a fixed interval until interrupted.
    Poll,
    /// Evaluate one cycle and print it.
    Once,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

fn parse_or<T: FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: T,
    expected: &str,
) -> Result<T, ConfigError> {
    match env_map.get(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            ConfigError::InvalidValue(key.to_string(), format!("must be {}", expected))
        }),
        None => Ok(default),
    }
}

fn required(env_map: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    env_map
        .get(key)
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnv(key.to_string()))
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = parse_or(&env_map, "PORT", 8080u16, "a valid u16")?;

        let run_mode = match env_map
            .get("RUN_MODE")
            .map(|s| s.as_str())
            .unwrap_or("server")
        {
            "server" => RunMode::Server,
            "poll" => RunMode::Poll,
            "once" => RunMode::Once,
            other => {
                return Err(ConfigError::InvalidValue(
                    "RUN_MODE".to_string(),
                    format!("must be server, poll, or once, got {}", other),
                ))
            }
        };

        let api_key_id = required(&env_map, "BROKER_API_KEY_ID")?;
        let api_secret_key = required(&env_map, "BROKER_API_SECRET_KEY")?;

        let broker_api_url = env_map
            .get("BROKER_API_URL")
            .cloned()
            .unwrap_or_else(|| "https://paper-api.alpaca.markets".to_string());
        let market_data_url = env_map
            .get("MARKET_DATA_URL")
            .cloned()
            .unwrap_or_else(|| "https://data.alpaca.markets".to_string());

        let symbol = Symbol::new(
            env_map
                .get("SYMBOL")
                .cloned()
                .unwrap_or_else(|| "BTC/USD".to_string()),
        );
        let bar_timeframe = env_map
            .get("BAR_TIMEFRAME")
            .cloned()
            .unwrap_or_else(|| "1Min".to_string());
        let bar_lookback_ms = parse_or(&env_map, "BAR_LOOKBACK_MS", 86_400_000i64, "a valid i64")?;
        let poll_interval_ms = parse_or(&env_map, "POLL_INTERVAL_MS", 60_000u64, "a valid u64")?;

        let strategy = StrategyConfig::from_env_map(&env_map)?;

        Ok(Config {
            port,
            run_mode,
            broker_api_url,
            market_data_url,
            api_key_id,
            api_secret_key,
            symbol,
            bar_timeframe,
            bar_lookback_ms,
            strategy,
            poll_interval_ms,
        })
    }
}

impl StrategyConfig {
    pub fn from_env_map(env_map: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            quantity_per_trade: parse_or(
                env_map,
                "QUANTITY_PER_TRADE",
                defaults.quantity_per_trade,
                "a decimal",
            )?,
            profit_margin: parse_or(env_map, "PROFIT_MARGIN", defaults.profit_margin, "a decimal")?,
            stale_after_ms: parse_or(env_map, "STALE_AFTER_MS", defaults.stale_after_ms, "a valid i64")?,
            min_history: parse_or(env_map, "MIN_HISTORY", defaults.min_history, "a valid usize")?,
            fast_window: parse_or(env_map, "FAST_WINDOW", defaults.fast_window, "a valid usize")?,
            slow_window: parse_or(env_map, "SLOW_WINDOW", defaults.slow_window, "a valid usize")?,
            band_window: parse_or(env_map, "BAND_WINDOW", defaults.band_window, "a valid usize")?,
            band_multiplier: parse_or(
                env_map,
                "BAND_MULTIPLIER",
                defaults.band_multiplier,
                "a number",
            )?,
            settlement_delay_ms: parse_or(
                env_map,
                "SETTLEMENT_DELAY_MS",
                defaults.settlement_delay_ms,
                "a valid u64",
            )?,
            hold_delay_ms: parse_or(env_map, "HOLD_DELAY_MS", defaults.hold_delay_ms, "a valid u64")?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Windows must fit inside the minimum history gate so every indicator is
    /// defined once the gate passes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, msg: &str| ConfigError::InvalidValue(key.to_string(), msg.to_string());

        if !self.quantity_per_trade.is_positive() {
            return Err(invalid("QUANTITY_PER_TRADE", "must be greater than zero"));
        }
        if self.profit_margin.is_negative() {
            return Err(invalid("PROFIT_MARGIN", "must not be negative"));
        }
        if self.fast_window == 0 || self.slow_window == 0 || self.band_window == 0 {
            return Err(invalid("FAST_WINDOW", "windows must be greater than zero"));
        }
        if self.fast_window >= self.slow_window {
            return Err(invalid("FAST_WINDOW", "must be smaller than SLOW_WINDOW"));
        }
        if self.slow_window > self.min_history {
            return Err(invalid("SLOW_WINDOW", "must not exceed MIN_HISTORY"));
        }
        if self.band_window > self.min_history {
            return Err(invalid("BAND_WINDOW", "must not exceed MIN_HISTORY"));
        }
        if !self.band_multiplier.is_finite() {
            return Err(invalid("BAND_MULTIPLIER", "must be finite"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("BROKER_API_KEY_ID".to_string(), "key".to_string());
        map.insert("BROKER_API_SECRET_KEY".to_string(), "secret".to_string());
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.run_mode, RunMode::Server);
        assert_eq!(config.symbol.as_str(), "BTC/USD");
        assert_eq!(config.strategy, StrategyConfig::default());
        assert_eq!(
            config.strategy.quantity_per_trade,
            Decimal::from_str_canonical("0.5").unwrap()
        );
        assert_eq!(
            config.strategy.profit_margin,
            Decimal::from_str_canonical("0.004").unwrap()
        );
        assert_eq!(config.strategy.min_history, 20);
    }

    #[test]
    fn test_missing_key_id() {
        let mut env_map = setup_required_env();
        env_map.remove("BROKER_API_KEY_ID");
        match Config::from_env_map(env_map) {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "BROKER_API_KEY_ID"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_missing_secret_key() {
        let mut env_map = setup_required_env();
        env_map.remove("BROKER_API_SECRET_KEY");
        match Config::from_env_map(env_map) {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "BROKER_API_SECRET_KEY"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_invalid_port() {
        let mut env_map = setup_required_env();
        env_map.insert("PORT".to_string(), "not_a_number".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_run_mode() {
        let mut env_map = setup_required_env();
        env_map.insert("RUN_MODE".to_string(), "daemon".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "RUN_MODE"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_overrides() {
        let mut env_map = setup_required_env();
        env_map.insert("QUANTITY_PER_TRADE".to_string(), "0.25".to_string());
        env_map.insert("RUN_MODE".to_string(), "once".to_string());
        env_map.insert("SYMBOL".to_string(), "ETH/USD".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.run_mode, RunMode::Once);
        assert_eq!(config.symbol.as_str(), "ETH/USD");
        assert_eq!(
            config.strategy.quantity_per_trade,
            Decimal::from_str_canonical("0.25").unwrap()
        );
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut env_map = setup_required_env();
        env_map.insert("QUANTITY_PER_TRADE".to_string(), "0".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "QUANTITY_PER_TRADE"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_slow_window_beyond_history_rejected() {
        let mut env_map = setup_required_env();
        env_map.insert("SLOW_WINDOW".to_string(), "30".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "SLOW_WINDOW"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_fast_not_below_slow_rejected() {
        let mut env_map = setup_required_env();
        env_map.insert("FAST_WINDOW".to_string(), "20".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "FAST_WINDOW"),
            _ => panic!("Expected InvalidValue error"),
        }
    }
}
