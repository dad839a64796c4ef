//! Domain primitives: TimeNs, Symbol, Side, TimeInForce.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Time in nanoseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeNs(pub i64);

impl TimeNs {
    pub const NANOS_PER_MS: i64 = 1_000_000;

    pub fn new(ns: i64) -> Self {
        TimeNs(ns)
    }

    pub fn from_ms(ms: i64) -> Self {
        TimeNs(ms.saturating_mul(Self::NANOS_PER_MS))
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        // Out of range only past the year 2262.
        TimeNs(dt.timestamp_nanos_opt().unwrap_or(i64::MAX))
    }

    /// Parse an RFC 3339 timestamp such as `2024-03-01T12:00:00.123456Z`.
    pub fn parse_rfc3339(s: &str) -> Result<Self, chrono::ParseError> {
        DateTime::parse_from_rfc3339(s).map(|dt| Self::from_datetime(dt.with_timezone(&Utc)))
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.0)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// Nanoseconds elapsed from `earlier` to `self`.
    pub fn nanos_since(&self, earlier: TimeNs) -> i64 {
        self.0.saturating_sub(earlier.0)
    }

    pub fn saturating_sub_ms(&self, ms: i64) -> Self {
        TimeNs(self.0.saturating_sub(ms.saturating_mul(Self::NANOS_PER_MS)))
    }
}

impl std::fmt::Display for TimeNs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_datetime().to_rfc3339())
    }
}

/// Market symbol in pair form (e.g. "BTC/USD").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(symbol: String) -> Self {
        Symbol(symbol)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Pair without the separator ("BTCUSD"), as positions are keyed.
    pub fn compact(&self) -> String {
        self.0.replace('/', "")
    }

    /// True when `other` names the same market in either pair or compact form.
    pub fn matches(&self, other: &str) -> bool {
        self.0 == other || self.compact() == other.replace('/', "")
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order or fill side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Order time-in-force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    /// Good til cancelled.
    Gtc,
}

impl TimeInForce {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeInForce::Gtc => "gtc",
        }
    }
}
