//! Core data types for the papertrade system.

use crate::config::{AnalyticsConfig, RiskThresholds};
use crate::sentiment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sector label used when the upstream classification is unavailable.
pub const UNKNOWN_SECTOR: &str = "Unknown";

/// Coarse volatility classification of an instrument.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RiskTag {
    #[default]
    Low,
    Moderate,
    High,
}

impl RiskTag {
    /// Classify a price history by its max-minus-min range.
    ///
    /// An empty history is Low risk.
    pub fn classify(history: &[f64], thresholds: &RiskThresholds) -> Self {
        if history.is_empty() {
            return RiskTag::Low;
        }

        let max = history.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = history.iter().copied().fold(f64::INFINITY, f64::min);
        let range = max - min;

        if range > thresholds.high {
            RiskTag::High
        } else if range > thresholds.moderate {
            RiskTag::Moderate
        } else {
            RiskTag::Low
        }
    }

    /// Scaling applied to rebalance adjustments.
    pub fn modifier(&self) -> f64 {
        match self {
            RiskTag::High => 1.5,
            RiskTag::Moderate => 1.0,
            RiskTag::Low => 0.8,
        }
    }

    /// Human-readable exposure advice; empty for Moderate.
    pub fn advisory(&self) -> &'static str {
        match self {
            RiskTag::High => "High-risk. Consider reducing exposure.",
            RiskTag::Low => "Low-risk. Consider increasing exposure.",
            RiskTag::Moderate => "",
        }
    }
}

impl fmt::Display for RiskTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskTag::Low => "Low",
            RiskTag::Moderate => "Moderate",
            RiskTag::High => "High",
        };
        f.write_str(label)
    }
}

/// Per-symbol record consumed by the scenario analytics.
///
/// `total_value` is always recomputed from `last_price * quantity` and never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstrumentSnapshot {
    /// Ticker symbol (uppercase)
    pub symbol: String,
    /// Simulated units held
    pub quantity: f64,
    /// Daily closing prices, oldest first
    pub history: Vec<f64>,
    /// Most recent quote
    pub last_price: f64,
    /// Sector classification
    pub sector: String,
    /// Volatility-derived risk tag
    pub risk: RiskTag,
    /// Headline sentiment tally
    pub score: i32,
    /// Trailing dividend yield as a fraction, e.g. `0.025`
    #[serde(default)]
    pub dividend_yield: Option<f64>,
    /// Trailing earnings per share
    #[serde(default)]
    pub eps: Option<f64>,
}

impl InstrumentSnapshot {
    /// Create a snapshot, deriving the risk tag with default thresholds.
    pub fn new(symbol: &str, quantity: f64, history: Vec<f64>, last_price: f64, sector: &str) -> Self {
        let risk = RiskTag::classify(&history, &RiskThresholds::default());
        let sector = if sector.trim().is_empty() {
            UNKNOWN_SECTOR.to_string()
        } else {
            sector.to_string()
        };

        Self {
            symbol: symbol.to_uppercase(),
            quantity,
            history,
            last_price,
            sector,
            risk,
            score: 0,
            dividend_yield: None,
            eps: None,
        }
    }

    /// Override the risk tag.
    pub fn with_risk(mut self, risk: RiskTag) -> Self {
        self.risk = risk;
        self
    }

    /// Attach a sentiment score.
    pub fn with_score(mut self, score: i32) -> Self {
        self.score = score;
        self
    }

    /// Attach fundamentals used by the health score.
    pub fn with_fundamentals(mut self, dividend_yield: Option<f64>, eps: Option<f64>) -> Self {
        self.dividend_yield = dividend_yield;
        self.eps = eps;
        self
    }

    /// Current valuation: `last_price * quantity`.
    pub fn total_value(&self) -> f64 {
        self.last_price * self.quantity
    }

    /// Gain over the whole history: `quantity * (last_price - history[0])`.
    pub fn period_gain(&self) -> Option<f64> {
        self.history
            .first()
            .map(|start| self.quantity * (self.last_price - start))
    }

    /// Percentage change of `last_price` versus the price `lookback` points from the end.
    ///
    /// `None` when the history is too short or the base price is zero.
    pub fn change_percent(&self, lookback: usize) -> Option<f64> {
        if lookback == 0 || lookback > self.history.len() {
            return None;
        }

        let base = self.history[self.history.len() - lookback];
        if base == 0.0 {
            return None;
        }
        Some((self.last_price - base) / base * 100.0)
    }

    /// Percentage change of `last_price` versus the oldest price.
    pub fn period_change_percent(&self) -> Option<f64> {
        self.change_percent(self.history.len())
    }
}

/// Loosely-specified snapshot as read from an input file.
///
/// Missing sector, risk or score are derived on conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub symbol: String,
    pub quantity: f64,
    #[serde(default)]
    pub history: Vec<f64>,
    pub last_price: f64,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub risk: Option<RiskTag>,
    #[serde(default)]
    pub score: Option<i32>,
    /// Recent headlines, scored when `score` is absent
    #[serde(default)]
    pub headlines: Vec<String>,
    #[serde(default)]
    pub dividend_yield: Option<f64>,
    #[serde(default)]
    pub eps: Option<f64>,
}

impl SnapshotRecord {
    /// Convert into a snapshot, filling derived fields from the config.
    pub fn into_snapshot(self, config: &AnalyticsConfig) -> InstrumentSnapshot {
        let risk = self
            .risk
            .unwrap_or_else(|| RiskTag::classify(&self.history, &config.risk));
        let score = self
            .score
            .unwrap_or_else(|| sentiment::headline_score(&self.headlines, &config.lexicon));
        let sector = self.sector.unwrap_or_default();

        InstrumentSnapshot::new(&self.symbol, self.quantity, self.history, self.last_price, &sector)
            .with_risk(risk)
            .with_score(score)
            .with_fundamentals(self.dividend_yield, self.eps)
    }
}

/// A single executed equity trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    /// Stock symbol
    pub symbol: String,
    /// Buy or Sell
    pub side: TradeSide,
    /// Number of shares
    pub quantity: f64,
    /// Price per share at execution
    pub price: f64,
    /// Total value of the trade
    pub value: f64,
    /// Realized P&L (zero for buys)
    pub realized_pl: f64,
    /// When the trade was executed
    pub executed_at: DateTime<Utc>,
}

impl Trade {
    /// Create a new trade.
    pub fn new(symbol: &str, side: TradeSide, quantity: f64, price: f64) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            side,
            quantity,
            price,
            value: quantity * price,
            realized_pl: 0.0,
            executed_at: Utc::now(),
        }
    }

    /// Create a closing trade with realized P&L.
    pub fn with_realized_pl(mut self, pl: f64) -> Self {
        self.realized_pl = pl;
        self
    }
}

/// Trade direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// API response wrapper for CLI output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
