//! Configuration for analytics and paper trading sessions.
//!
//! Loaded from a TOML file. Every field has a default, so a partial (or
//! missing) file is valid:
//!
//! ```toml
//! [analytics]
//! risk_tolerance = 0.25
//! length_policy = "truncate"
//!
//! [analytics.risk]
//! high = 12.0
//!
//! [session]
//! starting_balance = 25000.0
//! ```

use crate::analytics::LengthPolicy;
use crate::paper_trade::MarketHours;
use crate::sentiment::Lexicon;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analytics: AnalyticsConfig,
    pub session: SessionConfig,
}

impl Config {
    /// Get the default config file path.
    ///
    /// Default path: `~/.papertrade/config.toml`
    /// Can be overridden with `PAPERTRADE_CONFIG` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("PAPERTRADE_CONFIG") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".papertrade/config.toml"))
            .unwrap_or_else(|| PathBuf::from("papertrade.toml"))
    }

    /// Load config from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load config from a specific path. A missing file yields defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Tunables for the scenario analytics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Price-range thresholds for risk classification
    pub risk: RiskThresholds,
    /// Default risk tolerance for the rebalance advisor
    pub risk_tolerance: f64,
    /// Default assumed holding period for ROI annualization
    pub days_held: i64,
    /// How the correlation builder treats histories of unequal length
    pub length_policy: LengthPolicy,
    /// Headline keywords for sentiment scoring
    pub lexicon: Lexicon,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            risk: RiskThresholds::default(),
            risk_tolerance: 0.5,
            days_held: crate::analytics::DEFAULT_DAYS_HELD,
            length_policy: LengthPolicy::default(),
            lexicon: Lexicon::default(),
        }
    }
}

/// Max-minus-min price range above which an instrument is tagged High or Moderate risk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    pub high: f64,
    pub moderate: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high: 10.0,
            moderate: 5.0,
        }
    }
}

/// Settings for paper trading sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Balance used by `setup` when none is given
    pub starting_balance: f64,
    /// Shares per option contract
    pub contract_multiplier: f64,
    /// Regular trading session
    pub market_hours: MarketHours,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            starting_balance: 10_000.0,
            contract_multiplier: 100.0,
            market_hours: MarketHours::default(),
        }
    }
}
