//! Papertrade Core - Paper trading session state and scenario analytics.
//!
//! This crate provides the computational core of a paper-trading front end:
//!
//! - **Scenario analytics**: correlation matrix, smart entry optimizer,
//!   auto-rebalance advisor, time-weighted ROI
//! - **Sentiment**: keyword-based headline scoring
//! - **Options**: payoff curves, breakeven and max gain/loss
//! - **Paper trading**: an explicit session store for balances, holdings and queued orders
//!
//! # Example
//!
//! ```rust
//! use papertrade_core::analytics::{correlation_matrix, LengthPolicy};
//! use papertrade_core::InstrumentSnapshot;
//!
//! let snapshots = vec![
//!     InstrumentSnapshot::new("aapl", 10.0, vec![100.0, 110.0, 121.0], 121.0, "Technology"),
//!     InstrumentSnapshot::new("msft", 5.0, vec![200.0, 210.0, 230.0], 230.0, "Technology"),
//! ];
//!
//! let pairs = correlation_matrix(&snapshots, LengthPolicy::Strict).unwrap();
//! assert_eq!(pairs.len(), 1);
//! assert_eq!(pairs[0].source, "AAPL");
//! ```

pub mod analytics;
pub mod config;
pub mod options;
pub mod paper_trade;
pub mod scenario;
pub mod sentiment;
pub mod types;

// Re-export commonly used types
pub use types::{ApiResponse, InstrumentSnapshot, RiskTag, Trade, TradeSide};

// Re-export main functionality
pub use analytics::{
    auto_rebalance, correlation_matrix, smart_entry, time_weighted_roi, CorrelationPair,
    LengthPolicy, Outcome, RebalanceSuggestion, SmartEntry,
};
pub use config::{AnalyticsConfig, Config, SessionConfig};
pub use paper_trade::{MarketHours, TradingSession};
pub use scenario::ScenarioReport;

/// Error types for papertrade-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Position not found: {0}")]
    PositionNotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Insufficient funds: need ${needed:.2}, have ${available:.2}")]
    InsufficientFunds { needed: f64, available: f64 },

    #[error("Index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Result type for papertrade-core operations.
pub type Result<T> = std::result::Result<T, Error>;
