//! Scenario analytics over instrument snapshots.
//!
//! Four independent, pure computations:
//!
//! - **Correlation matrix**: pairwise Pearson correlation of price histories
//! - **Smart entry**: best historical entry point versus the actual one
//! - **Auto-rebalance**: per-instrument nudges toward equal sector weights
//! - **Time-weighted ROI**: annualized return over an assumed holding period
//!
//! Malformed input is rejected with [`crate::Error::Validation`]; numeric
//! degeneracies (flat series, zero prices) come back as [`Outcome::Degenerate`].

mod correlation;
mod outcome;
mod rebalance;
mod roi;
mod smart_entry;

pub use correlation::{correlation_matrix, pearson, CorrelationPair, LengthPolicy};
pub use outcome::{Degeneracy, Outcome};
pub use rebalance::{auto_rebalance, sector_totals, RebalanceSuggestion};
pub use roi::{
    annualize_return, format_roi, holding_period_return, time_weighted_roi, DEFAULT_DAYS_HELD,
};
pub use smart_entry::{smart_entry, SmartEntry};
