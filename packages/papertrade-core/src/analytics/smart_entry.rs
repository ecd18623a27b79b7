//! Smart entry optimizer: which historical buy point would have done best.

use super::outcome::{Degeneracy, Outcome};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Best possible entry versus the actual one, gains in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartEntry {
    /// The entry index that was analysed
    pub entry_index: usize,
    /// Index with the highest gain to the final price (earliest on ties)
    pub best_index: usize,
    /// Gain from `best_index` to the final price
    pub best_gain: f64,
    /// Gain from `entry_index` to the final price
    pub actual_gain: f64,
    /// `best_gain - actual_gain`
    pub delta: f64,
    /// Share of the other candidate entries the actual entry beat
    pub beat_percent: f64,
}

/// Find the entry index that maximizes gain to the final price.
///
/// The terminal index is never a candidate. A single-point history has no
/// candidates, so the actual entry is reported as the best with zero gain.
///
/// # Arguments
///
/// * `history` - Closing prices, oldest first
/// * `entry_index` - Index of the actual (or hypothetical) purchase
///
/// # Errors
///
/// An empty history is a [`Error::Validation`]; `entry_index` past the end is
/// [`Error::IndexOutOfRange`]. A non-positive price makes the result degenerate.
pub fn smart_entry(history: &[f64], entry_index: usize) -> Result<Outcome<SmartEntry>> {
    if history.is_empty() {
        return Err(Error::Validation("price history is empty".to_string()));
    }
    if entry_index >= history.len() {
        return Err(Error::IndexOutOfRange {
            index: entry_index,
            len: history.len(),
        });
    }
    if history.iter().any(|p| !(p.is_finite() && *p > 0.0)) {
        tracing::warn!(entry_index, "smart entry skipped: non-positive price in history");
        return Ok(Outcome::Degenerate(Degeneracy::NonPositivePrice));
    }

    let last = history.len() - 1;
    let final_price = history[last];
    let gain = |i: usize| (final_price - history[i]) / history[i] * 100.0;

    if last == 0 {
        return Ok(Outcome::Computed(SmartEntry {
            entry_index,
            best_index: entry_index,
            best_gain: 0.0,
            actual_gain: 0.0,
            delta: 0.0,
            beat_percent: 0.0,
        }));
    }

    let mut best_index = 0;
    let mut best_gain = f64::NEG_INFINITY;
    for i in 0..last {
        let g = gain(i);
        if g > best_gain {
            best_gain = g;
            best_index = i;
        }
    }

    let actual_gain = gain(entry_index);

    // Candidates other than the entry; the terminal entry competes with all of them
    let others: Vec<usize> = (0..last).filter(|&i| i != entry_index).collect();
    let beat_percent = if others.is_empty() {
        0.0
    } else {
        let beaten = others.iter().filter(|&&i| gain(i) < actual_gain).count();
        beaten as f64 / others.len() as f64 * 100.0
    };

    let result = SmartEntry {
        entry_index,
        best_index,
        best_gain,
        actual_gain,
        delta: best_gain - actual_gain,
        beat_percent,
    };
    tracing::debug!(
        entry_index,
        best_index,
        delta = result.delta,
        "smart entry computed"
    );

    Ok(Outcome::Computed(result))
}
