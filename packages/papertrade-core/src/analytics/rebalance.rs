//! Auto-rebalance advisor.
//!
//! Nudges each sector toward an equal share of the portfolio. The sector's
//! excess (or deficit) is spread across its members by value weight, scaled
//! by the risk tolerance and each member's risk modifier. This is a
//! heuristic; suggested values are not constrained to the current total.

use crate::types::{InstrumentSnapshot, RiskTag};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Suggested value adjustment for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceSuggestion {
    pub symbol: String,
    pub sector: String,
    pub risk: RiskTag,
    /// Current total value
    pub current: f64,
    /// `current + adjustment`
    pub suggested: f64,
    /// Signed value change; negative means trim
    pub adjustment: f64,
    /// Exposure advice derived from the risk tag (may be empty)
    pub advisory: String,
}

/// Group snapshots by sector, preserving first-seen sector order.
fn group_by_sector(snapshots: &[InstrumentSnapshot]) -> Vec<(&str, Vec<&InstrumentSnapshot>)> {
    let mut groups: Vec<(&str, Vec<&InstrumentSnapshot>)> = Vec::new();
    for snapshot in snapshots {
        match groups.iter_mut().find(|(sector, _)| *sector == snapshot.sector) {
            Some((_, members)) => members.push(snapshot),
            None => groups.push((snapshot.sector.as_str(), vec![snapshot])),
        }
    }
    groups
}

/// Total value per sector, in first-seen sector order.
pub fn sector_totals(snapshots: &[InstrumentSnapshot]) -> Vec<(String, f64)> {
    group_by_sector(snapshots)
        .into_iter()
        .map(|(sector, members)| {
            (
                sector.to_string(),
                members.iter().map(|s| s.total_value()).sum(),
            )
        })
        .collect()
}

/// Propose per-instrument adjustments toward equal sector weighting.
///
/// # Arguments
///
/// * `snapshots` - Holdings to rebalance
/// * `risk_tolerance` - Scaling in [0, 1]; values outside are clamped
///
/// # Returns
///
/// One suggestion per snapshot, grouped by sector in first-seen order.
///
/// # Errors
///
/// A NaN or infinite `risk_tolerance` is a [`Error::Validation`].
pub fn auto_rebalance(
    snapshots: &[InstrumentSnapshot],
    risk_tolerance: f64,
) -> Result<Vec<RebalanceSuggestion>> {
    if !risk_tolerance.is_finite() {
        return Err(Error::Validation(format!(
            "risk tolerance must be finite, got {}",
            risk_tolerance
        )));
    }

    let tolerance = risk_tolerance.clamp(0.0, 1.0);
    if tolerance != risk_tolerance {
        tracing::warn!(requested = risk_tolerance, used = tolerance, "risk tolerance clamped");
    }

    let groups = group_by_sector(snapshots);
    if groups.is_empty() {
        return Ok(Vec::new());
    }

    let total_value: f64 = snapshots.iter().map(|s| s.total_value()).sum();
    let ideal_sector_value = total_value / groups.len() as f64;

    let mut suggestions = Vec::with_capacity(snapshots.len());
    for (sector, members) in groups {
        let sector_value: f64 = members.iter().map(|s| s.total_value()).sum();
        let sector_excess = sector_value - ideal_sector_value;

        for snapshot in members {
            let current = snapshot.total_value();
            let weight = if sector_value == 0.0 {
                0.0
            } else {
                current / sector_value
            };
            let adjustment = -sector_excess * weight * tolerance * snapshot.risk.modifier();

            suggestions.push(RebalanceSuggestion {
                symbol: snapshot.symbol.clone(),
                sector: sector.to_string(),
                risk: snapshot.risk,
                current,
                suggested: current + adjustment,
                adjustment,
                advisory: snapshot.risk.advisory().to_string(),
            });
        }
    }

    tracing::debug!(
        suggestions = suggestions.len(),
        total_value,
        tolerance,
        "rebalance suggestions computed"
    );
    Ok(suggestions)
}
