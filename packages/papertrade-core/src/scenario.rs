//! Scenario simulation report.
//!
//! Assembles the per-instrument figures and portfolio-level analytics shown
//! after a "Simulate" action. Snapshots are consumed as given; nothing is
//! cached between reports.

use crate::analytics::{
    auto_rebalance, correlation_matrix, format_roi, sector_totals, time_weighted_roi,
    CorrelationPair, Outcome, RebalanceSuggestion,
};
use crate::config::AnalyticsConfig;
use crate::sentiment::Crowd;
use crate::types::{InstrumentSnapshot, RiskTag};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Lookback for the short-term change figure.
const SHORT_LOOKBACK: usize = 30;

/// Notional used for the single-holding what-if.
const SINGLE_HOLDING_NOTIONAL: f64 = 10_000.0;

/// Per-instrument figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentSummary {
    pub symbol: String,
    pub quantity: f64,
    pub last_price: f64,
    pub total_value: f64,
    pub sector: String,
    pub risk: RiskTag,
    pub score: i32,
    pub crowd: Crowd,
    /// Change versus 30 points ago, percent
    pub change_30: Option<f64>,
    /// Change versus the oldest point, percent
    pub change_period: Option<f64>,
    /// `quantity * (last_price - history[0])`
    pub period_gain: Option<f64>,
    /// Annualized ROI display text
    pub roi: String,
}

/// Value held in one sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorAllocation {
    pub sector: String,
    pub value: f64,
}

/// Counterfactual gains for one instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatIf {
    pub symbol: String,
    /// Period change applied to the position valued 30 points ago
    pub rebalanced_gain: Option<f64>,
    /// Period change applied to a fixed 10,000 notional
    pub single_holding_gain: Option<f64>,
    pub avoidance_note: String,
}

/// Value series for a holding versus a hypothetical entry at a chosen index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhatIfSeries {
    /// `price * quantity` at every point
    pub actual: Vec<f64>,
    /// `None` before the entry index
    pub what_if: Vec<Option<f64>>,
}

/// Portfolio health breakdown. Component caps: diversification 30, risk 30,
/// returns 25, ROI 20, income 15. The total is capped at 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    pub diversification: f64,
    pub risk: f64,
    pub returns: f64,
    pub roi: f64,
    /// Dividend yield and EPS contribution
    pub income: f64,
    pub total: f64,
}

/// Full scenario analysis for a snapshot set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub instruments: Vec<InstrumentSummary>,
    pub total_gain: f64,
    pub total_portfolio_value: f64,
    /// Index-wise portfolio value; missing points count as zero
    pub portfolio_trend: Vec<f64>,
    pub sector_allocations: Vec<SectorAllocation>,
    pub rebalance_advice: Vec<String>,
    pub what_ifs: Vec<WhatIf>,
    pub correlations: Vec<CorrelationPair>,
    pub rebalance: Vec<RebalanceSuggestion>,
    /// `None` for an empty snapshot set
    pub health: Option<HealthScore>,
}

impl ScenarioReport {
    /// Build the report from a snapshot set.
    ///
    /// Fails only where the underlying analytics reject their input, e.g.
    /// mismatched history lengths under the strict length policy.
    pub fn build(snapshots: &[InstrumentSnapshot], config: &AnalyticsConfig) -> Result<Self> {
        let instruments = snapshots
            .iter()
            .map(|s| InstrumentSummary {
                symbol: s.symbol.clone(),
                quantity: s.quantity,
                last_price: s.last_price,
                total_value: s.total_value(),
                sector: s.sector.clone(),
                risk: s.risk,
                score: s.score,
                crowd: Crowd::from_score(s.score),
                change_30: s.change_percent(SHORT_LOOKBACK),
                change_period: s.period_change_percent(),
                period_gain: s.period_gain(),
                roi: format_roi(s, config.days_held),
            })
            .collect();

        let total_gain = snapshots.iter().filter_map(|s| s.period_gain()).sum();
        let total_portfolio_value = snapshots.iter().map(|s| s.total_value()).sum();

        let sector_allocations = sector_totals(snapshots)
            .into_iter()
            .map(|(sector, value)| SectorAllocation { sector, value })
            .collect();

        let rebalance_advice = snapshots
            .iter()
            .filter(|s| s.risk == RiskTag::High)
            .map(|s| format!("{} is high-risk. Consider reducing exposure.", s.symbol))
            .collect();

        let report = Self {
            instruments,
            total_gain,
            total_portfolio_value,
            portfolio_trend: portfolio_trend(snapshots),
            sector_allocations,
            rebalance_advice,
            what_ifs: snapshots.iter().map(what_if).collect(),
            correlations: correlation_matrix(snapshots, config.length_policy)?,
            rebalance: auto_rebalance(snapshots, config.risk_tolerance)?,
            health: portfolio_health(snapshots, total_gain, config.days_held),
        };

        tracing::info!(
            instruments = report.instruments.len(),
            total_value = report.total_portfolio_value,
            "scenario report built"
        );
        Ok(report)
    }
}

/// Score portfolio health out of 100.
///
/// ROI that cannot be computed counts as zero. Fundamentals average only over
/// instruments that report a finite value.
pub fn portfolio_health(
    snapshots: &[InstrumentSnapshot],
    total_gain: f64,
    days_held: i64,
) -> Option<HealthScore> {
    if snapshots.is_empty() {
        return None;
    }

    let diversification = if sector_totals(snapshots).len() >= 4 { 30.0 } else { 10.0 };

    let risk = if snapshots.iter().all(|s| s.risk == RiskTag::Low) {
        30.0
    } else if snapshots.iter().all(|s| s.risk != RiskTag::High) {
        20.0
    } else {
        10.0
    };

    let returns = if total_gain > 0.0 { 25.0 } else { 10.0 };

    let roi_sum: f64 = snapshots
        .iter()
        .map(|s| match time_weighted_roi(s, days_held) {
            Ok(Outcome::Computed(pct)) => pct,
            _ => 0.0,
        })
        .sum();
    let roi = (roi_sum / snapshots.len() as f64).clamp(0.0, 20.0);

    // Yield is stored as a fraction and scored in percent
    let avg_yield = finite_mean(snapshots.iter().filter_map(|s| s.dividend_yield)) * 100.0;
    let avg_eps = finite_mean(snapshots.iter().filter_map(|s| s.eps));
    let income = (avg_yield / 5.0 * 10.0).clamp(0.0, 10.0) + (avg_eps / 5.0 * 10.0).clamp(0.0, 5.0);

    let total = (diversification + risk + returns + roi + income).min(100.0);
    Some(HealthScore {
        diversification,
        risk,
        returns,
        roi,
        income,
        total,
    })
}

fn finite_mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Sum of `history[i] * quantity` across snapshots for every index.
pub fn portfolio_trend(snapshots: &[InstrumentSnapshot]) -> Vec<f64> {
    let len = snapshots.iter().map(|s| s.history.len()).max().unwrap_or(0);
    (0..len)
        .map(|i| {
            snapshots
                .iter()
                .map(|s| s.history.get(i).copied().unwrap_or(0.0) * s.quantity)
                .sum()
        })
        .collect()
}

fn what_if(snapshot: &InstrumentSnapshot) -> WhatIf {
    let change = snapshot.period_change_percent();
    let history = &snapshot.history;

    let rebalanced_gain = match change {
        Some(pct) if history.len() >= SHORT_LOOKBACK => {
            let base = history[history.len() - SHORT_LOOKBACK];
            Some(pct / 100.0 * snapshot.quantity * base)
        }
        _ => None,
    };

    let avoidance_note = if snapshot.risk == RiskTag::High {
        "Avoiding would reduce portfolio volatility"
    } else {
        "Safe asset"
    };

    WhatIf {
        symbol: snapshot.symbol.clone(),
        rebalanced_gain,
        single_holding_gain: change.map(|pct| pct / 100.0 * SINGLE_HOLDING_NOTIONAL),
        avoidance_note: avoidance_note.to_string(),
    }
}

/// Compare the actual value series with a hypothetical entry at `entry_index`.
///
/// After the entry, the hypothetical position tracks the price relative to
/// the entry price; a zero entry price yields zeros.
pub fn simulate_what_if(snapshot: &InstrumentSnapshot, entry_index: usize) -> Result<WhatIfSeries> {
    let history = &snapshot.history;
    let Some(&initial) = history.get(entry_index) else {
        return Err(Error::IndexOutOfRange {
            index: entry_index,
            len: history.len(),
        });
    };

    let actual = history.iter().map(|p| p * snapshot.quantity).collect();
    let what_if = history
        .iter()
        .enumerate()
        .map(|(i, &price)| {
            if i < entry_index {
                None
            } else if initial != 0.0 {
                Some(initial * snapshot.quantity * (price / initial))
            } else {
                Some(0.0)
            }
        })
        .collect();

    Ok(WhatIfSeries { actual, what_if })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::LengthPolicy;
    use approx::assert_abs_diff_eq;

    fn portfolio() -> Vec<InstrumentSnapshot> {
        vec![
            InstrumentSnapshot::new("A", 10.0, vec![100.0, 110.0, 121.0], 121.0, "Tech"),
            InstrumentSnapshot::new("B", 5.0, vec![50.0, 50.0, 50.0], 50.0, "Energy"),
        ]
    }

    #[test]
    fn test_report_totals() {
        let report = ScenarioReport::build(&portfolio(), &AnalyticsConfig::default()).unwrap();

        assert_eq!(report.total_portfolio_value, 1210.0 + 250.0);
        assert_eq!(report.total_gain, 210.0);
        assert_eq!(report.portfolio_trend, vec![1250.0, 1350.0, 1460.0]);
        assert_eq!(
            report.sector_allocations,
            vec![
                SectorAllocation { sector: "Tech".to_string(), value: 1210.0 },
                SectorAllocation { sector: "Energy".to_string(), value: 250.0 },
            ]
        );
        assert_eq!(report.rebalance_advice, vec!["A is high-risk. Consider reducing exposure."]);
        assert_eq!(report.correlations.len(), 1);
        assert!(report.correlations[0].value.is_degenerate());
        assert_eq!(report.rebalance.len(), 2);
        assert_eq!(report.instruments[0].roi, "116.64");
    }

    #[test]
    fn test_report_strict_length_mismatch() {
        let mut snapshots = portfolio();
        snapshots[1].history.pop();

        let strict = ScenarioReport::build(&snapshots, &AnalyticsConfig::default());
        assert!(matches!(strict, Err(Error::Validation(_))));

        let config = AnalyticsConfig {
            length_policy: LengthPolicy::Truncate,
            ..Default::default()
        };
        assert!(ScenarioReport::build(&snapshots, &config).is_ok());
    }

    #[test]
    fn test_portfolio_trend_missing_points() {
        let snapshots = vec![
            InstrumentSnapshot::new("A", 2.0, vec![10.0, 11.0, 12.0], 12.0, "Tech"),
            InstrumentSnapshot::new("B", 1.0, vec![5.0], 5.0, "Tech"),
        ];
        assert_eq!(portfolio_trend(&snapshots), vec![25.0, 22.0, 24.0]);
        assert!(portfolio_trend(&[]).is_empty());
    }

    #[test]
    fn test_what_ifs() {
        let report = ScenarioReport::build(&portfolio(), &AnalyticsConfig::default()).unwrap();
        let a = &report.what_ifs[0];
        // Fewer than 30 points
        assert_eq!(a.rebalanced_gain, None);
        assert_abs_diff_eq!(a.single_holding_gain.unwrap(), 2100.0, epsilon = 1e-9);
        assert_eq!(a.avoidance_note, "Avoiding would reduce portfolio volatility");
        assert_eq!(report.what_ifs[1].avoidance_note, "Safe asset");
    }

    #[test]
    fn test_rebalanced_gain_with_long_history() {
        let history: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let snap = InstrumentSnapshot::new("L", 2.0, history, 139.0, "Tech");
        let w = what_if(&snap);
        // change 39%, base = history[10] = 110
        assert_abs_diff_eq!(w.rebalanced_gain.unwrap(), 0.39 * 2.0 * 110.0, epsilon = 1e-9);
    }

    #[test]
    fn test_simulate_what_if() {
        let snap = InstrumentSnapshot::new("A", 10.0, vec![100.0, 110.0, 121.0], 121.0, "Tech");
        let series = simulate_what_if(&snap, 1).unwrap();

        assert_eq!(series.actual, vec![1000.0, 1100.0, 1210.0]);
        assert_eq!(series.what_if[0], None);
        assert_abs_diff_eq!(series.what_if[1].unwrap(), 1100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(series.what_if[2].unwrap(), 1210.0, epsilon = 1e-9);
    }

    #[test]
    fn test_simulate_what_if_zero_entry_price() {
        let snap = InstrumentSnapshot::new("Z", 1.0, vec![0.0, 5.0], 5.0, "Tech");
        let series = simulate_what_if(&snap, 0).unwrap();
        assert_eq!(series.what_if, vec![Some(0.0), Some(0.0)]);
    }

    #[test]
    fn test_simulate_what_if_out_of_range() {
        let snap = InstrumentSnapshot::new("A", 1.0, vec![1.0], 1.0, "Tech");
        assert!(matches!(
            simulate_what_if(&snap, 3),
            Err(Error::IndexOutOfRange { index: 3, len: 1 })
        ));
    }

    #[test]
    fn test_report_health_and_crowd() {
        let mut snapshots = portfolio();
        snapshots[0].score = 3;
        let report = ScenarioReport::build(&snapshots, &AnalyticsConfig::default()).unwrap();

        assert_eq!(report.instruments[0].crowd, Crowd::Hype);
        assert_eq!(report.instruments[1].crowd, Crowd::Neutral);

        // Two sectors, one high-risk holding, a gain, mean ROI above the cap
        let health = report.health.unwrap();
        assert_eq!(health.diversification, 10.0);
        assert_eq!(health.risk, 10.0);
        assert_eq!(health.returns, 25.0);
        assert_eq!(health.roi, 20.0);
        assert_eq!(health.income, 0.0);
        assert_eq!(health.total, 65.0);
    }

    #[test]
    fn test_health_fundamentals() {
        let snapshots = vec![
            InstrumentSnapshot::new("A", 1.0, vec![50.0, 50.0], 50.0, "Tech")
                .with_fundamentals(Some(0.02), None),
            InstrumentSnapshot::new("B", 1.0, vec![50.0, 50.0], 50.0, "Energy")
                .with_fundamentals(Some(0.03), Some(10.0)),
            InstrumentSnapshot::new("C", 1.0, vec![50.0, 50.0], 50.0, "Utilities")
                .with_fundamentals(Some(f64::NAN), None),
            InstrumentSnapshot::new("D", 1.0, vec![50.0, 50.0], 50.0, "Health"),
        ];

        let health = portfolio_health(&snapshots, 0.0, 90).unwrap();
        assert_eq!(health.diversification, 30.0);
        assert_eq!(health.risk, 30.0);
        assert_eq!(health.returns, 10.0);
        assert_eq!(health.roi, 0.0);
        // 2.5% average yield scores 5, EPS 10 hits its cap of 5
        assert_abs_diff_eq!(health.income, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(health.total, 80.0, epsilon = 1e-9);
    }

    #[test]
    fn test_health_total_capped() {
        let snapshots: Vec<InstrumentSnapshot> = ["Tech", "Energy", "Utilities", "Health"]
            .iter()
            .map(|sector| {
                InstrumentSnapshot::new(sector, 1.0, vec![100.0, 110.0], 110.0, sector)
                    .with_risk(RiskTag::Low)
                    .with_fundamentals(Some(0.05), Some(5.0))
            })
            .collect();

        let health = portfolio_health(&snapshots, 40.0, 90).unwrap();
        assert_eq!(health.roi, 20.0);
        assert_abs_diff_eq!(health.income, 15.0, epsilon = 1e-9);
        assert_eq!(health.total, 100.0);
    }

    #[test]
    fn test_health_empty_portfolio() {
        assert_eq!(portfolio_health(&[], 0.0, 90), None);
        let report = ScenarioReport::build(&[], &AnalyticsConfig::default()).unwrap();
        assert!(report.health.is_none());
    }
}
