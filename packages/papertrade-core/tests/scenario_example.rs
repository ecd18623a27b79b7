//! End-to-end scenario analytics over a two-instrument portfolio.

use approx::assert_relative_eq;
use papertrade_core::analytics::{format_roi, Degeneracy};
use papertrade_core::types::SnapshotRecord;
use papertrade_core::{
    auto_rebalance, correlation_matrix, smart_entry, time_weighted_roi, AnalyticsConfig,
    InstrumentSnapshot, LengthPolicy, Outcome, RiskTag, ScenarioReport,
};

const SNAPSHOTS: &str = r#"[
    {"symbol": "A", "quantity": 10, "history": [100, 110, 121], "last_price": 121, "sector": "Tech"},
    {"symbol": "B", "quantity": 5, "history": [50, 50, 50], "last_price": 50, "sector": "Energy"}
]"#;

fn portfolio() -> Vec<InstrumentSnapshot> {
    let records: Vec<SnapshotRecord> = serde_json::from_str(SNAPSHOTS).unwrap();
    let config = AnalyticsConfig::default();
    records.into_iter().map(|r| r.into_snapshot(&config)).collect()
}

#[test]
fn test_records_derive_risk() {
    let snapshots = portfolio();
    assert_eq!(snapshots[0].risk, RiskTag::High);
    assert_eq!(snapshots[1].risk, RiskTag::Low);
    assert_eq!(snapshots[0].score, 0);
}

#[test]
fn test_zero_variance_pair_is_degenerate() {
    let pairs = correlation_matrix(&portfolio(), LengthPolicy::Strict).unwrap();

    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].source, "A");
    assert_eq!(pairs[0].target, "B");
    assert_eq!(pairs[0].value, Outcome::Degenerate(Degeneracy::ZeroVariance));
}

#[test]
fn test_smart_entry_at_best_index() {
    let snapshots = portfolio();
    let entry = smart_entry(&snapshots[0].history, 0)
        .unwrap()
        .into_option()
        .unwrap();

    assert_eq!(entry.best_index, 0);
    assert_eq!(entry.delta, 0.0);
    assert_relative_eq!(entry.best_gain, 21.0, epsilon = 1e-9);
}

#[test]
fn test_ninety_day_roi() {
    let snapshots = portfolio();
    let roi = time_weighted_roi(&snapshots[0], 90)
        .unwrap()
        .into_option()
        .unwrap();

    assert_relative_eq!(roi, (1.21_f64.powf(365.0 / 90.0) - 1.0) * 100.0, epsilon = 1e-9);
    assert_eq!(format_roi(&snapshots[0], 90), "116.64");
    assert_eq!(format_roi(&snapshots[1], 90), "0.00");
}

#[test]
fn test_rebalance_moves_toward_equal_sectors() {
    let suggestions = auto_rebalance(&portfolio(), 0.5).unwrap();

    // Tech 1210 vs ideal 730 is trimmed, Energy 250 is topped up
    assert!(suggestions[0].adjustment < 0.0);
    assert!(suggestions[1].adjustment > 0.0);
}

#[test]
fn test_report_serializes_outcomes() {
    let report = ScenarioReport::build(&portfolio(), &AnalyticsConfig::default()).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["correlations"][0]["value"]["status"], "degenerate");
    assert_eq!(json["correlations"][0]["value"]["value"], "zero_variance");
    assert_eq!(json["instruments"][0]["roi"], "116.64");
}
