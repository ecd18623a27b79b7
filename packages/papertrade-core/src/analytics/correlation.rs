//! Pairwise Pearson correlation across a snapshot set.

use super::outcome::{Degeneracy, Outcome};
use crate::types::InstrumentSnapshot;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// How to treat two histories of different length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthPolicy {
    /// Reject the snapshot set with a validation error
    #[default]
    Strict,
    /// Correlate only the trailing `min(len_a, len_b)` points
    Truncate,
}

/// Correlation between two symbols.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub source: String,
    pub target: String,
    pub value: Outcome<f64>,
}

/// Pearson correlation coefficient of two series.
///
/// Uses the trailing `min(a.len(), b.len())` points of each series, so the
/// most recent prices line up. Fewer than two points or a flat series is
/// degenerate.
///
/// # Example
///
/// ```rust
/// use papertrade_core::analytics::{pearson, Outcome};
///
/// let a = [1.0, 2.0, 3.0, 4.0];
/// let b = [2.0, 4.0, 6.0, 8.0];
/// let corr = pearson(&a, &b).into_option().unwrap();
/// assert!((corr - 1.0).abs() < 1e-12);
/// ```
pub fn pearson(a: &[f64], b: &[f64]) -> Outcome<f64> {
    let n = a.len().min(b.len());
    if n < 2 {
        return Outcome::Degenerate(Degeneracy::InsufficientData);
    }

    let a = &a[a.len() - n..];
    let b = &b[b.len() - n..];

    let mean_a = a.iter().sum::<f64>() / n as f64;
    let mean_b = b.iter().sum::<f64>() / n as f64;

    let mut numerator = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        numerator += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return Outcome::Degenerate(Degeneracy::ZeroVariance);
    }

    Outcome::finite(numerator / (var_a * var_b).sqrt()).map(|c| c.clamp(-1.0, 1.0))
}

/// Correlate every unordered pair of snapshots.
///
/// Pairs are emitted in input order: `(0,1), (0,2), ..., (1,2), ...`.
///
/// # Errors
///
/// With [`LengthPolicy::Strict`], any pair whose histories differ in length
/// is a [`Error::Validation`].
pub fn correlation_matrix(
    snapshots: &[InstrumentSnapshot],
    policy: LengthPolicy,
) -> Result<Vec<CorrelationPair>> {
    let mut pairs = Vec::with_capacity(snapshots.len() * snapshots.len().saturating_sub(1) / 2);

    for (i, a) in snapshots.iter().enumerate() {
        for b in &snapshots[i + 1..] {
            if policy == LengthPolicy::Strict && a.history.len() != b.history.len() {
                return Err(Error::Validation(format!(
                    "history length mismatch: {} has {} points, {} has {}",
                    a.symbol,
                    a.history.len(),
                    b.symbol,
                    b.history.len()
                )));
            }

            let value = pearson(&a.history, &b.history);
            if let Outcome::Degenerate(reason) = &value {
                tracing::warn!(left = %a.symbol, right = %b.symbol, %reason, "correlation degenerate");
            }

            pairs.push(CorrelationPair {
                source: a.symbol.clone(),
                target: b.symbol.clone(),
                value,
            });
        }
    }

    tracing::debug!(pairs = pairs.len(), "correlation matrix built");
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn snap(symbol: &str, history: Vec<f64>) -> InstrumentSnapshot {
        let last = history.last().copied().unwrap_or(0.0);
        InstrumentSnapshot::new(symbol, 1.0, history, last, "Tech")
    }

    #[test]
    fn test_pearson_perfect() {
        let up = [1.0, 2.0, 3.0, 4.0];
        let down = [4.0, 3.0, 2.0, 1.0];
        assert_abs_diff_eq!(pearson(&up, &up).into_option().unwrap(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pearson(&up, &down).into_option().unwrap(), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pearson_symmetric_and_bounded() {
        let a = [10.0, 12.0, 11.0, 15.0, 14.0, 13.0];
        let b = [5.0, 4.0, 6.0, 7.0, 5.5, 8.0];

        let ab = pearson(&a, &b).into_option().unwrap();
        let ba = pearson(&b, &a).into_option().unwrap();

        assert_abs_diff_eq!(ab, ba, epsilon = 1e-12);
        assert!((-1.0..=1.0).contains(&ab));
    }

    #[test]
    fn test_pearson_flat_series() {
        let flat = [50.0, 50.0, 50.0];
        let moving = [100.0, 110.0, 121.0];
        assert_eq!(
            pearson(&moving, &flat),
            Outcome::Degenerate(Degeneracy::ZeroVariance)
        );
    }

    #[test]
    fn test_pearson_too_short() {
        assert_eq!(
            pearson(&[1.0], &[2.0]),
            Outcome::Degenerate(Degeneracy::InsufficientData)
        );
        assert_eq!(
            pearson(&[], &[]),
            Outcome::Degenerate(Degeneracy::InsufficientData)
        );
    }

    #[test]
    fn test_pearson_uses_trailing_points() {
        // Leading 99.0 is dropped, leaving identical series
        let long = [99.0, 1.0, 2.0, 3.0];
        let short = [1.0, 2.0, 3.0];
        assert_abs_diff_eq!(
            pearson(&long, &short).into_option().unwrap(),
            1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_matrix_pair_order() {
        let snapshots = vec![
            snap("a", vec![1.0, 2.0, 3.0]),
            snap("b", vec![3.0, 2.0, 1.0]),
            snap("c", vec![1.0, 3.0, 2.0]),
        ];

        let pairs = correlation_matrix(&snapshots, LengthPolicy::Strict).unwrap();
        let order: Vec<(&str, &str)> = pairs
            .iter()
            .map(|p| (p.source.as_str(), p.target.as_str()))
            .collect();
        assert_eq!(order, vec![("A", "B"), ("A", "C"), ("B", "C")]);
        assert_abs_diff_eq!(*pairs[0].value.value().unwrap(), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_matrix_strict_rejects_mismatch() {
        let snapshots = vec![snap("a", vec![1.0, 2.0, 3.0]), snap("b", vec![1.0, 2.0])];
        let result = correlation_matrix(&snapshots, LengthPolicy::Strict);
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_matrix_truncate_accepts_mismatch() {
        let snapshots = vec![snap("a", vec![7.0, 1.0, 2.0, 3.0]), snap("b", vec![2.0, 4.0, 6.0])];
        let pairs = correlation_matrix(&snapshots, LengthPolicy::Truncate).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_abs_diff_eq!(*pairs[0].value.value().unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_matrix_small_sets() {
        assert!(correlation_matrix(&[], LengthPolicy::Strict).unwrap().is_empty());
        let single = vec![snap("a", vec![1.0, 2.0])];
        assert!(correlation_matrix(&single, LengthPolicy::Strict).unwrap().is_empty());
    }

    #[test]
    fn test_matrix_degenerate_pair_does_not_fail() {
        let snapshots = vec![
            snap("a", vec![100.0, 110.0, 121.0]),
            snap("b", vec![50.0, 50.0, 50.0]),
        ];
        let pairs = correlation_matrix(&snapshots, LengthPolicy::Strict).unwrap();
        assert!(pairs[0].value.is_degenerate());
    }
}
