//! Time-weighted ROI: a holding's return annualized over an assumed holding period.

use super::outcome::{Degeneracy, Outcome};
use crate::types::InstrumentSnapshot;
use crate::{Error, Result};

/// Holding period assumed when none is given.
pub const DEFAULT_DAYS_HELD: i64 = 90;

const DAYS_PER_YEAR: usize = 365;

/// Calculate holding period return.
pub fn holding_period_return(initial_value: f64, final_value: f64) -> f64 {
    if initial_value <= 0.0 {
        return 0.0;
    }
    ((final_value - initial_value) / initial_value) * 100.0
}

/// Annualize a return given the number of periods and periods per year.
pub fn annualize_return(return_pct: f64, periods: usize, periods_per_year: usize) -> f64 {
    if periods == 0 {
        return 0.0;
    }

    let years = periods as f64 / periods_per_year as f64;
    let total_return = 1.0 + (return_pct / 100.0);

    (total_return.powf(1.0 / years) - 1.0) * 100.0
}

/// Annualized percentage return of a holding from `history[0]` to `last_price`.
///
/// Computes `((end / start) ^ (365 / days_held) - 1) * 100` where
/// `start = history[0] * quantity` and `end = last_price * quantity`.
///
/// # Errors
///
/// An empty history or `days_held <= 0` is a [`Error::Validation`]. A
/// non-positive starting value is [`Degeneracy::ZeroStartValue`].
pub fn time_weighted_roi(snapshot: &InstrumentSnapshot, days_held: i64) -> Result<Outcome<f64>> {
    if days_held <= 0 {
        return Err(Error::Validation(format!(
            "days held must be positive, got {}",
            days_held
        )));
    }
    let Some(&start_price) = snapshot.history.first() else {
        return Err(Error::Validation(format!(
            "{} has an empty price history",
            snapshot.symbol
        )));
    };

    let start_value = start_price * snapshot.quantity;
    let end_value = snapshot.last_price * snapshot.quantity;
    if !(start_value.is_finite() && start_value > 0.0) {
        tracing::warn!(symbol = %snapshot.symbol, start_value, "ROI undefined for starting value");
        return Ok(Outcome::Degenerate(Degeneracy::ZeroStartValue));
    }

    let period_return = holding_period_return(start_value, end_value);
    let annualized = annualize_return(period_return, days_held as usize, DAYS_PER_YEAR);

    Ok(Outcome::finite(annualized))
}

/// ROI as display text with two decimals.
///
/// Invalid input renders as `"0.00"` and a degenerate result as `"N/A"`.
pub fn format_roi(snapshot: &InstrumentSnapshot, days_held: i64) -> String {
    match time_weighted_roi(snapshot, days_held) {
        Ok(Outcome::Computed(pct)) => format!("{:.2}", pct),
        Ok(Outcome::Degenerate(_)) => "N/A".to_string(),
        Err(e) => {
            tracing::debug!(symbol = %snapshot.symbol, error = %e, "ROI not computed");
            "0.00".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn snapshot(history: Vec<f64>, last_price: f64, quantity: f64) -> InstrumentSnapshot {
        InstrumentSnapshot::new("A", quantity, history, last_price, "Tech")
    }

    #[test]
    fn test_holding_period_return() {
        let hpr = holding_period_return(10000.0, 11500.0);
        assert!((hpr - 15.0).abs() < 0.01);
        assert_eq!(holding_period_return(0.0, 100.0), 0.0);
    }

    #[test]
    fn test_annualize_return() {
        // 10% return over half a year
        let annualized = annualize_return(10.0, 6, 12);

        // (1.10)^2 - 1 = 21%
        assert!((annualized - 21.0).abs() < 0.5);
        assert_eq!(annualize_return(10.0, 0, 12), 0.0);
    }

    #[test]
    fn test_roi_ninety_days() {
        let snap = snapshot(vec![100.0, 110.0, 121.0], 121.0, 10.0);
        let roi = time_weighted_roi(&snap, 90).unwrap().into_option().unwrap();

        let expected = (1.21_f64.powf(365.0 / 90.0) - 1.0) * 100.0;
        assert_relative_eq!(roi, expected, epsilon = 1e-9);
        assert_eq!(format_roi(&snap, 90), "116.64");
    }

    #[test]
    fn test_roi_full_year_is_plain_return() {
        let snap = snapshot(vec![50.0, 55.0], 55.0, 4.0);
        let roi = time_weighted_roi(&snap, 365).unwrap().into_option().unwrap();
        assert_relative_eq!(roi, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_roi_guards() {
        let snap = snapshot(vec![100.0, 121.0], 121.0, 10.0);
        assert!(matches!(time_weighted_roi(&snap, 0), Err(Error::Validation(_))));
        assert!(matches!(time_weighted_roi(&snap, -5), Err(Error::Validation(_))));
        assert_eq!(format_roi(&snap, 0), "0.00");
        assert_eq!(format_roi(&snap, -5), "0.00");

        let empty = snapshot(vec![], 121.0, 10.0);
        assert!(matches!(time_weighted_roi(&empty, 90), Err(Error::Validation(_))));
        assert_eq!(format_roi(&empty, 90), "0.00");
    }

    #[test]
    fn test_roi_zero_start_is_degenerate() {
        let zero_price = snapshot(vec![0.0, 10.0], 10.0, 5.0);
        assert_eq!(
            time_weighted_roi(&zero_price, 90).unwrap(),
            Outcome::Degenerate(Degeneracy::ZeroStartValue)
        );
        assert_eq!(format_roi(&zero_price, 90), "N/A");

        let zero_quantity = snapshot(vec![10.0, 12.0], 12.0, 0.0);
        assert!(time_weighted_roi(&zero_quantity, 90).unwrap().is_degenerate());
    }

    #[test]
    fn test_roi_total_loss() {
        let snap = snapshot(vec![10.0, 5.0], 0.0, 1.0);
        let roi = time_weighted_roi(&snap, 30).unwrap().into_option().unwrap();
        assert_relative_eq!(roi, -100.0, epsilon = 1e-9);
    }
}
