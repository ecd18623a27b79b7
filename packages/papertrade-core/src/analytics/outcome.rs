//! Tagged result for computations that can degenerate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a computation has no meaningful value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Degeneracy {
    /// A series is flat, so correlation is undefined
    ZeroVariance,
    /// Fewer points than the computation needs
    InsufficientData,
    /// A price used as a divisor is zero or negative
    NonPositivePrice,
    /// The starting value of a holding is zero or negative
    ZeroStartValue,
    /// The arithmetic overflowed or produced NaN
    NonFinite,
}

impl fmt::Display for Degeneracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Degeneracy::ZeroVariance => "zero variance",
            Degeneracy::InsufficientData => "insufficient data",
            Degeneracy::NonPositivePrice => "non-positive price",
            Degeneracy::ZeroStartValue => "zero starting value",
            Degeneracy::NonFinite => "non-finite result",
        };
        f.write_str(reason)
    }
}

/// A computed value, or the reason there is none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Outcome<T> {
    Computed(T),
    Degenerate(Degeneracy),
}

impl<T> Outcome<T> {
    pub fn is_computed(&self) -> bool {
        matches!(self, Outcome::Computed(_))
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, Outcome::Degenerate(_))
    }

    /// Borrow the computed value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Computed(v) => Some(v),
            Outcome::Degenerate(_) => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Outcome::Computed(v) => Some(v),
            Outcome::Degenerate(_) => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Computed(v) => Outcome::Computed(f(v)),
            Outcome::Degenerate(reason) => Outcome::Degenerate(reason),
        }
    }
}

impl Outcome<f64> {
    /// Wrap a float, flagging NaN and infinities as degenerate.
    pub fn finite(value: f64) -> Self {
        if value.is_finite() {
            Outcome::Computed(value)
        } else {
            Outcome::Degenerate(Degeneracy::NonFinite)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite() {
        assert_eq!(Outcome::finite(1.5), Outcome::Computed(1.5));
        assert_eq!(
            Outcome::finite(f64::NAN),
            Outcome::Degenerate(Degeneracy::NonFinite)
        );
        assert!(Outcome::finite(f64::INFINITY).is_degenerate());
    }

    #[test]
    fn test_map_and_value() {
        let computed = Outcome::Computed(2.0).map(|v| v * 3.0);
        assert_eq!(computed.value(), Some(&6.0));

        let degenerate: Outcome<f64> = Outcome::Degenerate(Degeneracy::ZeroVariance);
        assert_eq!(degenerate.clone().map(|v| v * 3.0).into_option(), None);
        assert!(!degenerate.is_computed());
    }

    #[test]
    fn test_serialization() {
        let computed = serde_json::to_value(Outcome::Computed(0.5)).unwrap();
        assert_eq!(computed["status"], "computed");
        assert_eq!(computed["value"], 0.5);

        let degenerate =
            serde_json::to_value(Outcome::<f64>::Degenerate(Degeneracy::ZeroVariance)).unwrap();
        assert_eq!(degenerate["status"], "degenerate");
        assert_eq!(degenerate["value"], "zero_variance");
    }
}
