//! Single-leg option payoff at expiry.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shares controlled by one standard equity option contract.
pub const CONTRACT_MULTIPLIER: f64 = 100.0;

/// Largest payoff curve `profit_curve` will build.
pub const MAX_CURVE_POINTS: usize = 100_000;

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Call,
    Put,
}

/// Long (buy) or short (sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionSide {
    Buy,
    Sell,
}

/// Upper bound on a gain or loss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "amount", rename_all = "lowercase")]
pub enum Bound {
    Limited(f64),
    Unlimited,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Limited(amount) => write!(f, "${:.2}", amount),
            Bound::Unlimited => f.write_str("Unlimited"),
        }
    }
}

/// A point on a payoff curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayoffPoint {
    pub price: f64,
    pub profit: f64,
}

/// One option position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionPosition {
    pub kind: OptionKind,
    pub side: OptionSide,
    pub strike: f64,
    /// Premium per share
    pub premium: f64,
    pub contracts: u32,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_multiplier() -> f64 {
    CONTRACT_MULTIPLIER
}

impl OptionPosition {
    /// Create a position with the standard contract multiplier.
    ///
    /// Strike, premium and contracts must all be positive and finite.
    pub fn new(
        kind: OptionKind,
        side: OptionSide,
        strike: f64,
        premium: f64,
        contracts: u32,
    ) -> Result<Self> {
        if !is_positive(strike) || !is_positive(premium) || contracts == 0 {
            return Err(Error::Validation(format!(
                "strike, premium and contracts must be positive (got {}, {}, {})",
                strike, premium, contracts
            )));
        }

        Ok(Self {
            kind,
            side,
            strike,
            premium,
            contracts,
            multiplier: CONTRACT_MULTIPLIER,
        })
    }

    /// Use a non-standard contract multiplier.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Number of underlying shares.
    pub fn quantity(&self) -> f64 {
        self.contracts as f64 * self.multiplier
    }

    /// Premium paid (long) or received (short) in total.
    pub fn premium_total(&self) -> f64 {
        self.premium * self.quantity()
    }

    /// Profit at expiry for an underlying price.
    pub fn profit_at(&self, price: f64) -> f64 {
        let intrinsic = match self.kind {
            OptionKind::Call => (price - self.strike).max(0.0),
            OptionKind::Put => (self.strike - price).max(0.0),
        };
        let long = intrinsic * self.quantity() - self.premium_total();

        match self.side {
            OptionSide::Buy => long,
            OptionSide::Sell => -long,
        }
    }

    /// Underlying price at which the position breaks even.
    pub fn breakeven(&self) -> f64 {
        match self.kind {
            OptionKind::Call => self.strike + self.premium,
            OptionKind::Put => self.strike - self.premium,
        }
    }

    /// Theoretical maximum gain.
    pub fn max_gain(&self) -> Bound {
        match (self.side, self.kind) {
            (OptionSide::Buy, OptionKind::Call) => Bound::Unlimited,
            (OptionSide::Buy, OptionKind::Put) => {
                Bound::Limited(self.strike * self.quantity() - self.premium_total())
            }
            (OptionSide::Sell, _) => Bound::Limited(self.premium_total()),
        }
    }

    /// Theoretical maximum loss.
    pub fn max_loss(&self) -> Bound {
        match (self.side, self.kind) {
            (OptionSide::Buy, _) => Bound::Limited(self.premium_total()),
            (OptionSide::Sell, OptionKind::Call) => Bound::Unlimited,
            (OptionSide::Sell, OptionKind::Put) => {
                Bound::Limited(self.strike * self.quantity() - self.premium_total())
            }
        }
    }

    /// Payoff from `max(0, strike - zoom)` to `strike + zoom` in `step` increments.
    pub fn profit_curve(&self, zoom: f64, step: f64) -> Result<Vec<PayoffPoint>> {
        if !is_positive(step) || !zoom.is_finite() || zoom < 0.0 {
            return Err(Error::Validation(format!(
                "step must be positive and zoom non-negative, both finite (got {}, {})",
                step, zoom
            )));
        }

        let min = (self.strike - zoom).max(0.0);
        let max = self.strike + zoom;
        let intervals = ((max - min) / step).floor();
        if !intervals.is_finite() || intervals >= MAX_CURVE_POINTS as f64 {
            return Err(Error::Validation(format!(
                "payoff curve would exceed {} points (zoom {}, step {})",
                MAX_CURVE_POINTS, zoom, step
            )));
        }
        let points = intervals as usize + 1;

        Ok((0..points)
            .map(|i| {
                let price = min + i as f64 * step;
                PayoffPoint {
                    price,
                    profit: self.profit_at(price),
                }
            })
            .collect())
    }
}
