//! Kelly Criterion reference sizing for R-multiple trades.
//!
//! Produces the growth-optimal fraction for a win probability and payout
//! multiple, and a disciplined half-Kelly reference capped at a hard ceiling.
//! The values are an approximation shown as guidance, not a guarantee.

use serde::{Deserialize, Serialize};

/// Hard ceiling for the disciplined risk reference (2% of equity).
pub const DISCIPLINED_RISK_CAP: f64 = 0.02;

/// Multiplier applied to full Kelly for the disciplined reference.
pub const DISCIPLINED_KELLY_MULTIPLIER: f64 = 0.5;

/// Kelly reference for a trade with payout multiple `b` and win probability `p`.
///
/// ```text
/// f* = (b*p - q) / b    where q = 1 - p
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KellyReference {
    /// Full Kelly fraction, clamped to [0, 1].
    pub kelly_fraction: f64,
    /// Half-Kelly clamped to [0, `DISCIPLINED_RISK_CAP`].
    pub disciplined_risk_fraction: f64,
    /// Expected profit per trade in units of risk (`b*p - q`).
    pub expected_r_per_trade: f64,
    pub edge: EdgeStatus,
}

/// Classification of the edge behind a Kelly reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeStatus {
    /// Positive expectancy; Kelly fraction above zero.
    Positive,
    /// Break-even expectancy.
    None,
    /// Negative expectancy; Kelly clamped to zero.
    Negative,
    /// Probability outside [0, 1], non-positive payout, or non-finite input.
    InvalidInputs,
}

impl KellyReference {
    /// Computes the Kelly reference.
    ///
    /// # Examples
    /// ```
    /// use survival_core::kelly::KellyReference;
    ///
    /// let reference = KellyReference::compute(0.5, 1.2);
    /// // (1.2 * 0.5 - 0.5) / 1.2 = 0.0833...
    /// assert!((reference.kelly_fraction - 0.1 / 1.2).abs() < 1e-12);
    /// assert!((reference.disciplined_risk_fraction - 0.02).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn compute(win_probability: f64, payout_multiple: f64) -> Self {
        if !win_probability.is_finite()
            || !payout_multiple.is_finite()
            || !(0.0..=1.0).contains(&win_probability)
            || payout_multiple <= 0.0
        {
            return Self {
                kelly_fraction: 0.0,
                disciplined_risk_fraction: 0.0,
                expected_r_per_trade: 0.0,
                edge: EdgeStatus::InvalidInputs,
            };
        }

        let kelly_fraction = kelly_fraction(win_probability, payout_multiple);
        let expected_r_per_trade = expected_r(win_probability, payout_multiple);

        let edge = if expected_r_per_trade > 0.0 {
            EdgeStatus::Positive
        } else if expected_r_per_trade < 0.0 {
            EdgeStatus::Negative
        } else {
            EdgeStatus::None
        };

        Self {
            kelly_fraction,
            disciplined_risk_fraction: disciplined_risk_fraction(kelly_fraction),
            expected_r_per_trade,
            edge,
        }
    }

    /// Returns true when `risk_per_trade` exceeds the disciplined reference.
    #[must_use]
    pub fn is_oversized(&self, risk_per_trade: f64) -> bool {
        risk_per_trade > self.disciplined_risk_fraction
    }
}

/// Full Kelly fraction clamped to [0, 1]. Invalid inputs give 0.
#[must_use]
pub fn kelly_fraction(win_probability: f64, payout_multiple: f64) -> f64 {
    if payout_multiple <= 0.0 || !payout_multiple.is_finite() || !win_probability.is_finite() {
        return 0.0;
    }
    let q = 1.0 - win_probability;
    ((payout_multiple * win_probability - q) / payout_multiple).clamp(0.0, 1.0)
}

/// Half of `kelly`, clamped to [0, `DISCIPLINED_RISK_CAP`].
#[must_use]
pub fn disciplined_risk_fraction(kelly: f64) -> f64 {
    if !kelly.is_finite() {
        return 0.0;
    }
    (DISCIPLINED_KELLY_MULTIPLIER * kelly).clamp(0.0, DISCIPLINED_RISK_CAP)
}

/// Expected profit per trade in R: `b*p - (1 - p)`.
#[must_use]
pub fn expected_r(win_probability: f64, payout_multiple: f64) -> f64 {
    payout_multiple * win_probability - (1.0 - win_probability)
}
