//! Simulated horizon derived from volatility and sizing.
//!
//! Higher volatility gets a shorter base horizon. Risk above the reference
//! compresses it and risk below extends it, within clamped bounds:
//!
//! ```text
//! horizon = round(base * clamp((reference_risk / risk) ^ exponent, min_adj, max_adj))
//! ```

use crate::config::HorizonConfig;
use crate::params::Volatility;

#[derive(Debug, Clone, Default)]
pub struct HorizonCalculator {
    config: HorizonConfig,
}

impl HorizonCalculator {
    #[must_use]
    pub fn new(config: HorizonConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &HorizonConfig {
        &self.config
    }

    /// Base trade count for a volatility class.
    #[must_use]
    pub fn base(&self, volatility: Volatility) -> usize {
        match volatility {
            Volatility::Low => self.config.base_low,
            Volatility::Med => self.config.base_med,
            Volatility::High => self.config.base_high,
            Volatility::Extreme => self.config.base_extreme,
        }
    }

    /// Clamped adjustment factor for `risk_per_trade`.
    ///
    /// Non-positive or non-finite risk takes the upper bound.
    #[must_use]
    pub fn adjustment(&self, risk_per_trade: f64) -> f64 {
        let (lo, hi) = (self.config.min_adjustment, self.config.max_adjustment);
        if !risk_per_trade.is_finite() || risk_per_trade <= 0.0 {
            return hi;
        }
        let raw = (self.config.reference_risk / risk_per_trade).powf(self.config.exponent);
        if raw.is_nan() {
            return hi;
        }
        raw.clamp(lo, hi)
    }

    /// Number of trade events to simulate. Always at least one.
    #[must_use]
    pub fn trade_events(&self, volatility: Volatility, risk_per_trade: f64) -> usize {
        let base = self.base(volatility) as f64;
        let horizon = (base * self.adjustment(risk_per_trade)).round();
        (horizon as usize).max(1)
    }

    /// Smallest and largest horizon reachable for a volatility class.
    #[must_use]
    pub fn bounds(&self, volatility: Volatility) -> (usize, usize) {
        let base = self.base(volatility) as f64;
        (
            ((base * self.config.min_adjustment).round() as usize).max(1),
            ((base * self.config.max_adjustment).round() as usize).max(1),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculator() -> HorizonCalculator {
        HorizonCalculator::default()
    }

    #[test]
    fn reference_risk_returns_base() {
        let calc = calculator();
        for volatility in Volatility::ALL {
            assert_eq!(calc.trade_events(volatility, 0.01), calc.base(volatility));
        }
    }

    #[test]
    fn higher_volatility_has_shorter_base() {
        let calc = calculator();
        assert!(calc.base(Volatility::Low) > calc.base(Volatility::Med));
        assert!(calc.base(Volatility::Med) > calc.base(Volatility::High));
        assert!(calc.base(Volatility::High) > calc.base(Volatility::Extreme));
    }

    #[test]
    fn larger_risk_compresses_horizon() {
        let calc = calculator();
        // (0.01 / 0.02)^0.5 = 0.7071 -> round(180 * 0.7071) = 127
        assert_eq!(calc.trade_events(Volatility::Med, 0.02), 127);
    }

    #[test]
    fn adjustment_is_clamped() {
        let calc = calculator();
        // tiny risk -> large factor, clamped to 1.5
        assert!((calc.adjustment(0.0001) - 1.5).abs() < f64::EPSILON);
        // huge risk -> small factor, clamped to 0.55
        assert!((calc.adjustment(0.5) - 0.55).abs() < f64::EPSILON);
        assert!((calc.adjustment(0.0) - 1.5).abs() < f64::EPSILON);
        assert!((calc.adjustment(f64::NAN) - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn horizon_non_increasing_in_risk_and_bounded() {
        let calc = calculator();
        for volatility in Volatility::ALL {
            let (lo, hi) = calc.bounds(volatility);
            let mut previous = usize::MAX;
            for step in 1..=400 {
                let risk = f64::from(step) * 0.00025;
                let horizon = calc.trade_events(volatility, risk);
                assert!(horizon <= previous, "{volatility} risk={risk}");
                assert!((lo..=hi).contains(&horizon), "{volatility} risk={risk}");
                previous = horizon;
            }
        }
    }

    #[test]
    fn bounds_match_clamp_edges() {
        let calc = calculator();
        // 80 * 0.55 = 44, 80 * 1.5 = 120
        assert_eq!(calc.bounds(Volatility::Extreme), (44, 120));
    }
}
