//! Simulation inputs.
//!
//! `SimulationParameters` is the immutable value a single engine run is driven
//! by. `SimulationRequest` is the shape the surrounding application hands in
//! (account size, sizing mode, win rate in percent, volatility class) and is
//! turned into parameters through validation and horizon derivation.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::horizon::HorizonCalculator;

/// Rejected inputs. Raised before any path is simulated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("risk per trade must be in (0, 1], got {0}")]
    RiskPerTrade(f64),
    #[error("win probability must be in (0, 1), got {0}")]
    WinProbability(f64),
    #[error("win rate must be in (0, 100) percent, got {0}")]
    WinRatePct(f64),
    #[error("payout multiple must be positive, got {0}")]
    PayoutMultiple(f64),
    #[error("number of trade events must be positive")]
    NumTradeEvents,
    #[error("number of paths must be positive")]
    NumPaths,
    #[error("death drawdown fraction must be in (0, 1), got {0}")]
    DeathDrawdownFraction(f64),
    #[error("starting equity must be positive, got {0}")]
    StartingEquity(f64),
    #[error("account size must be positive, got {0}")]
    AccountSize(Decimal),
    #[error("fixed risk {risk} must be positive and no larger than account size {account}")]
    FixedRisk { risk: Decimal, account: Decimal },
}

/// Parameters for one engine run.
///
/// Built with [`SimulationParameters::new`] and the `with_*` setters; a change
/// to any governing value means constructing a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// Fraction of current equity risked per trade event.
    pub risk_per_trade: f64,
    /// Probability that a trade event wins.
    pub win_probability: f64,
    /// Profit per unit risked on a win (R-multiple).
    pub payout_multiple: f64,
    /// Number of simulated trade events per path.
    pub num_trade_events: usize,
    /// Number of simulated paths.
    pub num_paths: usize,
    /// Fraction of starting equity at or below which a path is dead.
    pub death_drawdown_fraction: f64,
    /// Equity every path starts from.
    pub starting_equity: f64,
    /// How many paths keep full equity traces for band construction (`None` = all).
    pub band_paths: Option<usize>,
    /// Seed for reproducible runs.
    pub seed: Option<u64>,
}

impl SimulationParameters {
    /// Creates parameters with a 70% drawdown death line and unit starting equity.
    #[must_use]
    pub fn new(
        risk_per_trade: f64,
        win_probability: f64,
        payout_multiple: f64,
        num_trade_events: usize,
        num_paths: usize,
    ) -> Self {
        Self {
            risk_per_trade,
            win_probability,
            payout_multiple,
            num_trade_events,
            num_paths,
            death_drawdown_fraction: 0.30,
            starting_equity: 1.0,
            band_paths: None,
            seed: None,
        }
    }

    #[must_use]
    pub fn with_death_drawdown_fraction(mut self, fraction: f64) -> Self {
        self.death_drawdown_fraction = fraction;
        self
    }

    #[must_use]
    pub fn with_starting_equity(mut self, equity: f64) -> Self {
        self.starting_equity = equity;
        self
    }

    #[must_use]
    pub fn with_band_paths(mut self, band_paths: Option<usize>) -> Self {
        self.band_paths = band_paths;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_win_probability(mut self, win_probability: f64) -> Self {
        self.win_probability = win_probability;
        self
    }

    #[must_use]
    pub fn with_risk_per_trade(mut self, risk_per_trade: f64) -> Self {
        self.risk_per_trade = risk_per_trade;
        self
    }

    /// Equity level at or below which a path counts as practically ruined.
    #[must_use]
    pub fn death_line(&self) -> f64 {
        self.starting_equity * self.death_drawdown_fraction
    }

    /// Number of paths that retain equity traces.
    #[must_use]
    pub fn traced_paths(&self) -> usize {
        self.band_paths.map_or(self.num_paths, |n| n.min(self.num_paths))
    }

    /// Checks every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let risk = self.risk_per_trade;
        if !risk.is_finite() || risk <= 0.0 || risk > 1.0 {
            return Err(ValidationError::RiskPerTrade(risk));
        }
        let p = self.win_probability;
        if !p.is_finite() || p <= 0.0 || p >= 1.0 {
            return Err(ValidationError::WinProbability(p));
        }
        if !self.payout_multiple.is_finite() || self.payout_multiple <= 0.0 {
            return Err(ValidationError::PayoutMultiple(self.payout_multiple));
        }
        if self.num_trade_events == 0 {
            return Err(ValidationError::NumTradeEvents);
        }
        if self.num_paths == 0 {
            return Err(ValidationError::NumPaths);
        }
        let death = self.death_drawdown_fraction;
        if !death.is_finite() || death <= 0.0 || death >= 1.0 {
            return Err(ValidationError::DeathDrawdownFraction(death));
        }
        if !self.starting_equity.is_finite() || self.starting_equity <= 0.0 {
            return Err(ValidationError::StartingEquity(self.starting_equity));
        }
        Ok(())
    }
}

/// Market volatility classification used to pick a base horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Volatility {
    Low,
    #[default]
    Med,
    High,
    Extreme,
}

impl Volatility {
    pub const ALL: [Self; 4] = [Self::Low, Self::Med, Self::High, Self::Extreme];
}

impl fmt::Display for Volatility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "LOW",
            Self::Med => "MED",
            Self::High => "HIGH",
            Self::Extreme => "EXTREME",
        };
        f.write_str(s)
    }
}

impl FromStr for Volatility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MED" | "MEDIUM" => Ok(Self::Med),
            "HIGH" => Ok(Self::High),
            "EXTREME" => Ok(Self::Extreme),
            other => Err(format!(
                "unknown volatility level '{other}' (expected LOW, MED, HIGH or EXTREME)"
            )),
        }
    }
}

/// How the per-trade risk is expressed by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SizingMode {
    /// Percent of current equity, e.g. `1.0` = 1%.
    RiskPercent { pct: f64 },
    /// Fixed currency amount, converted to a fraction of the account size.
    FixedRiskDollars { amount: Decimal },
}

impl Default for SizingMode {
    fn default() -> Self {
        Self::RiskPercent { pct: 1.0 }
    }
}

/// Inputs accepted from the surrounding application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    #[serde(default = "default_account_size")]
    pub account_size: Decimal,
    #[serde(default)]
    pub sizing: SizingMode,
    #[serde(default = "default_win_rate_pct")]
    pub win_rate_pct: f64,
    #[serde(default = "default_payout_multiple")]
    pub payout_multiple: f64,
    #[serde(default)]
    pub volatility: Volatility,
    /// Advanced override; derived from volatility when absent.
    #[serde(default)]
    pub num_trade_events: Option<usize>,
    #[serde(default)]
    pub num_paths: Option<usize>,
    #[serde(default)]
    pub death_drawdown_fraction: Option<f64>,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_account_size() -> Decimal {
    Decimal::from(10_000)
}

const fn default_win_rate_pct() -> f64 {
    50.0
}

const fn default_payout_multiple() -> f64 {
    1.2
}

impl Default for SimulationRequest {
    fn default() -> Self {
        Self {
            account_size: default_account_size(),
            sizing: SizingMode::default(),
            win_rate_pct: default_win_rate_pct(),
            payout_multiple: default_payout_multiple(),
            volatility: Volatility::default(),
            num_trade_events: None,
            num_paths: None,
            death_drawdown_fraction: None,
            seed: None,
        }
    }
}

impl SimulationRequest {
    /// Per-trade risk as a fraction of equity.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive account size or a fixed risk that
    /// is non-positive or larger than the account.
    pub fn risk_fraction(&self) -> Result<f64, ValidationError> {
        if self.account_size <= Decimal::ZERO {
            return Err(ValidationError::AccountSize(self.account_size));
        }
        match &self.sizing {
            SizingMode::RiskPercent { pct } => Ok(pct / 100.0),
            SizingMode::FixedRiskDollars { amount } => {
                if *amount <= Decimal::ZERO || *amount > self.account_size {
                    return Err(ValidationError::FixedRisk {
                        risk: *amount,
                        account: self.account_size,
                    });
                }
                (*amount / self.account_size)
                    .to_f64()
                    .ok_or(ValidationError::FixedRisk {
                        risk: *amount,
                        account: self.account_size,
                    })
            }
        }
    }

    /// Validates the request and derives run parameters.
    ///
    /// The horizon comes from `horizon` unless `num_trade_events` is set;
    /// path count, death line and band retention fall back to `engine`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn to_parameters(
        &self,
        engine: &EngineConfig,
        horizon: &HorizonCalculator,
    ) -> Result<SimulationParameters, ValidationError> {
        let risk = self.risk_fraction()?;
        if !self.win_rate_pct.is_finite() || self.win_rate_pct <= 0.0 || self.win_rate_pct >= 100.0
        {
            return Err(ValidationError::WinRatePct(self.win_rate_pct));
        }
        let starting_equity = self
            .account_size
            .to_f64()
            .ok_or(ValidationError::AccountSize(self.account_size))?;

        let num_trade_events = self
            .num_trade_events
            .unwrap_or_else(|| horizon.trade_events(self.volatility, risk));

        let mut params = SimulationParameters::new(
            risk,
            self.win_rate_pct / 100.0,
            self.payout_multiple,
            num_trade_events,
            self.num_paths.unwrap_or(engine.num_paths),
        )
        .with_death_drawdown_fraction(
            self.death_drawdown_fraction
                .unwrap_or(engine.death_drawdown_fraction),
        )
        .with_starting_equity(starting_equity)
        .with_band_paths(engine.band_paths);
        params.seed = self.seed;

        params.validate()?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HorizonConfig;
    use rust_decimal_macros::dec;

    fn example_params() -> SimulationParameters {
        SimulationParameters::new(0.01, 0.5, 1.2, 120, 300)
    }

    // ============================================================
    // SimulationParameters
    // ============================================================

    #[test]
    fn new_uses_expected_defaults() {
        let params = example_params();

        assert!((params.death_drawdown_fraction - 0.30).abs() < f64::EPSILON);
        assert!((params.starting_equity - 1.0).abs() < f64::EPSILON);
        assert!(params.band_paths.is_none());
        assert!(params.seed.is_none());
        assert!(params.validate().is_ok());
    }

    #[test]
    fn death_line_scales_with_starting_equity() {
        let params = example_params().with_starting_equity(10_000.0);
        assert!((params.death_line() - 3_000.0).abs() < 1e-9);
    }

    #[test]
    fn traced_paths_is_capped_by_num_paths() {
        assert_eq!(example_params().traced_paths(), 300);
        assert_eq!(example_params().with_band_paths(Some(50)).traced_paths(), 50);
        assert_eq!(example_params().with_band_paths(Some(5_000)).traced_paths(), 300);
    }

    #[test]
    fn validate_rejects_win_probability_outside_open_interval() {
        for p in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            let err = example_params().with_win_probability(p).validate();
            assert!(matches!(err, Err(ValidationError::WinProbability(_))), "p = {p}");
        }
    }

    #[test]
    fn validate_rejects_non_positive_risk() {
        for risk in [0.0, -0.01, 1.01, f64::INFINITY] {
            let err = example_params().with_risk_per_trade(risk).validate();
            assert!(matches!(err, Err(ValidationError::RiskPerTrade(_))), "risk = {risk}");
        }
    }

    #[test]
    fn validate_rejects_zero_counts() {
        let mut params = example_params();
        params.num_trade_events = 0;
        assert_eq!(params.validate(), Err(ValidationError::NumTradeEvents));

        let mut params = example_params();
        params.num_paths = 0;
        assert_eq!(params.validate(), Err(ValidationError::NumPaths));
    }

    #[test]
    fn validate_rejects_bad_death_line_and_equity() {
        for death in [0.0, -0.1, 1.0, f64::NAN] {
            let params = example_params().with_death_drawdown_fraction(death);
            assert!(
                matches!(params.validate(), Err(ValidationError::DeathDrawdownFraction(_))),
                "death = {death}"
            );
        }
        assert!(example_params().with_death_drawdown_fraction(0.01).validate().is_ok());

        let params = example_params().with_starting_equity(0.0);
        assert!(matches!(params.validate(), Err(ValidationError::StartingEquity(_))));
    }

    // ============================================================
    // Volatility
    // ============================================================

    #[test]
    fn volatility_parses_case_insensitively() {
        assert_eq!("low".parse::<Volatility>(), Ok(Volatility::Low));
        assert_eq!("MED".parse::<Volatility>(), Ok(Volatility::Med));
        assert_eq!("Medium".parse::<Volatility>(), Ok(Volatility::Med));
        assert_eq!("extreme".parse::<Volatility>(), Ok(Volatility::Extreme));
        assert!("wild".parse::<Volatility>().is_err());
    }

    #[test]
    fn volatility_serializes_uppercase() {
        let json = serde_json::to_string(&Volatility::High).unwrap();
        assert_eq!(json, "\"HIGH\"");
    }

    // ============================================================
    // SimulationRequest
    // ============================================================

    fn calculator() -> HorizonCalculator {
        HorizonCalculator::new(HorizonConfig::default())
    }

    #[test]
    fn request_with_percent_risk_derives_parameters() {
        let request = SimulationRequest {
            account_size: dec!(25000),
            sizing: SizingMode::RiskPercent { pct: 1.0 },
            win_rate_pct: 55.0,
            payout_multiple: 1.5,
            volatility: Volatility::Med,
            ..Default::default()
        };

        let params = request
            .to_parameters(&EngineConfig::default(), &calculator())
            .unwrap();

        assert!((params.risk_per_trade - 0.01).abs() < 1e-12);
        assert!((params.win_probability - 0.55).abs() < 1e-12);
        assert!((params.starting_equity - 25_000.0).abs() < 1e-9);
        assert_eq!(
            params.num_trade_events,
            calculator().trade_events(Volatility::Med, 0.01)
        );
        assert_eq!(params.num_paths, EngineConfig::default().num_paths);
    }

    #[test]
    fn request_with_fixed_dollars_converts_to_fraction() {
        let request = SimulationRequest {
            account_size: dec!(20000),
            sizing: SizingMode::FixedRiskDollars { amount: dec!(400) },
            ..Default::default()
        };

        let risk = request.risk_fraction().unwrap();
        assert!((risk - 0.02).abs() < 1e-12);
    }

    #[test]
    fn request_rejects_fixed_risk_larger_than_account() {
        let request = SimulationRequest {
            account_size: dec!(1000),
            sizing: SizingMode::FixedRiskDollars { amount: dec!(1500) },
            ..Default::default()
        };

        assert!(matches!(
            request.risk_fraction(),
            Err(ValidationError::FixedRisk { .. })
        ));
    }

    #[test]
    fn request_rejects_non_positive_account() {
        let request = SimulationRequest {
            account_size: dec!(0),
            ..Default::default()
        };

        let err = request
            .to_parameters(&EngineConfig::default(), &calculator())
            .unwrap_err();
        assert_eq!(err, ValidationError::AccountSize(dec!(0)));
    }

    #[test]
    fn request_rejects_win_rate_out_of_range() {
        let request = SimulationRequest {
            win_rate_pct: 100.0,
            ..Default::default()
        };

        assert!(matches!(
            request.to_parameters(&EngineConfig::default(), &calculator()),
            Err(ValidationError::WinRatePct(_))
        ));
    }

    #[test]
    fn request_overrides_take_precedence() {
        let request = SimulationRequest {
            num_trade_events: Some(42),
            num_paths: Some(7),
            death_drawdown_fraction: Some(0.5),
            seed: Some(9),
            ..Default::default()
        };

        let params = request
            .to_parameters(&EngineConfig::default(), &calculator())
            .unwrap();

        assert_eq!(params.num_trade_events, 42);
        assert_eq!(params.num_paths, 7);
        assert!((params.death_drawdown_fraction - 0.5).abs() < f64::EPSILON);
        assert_eq!(params.seed, Some(9));
    }

    #[test]
    fn request_deserializes_tagged_sizing() {
        let json = r#"{
            "account_size": "5000",
            "sizing": { "mode": "fixed_risk_dollars", "amount": "50" },
            "win_rate_pct": 45.0,
            "payout_multiple": 2.0,
            "volatility": "HIGH"
        }"#;

        let request: SimulationRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.account_size, dec!(5000));
        assert_eq!(
            request.sizing,
            SizingMode::FixedRiskDollars { amount: dec!(50) }
        );
        assert_eq!(request.volatility, Volatility::High);
        assert!(request.num_paths.is_none());
    }
}
