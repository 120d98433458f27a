//! Full pipeline: base run, stressed run, and the published summary.
//!
//! # Example
//!
//! ```
//! use survival_core::SimulationParameters;
//! use survival_simulation::simulate;
//!
//! let params = SimulationParameters::new(0.01, 0.5, 1.2, 120, 300).with_seed(7);
//! let summary = simulate(&params).unwrap();
//!
//! println!(
//!     "practical ruin: {:.2}% (stressed {:.2}%)",
//!     summary.base.ruin.practical_ruin_probability * 100.0,
//!     summary.stressed.ruin.practical_ruin_probability * 100.0,
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use survival_core::{SimulationParameters, StressConfig};

use crate::error::EngineError;
use crate::random::{ChaChaSource, RandomSource};
use crate::stress::{Sensitivity, StressTester};
use crate::summary::OutcomeReport;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub num_paths: usize,
    pub num_trade_events: usize,
    pub seed: Option<u64>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Scheduler generation that produced this run, if scheduled.
    pub generation: Option<u64>,
}

/// Immutable result of one engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub base: OutcomeReport,
    pub stressed: OutcomeReport,
    pub sensitivity: Sensitivity,
    pub meta: RunMetadata,
}

impl RunSummary {
    #[must_use]
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.meta.generation = Some(generation);
        self
    }

    /// Total paths across base and stressed runs flagged as degenerate.
    #[must_use]
    pub fn degenerate_paths(&self) -> usize {
        self.base.degenerate_paths + self.stressed.degenerate_paths
    }
}

#[derive(Debug, Clone, Default)]
pub struct SurvivalEngine {
    stress: StressConfig,
}

impl SurvivalEngine {
    #[must_use]
    pub fn new(stress: StressConfig) -> Self {
        Self { stress }
    }

    /// Runs the pipeline with a source seeded from `params.seed`, or entropy.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Invalid`] if `params` fail validation; no paths
    /// are simulated in that case.
    pub fn simulate(&self, params: &SimulationParameters) -> Result<RunSummary, EngineError> {
        let mut source = ChaChaSource::for_parameters(params);
        self.simulate_with(params, &mut source)
    }

    /// Runs the pipeline drawing from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Invalid`] if `params` fail validation.
    pub fn simulate_with<S: RandomSource>(
        &self,
        params: &SimulationParameters,
        source: &mut S,
    ) -> Result<RunSummary, EngineError> {
        params.validate()?;
        let started_at = Utc::now();

        let base = OutcomeReport::evaluate(params, source);
        let (stressed, sensitivity) = StressTester::new(params, self.stress).run(&base, source);

        let summary = RunSummary {
            base,
            stressed,
            sensitivity,
            meta: RunMetadata {
                num_paths: params.num_paths,
                num_trade_events: params.num_trade_events,
                seed: params.seed,
                started_at,
                completed_at: Utc::now(),
                generation: None,
            },
        };

        let degenerate = summary.degenerate_paths();
        if degenerate > 0 {
            warn!(
                degenerate,
                num_paths = params.num_paths,
                "Clamped non-finite equity on some simulated paths"
            );
        }
        debug!(
            practical_ruin = summary.base.ruin.practical_ruin_probability,
            median_final = summary.base.summary.final_equity_median,
            "Simulation run complete"
        );

        Ok(summary)
    }
}

/// One-shot run with the default stress configuration.
///
/// # Errors
///
/// Returns [`EngineError::Invalid`] if `params` fail validation.
pub fn simulate(params: &SimulationParameters) -> Result<RunSummary, EngineError> {
    SurvivalEngine::default().simulate(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use survival_core::ValidationError;

    fn example() -> SimulationParameters {
        SimulationParameters::new(0.01, 0.5, 1.2, 120, 300).with_seed(2024)
    }

    // ============================================================
    // Validation
    // ============================================================

    #[test]
    fn invalid_parameters_are_rejected_before_running() {
        let params = example().with_win_probability(1.0);

        let err = simulate(&params).unwrap_err();

        assert_eq!(err, EngineError::Invalid(ValidationError::WinProbability(1.0)));
        assert!(err.is_invalid_input());
    }

    // ============================================================
    // Determinism
    // ============================================================

    #[test]
    fn seeded_runs_are_identical() {
        let a = simulate(&example()).unwrap();
        let b = simulate(&example()).unwrap();

        assert_eq!(a.base, b.base);
        assert_eq!(a.stressed, b.stressed);
        assert_eq!(a.sensitivity, b.sensitivity);
        assert_eq!(a.meta.seed, Some(2024));
    }

    #[test]
    fn different_seeds_differ() {
        let a = simulate(&example()).unwrap();
        let b = simulate(&example().with_seed(2025)).unwrap();

        assert_ne!(a.base, b.base);
    }

    // ============================================================
    // End-to-end behaviour
    // ============================================================

    #[test]
    fn small_positive_edge_keeps_median_near_start() {
        let summary = simulate(&example()).unwrap();
        let median = summary.base.summary.final_equity_median;

        // EV = 0.5 * 1.2 - 0.5 = +0.1R per trade
        assert!(median > 1.0 && median < 1.3, "median = {median}");
        assert_eq!(summary.meta.num_paths, 300);
        assert_eq!(summary.meta.num_trade_events, 120);
        assert_eq!(summary.base.summary.bands.len(), 120);
        assert!(summary.meta.completed_at >= summary.meta.started_at);
    }

    #[test]
    fn larger_risk_is_more_dangerous() {
        let low = simulate(&example()).unwrap();
        let high = simulate(&example().with_risk_per_trade(0.05)).unwrap();
        let reckless = simulate(&example().with_risk_per_trade(0.20)).unwrap();

        assert!(
            low.base.ruin.practical_ruin_probability <= high.base.ruin.practical_ruin_probability
        );
        assert!(
            high.base.ruin.practical_ruin_probability
                < reckless.base.ruin.practical_ruin_probability
        );
        assert!(
            low.base.summary.max_drawdown_median < high.base.summary.max_drawdown_median
        );
    }

    #[test]
    fn practical_ruin_non_decreasing_in_risk() {
        let mut previous = 0.0;
        for risk in [0.01, 0.02, 0.05, 0.10, 0.20, 0.35] {
            let params = SimulationParameters::new(risk, 0.5, 1.2, 120, 2_000).with_seed(77);
            let ruin = simulate(&params).unwrap().base.ruin.practical_ruin_probability;
            assert!(ruin >= previous, "risk {risk}: {ruin} < {previous}");
            previous = ruin;
        }
    }

    #[test]
    fn zero_win_probability_runs_every_path_into_the_death_line() {
        // Kernel-level run: zero win probability is rejected by validation,
        // so drive the population directly.
        let params = SimulationParameters::new(0.1, 0.0, 1.2, 40, 100);
        let report = OutcomeReport::evaluate(&params, &mut ChaChaSource::seeded(4));

        // 0.9^12 is the first power at or below 0.30
        assert!((report.ruin.practical_ruin_probability - 1.0).abs() < f64::EPSILON);
        assert!(report.ruin.zero_ruin_probability.abs() < f64::EPSILON);
        assert!(report.summary.final_equity_p90 <= params.starting_equity);

        let wipeout = SimulationParameters::new(1.0, 0.0, 1.2, 40, 100);
        let report = OutcomeReport::evaluate(&wipeout, &mut ChaChaSource::seeded(4));
        assert!((report.ruin.zero_ruin_probability - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn generation_is_attached_without_touching_results() {
        let summary = simulate(&example()).unwrap();
        let tagged = summary.clone().with_generation(3);

        assert_eq!(tagged.meta.generation, Some(3));
        assert_eq!(tagged.base, summary.base);
    }

    #[test]
    fn summary_serializes_to_json() {
        let params = SimulationParameters::new(0.02, 0.55, 1.5, 20, 50).with_seed(1);
        let summary = simulate(&params).unwrap();

        let json = serde_json::to_value(&summary).unwrap();

        assert!(json["base"]["ruin"]["kelly_fraction"].is_number());
        assert_eq!(json["base"]["summary"]["bands"]["p50"].as_array().map(Vec::len), Some(20));
    }
}
