//! Reduction of a path population into percentile maps, time-indexed bands,
//! and ruin probabilities.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use survival_core::{KellyReference, SimulationParameters};

use crate::path::PathResult;
use crate::quantile::{percentile_sorted, percentiles};
use crate::random::RandomSource;
use crate::runner::MonteCarloRunner;

const BAND_LEVELS: [f64; 5] = [0.05, 0.25, 0.50, 0.75, 0.95];

/// Per-step P05/P25/P50/P75/P95 of equity across traced paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PercentileBands {
    pub p05: Vec<f64>,
    pub p25: Vec<f64>,
    pub p50: Vec<f64>,
    pub p75: Vec<f64>,
    pub p95: Vec<f64>,
}

impl PercentileBands {
    #[must_use]
    pub fn len(&self) -> usize {
        self.p50.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.p50.is_empty()
    }
}

/// Terminal percentile map plus time-indexed bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub final_equity_p10: f64,
    pub final_equity_median: f64,
    pub final_equity_p90: f64,
    pub mean_final_equity: f64,
    pub max_drawdown_median: f64,
    pub max_drawdown_p90: f64,
    pub losing_streak_median: f64,
    pub losing_streak_p90: f64,
    /// Share of paths ending above starting equity.
    pub prob_profit: f64,
    /// Share of paths ending at or above twice starting equity.
    pub prob_double: f64,
    pub bands: PercentileBands,
}

/// Ruin probabilities from the population and the Kelly reference.
///
/// The Kelly values are an approximation offered as a reference, not a
/// guarantee about any particular outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuinEstimate {
    /// Share of paths ending at or below zero equity.
    pub zero_ruin_probability: f64,
    /// Share of paths ending at or below the death line.
    pub practical_ruin_probability: f64,
    pub kelly_fraction: f64,
    pub disciplined_risk_fraction: f64,
    pub expected_r_per_trade: f64,
}

/// Summary and ruin estimate for one win probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeReport {
    pub win_probability: f64,
    pub num_paths: usize,
    pub summary: DistributionSummary,
    pub ruin: RuinEstimate,
    /// Paths on which a non-finite equity value was clamped.
    pub degenerate_paths: usize,
}

impl OutcomeReport {
    /// Runs the population for `params` and summarizes it.
    pub fn evaluate<S: RandomSource>(params: &SimulationParameters, source: &mut S) -> Self {
        let paths = MonteCarloRunner::new(params).run(source);
        DistributionSummarizer::new(params).report(&paths)
    }
}

pub struct DistributionSummarizer<'a> {
    params: &'a SimulationParameters,
}

impl<'a> DistributionSummarizer<'a> {
    #[must_use]
    pub fn new(params: &'a SimulationParameters) -> Self {
        Self { params }
    }

    #[must_use]
    pub fn report(&self, paths: &[PathResult]) -> OutcomeReport {
        OutcomeReport {
            win_probability: self.params.win_probability,
            num_paths: paths.len(),
            summary: self.summarize(paths),
            ruin: self.ruin(paths),
            degenerate_paths: paths.iter().filter(|p| p.degenerate).count(),
        }
    }

    /// Percentile map over terminal values plus bands. Empty input gives `NaN`s.
    #[must_use]
    pub fn summarize(&self, paths: &[PathResult]) -> DistributionSummary {
        let start = self.params.starting_equity;
        let finals: Vec<f64> = paths.iter().map(|p| sanitize(p.final_equity)).collect();
        let drawdowns: Vec<f64> = paths.iter().map(|p| sanitize(p.max_drawdown)).collect();
        let streaks: Vec<f64> = paths
            .iter()
            .map(|p| p.longest_losing_streak as f64)
            .collect();

        let [final_equity_p10, final_equity_median, final_equity_p90] =
            percentiles(&finals, [0.10, 0.50, 0.90]);
        let [max_drawdown_median, max_drawdown_p90] = percentiles(&drawdowns, [0.50, 0.90]);
        let [losing_streak_median, losing_streak_p90] = percentiles(&streaks, [0.50, 0.90]);

        let mean_final_equity = if finals.is_empty() {
            f64::NAN
        } else {
            finals.iter().sum::<f64>() / finals.len() as f64
        };

        DistributionSummary {
            final_equity_p10,
            final_equity_median,
            final_equity_p90,
            mean_final_equity,
            max_drawdown_median,
            max_drawdown_p90,
            losing_streak_median,
            losing_streak_p90,
            prob_profit: share(&finals, |e| e > start),
            prob_double: share(&finals, |e| e >= 2.0 * start),
            bands: self.bands(paths),
        }
    }

    /// Ruin shares and the Kelly reference for the run's edge.
    #[must_use]
    pub fn ruin(&self, paths: &[PathResult]) -> RuinEstimate {
        let finals: Vec<f64> = paths.iter().map(|p| sanitize(p.final_equity)).collect();
        let death_line = self.params.death_line();
        let kelly =
            KellyReference::compute(self.params.win_probability, self.params.payout_multiple);

        RuinEstimate {
            zero_ruin_probability: share(&finals, |e| e <= 0.0),
            practical_ruin_probability: share(&finals, |e| e <= death_line),
            kelly_fraction: kelly.kelly_fraction,
            disciplined_risk_fraction: kelly.disciplined_risk_fraction,
            expected_r_per_trade: kelly.expected_r_per_trade,
        }
    }

    /// Cross-sectional bands over the traced paths. Dead paths contribute
    /// their frozen equity at every later step.
    #[must_use]
    pub fn bands(&self, paths: &[PathResult]) -> PercentileBands {
        let traces: Vec<&[f64]> = paths
            .iter()
            .filter_map(|p| p.equity_trace.as_deref())
            .filter(|t| !t.is_empty())
            .collect();
        if traces.is_empty() {
            return PercentileBands::default();
        }

        let steps = self.params.num_trade_events;
        let rows: Vec<[f64; 5]> = (0..steps)
            .into_par_iter()
            .map(|step| {
                let mut column: Vec<f64> = traces
                    .iter()
                    .map(|t| sanitize(t.get(step).copied().unwrap_or(t[t.len() - 1])))
                    .collect();
                column.sort_by(f64::total_cmp);
                BAND_LEVELS.map(|p| percentile_sorted(&column, p))
            })
            .collect();

        let mut bands = PercentileBands {
            p05: Vec::with_capacity(steps),
            p25: Vec::with_capacity(steps),
            p50: Vec::with_capacity(steps),
            p75: Vec::with_capacity(steps),
            p95: Vec::with_capacity(steps),
        };
        for [p05, p25, p50, p75, p95] in rows {
            bands.p05.push(p05);
            bands.p25.push(p25);
            bands.p50.push(p50);
            bands.p75.push(p75);
            bands.p95.push(p95);
        }
        bands
    }
}

/// Non-finite values count as zero contribution.
fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn share(values: &[f64], predicate: impl Fn(f64) -> bool) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|&&v| predicate(v)).count() as f64 / values.len() as f64
}
