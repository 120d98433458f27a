//! Re-run with an overstated edge removed.

use serde::{Deserialize, Serialize};

use survival_core::{SimulationParameters, StressConfig};

use crate::random::RandomSource;
use crate::summary::OutcomeReport;

/// Signed change from base to stressed (`stressed - base`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sensitivity {
    pub win_probability_delta: f64,
    pub practical_ruin_delta: f64,
    pub zero_ruin_delta: f64,
    pub median_final_equity_delta: f64,
    pub kelly_fraction_delta: f64,
}

impl Sensitivity {
    #[must_use]
    pub fn between(base: &OutcomeReport, stressed: &OutcomeReport) -> Self {
        Self {
            win_probability_delta: stressed.win_probability - base.win_probability,
            practical_ruin_delta: stressed.ruin.practical_ruin_probability
                - base.ruin.practical_ruin_probability,
            zero_ruin_delta: stressed.ruin.zero_ruin_probability
                - base.ruin.zero_ruin_probability,
            median_final_equity_delta: stressed.summary.final_equity_median
                - base.summary.final_equity_median,
            kelly_fraction_delta: stressed.ruin.kelly_fraction - base.ruin.kelly_fraction,
        }
    }
}

pub struct StressTester<'a> {
    params: &'a SimulationParameters,
    config: StressConfig,
}

impl<'a> StressTester<'a> {
    #[must_use]
    pub fn new(params: &'a SimulationParameters, config: StressConfig) -> Self {
        Self { params, config }
    }

    /// Base parameters with the win probability reduced and floored.
    #[must_use]
    pub fn stressed_parameters(&self) -> SimulationParameters {
        let stressed = self
            .config
            .stressed_win_probability(self.params.win_probability);
        self.params.clone().with_win_probability(stressed)
    }

    /// Runs the stressed population and compares it against `base`.
    pub fn run<S: RandomSource>(
        &self,
        base: &OutcomeReport,
        source: &mut S,
    ) -> (OutcomeReport, Sensitivity) {
        let params = self.stressed_parameters();
        let stressed = OutcomeReport::evaluate(&params, source);
        let sensitivity = Sensitivity::between(base, &stressed);
        (stressed, sensitivity)
    }
}
