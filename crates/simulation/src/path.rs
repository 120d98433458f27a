//! Single equity trajectory under compounding fractional risk.

use serde::{Deserialize, Serialize};

use survival_core::SimulationParameters;

use crate::random::RandomSource;

/// Outcome of one simulated path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathResult {
    /// Equity after the last simulated step (frozen at death).
    pub final_equity: f64,
    /// Largest peak-to-trough drawdown as a fraction of the peak.
    pub max_drawdown: f64,
    /// Longest run of consecutive losing trades.
    pub longest_losing_streak: usize,
    /// First step (1-based) at which equity reached the death line.
    pub died_at_step: Option<usize>,
    /// Equity after each step, padded with the frozen value after death.
    /// Only kept for paths used in band construction.
    pub equity_trace: Option<Vec<f64>>,
    /// A non-finite equity value was clamped on this path.
    pub degenerate: bool,
}

impl PathResult {
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.died_at_step.is_some()
    }
}

/// Simulates one trajectory for `num_trade_events` steps.
pub struct PathSimulator<'a> {
    params: &'a SimulationParameters,
}

impl<'a> PathSimulator<'a> {
    #[must_use]
    pub fn new(params: &'a SimulationParameters) -> Self {
        Self { params }
    }

    /// Runs the path, drawing one uniform per step from `source`.
    ///
    /// A win adds `equity * risk * payout`, a loss removes `equity * risk`.
    /// The path stops at the first step where equity is at or below the
    /// death line; a dead path does not recover.
    pub fn run<S: RandomSource + ?Sized>(&self, source: &mut S, keep_trace: bool) -> PathResult {
        let params = self.params;
        let steps = params.num_trade_events;
        let death_line = params.death_line();
        let risk = params.risk_per_trade;

        let mut equity = params.starting_equity;
        let mut peak = equity;
        let mut max_drawdown = 0.0_f64;
        let mut streak = 0_usize;
        let mut longest_losing_streak = 0_usize;
        let mut died_at_step = None;
        let mut degenerate = false;
        let mut trace = keep_trace.then(|| Vec::with_capacity(steps));

        for step in 1..=steps {
            // Non-positive risk is degenerate: equity never moves.
            let stake = if risk > 0.0 { equity * risk } else { 0.0 };

            if source.next_uniform() < params.win_probability {
                equity += stake * params.payout_multiple;
                streak = 0;
            } else {
                equity -= stake;
                streak += 1;
                longest_losing_streak = longest_losing_streak.max(streak);
            }

            if !equity.is_finite() {
                equity = 0.0;
                degenerate = true;
            }
            equity = equity.max(0.0);

            if equity > peak {
                peak = equity;
            }
            if peak > 0.0 {
                max_drawdown = max_drawdown.max((peak - equity) / peak);
            }

            if let Some(trace) = trace.as_mut() {
                trace.push(equity);
            }

            if equity <= death_line {
                died_at_step = Some(step);
                break;
            }
        }

        if let Some(trace) = trace.as_mut() {
            trace.resize(steps, equity);
        }

        PathResult {
            final_equity: equity,
            max_drawdown,
            longest_losing_streak,
            died_at_step,
            equity_trace: trace,
            degenerate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ChaChaSource;

    /// Replays a fixed sequence of draws, cycling when exhausted.
    struct ScriptedSource {
        draws: Vec<f64>,
        next: usize,
    }

    impl ScriptedSource {
        fn new(draws: Vec<f64>) -> Self {
            Self { draws, next: 0 }
        }
    }

    impl RandomSource for ScriptedSource {
        fn next_uniform(&mut self) -> f64 {
            let u = self.draws[self.next % self.draws.len()];
            self.next += 1;
            u
        }

        fn split(&mut self) -> Self {
            Self::new(self.draws.clone())
        }
    }

    const WIN: f64 = 0.0;
    const LOSS: f64 = 0.99;

    fn params(steps: usize) -> SimulationParameters {
        SimulationParameters::new(0.1, 0.5, 2.0, steps, 1)
    }

    // ============================================================
    // Compounding
    // ============================================================

    #[test]
    fn win_then_loss_compounds_on_current_equity() {
        let params = params(2);
        let mut source = ScriptedSource::new(vec![WIN, LOSS]);

        let result = PathSimulator::new(&params).run(&mut source, true);

        // 1.0 * (1 + 0.1 * 2.0) = 1.2, then 1.2 * 0.9 = 1.08
        assert!((result.final_equity - 1.08).abs() < 1e-12);
        assert_eq!(result.equity_trace.as_deref().map(<[f64]>::len), Some(2));
        assert!(!result.is_dead());
    }

    #[test]
    fn drawdown_measured_from_running_peak() {
        let params = params(3);
        let mut source = ScriptedSource::new(vec![WIN, LOSS, LOSS]);

        let result = PathSimulator::new(&params).run(&mut source, false);

        // peak 1.2, trough 1.2 * 0.81 = 0.972 -> drawdown 0.19
        assert!((result.max_drawdown - 0.19).abs() < 1e-12);
        assert!(result.equity_trace.is_none());
    }

    #[test]
    fn longest_losing_streak_tracks_consecutive_losses() {
        let params = params(8);
        let mut source = ScriptedSource::new(vec![LOSS, LOSS, WIN, LOSS, LOSS, LOSS, WIN, LOSS]);

        let result = PathSimulator::new(&params).run(&mut source, false);

        assert_eq!(result.longest_losing_streak, 3);
    }

    // ============================================================
    // Death line
    // ============================================================

    #[test]
    fn path_stops_at_death_line_and_trace_is_frozen() {
        // 0.9^11 = 0.3138, 0.9^12 = 0.2824 <= 0.30
        let params = params(20);
        let mut source = ScriptedSource::new(vec![LOSS]);

        let result = PathSimulator::new(&params).run(&mut source, true);

        assert_eq!(result.died_at_step, Some(12));
        assert!(result.final_equity <= params.death_line());
        assert_eq!(source.next, 12, "no draws after death");

        let trace = result.equity_trace.expect("trace kept");
        assert_eq!(trace.len(), 20);
        assert!(trace[11..].iter().all(|&e| (e - result.final_equity).abs() < f64::EPSILON));
    }

    #[test]
    fn full_risk_loss_reaches_zero() {
        let params = SimulationParameters::new(1.0, 0.5, 1.0, 10, 1);
        let mut source = ScriptedSource::new(vec![LOSS]);

        let result = PathSimulator::new(&params).run(&mut source, false);

        assert!(result.final_equity.abs() < f64::EPSILON);
        assert_eq!(result.died_at_step, Some(1));
        assert!((result.max_drawdown - 1.0).abs() < f64::EPSILON);
    }

    // ============================================================
    // Degenerate inputs
    // ============================================================

    #[test]
    fn zero_risk_leaves_equity_unchanged() {
        let params = SimulationParameters::new(0.0, 0.5, 1.5, 50, 1);
        let mut source = ChaChaSource::seeded(1);

        let result = PathSimulator::new(&params).run(&mut source, true);

        assert!((result.final_equity - 1.0).abs() < f64::EPSILON);
        assert!(result.max_drawdown.abs() < f64::EPSILON);
        assert!(!result.degenerate);
        assert!(result
            .equity_trace
            .unwrap()
            .iter()
            .all(|&e| (e - 1.0).abs() < f64::EPSILON));
    }

    #[test]
    fn overflowing_equity_is_clamped_and_flagged() {
        let params = SimulationParameters::new(1.0, 0.5, f64::MAX, 3, 1);
        let mut source = ScriptedSource::new(vec![WIN]);

        let result = PathSimulator::new(&params).run(&mut source, false);

        assert!(result.degenerate);
        assert!(result.final_equity.is_finite());
    }

    #[test]
    fn zero_win_probability_never_gains() {
        let params = SimulationParameters::new(0.05, 0.0, 1.2, 40, 1);
        let mut source = ChaChaSource::seeded(9);

        let result = PathSimulator::new(&params).run(&mut source, true);

        let trace = result.equity_trace.unwrap();
        assert!(trace.windows(2).all(|w| w[1] <= w[0]));
        assert!(result.final_equity <= params.starting_equity);
    }
}
