use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::params::SimulationRequest;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub horizon: HorizonConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Request used by the `watch` command and as CLI defaults.
    #[serde(default)]
    pub profile: SimulationRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_num_paths")]
    pub num_paths: usize,
    #[serde(default = "default_death_drawdown_fraction")]
    pub death_drawdown_fraction: f64,
    /// Paths retaining equity traces for band construction (`None` = all).
    #[serde(default = "default_band_paths")]
    pub band_paths: Option<usize>,
    #[serde(default)]
    pub stress: StressConfig,
}

const fn default_num_paths() -> usize {
    1_000
}

const fn default_death_drawdown_fraction() -> f64 {
    0.30 // death at a 70% drawdown
}

#[allow(clippy::unnecessary_wraps)]
const fn default_band_paths() -> Option<usize> {
    Some(500)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            num_paths: default_num_paths(),
            death_drawdown_fraction: default_death_drawdown_fraction(),
            band_paths: default_band_paths(),
            stress: StressConfig::default(),
        }
    }
}

/// Win-probability perturbation for the stress run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressConfig {
    #[serde(default = "default_win_delta")]
    pub win_delta: f64,
    #[serde(default = "default_min_win_probability")]
    pub min_win_probability: f64,
}

const fn default_win_delta() -> f64 {
    0.05 // 5 percentage points
}

const fn default_min_win_probability() -> f64 {
    0.01
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            win_delta: default_win_delta(),
            min_win_probability: default_min_win_probability(),
        }
    }
}

impl StressConfig {
    /// Win probability used for the stressed run. Floored, but never above `base`.
    #[must_use]
    pub fn stressed_win_probability(&self, base: f64) -> f64 {
        (base - self.win_delta)
            .max(self.min_win_probability)
            .min(base)
    }
}

/// Calibration constants for horizon derivation. Tunable, not derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonConfig {
    #[serde(default = "default_base_low")]
    pub base_low: usize,
    #[serde(default = "default_base_med")]
    pub base_med: usize,
    #[serde(default = "default_base_high")]
    pub base_high: usize,
    #[serde(default = "default_base_extreme")]
    pub base_extreme: usize,
    #[serde(default = "default_reference_risk")]
    pub reference_risk: f64,
    #[serde(default = "default_exponent")]
    pub exponent: f64,
    #[serde(default = "default_min_adjustment")]
    pub min_adjustment: f64,
    #[serde(default = "default_max_adjustment")]
    pub max_adjustment: f64,
}

const fn default_base_low() -> usize {
    250
}

const fn default_base_med() -> usize {
    180
}

const fn default_base_high() -> usize {
    120
}

const fn default_base_extreme() -> usize {
    80
}

const fn default_reference_risk() -> f64 {
    0.01
}

const fn default_exponent() -> f64 {
    0.5
}

const fn default_min_adjustment() -> f64 {
    0.55
}

const fn default_max_adjustment() -> f64 {
    1.5
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self {
            base_low: default_base_low(),
            base_med: default_base_med(),
            base_high: default_base_high(),
            base_extreme: default_base_extreme(),
            reference_risk: default_reference_risk(),
            exponent: default_exponent(),
            min_adjustment: default_min_adjustment(),
            max_adjustment: default_max_adjustment(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Lower bound of the jittered wait between runs.
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    /// Upper bound of the jittered wait between runs.
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,
    /// Skip the wait for the first cycle after start or a parameter change.
    #[serde(default)]
    pub run_immediately: bool,
}

const fn default_min_interval_ms() -> u64 {
    120_000
}

const fn default_max_interval_ms() -> u64 {
    300_000
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: default_min_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
            run_immediately: false,
        }
    }
}

impl SchedulerConfig {
    /// Jitter window as `(min, max)`, with `max` never below `min`.
    #[must_use]
    pub fn interval_window(&self) -> (Duration, Duration) {
        let min = Duration::from_millis(self.min_interval_ms);
        let max = Duration::from_millis(self.max_interval_ms.max(self.min_interval_ms));
        (min, max)
    }
}
