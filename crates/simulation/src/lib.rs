//! Monte Carlo survivability engine.
//!
//! Simulates many independent equity paths under fixed-fractional risk and
//! summarizes how often the account dies, how deep it draws down, and how
//! fragile the result is when the assumed edge is overstated.

pub mod engine;
pub mod error;
pub mod path;
pub mod quantile;
pub mod random;
pub mod runner;
pub mod stress;
pub mod summary;

pub use engine::{simulate, RunMetadata, RunSummary, SurvivalEngine};
pub use error::EngineError;
pub use path::{PathResult, PathSimulator};
pub use quantile::{percentile, percentile_sorted};
pub use random::{ChaChaSource, RandomSource};
pub use runner::MonteCarloRunner;
pub use stress::{Sensitivity, StressTester};
pub use summary::{
    DistributionSummarizer, DistributionSummary, OutcomeReport, PercentileBands, RuinEstimate,
};
