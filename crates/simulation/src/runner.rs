//! Population of independent paths.

use rayon::prelude::*;

use survival_core::SimulationParameters;

use crate::path::{PathResult, PathSimulator};
use crate::random::RandomSource;

/// Runs `num_paths` independent paths.
///
/// One child stream per path is split from the caller's source up front, in
/// path order, and the paths are then simulated in parallel. A seeded source
/// therefore reproduces the population regardless of thread scheduling.
pub struct MonteCarloRunner<'a> {
    params: &'a SimulationParameters,
}

impl<'a> MonteCarloRunner<'a> {
    #[must_use]
    pub fn new(params: &'a SimulationParameters) -> Self {
        Self { params }
    }

    /// Simulates the population on the rayon pool.
    ///
    /// The first `params.traced_paths()` results keep their equity traces.
    pub fn run<S: RandomSource>(&self, source: &mut S) -> Vec<PathResult> {
        let traced = self.params.traced_paths();
        let streams: Vec<S> = (0..self.params.num_paths).map(|_| source.split()).collect();
        let simulator = PathSimulator::new(self.params);

        streams
            .into_par_iter()
            .enumerate()
            .map(|(i, mut stream)| simulator.run(&mut stream, i < traced))
            .collect()
    }

    /// Same population as [`run`](Self::run), simulated on the calling thread.
    pub fn run_sequential<S: RandomSource>(&self, source: &mut S) -> Vec<PathResult> {
        let traced = self.params.traced_paths();
        let simulator = PathSimulator::new(self.params);

        (0..self.params.num_paths)
            .map(|i| {
                let mut stream = source.split();
                simulator.run(&mut stream, i < traced)
            })
            .collect()
    }
}
