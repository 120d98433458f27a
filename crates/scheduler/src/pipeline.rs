use survival_core::SimulationParameters;
use survival_simulation::{EngineError, RunSummary, SurvivalEngine};

/// Work executed once per scheduled cycle, on a blocking worker thread.
pub trait RunPipeline: Send + Sync + 'static {
    /// Produces a summary for `params`.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if the run cannot complete.
    fn run(&self, params: &SimulationParameters) -> Result<RunSummary, EngineError>;
}

/// Runs the full Monte Carlo pipeline.
#[derive(Debug, Clone, Default)]
pub struct MonteCarloPipeline {
    engine: SurvivalEngine,
}

impl MonteCarloPipeline {
    #[must_use]
    pub const fn new(engine: SurvivalEngine) -> Self {
        Self { engine }
    }
}

impl RunPipeline for MonteCarloPipeline {
    fn run(&self, params: &SimulationParameters) -> Result<RunSummary, EngineError> {
        self.engine.simulate(params)
    }
}

impl<F> RunPipeline for F
where
    F: Fn(&SimulationParameters) -> Result<RunSummary, EngineError> + Send + Sync + 'static,
{
    fn run(&self, params: &SimulationParameters) -> Result<RunSummary, EngineError> {
        self(params)
    }
}
