use survival_core::SimulationParameters;

#[derive(Debug)]
pub enum SchedulerCommand {
    /// Replace the parameters and start a fresh cycle.
    UpdateParameters(Box<SimulationParameters>),
    /// Tear the loop down.
    Cancel,
}
