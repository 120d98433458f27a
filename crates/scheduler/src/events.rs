use std::sync::Arc;

use survival_simulation::RunSummary;

/// Delivered to the consumer callback for every current-generation outcome.
#[derive(Debug, Clone)]
pub enum RecomputeEvent {
    Completed(Arc<RunSummary>),
    Errored { generation: u64, message: String },
}

impl RecomputeEvent {
    #[must_use]
    pub fn generation(&self) -> Option<u64> {
        match self {
            Self::Completed(summary) => summary.meta.generation,
            Self::Errored { generation, .. } => Some(*generation),
        }
    }
}
