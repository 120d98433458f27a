use survival_core::ValidationError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid simulation input: {0}")]
    Invalid(#[from] ValidationError),
    /// The background compute unit failed or panicked.
    #[error("simulation worker failed: {0}")]
    Worker(String),
}

impl EngineError {
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }
}
