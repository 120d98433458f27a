use survival_core::ValidationError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchedulerError {
    #[error("recompute loop has shut down")]
    Closed,
    #[error("rejected parameters: {0}")]
    Invalid(#[from] ValidationError),
}
