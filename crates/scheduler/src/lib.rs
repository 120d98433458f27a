//! Periodic, cancellable recompute of survivability runs.
//!
//! A single tokio task owns the schedule. Each cycle waits a jittered
//! interval, runs the pipeline on the blocking pool, and publishes the
//! result only if no parameter change or cancel happened meanwhile.

pub mod commands;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod recompute_actor;
pub mod recompute_handle;
pub mod scheduler;
pub mod state;

pub use commands::SchedulerCommand;
pub use error::SchedulerError;
pub use events::RecomputeEvent;
pub use pipeline::{MonteCarloPipeline, RunPipeline};
pub use recompute_handle::RecomputeHandle;
pub use scheduler::RecomputeScheduler;
pub use state::{ScheduleState, ScheduleStatus};
