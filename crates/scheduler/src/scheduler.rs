use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use survival_core::{SchedulerConfig, SimulationParameters};
use survival_simulation::SurvivalEngine;

use crate::events::RecomputeEvent;
use crate::pipeline::{MonteCarloPipeline, RunPipeline};
use crate::recompute_actor::{ActorChannels, RecomputeActor};
use crate::recompute_handle::RecomputeHandle;
use crate::state::ScheduleState;

/// Entry point for periodic background recomputation.
pub struct RecomputeScheduler;

impl RecomputeScheduler {
    /// Spawns a loop running the Monte Carlo pipeline with default stress
    /// settings.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(
        params: SimulationParameters,
        config: SchedulerConfig,
        on_update: F,
    ) -> RecomputeHandle
    where
        F: Fn(RecomputeEvent) + Send + 'static,
    {
        Self::spawn_with_pipeline(
            params,
            config,
            MonteCarloPipeline::new(SurvivalEngine::default()),
            on_update,
        )
    }

    /// Spawns a loop running `pipeline` once per cycle.
    pub fn spawn_with_pipeline<P, F>(
        params: SimulationParameters,
        config: SchedulerConfig,
        pipeline: P,
        on_update: F,
    ) -> RecomputeHandle
    where
        P: RunPipeline,
        F: Fn(RecomputeEvent) + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ScheduleState::idle());
        let (summary_tx, summary_rx) = watch::channel(None);
        let generation = Arc::new(AtomicU64::new(0));
        let canceled = Arc::new(AtomicBool::new(false));

        let actor = RecomputeActor::new(
            params,
            config,
            Arc::new(pipeline),
            on_update,
            ActorChannels {
                rx,
                generation: Arc::clone(&generation),
                canceled: Arc::clone(&canceled),
                state_tx,
                summary_tx,
            },
        );
        tokio::spawn(actor.run());

        RecomputeHandle::new(tx, generation, canceled, state_rx, summary_rx)
    }
}
