use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use survival_core::SimulationParameters;
use survival_simulation::RunSummary;

use crate::commands::SchedulerCommand;
use crate::error::SchedulerError;
use crate::state::ScheduleState;

/// Consumer side of a recompute loop.
///
/// Cloneable; the loop shuts down on [`cancel`](Self::cancel) or once every
/// clone has been dropped.
///
/// The handle shares the write side of the generation counter with the
/// loop. [`cancel`](Self::cancel) and
/// [`update_parameters`](Self::update_parameters) bump it before sending
/// their command, so a run that completes while the command is still queued
/// already carries a stale generation and is dropped.
#[derive(Clone)]
pub struct RecomputeHandle {
    tx: mpsc::UnboundedSender<SchedulerCommand>,
    generation: Arc<AtomicU64>,
    canceled: Arc<AtomicBool>,
    state_rx: watch::Receiver<ScheduleState>,
    summary_rx: watch::Receiver<Option<Arc<RunSummary>>>,
}

impl RecomputeHandle {
    pub(crate) const fn new(
        tx: mpsc::UnboundedSender<SchedulerCommand>,
        generation: Arc<AtomicU64>,
        canceled: Arc<AtomicBool>,
        state_rx: watch::Receiver<ScheduleState>,
        summary_rx: watch::Receiver<Option<Arc<RunSummary>>>,
    ) -> Self {
        Self {
            tx,
            generation,
            canceled,
            state_rx,
            summary_rx,
        }
    }

    /// Stops the loop. Any run in flight is discarded and no further
    /// callbacks are delivered.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
        let _ = self.tx.send(SchedulerCommand::Cancel);
    }

    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    /// Replaces the parameters, superseding any run in flight.
    ///
    /// # Errors
    /// Returns [`SchedulerError::Invalid`] if `params` fail validation, or
    /// [`SchedulerError::Closed`] if the loop has shut down.
    pub fn update_parameters(&self, params: SimulationParameters) -> Result<(), SchedulerError> {
        params.validate()?;
        if self.is_canceled() {
            return Err(SchedulerError::Closed);
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.tx
            .send(SchedulerCommand::UpdateParameters(Box::new(params)))
            .map_err(|_| SchedulerError::Closed)
    }

    /// Current generation counter.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn state(&self) -> ScheduleState {
        self.state_rx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ScheduleState> {
        self.state_rx.clone()
    }

    /// Most recently published summary, if any.
    #[must_use]
    pub fn latest(&self) -> Option<Arc<RunSummary>> {
        self.summary_rx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe_summaries(&self) -> watch::Receiver<Option<Arc<RunSummary>>> {
        self.summary_rx.clone()
    }
}

impl std::fmt::Debug for RecomputeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecomputeHandle")
            .field("generation", &self.generation())
            .field("canceled", &self.is_canceled())
            .finish_non_exhaustive()
    }
}
