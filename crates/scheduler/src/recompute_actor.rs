use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};

use survival_core::{SchedulerConfig, SimulationParameters};
use survival_simulation::{EngineError, RunSummary};

use crate::commands::SchedulerCommand;
use crate::events::RecomputeEvent;
use crate::pipeline::RunPipeline;
use crate::state::{ScheduleState, ScheduleStatus};

/// Message sent by a worker when its run finishes.
struct Completion {
    generation: u64,
    result: Result<RunSummary, EngineError>,
}

/// Owns the recompute state machine.
///
/// One actor per consumer. Commands arrive from [`RecomputeHandle`]s; runs
/// execute on the blocking pool and report back through a completion
/// channel tagged with the generation they were started under.
///
/// [`RecomputeHandle`]: crate::RecomputeHandle
pub struct RecomputeActor<P, F> {
    params: SimulationParameters,
    config: SchedulerConfig,
    pipeline: Arc<P>,
    on_update: F,

    rx: mpsc::UnboundedReceiver<SchedulerCommand>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,

    generation: Arc<AtomicU64>,
    canceled: Arc<AtomicBool>,
    state_tx: watch::Sender<ScheduleState>,
    summary_tx: watch::Sender<Option<Arc<RunSummary>>>,

    deadline: Option<Instant>,
    run_next_immediately: bool,
    rng: ChaCha8Rng,
}

/// Channels and shared counters the actor publishes through.
pub(crate) struct ActorChannels {
    pub rx: mpsc::UnboundedReceiver<SchedulerCommand>,
    pub generation: Arc<AtomicU64>,
    pub canceled: Arc<AtomicBool>,
    pub state_tx: watch::Sender<ScheduleState>,
    pub summary_tx: watch::Sender<Option<Arc<RunSummary>>>,
}

impl<P, F> RecomputeActor<P, F>
where
    P: RunPipeline,
    F: Fn(RecomputeEvent) + Send + 'static,
{
    pub(crate) fn new(
        params: SimulationParameters,
        config: SchedulerConfig,
        pipeline: Arc<P>,
        on_update: F,
        channels: ActorChannels,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            params,
            run_next_immediately: config.run_immediately,
            config,
            pipeline,
            on_update,
            rx: channels.rx,
            completion_tx,
            completion_rx,
            generation: channels.generation,
            canceled: channels.canceled,
            state_tx: channels.state_tx,
            summary_tx: channels.summary_tx,
            deadline: None,
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Runs until canceled or every handle is dropped.
    pub async fn run(mut self) {
        tracing::info!(
            min_ms = self.config.min_interval_ms,
            max_ms = self.config.max_interval_ms,
            "Recompute scheduler starting"
        );
        self.schedule();

        loop {
            tokio::select! {
                cmd = self.rx.recv() => match cmd {
                    Some(SchedulerCommand::UpdateParameters(params)) => {
                        self.on_parameters(*params);
                    }
                    Some(SchedulerCommand::Cancel) | None => break,
                },
                Some(done) = self.completion_rx.recv() => {
                    self.on_completion(done);
                }
                () = wait_for(self.deadline) => {
                    self.deadline = None;
                    self.launch();
                }
            }
        }

        self.deadline = None;
        self.canceled.store(true, Ordering::SeqCst);
        self.publish_state(ScheduleStatus::Canceled);
        tracing::info!("Recompute scheduler stopped");
    }

    fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn publish_state(&self, status: ScheduleStatus) {
        let generation = self.current_generation();
        self.state_tx
            .send_modify(|state| *state = state.transition(status, generation));
    }

    /// Enters Scheduled with a fresh jittered deadline.
    fn schedule(&mut self) {
        let wait = if std::mem::take(&mut self.run_next_immediately) {
            Duration::ZERO
        } else {
            next_delay(&mut self.rng, &self.config)
        };
        self.deadline = Some(Instant::now() + wait);

        let generation = self.current_generation();
        self.state_tx
            .send_modify(|state| *state = state.scheduled(generation, wait));
        tracing::debug!(generation, wait_ms = wait.as_millis(), "Recompute scheduled");
    }

    /// Enters Running and hands the pipeline to the blocking pool.
    fn launch(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.publish_state(ScheduleStatus::Running);
        tracing::debug!(generation, "Recompute running");

        let pipeline = Arc::clone(&self.pipeline);
        let params = self.params.clone();
        let tx = self.completion_tx.clone();
        tokio::task::spawn_blocking(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| pipeline.run(&params)))
                .unwrap_or_else(|_| Err(EngineError::Worker("simulation panicked".to_string())));
            let _ = tx.send(Completion { generation, result });
        });
    }

    fn on_parameters(&mut self, params: SimulationParameters) {
        // Bumped by the handle before sending; an in-flight run is already stale.
        tracing::info!(
            generation = self.current_generation(),
            risk_per_trade = params.risk_per_trade,
            win_probability = params.win_probability,
            "Recompute parameters changed"
        );
        self.params = params;
        self.publish_state(ScheduleStatus::Canceled);
        self.run_next_immediately = self.config.run_immediately;
        self.schedule();
    }

    fn on_completion(&mut self, done: Completion) {
        let current = self.current_generation();
        if done.generation != current || self.canceled.load(Ordering::SeqCst) {
            tracing::debug!(
                run_generation = done.generation,
                current_generation = current,
                "Discarding stale recompute result"
            );
            return;
        }

        match done.result {
            Ok(summary) => {
                let summary = Arc::new(summary.with_generation(done.generation));
                self.summary_tx.send_replace(Some(Arc::clone(&summary)));
                self.state_tx.send_modify(|state| {
                    let mut next = state.transition(ScheduleStatus::Completed, current);
                    next.last_error = None;
                    *state = next;
                });
                tracing::info!(
                    generation = done.generation,
                    practical_ruin = summary.base.ruin.practical_ruin_probability,
                    "Recompute completed"
                );
                (self.on_update)(RecomputeEvent::Completed(summary));
            }
            Err(err) => {
                let message = err.to_string();
                tracing::error!(generation = done.generation, "Recompute failed: {message}");
                self.state_tx
                    .send_modify(|state| *state = state.errored(current, message.clone()));
                (self.on_update)(RecomputeEvent::Errored {
                    generation: done.generation,
                    message,
                });
            }
        }

        // A parameter change may have already scheduled the next cycle.
        if self.deadline.is_none() {
            self.schedule();
        }
    }
}

/// Uniform draw from the configured interval window.
pub(crate) fn next_delay(rng: &mut impl Rng, config: &SchedulerConfig) -> Duration {
    let (min, max) = config.interval_window();
    let ms = rng.gen_range(min.as_millis()..=max.as_millis());
    Duration::from_millis(u64::try_from(ms).unwrap_or(u64::MAX))
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
