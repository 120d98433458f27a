//! Periodic recompute driven by the config file.
//!
//! Edits to the `profile` section become parameter changes on the running
//! scheduler; edits to `scheduler` or `engine.stress` restart it.

use anyhow::Result;
use clap::Args;
use tracing::{info, warn};

use survival_core::config_loader::DEFAULT_CONFIG_PATH;
use survival_core::{AppConfig, ConfigLoader, ConfigWatcher};
use survival_scheduler::{
    MonteCarloPipeline, RecomputeEvent, RecomputeHandle, RecomputeScheduler,
};
use survival_simulation::SurvivalEngine;

use super::simulate::{parameters_for, OutputFormat};
use crate::report::ReportFormatter;

/// Arguments for the watch command.
#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    /// Config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Output format for each update
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// What a config reload requires of the running scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadAction {
    Nothing,
    UpdateParameters,
    Restart,
}

impl ReloadAction {
    #[must_use]
    pub fn between(current: &AppConfig, next: &AppConfig) -> Self {
        if current.scheduler != next.scheduler || current.engine.stress != next.engine.stress {
            Self::Restart
        } else if current != next {
            Self::UpdateParameters
        } else {
            Self::Nothing
        }
    }
}

fn start(config: &AppConfig, format: OutputFormat) -> Result<RecomputeHandle> {
    let params = parameters_for(config, &config.profile)?;
    info!(
        trades = params.num_trade_events,
        paths = params.num_paths,
        min_interval_ms = config.scheduler.min_interval_ms,
        max_interval_ms = config.scheduler.max_interval_ms,
        "Starting recompute scheduler"
    );

    let pipeline = MonteCarloPipeline::new(SurvivalEngine::new(config.engine.stress));
    Ok(RecomputeScheduler::spawn_with_pipeline(
        params,
        config.scheduler.clone(),
        pipeline,
        move |event| print_event(&event, format),
    ))
}

/// Applies `next` to the running scheduler. On error the scheduler is left
/// untouched and `current` remains the config it runs under.
fn reload(
    current: &AppConfig,
    next: &AppConfig,
    handle: &mut RecomputeHandle,
    format: OutputFormat,
) -> Result<()> {
    match ReloadAction::between(current, next) {
        ReloadAction::Nothing => {}
        ReloadAction::UpdateParameters => {
            let params = parameters_for(next, &next.profile)?;
            handle.update_parameters(params)?;
        }
        ReloadAction::Restart => {
            let next_handle = start(next, format)?;
            handle.cancel();
            *handle = next_handle;
        }
    }
    Ok(())
}

fn print_event(event: &RecomputeEvent, format: OutputFormat) {
    match event {
        RecomputeEvent::Completed(summary) => match format {
            OutputFormat::Text => println!("{}", ReportFormatter::headline(summary)),
            OutputFormat::Json => match serde_json::to_string(summary.as_ref()) {
                Ok(json) => println!("{json}"),
                Err(e) => warn!("Failed to serialize summary: {}", e),
            },
        },
        RecomputeEvent::Errored {
            generation,
            message,
        } => {
            warn!(generation, "Recompute failed: {}", message);
        }
    }
}

/// Run the watch command until Ctrl-C.
///
/// # Errors
/// Returns an error if the initial config cannot be loaded or is invalid.
pub async fn run_watch(args: WatchArgs) -> Result<()> {
    let mut current = ConfigLoader::load_from(&args.config)?;
    let mut handle = start(&current, args.format)?;

    let (watcher, mut config_rx) = ConfigWatcher::new(current.clone());
    let config_path = args.config.clone();
    tokio::spawn(async move {
        if let Err(e) = watcher.watch(config_path).await {
            warn!("Config watcher stopped, hot reload disabled: {:#}", e);
        }
    });
    let mut reload_enabled = true;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, shutting down");
                break;
            }
            changed = config_rx.changed(), if reload_enabled => {
                if changed.is_err() {
                    reload_enabled = false;
                    continue;
                }
                let next = config_rx.borrow_and_update().clone();
                match reload(&current, &next, &mut handle, args.format) {
                    Ok(()) => current = next,
                    Err(e) => warn!("Keeping previous config: {:#}", e),
                }
            }
        }
    }

    handle.cancel();
    Ok(())
}
