//! One-shot survivability run.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use tracing::info;

use survival_core::config_loader::DEFAULT_CONFIG_PATH;
use survival_core::{
    AppConfig, ConfigLoader, HorizonCalculator, SimulationParameters, SimulationRequest,
    SizingMode, Volatility,
};
use survival_simulation::SurvivalEngine;

use crate::report::ReportFormatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Arguments for the simulate command. Unset flags fall back to the
/// config file's `profile`.
#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Account size in currency units
    #[arg(long)]
    pub account_size: Option<Decimal>,

    /// Risk per trade as percent of equity (e.g. 1.0 = 1%)
    #[arg(long, conflicts_with = "fixed_risk")]
    pub risk_pct: Option<f64>,

    /// Risk per trade as a fixed currency amount
    #[arg(long)]
    pub fixed_risk: Option<Decimal>,

    /// Win rate in percent (e.g. 50)
    #[arg(long)]
    pub win_rate: Option<f64>,

    /// Payout multiple on a win, in R
    #[arg(long)]
    pub payout: Option<f64>,

    /// Volatility class: LOW, MED, HIGH, EXTREME
    #[arg(long)]
    pub volatility: Option<Volatility>,

    /// Override the derived number of trade events
    #[arg(long)]
    pub trades: Option<usize>,

    /// Number of simulated paths
    #[arg(long)]
    pub paths: Option<usize>,

    /// Seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl SimulateArgs {
    /// Applies command-line overrides on top of `request`.
    #[must_use]
    pub fn apply(&self, mut request: SimulationRequest) -> SimulationRequest {
        if let Some(account_size) = self.account_size {
            request.account_size = account_size;
        }
        if let Some(pct) = self.risk_pct {
            request.sizing = SizingMode::RiskPercent { pct };
        }
        if let Some(amount) = self.fixed_risk {
            request.sizing = SizingMode::FixedRiskDollars { amount };
        }
        if let Some(win_rate) = self.win_rate {
            request.win_rate_pct = win_rate;
        }
        if let Some(payout) = self.payout {
            request.payout_multiple = payout;
        }
        if let Some(volatility) = self.volatility {
            request.volatility = volatility;
        }
        if self.trades.is_some() {
            request.num_trade_events = self.trades;
        }
        if self.paths.is_some() {
            request.num_paths = self.paths;
        }
        if self.seed.is_some() {
            request.seed = self.seed;
        }
        request
    }
}

/// Validates `request` against the engine and horizon settings in `config`.
///
/// # Errors
/// Returns an error describing the first invalid input.
pub fn parameters_for(
    config: &AppConfig,
    request: &SimulationRequest,
) -> Result<SimulationParameters> {
    let horizon = HorizonCalculator::new(config.horizon.clone());
    let params = request
        .to_parameters(&config.engine, &horizon)
        .context("Invalid simulation inputs")?;
    Ok(params)
}

/// Run the simulate command.
///
/// # Errors
/// Returns an error if the config cannot be loaded, the inputs are invalid,
/// or the run fails.
pub async fn run_simulate(args: SimulateArgs) -> Result<()> {
    let config = ConfigLoader::load_from(&args.config)?;
    let request = args.apply(config.profile.clone());
    let params = parameters_for(&config, &request)?;

    info!(
        risk_per_trade = params.risk_per_trade,
        win_probability = params.win_probability,
        payout_multiple = params.payout_multiple,
        trades = params.num_trade_events,
        paths = params.num_paths,
        "Running survivability simulation"
    );

    let engine = SurvivalEngine::new(config.engine.stress);
    let run_params = params.clone();
    let summary = tokio::task::spawn_blocking(move || engine.simulate(&run_params))
        .await
        .context("Simulation task failed")??;

    match args.format {
        OutputFormat::Text => print!("{}", ReportFormatter::format(&params, &summary)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rust_decimal_macros::dec;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: SimulateArgs,
    }

    fn parse(argv: &[&str]) -> SimulateArgs {
        let mut full = vec!["survival"];
        full.extend_from_slice(argv);
        TestCli::try_parse_from(full).unwrap().args
    }

    #[test]
    fn unset_flags_keep_profile_values() {
        let args = parse(&[]);
        let profile = SimulationRequest::default();

        assert_eq!(args.apply(profile.clone()), profile);
        assert_eq!(args.format, OutputFormat::Text);
        assert_eq!(args.config, DEFAULT_CONFIG_PATH);
    }

    #[test]
    fn flags_override_profile() {
        let args = parse(&[
            "--account-size",
            "25000",
            "--risk-pct",
            "2",
            "--win-rate",
            "45",
            "--payout",
            "2.0",
            "--volatility",
            "high",
            "--paths",
            "400",
            "--seed",
            "11",
            "--format",
            "json",
        ]);

        let request = args.apply(SimulationRequest::default());

        assert_eq!(request.account_size, dec!(25000));
        assert_eq!(request.sizing, SizingMode::RiskPercent { pct: 2.0 });
        assert!((request.win_rate_pct - 45.0).abs() < f64::EPSILON);
        assert_eq!(request.volatility, Volatility::High);
        assert_eq!(request.num_paths, Some(400));
        assert_eq!(request.seed, Some(11));
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn fixed_risk_conflicts_with_percent() {
        let result = TestCli::try_parse_from([
            "survival",
            "--risk-pct",
            "1",
            "--fixed-risk",
            "100",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn fixed_risk_becomes_fraction_of_account() {
        let args = parse(&["--account-size", "10000", "--fixed-risk", "200"]);
        let request = args.apply(SimulationRequest::default());

        let params = parameters_for(&AppConfig::default(), &request).unwrap();

        assert!((params.risk_per_trade - 0.02).abs() < 1e-12);
        assert!((params.starting_equity - 10_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_inputs_are_reported() {
        let args = parse(&["--win-rate", "100"]);
        let request = args.apply(SimulationRequest::default());

        let err = parameters_for(&AppConfig::default(), &request).unwrap_err();

        assert!(format!("{err:#}").contains("Invalid simulation inputs"));
    }
}
