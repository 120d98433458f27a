#![allow(clippy::format_push_string)]

use survival_core::{EdgeStatus, KellyReference, SimulationParameters};
use survival_simulation::{OutcomeReport, RunSummary};

const RULE: &str = "═══════════════════════════════════════════════════════════════\n";
const SECTION: &str = "───────────────────────────────────────────────────────────────\n";

pub struct ReportFormatter;

impl ReportFormatter {
    /// Full text report for a one-shot run.
    #[must_use]
    pub fn format(params: &SimulationParameters, summary: &RunSummary) -> String {
        let mut output = String::new();
        let start = params.starting_equity;

        output.push('\n');
        output.push_str(RULE);
        output.push_str("                  SURVIVABILITY REPORT                         \n");
        output.push_str(RULE);
        output.push('\n');

        output.push_str("Inputs\n");
        output.push_str(SECTION);
        output.push_str(&format!("Starting Equity:       ${start:.2}\n"));
        output.push_str(&format!(
            "Risk Per Trade:        {:.2}%\n",
            params.risk_per_trade * 100.0
        ));
        output.push_str(&format!(
            "Win Probability:       {:.2}%\n",
            params.win_probability * 100.0
        ));
        output.push_str(&format!("Payout Multiple:       {:.2}R\n", params.payout_multiple));
        output.push_str(&format!("Trade Events:          {}\n", params.num_trade_events));
        output.push_str(&format!("Simulated Paths:       {}\n", params.num_paths));
        output.push_str(&format!(
            "Death Line:            ${:.2} ({:.0}% drawdown)\n",
            params.death_line(),
            (1.0 - params.death_drawdown_fraction) * 100.0
        ));
        output.push('\n');

        Self::push_outcome(&mut output, "Base Case", &summary.base, start);
        Self::push_outcome(&mut output, "Stressed Case", &summary.stressed, start);

        output.push_str("Sensitivity (stressed - base)\n");
        output.push_str(SECTION);
        let s = &summary.sensitivity;
        output.push_str(&format!(
            "Win Probability:       {:+.2} pts\n",
            s.win_probability_delta * 100.0
        ));
        output.push_str(&format!(
            "Practical Ruin:        {:+.2} pts\n",
            s.practical_ruin_delta * 100.0
        ));
        output.push_str(&format!(
            "Zero Ruin:             {:+.2} pts\n",
            s.zero_ruin_delta * 100.0
        ));
        output.push_str(&format!(
            "Median Final Equity:   {:+.2}\n",
            s.median_final_equity_delta
        ));
        output.push('\n');

        output.push_str("Kelly Reference\n");
        output.push_str(SECTION);
        let ruin = &summary.base.ruin;
        output.push_str(&format!(
            "Full Kelly:            {:.2}%\n",
            ruin.kelly_fraction * 100.0
        ));
        output.push_str(&format!(
            "Disciplined (capped):  {:.2}%\n",
            ruin.disciplined_risk_fraction * 100.0
        ));
        output.push_str(&format!(
            "Expected R Per Trade:  {:+.3}R\n",
            ruin.expected_r_per_trade
        ));
        output.push('\n');
        output.push_str(RULE);

        for warning in Self::warnings(params, summary) {
            output.push_str(&format!("\n⚠️  {warning}\n"));
        }
        output.push('\n');

        output
    }

    /// Single line per scheduled update.
    #[must_use]
    pub fn headline(summary: &RunSummary) -> String {
        format!(
            "[gen {}] {} | ruin {:.2}% (stressed {:.2}%) | median {:.2} | p10 {:.2} | DD p90 {:.1}%",
            summary.meta.generation.unwrap_or_default(),
            summary.meta.completed_at.format("%Y-%m-%d %H:%M:%S UTC"),
            summary.base.ruin.practical_ruin_probability * 100.0,
            summary.stressed.ruin.practical_ruin_probability * 100.0,
            summary.base.summary.final_equity_median,
            summary.base.summary.final_equity_p10,
            summary.base.summary.max_drawdown_p90 * 100.0,
        )
    }

    /// Advisory notes about sizing and edge.
    #[must_use]
    pub fn warnings(params: &SimulationParameters, summary: &RunSummary) -> Vec<String> {
        let mut warnings = Vec::new();
        let kelly = KellyReference::compute(params.win_probability, params.payout_multiple);

        match kelly.edge {
            EdgeStatus::Negative => warnings.push(
                "Negative expectancy: every sizing loses on average at these inputs.".to_string(),
            ),
            EdgeStatus::None => {
                warnings.push("Zero expectancy: the edge does not pay for any risk.".to_string());
            }
            EdgeStatus::Positive | EdgeStatus::InvalidInputs => {}
        }
        if kelly.is_oversized(params.risk_per_trade) {
            warnings.push(format!(
                "Risk per trade {:.2}% exceeds the disciplined reference of {:.2}%.",
                params.risk_per_trade * 100.0,
                kelly.disciplined_risk_fraction * 100.0
            ));
        }
        if summary.degenerate_paths() > 0 {
            warnings.push(format!(
                "{} path(s) produced non-finite equity and were clamped to zero.",
                summary.degenerate_paths()
            ));
        }
        warnings
    }

    fn push_outcome(output: &mut String, title: &str, report: &OutcomeReport, start: f64) {
        let summary = &report.summary;
        let ruin = &report.ruin;

        output.push_str(&format!(
            "{title} (win probability {:.2}%)\n",
            report.win_probability * 100.0
        ));
        output.push_str(SECTION);
        output.push_str(&format!(
            "Practical Ruin:        {:.2}%\n",
            ruin.practical_ruin_probability * 100.0
        ));
        output.push_str(&format!(
            "Zero Ruin:             {:.2}%\n",
            ruin.zero_ruin_probability * 100.0
        ));
        output.push_str(&format!(
            "P(Profit):             {:.2}%\n",
            summary.prob_profit * 100.0
        ));
        output.push_str(&format!(
            "P(Double):             {:.2}%\n",
            summary.prob_double * 100.0
        ));
        output.push_str(&format!(
            "Final Equity p10:      ${:.2} ({:+.1}%)\n",
            summary.final_equity_p10,
            pct_change(summary.final_equity_p10, start)
        ));
        output.push_str(&format!(
            "Final Equity Median:   ${:.2} ({:+.1}%)\n",
            summary.final_equity_median,
            pct_change(summary.final_equity_median, start)
        ));
        output.push_str(&format!(
            "Final Equity p90:      ${:.2} ({:+.1}%)\n",
            summary.final_equity_p90,
            pct_change(summary.final_equity_p90, start)
        ));
        output.push_str(&format!(
            "Final Equity Mean:     ${:.2}\n",
            summary.mean_final_equity
        ));
        output.push_str(&format!(
            "Max Drawdown Median:   {:.2}%\n",
            summary.max_drawdown_median * 100.0
        ));
        output.push_str(&format!(
            "Max Drawdown p90:      {:.2}%\n",
            summary.max_drawdown_p90 * 100.0
        ));
        output.push_str(&format!(
            "Losing Streak Median:  {:.0}\n",
            summary.losing_streak_median
        ));
        output.push_str(&format!(
            "Losing Streak p90:     {:.0}\n",
            summary.losing_streak_p90
        ));
        output.push('\n');
    }
}

fn pct_change(value: f64, start: f64) -> f64 {
    (value / start - 1.0) * 100.0
}
