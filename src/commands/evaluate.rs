//! Evaluate command implementation

use anyhow::{bail, Result};
use propfirm_tracker::compliance::{breaches, evaluate_compliance, AccountMetrics};
use propfirm_tracker::Config;
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};

use super::import::print_compliance;
use super::{date_or_today, parse_date};

pub struct EvaluateArgs {
    pub total_profit: f64,
    pub drawdown: f64,
    pub trading_days: u32,
    pub daily_pnl: f64,
    pub started: Option<String>,
    pub as_of: Option<String>,
    pub program: Option<String>,
    pub config: Option<PathBuf>,
    pub json: bool,
}

pub fn run(args: EvaluateArgs) -> Result<()> {
    if !args.total_profit.is_finite() || !args.daily_pnl.is_finite() {
        bail!("profit figures must be finite numbers");
    }
    if !args.drawdown.is_finite() || args.drawdown < 0.0 {
        bail!("--drawdown must be a non-negative amount, got {}", args.drawdown);
    }

    let config = Config::load(args.config.as_deref())?;
    let rules = config.program(args.program.as_deref())?;
    info!("Evaluating against program: {}", rules.name);

    let as_of = date_or_today(args.as_of.as_deref(), "as-of")?;
    let started = match args.started.as_deref() {
        Some(value) => parse_date(value, "started")?,
        None => as_of,
    };

    let metrics = AccountMetrics {
        total_profit: args.total_profit,
        drawdown: args.drawdown,
        trading_days: args.trading_days,
        ..AccountMetrics::initial(rules, started)
    };

    let state = evaluate_compliance(&metrics, rules, args.daily_pnl, as_of);
    let broken = breaches(&state, rules);
    for breach in &broken {
        warn!("{}: {}", rules.name, breach);
    }

    if args.json {
        let output = json!({
            "program": rules,
            "compliance": state,
            "breaches": broken,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_compliance(&rules.name, &state, &broken);
    }

    info!("Evaluation completed: {}", state.status);
    Ok(())
}
