//! Import command implementation

use anyhow::{Context, Result};
use propfirm_tracker::compliance::{breaches, evaluate_compliance, AccountMetrics, Breach};
use propfirm_tracker::daily_pnl::DailyPnLTable;
use propfirm_tracker::{
    normalize, summarize, AccountComplianceState, AccountMetricsSummary, Config, Dialect,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::{date_or_today, parse_date};

pub struct ImportArgs {
    pub file: PathBuf,
    pub dialect: Option<String>,
    pub program: Option<String>,
    pub config: Option<PathBuf>,
    pub daily_pnl: Option<f64>,
    pub started: Option<String>,
    pub as_of: Option<String>,
    pub daily: bool,
    pub json: bool,
}

#[derive(Serialize)]
struct ImportOutput<'a> {
    file: String,
    dialect: Option<Dialect>,
    summary: &'a AccountMetricsSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    daily_pnl: Option<&'a DailyPnLTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    compliance: Option<&'a AccountComplianceState>,
    breaches: Vec<Breach>,
}

pub fn run(args: ImportArgs) -> Result<()> {
    info!("Importing trade history from: {}", args.file.display());

    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let hint = args
        .dialect
        .as_deref()
        .map(str::parse::<Dialect>)
        .transpose()?;
    let dialect = hint.or_else(|| Dialect::detect(&raw));
    match dialect {
        Some(d) if hint.is_some() => info!("Using dialect: {}", d),
        Some(d) => info!("Detected dialect: {}", d),
        None => debug!("No dialect signature matched"),
    }

    let trades = normalize(&raw, hint)
        .with_context(|| format!("Failed to import {}", args.file.display()))?;
    let summary = summarize(&trades)?;
    let table = DailyPnLTable::from_trades(&trades);
    info!(
        "Normalized {} trades over {} trading days",
        summary.total_trades, summary.trading_days
    );

    let mut compliance = None;
    let mut broken = Vec::new();
    let mut program_name = None;

    if args.program.is_some() || args.config.is_some() {
        let config = Config::load(args.config.as_deref())?;
        let rules = config.program(args.program.as_deref())?;

        let started = match args.started.as_deref() {
            Some(value) => parse_date(value, "started")?,
            None => summary.first_trade_date,
        };
        let as_of = date_or_today(args.as_of.as_deref(), "as-of")?;
        let daily_pnl = args
            .daily_pnl
            .unwrap_or_else(|| table.last_day().map_or(0.0, |(_, day)| day.net_pnl));
        debug!("Evaluating with daily P&L {:.2} as of {}", daily_pnl, as_of);

        let metrics = AccountMetrics {
            date_started: started,
            ..AccountMetrics::initial(rules, started).apply_summary(&summary)
        };
        let state = evaluate_compliance(&metrics, rules, daily_pnl, as_of);
        broken = breaches(&state, rules);
        for breach in &broken {
            warn!("{}: {}", rules.name, breach);
        }
        info!("Program {}: {}", rules.name, state.status);

        program_name = Some(rules.name.clone());
        compliance = Some(state);
    }

    if args.json {
        let output = ImportOutput {
            file: args.file.display().to_string(),
            dialect,
            summary: &summary,
            daily_pnl: args.daily.then_some(&table),
            compliance: compliance.as_ref(),
            breaches: broken,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_summary(&summary);

    if args.daily {
        println!("{}", table.render());
    }

    if let (Some(state), Some(name)) = (&compliance, &program_name) {
        print_compliance(name, state, &broken);
    }

    info!("Import completed successfully");
    Ok(())
}

fn print_summary(summary: &AccountMetricsSummary) {
    println!("\n{}", "=".repeat(60));
    println!("TRADE HISTORY SUMMARY");
    println!("{}", "=".repeat(60));
    println!("Period:             {} to {}", summary.first_trade_date, summary.last_trade_date);
    if let Some(tag) = &summary.strategy_tag {
        println!("Strategy:           {}", tag);
    }
    println!("Total Profit:       ${:.2}", summary.total_profit);
    println!("Win Rate:           {:.2}%", summary.win_rate);
    println!("Max Drawdown:       ${:.2}", summary.max_drawdown);
    println!("Trading Days:       {}", summary.trading_days);
    match summary.profit_factor {
        Some(pf) => println!("Profit Factor:      {:.2}", pf),
        None => println!("Profit Factor:      n/a"),
    }
    println!("Total Trades:       {}", summary.total_trades);
    println!("Winning Trades:     {}", summary.winning_trades);
    println!("Losing Trades:      {}", summary.losing_trades);
    println!("Average Win:        ${:.2}", summary.avg_win);
    println!("Average Loss:       ${:.2}", summary.avg_loss);
    println!("Largest Win:        ${:.2}", summary.largest_win);
    println!("Largest Loss:       ${:.2}", summary.largest_loss);
    if let Some(mae) = summary.max_adverse_excursion {
        println!("Max Adverse Exc.:   ${:.2}", mae);
    }
    println!("{}", "=".repeat(60));
}

pub(crate) fn print_compliance(program: &str, state: &AccountComplianceState, broken: &[Breach]) {
    println!("\n{}", "=".repeat(60));
    println!("COMPLIANCE: {}", program);
    println!("{}", "=".repeat(60));
    println!("Status:             {}", state.status);
    println!("Balance:            ${:.2}", state.current_balance);
    println!("High-Water Mark:    ${:.2}", state.high_water_mark);
    println!("Progress:           {:.1}%", state.current_progress);
    println!("To Target:          ${:.2}", state.distance_from_target);
    println!("Daily P&L:          ${:.2}", state.daily_pnl);
    println!("Daily Limit Room:   ${:.2}", state.distance_from_daily_limit);
    println!("Drawdown Room:      ${:.2}", state.distance_from_drawdown);
    println!("Trading Days:       {}", state.completed_trading_days);
    println!("Days Remaining:     {}", state.days_remaining);
    for breach in broken {
        println!("Breach:             {}", breach);
    }
    println!("{}", "=".repeat(60));
}
