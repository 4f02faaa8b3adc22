//! Metrics Aggregator
//!
//! Reduces a normalized trade list to an [`AccountMetricsSummary`].

use std::collections::HashSet;

use crate::error::ParseError;
use crate::normalizer::{self, Dialect};
use crate::{AccountMetricsSummary, TradeRecord};

/// Parse an export and summarize it in one call
pub fn parse_trade_history(
    raw: &str,
    hint: Option<Dialect>,
) -> Result<AccountMetricsSummary, ParseError> {
    let trades = normalizer::normalize(raw, hint)?;
    summarize(&trades)
}

/// Summarize trades already in chronological order.
///
/// Drawdown is measured on the running cumulative-profit curve starting
/// from zero, in currency units.
pub fn summarize(trades: &[TradeRecord]) -> Result<AccountMetricsSummary, ParseError> {
    let dates = trades.iter().map(|t| t.entry_date);
    let (first_trade_date, last_trade_date) = match (dates.clone().min(), dates.max()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(ParseError::NoTrades),
    };

    let total_profit: f64 = trades.iter().map(|t| t.profit).sum();

    let winning_trades: Vec<&TradeRecord> = trades.iter().filter(|t| t.is_win()).collect();
    let losing_trades: Vec<&TradeRecord> = trades.iter().filter(|t| !t.is_win()).collect();

    let win_rate = (winning_trades.len() as f64 / trades.len() as f64) * 100.0;

    let gross_profits: f64 = winning_trades.iter().map(|t| t.profit).sum();
    let gross_losses: f64 = losing_trades.iter().map(|t| t.profit.abs()).sum();

    let profit_factor = if gross_losses > 0.0 {
        Some(gross_profits / gross_losses)
    } else {
        None
    };

    let avg_win = if !winning_trades.is_empty() {
        gross_profits / winning_trades.len() as f64
    } else {
        0.0
    };

    let avg_loss = if !losing_trades.is_empty() {
        gross_losses / losing_trades.len() as f64
    } else {
        0.0
    };

    let largest_win = winning_trades.iter().map(|t| t.profit).fold(0.0, f64::max);
    let largest_loss = losing_trades.iter().map(|t| t.profit).fold(0.0, f64::min);

    // Single left-to-right pass; the running peak makes this inherently sequential
    let mut peak = 0.0_f64;
    let mut running = 0.0_f64;
    let mut max_drawdown = 0.0_f64;

    for trade in trades {
        running += trade.profit;
        peak = peak.max(running);
        max_drawdown = max_drawdown.max(peak - running);
    }

    let trading_days = trades
        .iter()
        .map(|t| t.entry_date)
        .collect::<HashSet<_>>()
        .len() as u32;

    // First tag in file order, not date order
    let strategy_tag = trades
        .iter()
        .filter(|t| t.strategy_tag.as_deref().is_some_and(|s| !s.trim().is_empty()))
        .min_by_key(|t| t.row)
        .and_then(|t| t.strategy_tag.clone());

    let max_adverse_excursion = trades
        .iter()
        .filter_map(|t| t.mae)
        .map(f64::abs)
        .reduce(f64::max);

    Ok(AccountMetricsSummary {
        total_profit,
        win_rate,
        max_drawdown,
        trading_days,
        first_trade_date,
        last_trade_date,
        strategy_tag,
        total_trades: trades.len(),
        winning_trades: winning_trades.len(),
        losing_trades: losing_trades.len(),
        avg_win,
        avg_loss,
        largest_win,
        largest_loss,
        profit_factor,
        max_adverse_excursion,
    })
}
