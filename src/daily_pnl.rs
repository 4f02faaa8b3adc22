//! Day-by-day P&L breakdown of an imported trade history
//!
//! Prop firm rules are judged per trading day, so this groups the
//! normalized trades by calendar day and renders a compact table.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::TradeRecord;

/// P&L figures for one calendar day
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailyPnL {
    pub net_pnl: f64,
    pub trade_count: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
}

impl DailyPnL {
    fn add_trade(&mut self, trade: &TradeRecord) {
        self.net_pnl += trade.profit;
        self.trade_count += 1;

        if trade.is_win() {
            self.winning_trades += 1;
        } else {
            self.losing_trades += 1;
        }

        self.win_rate = (self.winning_trades as f64 / self.trade_count as f64) * 100.0;
    }
}

/// Trades grouped by calendar day, oldest first
#[derive(Debug, Clone, Default, Serialize)]
pub struct DailyPnLTable {
    days: BTreeMap<NaiveDate, DailyPnL>,
}

impl DailyPnLTable {
    pub fn from_trades(trades: &[TradeRecord]) -> Self {
        let mut days: BTreeMap<NaiveDate, DailyPnL> = BTreeMap::new();

        for trade in trades {
            days.entry(trade.entry_date)
                .or_default()
                .add_trade(trade);
        }

        Self { days }
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DailyPnL> {
        self.days.get(&date)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &DailyPnL)> {
        self.days.iter()
    }

    pub fn total_pnl(&self) -> f64 {
        self.days.values().map(|d| d.net_pnl).sum()
    }

    /// Day with the lowest net P&L
    pub fn worst_day(&self) -> Option<(NaiveDate, &DailyPnL)> {
        self.days
            .iter()
            .min_by(|a, b| a.1.net_pnl.total_cmp(&b.1.net_pnl))
            .map(|(date, pnl)| (*date, pnl))
    }

    /// Most recent trading day
    pub fn last_day(&self) -> Option<(NaiveDate, &DailyPnL)> {
        self.days.iter().next_back().map(|(date, pnl)| (*date, pnl))
    }

    /// Render the table as plain text
    pub fn render(&self) -> String {
        if self.days.is_empty() {
            return "No trades to display daily P&L.".to_string();
        }

        let mut output = String::new();

        output.push_str(&format!("\n{}\n", "=".repeat(64)));
        output.push_str("DAILY P&L\n");
        output.push_str(&format!("{}\n", "=".repeat(64)));
        output.push_str(&format!(
            "{:>10} │ {:>12} │ {:>12} │ {:>6} │ {:>6} │ {:>7}\n",
            "Date", "Net P&L", "Cumulative", "Trades", "Wins", "Win %"
        ));
        output.push_str(&format!("{}\n", "-".repeat(64)));

        let mut cumulative = 0.0;
        for (date, day) in &self.days {
            cumulative += day.net_pnl;
            output.push_str(&format!(
                "{:>10} │ {:>12.2} │ {:>12.2} │ {:>6} │ {:>6} │ {:>6.1}%\n",
                date.format("%Y-%m-%d"),
                day.net_pnl,
                cumulative,
                day.trade_count,
                day.winning_trades,
                day.win_rate
            ));
        }

        output.push_str(&format!("{}\n", "=".repeat(64)));

        let green_days = self.days.values().filter(|d| d.net_pnl > 0.0).count();
        output.push_str(&format!("Total P&L: {:.2}\n", self.total_pnl()));
        output.push_str(&format!(
            "Green Days: {} of {} ({:.1}%)\n",
            green_days,
            self.days.len(),
            (green_days as f64 / self.days.len() as f64) * 100.0
        ));
        if let Some((date, day)) = self.worst_day() {
            output.push_str(&format!("Worst Day: {} ({:.2})\n", date, day.net_pnl));
        }

        output
    }
}
