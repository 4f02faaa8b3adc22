//! Per-trade export (one row per completed trade), as written by
//! NinjaTrader-style trade performance reports.

use super::fields::{cell, header_names, parse_amount, parse_trade_date, read_table, significant_lines};
use super::DialectParser;
use crate::error::ParseError;
use crate::TradeRecord;

const PROFIT_COLUMNS: &[&str] = &["profit", "net profit"];
const DATE_COLUMNS: &[&str] = &["entry time", "date"];
const CUM_PROFIT_COLUMNS: &[&str] = &["cum. net profit", "cumulative net profit"];
const MAE_COLUMNS: &[&str] = &["mae", "max adverse excursion"];
const STRATEGY_COLUMNS: &[&str] = &["strategy"];

/// Dialect A parser
pub struct TradeLogParser;

impl DialectParser for TradeLogParser {
    fn name(&self) -> &'static str {
        "trade log"
    }

    fn matches(&self, raw: &str) -> bool {
        let Some(header) = significant_lines(raw).into_iter().next() else {
            return false;
        };
        header_names(header)
            .map(|columns| {
                columns.find(PROFIT_COLUMNS).is_some() && columns.find(DATE_COLUMNS).is_some()
            })
            .unwrap_or(false)
    }

    fn parse(&self, raw: &str) -> Result<Vec<TradeRecord>, ParseError> {
        let lines = significant_lines(raw);
        match lines.len() {
            0 => return Err(ParseError::EmptyInput),
            1 => return Err(ParseError::NoDataRows),
            _ => {}
        }

        let (columns, records) = read_table(&lines)?;

        let profit_idx = columns.find(PROFIT_COLUMNS);
        let date_idx = columns.find(DATE_COLUMNS);
        let (profit_idx, date_idx) = match (profit_idx, date_idx) {
            (Some(p), Some(d)) => (p, d),
            _ => {
                let mut missing = Vec::new();
                if profit_idx.is_none() {
                    missing.push("profit");
                }
                if date_idx.is_none() {
                    missing.push("entry time");
                }
                return Err(ParseError::MissingColumns {
                    dialect: self.name(),
                    missing,
                });
            }
        };
        let cum_profit_idx = columns.find(CUM_PROFIT_COLUMNS);
        let mae_idx = columns.find(MAE_COLUMNS);
        let strategy_idx = columns.find(STRATEGY_COLUMNS);

        let mut trades = Vec::with_capacity(records.len());

        for (i, record) in records.iter().enumerate() {
            let row = i + 1;

            let profit_str = cell(record, profit_idx);
            let profit = parse_amount(profit_str).ok_or_else(|| ParseError::InvalidNumber {
                row,
                column: "profit",
                value: profit_str.to_string(),
            })?;

            let date_str = cell(record, date_idx);
            let entry_date = parse_trade_date(date_str).ok_or_else(|| ParseError::InvalidDate {
                row,
                value: date_str.to_string(),
            })?;

            // Optional columns fall back to zero when the cell is unreadable
            let optional = |idx: Option<usize>| idx.map(|i| parse_amount(cell(record, i)).unwrap_or(0.0));

            let strategy = strategy_idx
                .map(|i| cell(record, i))
                .filter(|s| !s.is_empty())
                .map(str::to_string);

            let mut trade = TradeRecord::new(entry_date, profit, row).with_strategy_tag(strategy);
            trade.cumulative_profit = optional(cum_profit_idx);
            trade.mae = optional(mae_idx);
            trades.push(trade);
        }

        if trades.is_empty() {
            return Err(ParseError::NoDataRows);
        }

        Ok(trades)
    }
}
