//! Error types for trade-history import, program rules and the account store

use thiserror::Error;
use uuid::Uuid;

/// Why a trade-history export could not be turned into trades.
///
/// A parse either yields a complete trade list or one of these; there is no
/// best-effort partial result.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("file appears to be empty")]
    EmptyInput,

    #[error("CSV must contain a header row and at least one trade")]
    NoDataRows,

    #[error("{dialect} export is missing required column(s): {}", .missing.join(", "))]
    MissingColumns {
        dialect: &'static str,
        missing: Vec<&'static str>,
    },

    #[error("row {row}: invalid date format '{value}' (expected MM/DD/YYYY or YYYY-MM-DD)")]
    InvalidDate { row: usize, value: String },

    #[error("row {row}: cannot parse {column} value '{value}'")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("row {row}: unknown buy/sell marker '{value}'")]
    InvalidSide { row: usize, value: String },

    #[error("no section with Account and Status columns found in orders export")]
    NoMatchingSection,

    #[error("no valid filled trades found in orders export")]
    NoFilledTrades,

    #[error("filled orders never close a position, no realized trades")]
    NoClosedTrades,

    #[error("no trades to summarize")]
    NoTrades,

    #[error("unrecognized trade-history format: expected Profit and Entry Time columns, or an orders export with Account and Status columns")]
    UnrecognizedFormat,

    #[error("unknown dialect '{0}' (expected trade-log or completed-orders)")]
    UnknownDialect(String),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// A funding program rule set that cannot be evaluated against
#[derive(Debug, Error, PartialEq)]
pub enum RulesError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("account size must be positive, got {0}")]
    NonPositiveAccountSize(f64),

    #[error("profit target must be positive, got {0}")]
    NonPositiveTarget(f64),

    #[error("{field} must be negative, got {value}")]
    NonNegativeLimit { field: &'static str, value: f64 },

    #[error("max trading days must be at least 1")]
    NoTradingWindow,

    #[error("minimum trading days ({minimum}) exceeds max trading days ({maximum})")]
    MinimumExceedsMaximum { minimum: u32, maximum: u32 },
}

/// Failures of account store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no account with id {0}")]
    UnknownAccount(Uuid),

    #[error("profit target must be a positive number, got {0}")]
    InvalidProfitTarget(f64),

    #[error("failed to parse trade history: {0}")]
    Parse(#[from] ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message_lists_columns() {
        let err = ParseError::MissingColumns {
            dialect: "trade log",
            missing: vec!["profit", "entry time"],
        };
        assert_eq!(
            err.to_string(),
            "trade log export is missing required column(s): profit, entry time"
        );
    }

    #[test]
    fn test_store_error_wraps_parse_error() {
        let err: StoreError = ParseError::NoFilledTrades.into();
        assert!(err.to_string().contains("no valid filled trades"));
    }
}
