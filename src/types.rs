//! Core data types shared by the import pipeline, evaluator and store

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order direction in a broker export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

/// One normalized trade, as produced by a dialect parser.
///
/// Only lives for the duration of a single parse-and-aggregate call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Calendar day of the trade (UTC, no time component)
    pub entry_date: NaiveDate,
    /// Signed profit in account currency
    pub profit: f64,
    pub strategy_tag: Option<String>,
    /// 1-based data row in the source export
    pub row: usize,
    /// Cumulative net profit column, when the export carries one
    pub cumulative_profit: Option<f64>,
    /// Max adverse excursion column, when the export carries one
    pub mae: Option<f64>,
}

impl TradeRecord {
    pub fn new(entry_date: NaiveDate, profit: f64, row: usize) -> Self {
        Self {
            entry_date,
            profit,
            strategy_tag: None,
            row,
            cumulative_profit: None,
            mae: None,
        }
    }

    pub fn with_strategy_tag(mut self, tag: Option<String>) -> Self {
        self.strategy_tag = tag;
        self
    }

    pub fn is_win(&self) -> bool {
        self.profit > 0.0
    }
}

/// Summary statistics of one imported trade history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountMetricsSummary {
    pub total_profit: f64,
    /// Percentage of trades with profit > 0, in [0, 100]
    pub win_rate: f64,
    /// Worst peak-to-trough decline of cumulative profit, in currency units
    pub max_drawdown: f64,
    /// Distinct calendar days with at least one trade
    pub trading_days: u32,
    pub first_trade_date: NaiveDate,
    pub last_trade_date: NaiveDate,
    pub strategy_tag: Option<String>,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub avg_win: f64,
    /// Average losing trade as a positive magnitude
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    /// Gross wins over gross losses; `None` without any losing trade
    pub profit_factor: Option<f64>,
    pub max_adverse_excursion: Option<f64>,
}

/// Trading platform an account runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Platform {
    #[default]
    MT4,
    MT5,
    Tradovate,
    Rithmic,
    NinjaTrader,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::MT4,
        Platform::MT5,
        Platform::Tradovate,
        Platform::Rithmic,
        Platform::NinjaTrader,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::MT4 => "MT4",
            Platform::MT5 => "MT5",
            Platform::Tradovate => "Tradovate",
            Platform::Rithmic => "Rithmic",
            Platform::NinjaTrader => "NinjaTrader",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown platform: {}", s))
    }
}

/// Evaluation status of an account.
///
/// `Passed` and `Failed` are terminal: once reached, re-evaluation never
/// moves the account back to `InProgress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AccountStatus {
    #[default]
    InProgress,
    Passed,
    Failed,
}

impl AccountStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, AccountStatus::Passed | AccountStatus::Failed)
    }

    /// Apply a freshly evaluated status on top of the current one
    pub fn advance(self, evaluated: AccountStatus) -> AccountStatus {
        if self.is_terminal() {
            self
        } else {
            evaluated
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountStatus::InProgress => f.write_str("In Progress"),
            AccountStatus::Passed => f.write_str("Passed"),
            AccountStatus::Failed => f.write_str("Failed"),
        }
    }
}

// ============================================================================
// Money Type - Precise Decimal Arithmetic for Monetary Values
// ============================================================================

use rust_decimal::Decimal;
use std::ops::Neg;

/// Money type for precise decimal arithmetic in monetary calculations.
///
/// Wraps `rust_decimal::Decimal` so fill prices such as `18250.25` do not
/// pick up binary floating-point drift while a position is being averaged
/// and realized. Arithmetic is checked: every operation returns `None`
/// instead of overflowing.
///
/// # Example
/// ```
/// use propfirm_tracker::Money;
/// let entry = Money::try_from_f64(18250.25).unwrap();
/// let exit = Money::try_from_f64(18260.75).unwrap();
/// assert_eq!(exit.checked_sub(entry).unwrap().to_f64(), 10.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(#[serde(with = "rust_decimal::serde::str")] Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Convert from f64; `None` when the value is non-finite or outside the
    /// decimal range.
    pub fn try_from_f64(value: f64) -> Option<Self> {
        Decimal::try_from(value).ok().map(Money)
    }

    pub fn to_f64(self) -> f64 {
        use rust_decimal::prelude::ToPrimitive;
        self.0.to_f64().unwrap_or(0.0)
    }

    pub fn from_i64(value: i64) -> Self {
        Money(Decimal::from(value))
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Money)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        self.0.checked_mul(rhs.0).map(Money)
    }

    /// `None` on overflow or a zero divisor
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        self.0.checked_div(rhs.0).map(Money)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}
