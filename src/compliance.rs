//! Program Compliance Evaluator
//!
//! Derives risk and progress figures for an evaluation account from its
//! cumulative metrics and the funding program's rules, then classifies the
//! account as in progress, passed or failed.
//!
//! Everything here is a pure function of its inputs: the evaluation date
//! and the day's P&L are passed in by the caller.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::RulesError;
use crate::{AccountMetricsSummary, AccountStatus};

/// Static rule set of one funding program.
///
/// Loss limits are negative currency amounts, e.g. `-2000.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramRules {
    pub name: String,
    pub account_size: f64,
    pub profit_target: f64,
    pub daily_loss_limit: f64,
    pub max_drawdown_limit: f64,
    pub minimum_trading_days: u32,
    pub max_trading_days: u32,
}

impl ProgramRules {
    pub fn evaluation_50k() -> Self {
        Self {
            name: "50K Evaluation".to_string(),
            account_size: 50_000.0,
            profit_target: 3_000.0,
            daily_loss_limit: -1_000.0,
            max_drawdown_limit: -2_000.0,
            minimum_trading_days: 5,
            max_trading_days: 30,
        }
    }

    pub fn evaluation_100k() -> Self {
        Self {
            name: "100K Evaluation".to_string(),
            account_size: 100_000.0,
            profit_target: 6_000.0,
            daily_loss_limit: -2_000.0,
            max_drawdown_limit: -3_000.0,
            minimum_trading_days: 5,
            max_trading_days: 30,
        }
    }

    pub fn evaluation_150k() -> Self {
        Self {
            name: "150K Evaluation".to_string(),
            account_size: 150_000.0,
            profit_target: 9_000.0,
            daily_loss_limit: -3_000.0,
            max_drawdown_limit: -4_500.0,
            minimum_trading_days: 5,
            max_trading_days: 30,
        }
    }

    /// Check that the rule set can be evaluated against
    pub fn validate(&self) -> Result<(), RulesError> {
        for (field, value) in [
            ("account size", self.account_size),
            ("profit target", self.profit_target),
            ("daily loss limit", self.daily_loss_limit),
            ("max drawdown limit", self.max_drawdown_limit),
        ] {
            if !value.is_finite() {
                return Err(RulesError::NotFinite { field });
            }
        }

        if self.account_size <= 0.0 {
            return Err(RulesError::NonPositiveAccountSize(self.account_size));
        }
        if self.profit_target <= 0.0 {
            return Err(RulesError::NonPositiveTarget(self.profit_target));
        }
        if self.daily_loss_limit >= 0.0 {
            return Err(RulesError::NonNegativeLimit {
                field: "daily loss limit",
                value: self.daily_loss_limit,
            });
        }
        if self.max_drawdown_limit >= 0.0 {
            return Err(RulesError::NonNegativeLimit {
                field: "max drawdown limit",
                value: self.max_drawdown_limit,
            });
        }
        if self.max_trading_days == 0 {
            return Err(RulesError::NoTradingWindow);
        }
        if self.minimum_trading_days > self.max_trading_days {
            return Err(RulesError::MinimumExceedsMaximum {
                minimum: self.minimum_trading_days,
                maximum: self.max_trading_days,
            });
        }

        Ok(())
    }
}

impl Default for ProgramRules {
    fn default() -> Self {
        Self::evaluation_50k()
    }
}

/// Cumulative figures an account carries between evaluations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountMetrics {
    pub starting_balance: f64,
    pub total_profit: f64,
    pub win_rate: f64,
    pub drawdown: f64,
    pub trading_days: u32,
    /// Highest balance reached so far
    pub high_water_mark: f64,
    pub date_started: NaiveDate,
    pub status: AccountStatus,
}

impl AccountMetrics {
    /// Fresh metrics for an account enrolled in `rules`
    pub fn initial(rules: &ProgramRules, date_started: NaiveDate) -> Self {
        Self::with_balance(rules.account_size, date_started)
    }

    pub fn with_balance(starting_balance: f64, date_started: NaiveDate) -> Self {
        Self {
            starting_balance,
            total_profit: 0.0,
            win_rate: 0.0,
            drawdown: 0.0,
            trading_days: 0,
            high_water_mark: starting_balance,
            date_started,
            status: AccountStatus::InProgress,
        }
    }

    /// Replace the trade-derived figures with a freshly imported summary.
    ///
    /// Balance history (high-water mark) and status are carried over.
    pub fn apply_summary(&self, summary: &AccountMetricsSummary) -> Self {
        Self {
            total_profit: summary.total_profit,
            win_rate: summary.win_rate,
            drawdown: summary.max_drawdown,
            trading_days: summary.trading_days,
            date_started: summary.first_trade_date,
            ..self.clone()
        }
    }

    pub fn current_balance(&self) -> f64 {
        self.starting_balance + self.total_profit
    }
}

/// Derived risk and progress figures of one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountComplianceState {
    pub current_balance: f64,
    pub high_water_mark: f64,
    pub daily_pnl: f64,
    pub days_remaining: u32,
    pub distance_from_target: f64,
    pub distance_from_daily_limit: f64,
    pub distance_from_drawdown: f64,
    /// Percent of the profit target reached, clamped to [0, 100]
    pub current_progress: f64,
    pub completed_trading_days: u32,
    pub total_profit: f64,
    pub drawdown: f64,
    pub status: AccountStatus,
    /// Date the state was evaluated for
    pub as_of: NaiveDate,
}

/// A rule the account has broken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Breach {
    DailyLossLimit,
    MaxDrawdown,
    OutOfTime,
}

impl fmt::Display for Breach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Breach::DailyLossLimit => f.write_str("daily loss limit reached"),
            Breach::MaxDrawdown => f.write_str("max drawdown limit reached"),
            Breach::OutOfTime => f.write_str("evaluation window ended before target"),
        }
    }
}

/// Percentage of `target` reached by `total_profit`, saturating at 0 and 100
pub fn progress_percent(total_profit: f64, target: f64) -> f64 {
    if target <= 0.0 {
        return 0.0;
    }
    (total_profit / target * 100.0).clamp(0.0, 100.0)
}

/// Recompute every derived figure and the status for one metrics update
pub fn evaluate_compliance(
    metrics: &AccountMetrics,
    rules: &ProgramRules,
    daily_pnl: f64,
    as_of: NaiveDate,
) -> AccountComplianceState {
    let days_elapsed = (as_of - metrics.date_started).num_days().max(0);
    let days_remaining = (i64::from(rules.max_trading_days) - days_elapsed).max(0) as u32;

    let current_balance = metrics.current_balance();
    let high_water_mark = metrics.high_water_mark.max(current_balance);

    let mut state = AccountComplianceState {
        current_balance,
        high_water_mark,
        daily_pnl,
        days_remaining,
        distance_from_target: rules.profit_target - metrics.total_profit,
        distance_from_daily_limit: rules.daily_loss_limit.abs() + daily_pnl,
        distance_from_drawdown: rules.max_drawdown_limit.abs() - metrics.drawdown,
        current_progress: progress_percent(metrics.total_profit, rules.profit_target),
        completed_trading_days: metrics.trading_days.min(rules.max_trading_days),
        total_profit: metrics.total_profit,
        drawdown: metrics.drawdown,
        status: metrics.status,
        as_of,
    };

    let evaluated = check_status(&state, rules);
    state.status = metrics.status.advance(evaluated);

    debug!(
        "Evaluated against {}: progress {:.1}%, {} days left, status {}",
        rules.name, state.current_progress, state.days_remaining, state.status
    );

    state
}

/// Every rule the state currently breaks
pub fn breaches(state: &AccountComplianceState, rules: &ProgramRules) -> Vec<Breach> {
    let mut breaches = Vec::new();

    if state.daily_pnl <= rules.daily_loss_limit {
        breaches.push(Breach::DailyLossLimit);
    }
    if state.drawdown >= rules.max_drawdown_limit.abs() {
        breaches.push(Breach::MaxDrawdown);
    }
    if state.days_remaining == 0 && state.total_profit < rules.profit_target {
        breaches.push(Breach::OutOfTime);
    }

    breaches
}

/// Classify the state. Any breach fails the account even when the profit
/// target has been reached at the same time.
pub fn check_status(state: &AccountComplianceState, rules: &ProgramRules) -> AccountStatus {
    if !breaches(state, rules).is_empty() {
        return AccountStatus::Failed;
    }

    if state.total_profit >= rules.profit_target
        && state.completed_trading_days >= rules.minimum_trading_days
    {
        return AccountStatus::Passed;
    }

    AccountStatus::InProgress
}
