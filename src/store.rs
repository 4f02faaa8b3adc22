// Account Store
// In-memory registry of evaluation accounts
//
// Holds every tracked account together with its latest imported metrics
// and compliance state. Trade-history imports are applied atomically.

use chrono::NaiveDate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::compliance::{evaluate_compliance, progress_percent, AccountComplianceState, AccountMetrics, ProgramRules};
use crate::error::StoreError;
use crate::metrics::parse_trade_history;
use crate::normalizer::Dialect;
use crate::{AccountMetricsSummary, AccountStatus, Platform};

/// Profit target of accounts not bound to a funding program
pub const DEFAULT_PROFIT_TARGET: f64 = 3_000.0;

// =============================================================================
// Data Models
// =============================================================================

/// Strategy source attached to an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyFile {
    pub name: String,
    pub content: String,
}

/// Details supplied when an account is created
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountForm {
    pub account_name: String,
    pub prop_firm: String,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub strategy: String,
    #[serde(default)]
    pub strategy_file: Option<StrategyFile>,
    pub date_started: Option<NaiveDate>,
    #[serde(default)]
    pub program: Option<ProgramRules>,
}

/// Partial update of account details; `None` fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountEdit {
    pub account_name: Option<String>,
    pub prop_firm: Option<String>,
    pub platform: Option<Platform>,
    pub login: Option<String>,
    pub server: Option<String>,
    pub strategy: Option<String>,
    pub strategy_file: Option<StrategyFile>,
    /// Manual status override, applied as-is
    pub status: Option<AccountStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingAccount {
    pub id: Uuid,
    pub account_name: String,
    pub prop_firm: String,
    pub platform: Platform,
    pub login: String,
    pub server: String,
    pub strategy: String,
    pub strategy_file: Option<StrategyFile>,
    pub date_started: NaiveDate,
    pub program: Option<ProgramRules>,
    pub profit_target: f64,
    /// Percent of the profit target reached, in [0, 100]
    pub current_progress: f64,
    pub metrics: AccountMetrics,
    pub summary: Option<AccountMetricsSummary>,
    pub compliance: Option<AccountComplianceState>,
}

impl TradingAccount {
    fn from_form(form: AccountForm, today: NaiveDate) -> Self {
        let date_started = form.date_started.unwrap_or(today);
        let (profit_target, metrics) = match &form.program {
            Some(rules) => (rules.profit_target, AccountMetrics::initial(rules, date_started)),
            None => (DEFAULT_PROFIT_TARGET, AccountMetrics::with_balance(0.0, date_started)),
        };

        Self {
            id: Uuid::new_v4(),
            account_name: form.account_name,
            prop_firm: form.prop_firm,
            platform: form.platform,
            login: form.login,
            server: form.server,
            strategy: form.strategy,
            strategy_file: form.strategy_file,
            date_started,
            program: form.program,
            profit_target,
            current_progress: 0.0,
            metrics,
            summary: None,
            compliance: None,
        }
    }

    pub fn status(&self) -> AccountStatus {
        self.metrics.status
    }

    pub fn total_profit(&self) -> f64 {
        self.metrics.total_profit
    }
}

/// Distinct values already used across accounts, for form suggestions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormOptions {
    pub prop_firms: Vec<String>,
    pub logins: Vec<String>,
    pub servers: Vec<String>,
    pub strategies: Vec<String>,
}

// =============================================================================
// Store
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountStore {
    accounts: Vec<TradingAccount>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new account in progress; returns its id.
    ///
    /// Without a start date the account starts today.
    pub fn add_account(&mut self, form: AccountForm) -> Uuid {
        let today = chrono::Utc::now().date_naive();
        let account = TradingAccount::from_form(form, today);
        let id = account.id;

        info!(
            "Added account {} ({} / {}) id={}",
            account.account_name, account.prop_firm, account.platform, id
        );
        self.accounts.push(account);
        id
    }

    pub fn get(&self, id: Uuid) -> Option<&TradingAccount> {
        self.accounts.iter().find(|a| a.id == id)
    }

    /// All accounts in insertion order
    pub fn accounts(&self) -> &[TradingAccount] {
        &self.accounts
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn index_of(&self, id: Uuid) -> Result<usize, StoreError> {
        self.accounts
            .iter()
            .position(|a| a.id == id)
            .ok_or(StoreError::UnknownAccount(id))
    }

    /// Edit account details. A status in the edit overrides the evaluated one.
    pub fn update_account(&mut self, id: Uuid, edit: AccountEdit) -> Result<&TradingAccount, StoreError> {
        let index = self.index_of(id)?;
        let account = &mut self.accounts[index];

        if let Some(name) = edit.account_name {
            account.account_name = name;
        }
        if let Some(firm) = edit.prop_firm {
            account.prop_firm = firm;
        }
        if let Some(platform) = edit.platform {
            account.platform = platform;
        }
        if let Some(login) = edit.login {
            account.login = login;
        }
        if let Some(server) = edit.server {
            account.server = server;
        }
        if let Some(strategy) = edit.strategy {
            account.strategy = strategy;
        }
        if let Some(file) = edit.strategy_file {
            account.strategy_file = Some(file);
        }
        if let Some(status) = edit.status {
            if status != account.metrics.status {
                warn!(
                    "Manual status change for {}: {} -> {}",
                    account.account_name, account.metrics.status, status
                );
            }
            account.metrics.status = status;
            if let Some(state) = account.compliance.as_mut() {
                state.status = status;
            }
        }

        debug!("Updated account {}", id);
        Ok(&self.accounts[index])
    }

    /// Change the profit target used for progress.
    ///
    /// Program-bound accounts also carry the new target into their rules,
    /// so the next import evaluates against it.
    pub fn set_profit_target(&mut self, id: Uuid, target: f64) -> Result<&TradingAccount, StoreError> {
        if !target.is_finite() || target <= 0.0 {
            return Err(StoreError::InvalidProfitTarget(target));
        }

        let index = self.index_of(id)?;
        let account = &mut self.accounts[index];

        account.profit_target = target;
        account.current_progress = progress_percent(account.metrics.total_profit, target);
        if let Some(rules) = account.program.as_mut() {
            rules.profit_target = target;
        }
        if let Some(prev) = account.compliance.as_ref() {
            let (daily_pnl, as_of) = (prev.daily_pnl, prev.as_of);
            Self::reevaluate(account, daily_pnl, as_of);
        }

        info!("Profit target of {} set to {:.2}", account.account_name, target);
        Ok(&self.accounts[index])
    }

    /// Parse a trade-history export and apply it to the account.
    ///
    /// Either every figure is replaced or, on any error, the account is left
    /// exactly as it was. Repeated imports replace the previous totals.
    pub fn import_trade_history(
        &mut self,
        id: Uuid,
        raw: &str,
        hint: Option<Dialect>,
        daily_pnl: f64,
        as_of: NaiveDate,
    ) -> Result<&TradingAccount, StoreError> {
        self.index_of(id)?;
        let summary = parse_trade_history(raw, hint)?;
        self.record_summary(id, summary, daily_pnl, as_of)
    }

    /// Apply an already parsed trade history to the account
    pub fn record_summary(
        &mut self,
        id: Uuid,
        summary: AccountMetricsSummary,
        daily_pnl: f64,
        as_of: NaiveDate,
    ) -> Result<&TradingAccount, StoreError> {
        let index = self.index_of(id)?;
        let updated = Self::apply_summary(&self.accounts[index], summary, daily_pnl, as_of);

        let previous = self.accounts[index].status();
        if updated.status() != previous {
            info!(
                "Account {} status: {} -> {}",
                updated.account_name,
                previous,
                updated.status()
            );
        }
        info!(
            "Imported {} trades into {}: profit {:.2}, win rate {:.1}%, {} trading days",
            updated.summary.as_ref().map_or(0, |s| s.total_trades),
            updated.account_name,
            updated.metrics.total_profit,
            updated.metrics.win_rate,
            updated.metrics.trading_days
        );

        self.accounts[index] = updated;
        Ok(&self.accounts[index])
    }

    fn apply_summary(
        current: &TradingAccount,
        summary: AccountMetricsSummary,
        daily_pnl: f64,
        as_of: NaiveDate,
    ) -> TradingAccount {
        let mut updated = current.clone();

        updated.date_started = summary.first_trade_date;
        if updated.strategy.trim().is_empty() {
            if let Some(tag) = &summary.strategy_tag {
                updated.strategy = tag.clone();
            }
        }
        updated.metrics = current.metrics.apply_summary(&summary);

        if updated.program.is_some() {
            Self::reevaluate(&mut updated, daily_pnl, as_of);
        } else {
            updated.current_progress =
                progress_percent(updated.metrics.total_profit, updated.profit_target);
        }

        updated.summary = Some(summary);
        updated
    }

    /// Re-run the program rules and store the resulting compliance state
    fn reevaluate(account: &mut TradingAccount, daily_pnl: f64, as_of: NaiveDate) {
        let Some(rules) = &account.program else {
            return;
        };
        let state = evaluate_compliance(&account.metrics, rules, daily_pnl, as_of);
        account.metrics.high_water_mark = state.high_water_mark;
        account.metrics.status = state.status;
        account.current_progress = state.current_progress;
        account.compliance = Some(state);
    }

    /// Distinct non-empty prop firms, logins, servers and strategies in
    /// first-seen order
    pub fn form_options(&self) -> FormOptions {
        let distinct = |field: fn(&TradingAccount) -> &str| -> Vec<String> {
            self.accounts
                .iter()
                .map(field)
                .filter(|v| !v.trim().is_empty())
                .unique()
                .map(str::to_string)
                .collect()
        };

        FormOptions {
            prop_firms: distinct(|a| a.prop_firm.as_str()),
            logins: distinct(|a| a.login.as_str()),
            servers: distinct(|a| a.server.as_str()),
            strategies: distinct(|a| a.strategy.as_str()),
        }
    }
}
