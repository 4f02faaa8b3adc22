//! Portfolio report across all tracked accounts

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::store::TradingAccount;
use crate::AccountStatus;

/// Account counts and profit of one prop firm
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropFirmStats {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub in_progress: usize,
    pub total_profit: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReport {
    pub account_count: usize,
    pub total_profit: f64,
    pub avg_win_rate: f64,
    pub avg_drawdown: f64,
    pub avg_progress: f64,
    pub in_progress: usize,
    pub passed: usize,
    pub failed: usize,
    /// Keyed by prop firm name, sorted
    pub prop_firms: BTreeMap<String, PropFirmStats>,
}

impl PortfolioReport {
    /// Aggregate over `accounts`; averages are 0 when there are none
    pub fn from_accounts(accounts: &[TradingAccount]) -> Self {
        let mut report = PortfolioReport {
            account_count: accounts.len(),
            ..Default::default()
        };

        for account in accounts {
            report.total_profit += account.total_profit();

            let firm = report.prop_firms.entry(account.prop_firm.clone()).or_default();
            firm.total += 1;
            firm.total_profit += account.total_profit();

            match account.status() {
                AccountStatus::Passed => {
                    report.passed += 1;
                    firm.passed += 1;
                }
                AccountStatus::Failed => {
                    report.failed += 1;
                    firm.failed += 1;
                }
                AccountStatus::InProgress => {
                    report.in_progress += 1;
                    firm.in_progress += 1;
                }
            }
        }

        if !accounts.is_empty() {
            let n = accounts.len() as f64;
            report.avg_win_rate = accounts.iter().map(|a| a.metrics.win_rate).sum::<f64>() / n;
            report.avg_drawdown = accounts.iter().map(|a| a.metrics.drawdown).sum::<f64>() / n;
            report.avg_progress = accounts.iter().map(|a| a.current_progress).sum::<f64>() / n;
        }

        report
    }

    /// Percentage of finished evaluations that passed
    pub fn pass_rate(&self) -> Option<f64> {
        let finished = self.passed + self.failed;
        if finished == 0 {
            None
        } else {
            Some(self.passed as f64 / finished as f64 * 100.0)
        }
    }

    pub fn render(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("\n{}\n", "=".repeat(60)));
        output.push_str("PORTFOLIO REPORT\n");
        output.push_str(&format!("{}\n", "=".repeat(60)));
        output.push_str(&format!("Accounts:           {}\n", self.account_count));
        output.push_str(&format!("Total Profit:       ${:.2}\n", self.total_profit));
        output.push_str(&format!("Avg Win Rate:       {:.2}%\n", self.avg_win_rate));
        output.push_str(&format!("Avg Drawdown:       ${:.2}\n", self.avg_drawdown));
        output.push_str(&format!("Avg Progress:       {:.1}%\n", self.avg_progress));
        output.push_str(&format!(
            "Status:             {} in progress, {} passed, {} failed\n",
            self.in_progress, self.passed, self.failed
        ));
        if let Some(rate) = self.pass_rate() {
            output.push_str(&format!("Pass Rate:          {:.1}%\n", rate));
        }

        if !self.prop_firms.is_empty() {
            output.push_str(&format!("{}\n", "-".repeat(60)));
            output.push_str(&format!(
                "{:<20} │ {:>5} │ {:>6} │ {:>6} │ {:>12}\n",
                "Prop Firm", "Total", "Passed", "Failed", "Profit"
            ));
            for (name, stats) in &self.prop_firms {
                output.push_str(&format!(
                    "{:<20} │ {:>5} │ {:>6} │ {:>6} │ {:>12.2}\n",
                    name, stats.total, stats.passed, stats.failed, stats.total_profit
                ));
            }
        }

        output.push_str(&format!("{}\n", "=".repeat(60)));
        output
    }
}
