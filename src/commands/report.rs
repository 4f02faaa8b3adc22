//! Report command implementation

use anyhow::{Context, Result};
use chrono::NaiveDate;
use propfirm_tracker::reports::PortfolioReport;
use propfirm_tracker::store::{AccountForm, StrategyFile};
use propfirm_tracker::{
    parse_trade_history, AccountMetricsSummary, AccountStore, Config, Dialect, Platform,
};
use rayon::prelude::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::date_or_today;

/// One account in the manifest
#[derive(Debug, Deserialize)]
struct ManifestEntry {
    account_name: String,
    prop_firm: String,
    #[serde(default)]
    platform: Option<String>,
    #[serde(default)]
    login: String,
    #[serde(default)]
    server: String,
    #[serde(default)]
    strategy: String,
    /// Strategy source file attached to the account
    #[serde(default)]
    strategy_file: Option<PathBuf>,
    #[serde(default)]
    date_started: Option<NaiveDate>,
    /// Program key; accounts without one only track progress
    #[serde(default)]
    program: Option<String>,
    /// Trade-history export, relative to the manifest
    trades: Option<PathBuf>,
    #[serde(default)]
    dialect: Option<String>,
    #[serde(default)]
    daily_pnl: f64,
}

pub fn run(
    manifest_path: PathBuf,
    config_path: Option<PathBuf>,
    as_of: Option<String>,
    json: bool,
) -> Result<()> {
    info!("Building report from manifest: {}", manifest_path.display());

    let config = Config::load(config_path.as_deref())?;
    let as_of = date_or_today(as_of.as_deref(), "as-of")?;

    let contents = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("Failed to read manifest {}", manifest_path.display()))?;
    let entries: Vec<ManifestEntry> =
        serde_json::from_str(&contents).context("Failed to parse manifest JSON")?;
    let base_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));

    let mut store = AccountStore::new();
    let mut ids = Vec::with_capacity(entries.len());
    for entry in &entries {
        let form = account_form(entry, &config, base_dir)?;
        ids.push(store.add_account(form));
    }
    info!("Registered {} accounts", store.len());

    // Read and parse every export in parallel
    let parsed: Vec<_> = entries
        .par_iter()
        .map(|entry| -> Option<Result<_>> {
            let path = base_dir.join(entry.trades.as_ref()?);
            Some(load_summary(&path, entry.dialect.as_deref()))
        })
        .collect();

    // Apply sequentially, in manifest order
    let mut failed = 0usize;
    for ((entry, id), result) in entries.iter().zip(&ids).zip(parsed) {
        match result {
            None => debug!("{} has no trade history", entry.account_name),
            Some(Ok(summary)) => {
                store.record_summary(*id, summary, entry.daily_pnl, as_of)?;
            }
            Some(Err(e)) => {
                failed += 1;
                warn!("Import failed for {}: {:#}", entry.account_name, e);
            }
        }
    }
    if failed > 0 {
        warn!("{} of {} imports failed", failed, entries.len());
    }

    let report = PortfolioReport::from_accounts(store.accounts());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.render());
    }

    info!("Report completed successfully");
    Ok(())
}

fn account_form(entry: &ManifestEntry, config: &Config, base_dir: &Path) -> Result<AccountForm> {
    let platform = match entry.platform.as_deref() {
        Some(name) => name.parse::<Platform>().map_err(anyhow::Error::msg)?,
        None => Platform::default(),
    };

    let program = match entry.program.as_deref() {
        Some(key) => Some(config.program(Some(key))?.clone()),
        None => None,
    };

    let strategy_file = match &entry.strategy_file {
        Some(path) => {
            let path = base_dir.join(path);
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read strategy file {}", path.display()))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Some(StrategyFile { name, content })
        }
        None => None,
    };

    Ok(AccountForm {
        account_name: entry.account_name.clone(),
        prop_firm: entry.prop_firm.clone(),
        platform,
        login: entry.login.clone(),
        server: entry.server.clone(),
        strategy: entry.strategy.clone(),
        strategy_file,
        date_started: entry.date_started,
        program,
    })
}

fn load_summary(path: &Path, dialect: Option<&str>) -> Result<AccountMetricsSummary> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let hint = dialect.map(str::parse::<Dialect>).transpose()?;
    let summary = parse_trade_history(&raw, hint)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    debug!("Parsed {} trades from {}", summary.total_trades, path.display());
    Ok(summary)
}
