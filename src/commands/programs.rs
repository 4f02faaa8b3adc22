//! Programs command implementation

use anyhow::Result;
use propfirm_tracker::Config;
use std::path::PathBuf;
use tracing::info;

pub fn run(config_path: Option<PathBuf>) -> Result<()> {
    let config = Config::load(config_path.as_deref())?;
    info!("Loaded {} funding programs", config.programs.len());

    println!("\n{}", "=".repeat(96));
    println!("FUNDING PROGRAMS");
    println!("{}", "=".repeat(96));
    println!(
        "{:<8} │ {:<18} │ {:>10} │ {:>8} │ {:>10} │ {:>10} │ {:>8}",
        "Key", "Name", "Size", "Target", "Daily Loss", "Drawdown", "Days"
    );
    println!("{}", "-".repeat(96));

    for (key, rules) in &config.programs {
        let marker = if *key == config.default_program { "*" } else { "" };
        println!(
            "{:<8} │ {:<18} │ {:>10.0} │ {:>8.0} │ {:>10.0} │ {:>10.0} │ {:>3}-{:<4}",
            format!("{}{}", key, marker),
            rules.name,
            rules.account_size,
            rules.profit_target,
            rules.daily_loss_limit,
            rules.max_drawdown_limit,
            rules.minimum_trading_days,
            rules.max_trading_days
        );
    }

    println!("{}", "=".repeat(96));
    println!("* default program");
    Ok(())
}
