//! Subcommand implementations

pub mod evaluate;
pub mod import;
pub mod programs;
pub mod report;

use anyhow::{Context, Result};
use chrono::NaiveDate;

/// Parse an optional YYYY-MM-DD argument, defaulting to today
pub(crate) fn date_or_today(value: Option<&str>, flag: &str) -> Result<NaiveDate> {
    match value {
        Some(value) => parse_date(value, flag),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

pub(crate) fn parse_date(value: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid --{} date '{}' (expected YYYY-MM-DD)", flag, value))
}
