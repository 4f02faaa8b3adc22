//! Trade Record Normalizer
//!
//! Turns a broker trade-history export into an ordered list of
//! [`TradeRecord`]s. Each supported export layout ("dialect") is a
//! [`DialectParser`] selected by inspecting the header row(s); adding a
//! layout means adding a parser and a [`Dialect`] variant.

pub mod completed_orders;
mod fields;
pub mod trade_log;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::error::ParseError;
use crate::TradeRecord;

pub use completed_orders::{CompletedOrdersParser, POINT_VALUE};
pub use trade_log::TradeLogParser;

/// One export layout: a header-signature predicate plus a parser
pub trait DialectParser: Send + Sync {
    /// Human readable layout name used in error messages
    fn name(&self) -> &'static str;

    /// Whether the header row(s) of `raw` carry this layout's signature
    fn matches(&self, raw: &str) -> bool;

    /// Parse every trade in file order, or fail on the first violation
    fn parse(&self, raw: &str) -> Result<Vec<TradeRecord>, ParseError>;
}

/// The closed set of recognized export layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    /// One row per completed trade with a profit column
    TradeLog,
    /// Multi-section export whose orders block is rebuilt into trades
    CompletedOrders,
}

impl Dialect {
    /// Detection order
    pub const ALL: [Dialect; 2] = [Dialect::TradeLog, Dialect::CompletedOrders];

    pub fn parser(self) -> &'static dyn DialectParser {
        match self {
            Dialect::TradeLog => &TradeLogParser,
            Dialect::CompletedOrders => &CompletedOrdersParser,
        }
    }

    /// First dialect whose header signature matches
    pub fn detect(raw: &str) -> Option<Dialect> {
        Dialect::ALL.into_iter().find(|d| d.parser().matches(raw))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::TradeLog => "trade-log",
            Dialect::CompletedOrders => "completed-orders",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trade-log" | "tradelog" | "a" => Ok(Dialect::TradeLog),
            "completed-orders" | "orders" | "b" => Ok(Dialect::CompletedOrders),
            other => Err(ParseError::UnknownDialect(other.to_string())),
        }
    }
}

/// Normalize raw export text into trades sorted by date.
///
/// With `hint` the named dialect is parsed directly, otherwise the layout
/// is detected from the headers. The sort is stable, so trades on the same
/// day keep their file order.
pub fn normalize(raw: &str, hint: Option<Dialect>) -> Result<Vec<TradeRecord>, ParseError> {
    if raw.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let dialect = match hint {
        Some(dialect) => dialect,
        None => Dialect::detect(raw).ok_or(ParseError::UnrecognizedFormat)?,
    };

    let mut trades = dialect.parser().parse(raw)?;
    if trades.is_empty() {
        return Err(ParseError::NoDataRows);
    }
    trades.sort_by_key(|t| t.entry_date);

    debug!("Normalized {} trades from {} export", trades.len(), dialect);
    Ok(trades)
}
