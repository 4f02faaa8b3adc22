//! Prop Firm Evaluation Tracker
//!
//! Imports broker trade-history exports, reduces them to performance
//! metrics and evaluates evaluation accounts against funding-program rules
//! (profit target, daily loss limit, max drawdown, trading-day window).
//!
//! The pipeline is `normalizer` → `metrics` → `compliance`, with `store`
//! applying imports to tracked accounts and `reports` summarizing them.

pub mod compliance;
pub mod config;
pub mod daily_pnl;
pub mod error;
pub mod metrics;
pub mod normalizer;
pub mod reports;
pub mod store;
pub mod types;

pub use compliance::{
    check_status, evaluate_compliance, AccountComplianceState, AccountMetrics, ProgramRules,
};
pub use config::Config;
pub use error::{ParseError, RulesError, StoreError};
pub use metrics::{parse_trade_history, summarize};
pub use normalizer::{normalize, Dialect};
pub use store::AccountStore;
pub use types::*;
