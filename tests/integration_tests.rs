//! Integration tests for the prop firm tracker
//!
//! These tests verify that import, aggregation, evaluation and the account
//! store work together correctly.

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};

use propfirm_tracker::compliance::{breaches, Breach};
use propfirm_tracker::daily_pnl::DailyPnLTable;
use propfirm_tracker::reports::PortfolioReport;
use propfirm_tracker::store::{AccountForm, AccountStore};
use propfirm_tracker::{
    evaluate_compliance, normalize, parse_trade_history, summarize, AccountMetrics, AccountStatus,
    Config, Dialect, ParseError, ProgramRules, StoreError, TradeRecord,
};

// =============================================================================
// Test Utilities
// =============================================================================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Deterministic trade sequence with mixed wins, losses and repeated days
fn generate_trades(count: usize, seed: u64) -> Vec<TradeRecord> {
    let mut state = seed;
    let start = date(2024, 1, 2);

    (0..count)
        .map(|i| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let profit = ((state >> 33) % 2_001) as f64 - 1_000.0;
            let day = (i / 3) as i64;
            TradeRecord::new(start + Duration::days(day), profit, i + 1)
        })
        .collect()
}

fn trade_log_csv(rows: &[(&str, &str)]) -> String {
    let mut csv = String::from("Profit,Entry Time\n");
    for (profit, when) in rows {
        csv.push_str(&format!("{},{}\n", profit, when));
    }
    csv
}

fn evaluation_rules() -> ProgramRules {
    ProgramRules {
        name: "Test Evaluation".to_string(),
        account_size: 50_000.0,
        profit_target: 3_000.0,
        daily_loss_limit: -2_000.0,
        max_drawdown_limit: -2_000.0,
        minimum_trading_days: 10,
        max_trading_days: 30,
    }
}

const ORDERS_EXPORT: &str = "\
Account Summary
Account,Balance,Currency
DEMO4471,50000,USD

Account,Order ID,B/S,Contract,Status,Avg Fill Price,Filled Qty,Create Time (EDT)
DEMO4471,101,Buy,NQH4,Filled,17850.00,2,01/08/2024 09:31:02
DEMO4471,102,Sell,NQH4,Filled,17860.00,1,01/08/2024 09:45:10
DEMO4471,103,Sell,NQH4,Canceled,17900.00,1,01/08/2024 10:00:00
DEMO4471,104,Sell,NQH4,Filled,17845.00,2,01/09/2024 09:35:00
DEMO4471,105,Buy,NQH4,Filled,17840.00,1,01/09/2024 11:12:45
";

// =============================================================================
// Aggregation Properties
// =============================================================================

#[test]
fn test_win_rate_and_drawdown_bounds() {
    for seed in 1..=25 {
        let trades = generate_trades(40, seed);
        let summary = summarize(&trades).unwrap();

        assert!((0.0..=100.0).contains(&summary.win_rate));
        assert!(summary.max_drawdown >= 0.0);
        assert!(summary.trading_days as usize <= trades.len());

        let distinct = trades
            .iter()
            .map(|t| t.entry_date)
            .collect::<std::collections::HashSet<_>>()
            .len();
        assert!(summary.trading_days as usize <= distinct);
    }
}

#[test]
fn test_zero_drawdown_iff_curve_never_falls() {
    for seed in 1..=25 {
        let trades = generate_trades(12, seed);
        let summary = summarize(&trades).unwrap();

        let mut running = 0.0;
        let mut peak = 0.0_f64;
        let mut never_falls = true;
        for t in &trades {
            running += t.profit;
            if running < peak {
                never_falls = false;
            }
            peak = peak.max(running);
        }

        assert_eq!(summary.max_drawdown == 0.0, never_falls, "seed {}", seed);
    }

    let rising: Vec<TradeRecord> = (0..5)
        .map(|i| TradeRecord::new(date(2024, 1, 2 + i), 10.0, i as usize + 1))
        .collect();
    assert_eq!(summarize(&rising).unwrap().max_drawdown, 0.0);
}

#[test]
fn test_reference_trade_log() {
    let summary = parse_trade_history(
        "profit,entry time\n100,2024-01-05\n-50,2024-01-05\n200,01/06/2024\n",
        None,
    )
    .unwrap();

    assert_eq!(summary.total_profit, 250.0);
    assert_relative_eq!(summary.win_rate, 200.0 / 3.0);
    assert_eq!(summary.trading_days, 2);
    assert_eq!(summary.first_trade_date, date(2024, 1, 5));
    assert_eq!(
        serde_json::to_value(&summary).unwrap()["first_trade_date"],
        "2024-01-05"
    );
}

#[test]
fn test_row_order_does_not_change_summary() {
    let rows = [
        ("100", "2024-01-05"),
        ("-50", "2024-01-06"),
        ("200", "01/07/2024"),
        ("-75", "2024-01-08"),
        ("30", "2024-01-09"),
    ];
    let forward = parse_trade_history(&trade_log_csv(&rows), None).unwrap();

    let mut shuffled = rows;
    shuffled.reverse();
    shuffled.swap(0, 2);
    let reordered = parse_trade_history(&trade_log_csv(&shuffled), None).unwrap();

    assert_eq!(forward, reordered);
}

#[test]
fn test_header_without_rows_is_an_error() {
    let err = parse_trade_history("Profit,Entry Time\n", None).unwrap_err();
    assert!(matches!(err, ParseError::NoDataRows));

    let err = parse_trade_history("Profit,Entry Time\n\n\n", Some(Dialect::TradeLog)).unwrap_err();
    assert!(matches!(err, ParseError::NoDataRows));
}

#[test]
fn test_quoted_amounts_and_accounting_negatives() {
    let raw = "Trade #,Profit,Entry Time,Strategy\n1,\"$1,250.50\",01/05/2024 9:30:00 AM,ORB\n2,($50.25),2024-01-05,ORB\n";
    let summary = parse_trade_history(raw, None).unwrap();
    assert_relative_eq!(summary.total_profit, 1_200.25);
    assert_eq!(summary.strategy_tag.as_deref(), Some("ORB"));
    assert_eq!(summary.losing_trades, 1);
}

#[test]
fn test_invalid_calendar_date_is_rejected() {
    let err = parse_trade_history(&trade_log_csv(&[("10", "02/30/2024")]), None).unwrap_err();
    match err {
        ParseError::InvalidDate { row, value } => {
            assert_eq!(row, 1);
            assert_eq!(value, "02/30/2024");
        }
        other => panic!("unexpected error: {}", other),
    }
}

// =============================================================================
// Orders Export
// =============================================================================

#[test]
fn test_orders_export_end_to_end() {
    assert_eq!(Dialect::detect(ORDERS_EXPORT), Some(Dialect::CompletedOrders));

    let trades = normalize(ORDERS_EXPORT, None).unwrap();
    let profits: Vec<f64> = trades.iter().map(|t| t.profit).collect();
    // +1 @ 10 pts, then close 1 @ -5 pts and reverse short 1, then cover @ +5 pts
    assert_eq!(profits, vec![200.0, -100.0, 100.0]);

    let summary = summarize(&trades).unwrap();
    assert_eq!(summary.total_profit, 200.0);
    assert_eq!(summary.trading_days, 2);
    assert_eq!(summary.first_trade_date, date(2024, 1, 8));
    assert_eq!(summary.last_trade_date, date(2024, 1, 9));
    assert_eq!(summary.max_drawdown, 100.0);

    let table = DailyPnLTable::from_trades(&trades);
    assert_eq!(table.get(date(2024, 1, 8)).unwrap().net_pnl, 200.0);
    assert_eq!(table.get(date(2024, 1, 9)).unwrap().net_pnl, 0.0);
}

#[test]
fn test_orders_without_fills_is_an_error() {
    let raw = "Account,Status,Buy/Sell,Avg Fill Price,Qty To Fill,Create Time (EDT)\n\
               DEMO,Canceled,Buy,100,1,01/05/2024\n\
               DEMO,Working,Sell,101,1,01/05/2024\n";
    let err = parse_trade_history(raw, None).unwrap_err();
    assert!(err.to_string().contains("no valid filled trades"));
}

// =============================================================================
// Compliance
// =============================================================================

#[test]
fn test_daily_loss_takes_precedence_over_target() {
    let rules = evaluation_rules();
    let metrics = AccountMetrics {
        total_profit: 3_000.0,
        drawdown: 100.0,
        trading_days: 10,
        ..AccountMetrics::initial(&rules, date(2024, 1, 2))
    };

    let failed = evaluate_compliance(&metrics, &rules, -2_500.0, date(2024, 1, 20));
    assert_eq!(failed.status, AccountStatus::Failed);
    assert_eq!(breaches(&failed, &rules), vec![Breach::DailyLossLimit]);

    let passed = evaluate_compliance(&metrics, &rules, 0.0, date(2024, 1, 20));
    assert_eq!(passed.status, AccountStatus::Passed);
    assert_eq!(passed.completed_trading_days, 10);
}

#[test]
fn test_evaluation_is_deterministic() {
    let rules = ProgramRules::evaluation_100k();
    let metrics = AccountMetrics {
        total_profit: 2_500.0,
        drawdown: 900.0,
        trading_days: 6,
        ..AccountMetrics::initial(&rules, date(2024, 3, 1))
    };

    let a = evaluate_compliance(&metrics, &rules, -300.0, date(2024, 3, 15));
    let b = evaluate_compliance(&metrics, &rules, -300.0, date(2024, 3, 15));
    assert_eq!(a, b);
    assert_eq!(a.days_remaining, 16);
    assert_relative_eq!(a.current_progress, 2_500.0 / 6_000.0 * 100.0);
}

#[test]
fn test_default_config_programs_are_valid() {
    let config = Config::default().validated().unwrap();
    for (key, rules) in &config.programs {
        assert!(rules.validate().is_ok(), "program {} invalid", key);
    }
}

// =============================================================================
// Account Store
// =============================================================================

#[test]
fn test_store_import_is_atomic() {
    let mut store = AccountStore::new();
    let id = store.add_account(AccountForm {
        account_name: "Eval #1".to_string(),
        prop_firm: "Topstep".to_string(),
        date_started: Some(date(2024, 1, 1)),
        program: Some(ProgramRules::evaluation_50k()),
        ..Default::default()
    });

    store
        .import_trade_history(id, ORDERS_EXPORT, None, 0.0, date(2024, 1, 9))
        .unwrap();
    let before = store.get(id).unwrap().clone();
    assert_eq!(before.metrics.total_profit, 200.0);
    assert_eq!(before.date_started, date(2024, 1, 8));

    for bad in ["", "Profit,Entry Time\n", "Profit,Entry Time\nabc,2024-01-05\n"] {
        let err = store
            .import_trade_history(id, bad, None, 0.0, date(2024, 1, 9))
            .unwrap_err();
        assert!(matches!(err, StoreError::Parse(_)));
        assert_eq!(store.get(id).unwrap(), &before);
    }
}

#[test]
fn test_independent_accounts_and_report() {
    let mut store = AccountStore::new();
    let as_of = date(2024, 1, 20);

    let winner = store.add_account(AccountForm {
        account_name: "Winner".to_string(),
        prop_firm: "Apex".to_string(),
        program: Some(evaluation_rules()),
        date_started: Some(date(2024, 1, 1)),
        ..Default::default()
    });
    let loser = store.add_account(AccountForm {
        account_name: "Loser".to_string(),
        prop_firm: "Topstep".to_string(),
        program: Some(evaluation_rules()),
        date_started: Some(date(2024, 1, 1)),
        ..Default::default()
    });

    let winning_rows: Vec<(String, String)> = (0..10)
        .map(|i| ("400".to_string(), format!("2024-01-{:02}", i + 2)))
        .collect();
    let winning_rows: Vec<(&str, &str)> = winning_rows
        .iter()
        .map(|(p, d)| (p.as_str(), d.as_str()))
        .collect();

    store
        .import_trade_history(loser, &trade_log_csv(&[("-2500", "2024-01-03")]), None, -2_500.0, as_of)
        .unwrap();
    store
        .import_trade_history(winner, &trade_log_csv(&winning_rows), None, 400.0, as_of)
        .unwrap();

    assert_eq!(store.get(winner).unwrap().status(), AccountStatus::Passed);
    assert_eq!(store.get(loser).unwrap().status(), AccountStatus::Failed);

    // A later winning import cannot revive a failed evaluation
    store
        .import_trade_history(loser, &trade_log_csv(&winning_rows), None, 400.0, as_of)
        .unwrap();
    assert_eq!(store.get(loser).unwrap().status(), AccountStatus::Failed);
    assert_eq!(store.get(loser).unwrap().metrics.total_profit, 4_000.0);

    let report = PortfolioReport::from_accounts(store.accounts());
    assert_eq!(report.account_count, 2);
    assert_eq!(report.passed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.total_profit, 8_000.0);
    assert_eq!(report.prop_firms["Apex"].passed, 1);
    assert_eq!(report.prop_firms["Topstep"].failed, 1);
    assert_relative_eq!(report.avg_progress, 100.0);
}
