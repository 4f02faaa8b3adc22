//! Prop firm tracker - main entry point
//!
//! This binary provides four subcommands:
//! - import: Parse a trade-history export and evaluate it
//! - evaluate: Evaluate hand-entered metrics against a program
//! - report: Portfolio report over a manifest of accounts
//! - programs: List configured funding programs

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "propfirm-tracker")]
#[command(about = "Prop firm evaluation tracker: trade-history import, metrics and program compliance", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import a trade-history export and print its metrics
    Import {
        /// Path to the CSV export
        file: PathBuf,

        /// Export layout (trade-log or completed-orders); detected when omitted
        #[arg(short, long)]
        dialect: Option<String>,

        /// Funding program key to evaluate against
        #[arg(short, long)]
        program: Option<String>,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Today's P&L; defaults to the last trading day's net P&L
        #[arg(long, allow_hyphen_values = true)]
        daily_pnl: Option<f64>,

        /// Evaluation start date (YYYY-MM-DD); defaults to the first trade date
        #[arg(long)]
        started: Option<String>,

        /// Evaluation date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        as_of: Option<String>,

        /// Print the per-day P&L table
        #[arg(long)]
        daily: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Evaluate metrics against a funding program
    Evaluate {
        #[arg(long, allow_hyphen_values = true)]
        total_profit: f64,

        /// Max drawdown as a positive currency amount
        #[arg(long)]
        drawdown: f64,

        #[arg(long)]
        trading_days: u32,

        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        daily_pnl: f64,

        /// Evaluation start date (YYYY-MM-DD); defaults to the evaluation date
        #[arg(long)]
        started: Option<String>,

        /// Evaluation date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        as_of: Option<String>,

        #[arg(short, long)]
        program: Option<String>,

        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Portfolio report over the accounts in a manifest
    Report {
        /// JSON array of accounts, each naming a trade-history file
        #[arg(short, long)]
        manifest: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        as_of: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// List configured funding programs
    Programs {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn setup_logging(verbose: bool, command_name: &str, file_only: bool) -> Result<()> {
    // Create logs directory
    std::fs::create_dir_all("logs")?;

    // Create log file with naming pattern: {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    let level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    if file_only {
        // JSON output: keep stdout machine readable
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .init();
    } else {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(true);

        // Same format without ANSI colors
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        info!("Logging initialized");
        info!("Log file: {}", log_path.display());
    }

    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let (command_name, file_only) = match &cli.command {
        Commands::Import { json, .. } => ("import", *json),
        Commands::Evaluate { json, .. } => ("evaluate", *json),
        Commands::Report { json, .. } => ("report", *json),
        Commands::Programs { .. } => ("programs", false),
    };

    setup_logging(cli.verbose, command_name, file_only)?;

    match cli.command {
        Commands::Import {
            file,
            dialect,
            program,
            config,
            daily_pnl,
            started,
            as_of,
            daily,
            json,
        } => commands::import::run(commands::import::ImportArgs {
            file,
            dialect,
            program,
            config,
            daily_pnl,
            started,
            as_of,
            daily,
            json,
        }),

        Commands::Evaluate {
            total_profit,
            drawdown,
            trading_days,
            daily_pnl,
            started,
            as_of,
            program,
            config,
            json,
        } => commands::evaluate::run(commands::evaluate::EvaluateArgs {
            total_profit,
            drawdown,
            trading_days,
            daily_pnl,
            started,
            as_of,
            program,
            config,
            json,
        }),

        Commands::Report {
            manifest,
            config,
            as_of,
            json,
        } => commands::report::run(manifest, config, as_of, json),

        Commands::Programs { config } => commands::programs::run(config),
    }
}
