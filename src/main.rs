//! Tharseo grid trading engine - main entry point
//!
//! Subcommands:
//! - run: reconciliation loop at the configured interval
//! - start: one manual grid engine pass
//! - check: one manual reconciliation tick
//! - cancel: cancel all of a user's open orders
//! - order: place a direct market order

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "tharseo")]
#[command(about = "Automated grid trading engine with paired-order reconciliation", long_about = None)]
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
    /// Run the reconciliation loop (Ctrl-C to stop)
    Run {
        /// Path to configuration file
        #[arg(short, long, default_value = "configs/engine.json")]
        config: String,

        /// Override the reconciliation interval in seconds
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Run one grid engine pass over all active tradeflows
    Start {
        /// Path to configuration file
        #[arg(short, long, default_value = "configs/engine.json")]
        config: String,
    },

    /// Run one reconciliation tick
    Check {
        /// Path to configuration file
        #[arg(short, long, default_value = "configs/engine.json")]
        config: String,
    },

    /// Cancel all of a user's open orders
    Cancel {
        /// Path to configuration file
        #[arg(short, long, default_value = "configs/engine.json")]
        config: String,

        /// User id
        #[arg(long)]
        user: i64,
    },

    /// Place a direct market order
    Order {
        /// Path to configuration file
        #[arg(short, long, default_value = "configs/engine.json")]
        config: String,

        /// User id
        #[arg(long)]
        user: i64,

        /// Asset id
        #[arg(long)]
        asset: i64,

        /// Order side (BUY or SELL)
        #[arg(long)]
        side: String,

        /// Order quantity
        #[arg(long)]
        quantity: String,
    },
}

fn setup_logging(verbose: bool, command_name: &str) -> Result<()> {
    std::fs::create_dir_all("logs")?;

    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    // Filter out noisy HTTP crates
    let level = if verbose { "debug" } else { "info" };
    let filter_str = format!(
        "{},hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn,h2=warn",
        level
    );
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true);

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

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let command_name = match &cli.command {
        Commands::Run { .. } => "run",
        Commands::Start { .. } => "start",
        Commands::Check { .. } => "check",
        Commands::Cancel { .. } => "cancel",
        Commands::Order { .. } => "order",
    };

    setup_logging(cli.verbose, command_name)?;

    match cli.command {
        Commands::Run { config, interval } => commands::run::run(config, interval),

        Commands::Start { config } => commands::start::run(config),

        Commands::Check { config } => commands::check::run(config),

        Commands::Cancel { config, user } => commands::cancel::run(config, user),

        Commands::Order {
            config,
            user,
            asset,
            side,
            quantity,
        } => commands::order::run(config, user, asset, side, quantity),
    }
}
