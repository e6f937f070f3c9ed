mod commands;
mod config;
mod models;
mod storage;
mod store;
mod types;

use std::io::stderr;
use std::process::exit;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::commands::Cli;
use crate::config::LedgerConfig;
use crate::models::LedgerError;
use crate::storage::{FileStorage, MemoryStorage};
use crate::store::LedgerStore;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(error) = execute(cli).await {
        match error.downcast_ref::<LedgerError>() {
            Some(ledger_error) => eprintln!("{}", ledger_error.user_message()),
            None => eprintln!("Error: {error:#}")
        }

        exit(1);
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let mut config = LedgerConfig::load(cli.config.as_deref())?;

    if let Some(data) = cli.data {
        config.data_file = data;
    }

    setup_logging(cli.log_level.as_deref(), &config.log_level);

    if cli.in_memory {
        let store = LedgerStore::open(Arc::new(MemoryStorage::new()), &config)?;
        commands::run(&store, cli.command).await
    } else {
        let storage = FileStorage::new(config.data_file.clone());
        debug!("Using ledger file {}", storage.path().display());

        let store = LedgerStore::open(Arc::new(storage), &config)?;
        commands::run(&store, cli.command).await
    }
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" => LevelFilter::OFF,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'warn'", level);
            LevelFilter::WARN
        }
    }
}

fn setup_logging(cli_level: Option<&str>, config_level: &str) {
    //NOTE: An explicit --log-level wins, then RUST_LOG, then the config file
    let filter = match cli_level {
        Some(level) => EnvFilter::default().add_directive(parse_log_level(level).into()),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::default().add_directive(parse_log_level(config_level).into()))
    };

    //NOTE: stdout carries command output (CSV included), so logging goes to stderr
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}
