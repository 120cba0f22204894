mod app;
mod cli;
mod config;
mod logging;
mod render;

use std::io;
use std::sync::Arc;

use anyhow::Result;
use bookdoum_core::Watcher;
use clap::Parser;

use crate::cli::{Cli, Command};
use crate::config::SearchConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose || logging::env_flag());
    let config = SearchConfig::load(cli.config.as_deref(), cli.source)?;
    let ledger = app::open_ledger(&config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Command::Search {
            field,
            term,
            format,
        } => app::run_search(&ledger.engine(), &config, &field, &term, format, &mut out),
        Command::Interactive { format } => {
            let watcher = Watcher::new(
                Arc::clone(&ledger.source),
                Arc::clone(&ledger.store),
                config.poll_interval(),
            )
            .spawn();
            let stdin = io::stdin();
            let result = app::run_interactive(
                &ledger.engine(),
                &ledger.store,
                &config,
                format,
                stdin.lock(),
                &mut out,
            );
            watcher.stop();
            result
        }
        Command::Fields => app::run_fields(&ledger.store, &config, &mut out),
        Command::Inspect => app::run_inspect(&ledger.store, &config.source_path, &mut out),
    }
}
