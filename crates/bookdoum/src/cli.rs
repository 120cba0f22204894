use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::render::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "bookdoum", about = "북돋움 관리대장 search")]
pub struct Cli {
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,
    /// YAML config file (defaults to ./bookdoum.yaml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Ledger workbook, overrides the config and BOOKDOUM_SOURCE
    #[arg(long, global = true)]
    pub source: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one search and print the hits
    Search {
        field: String,
        term: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Read `<field> <term>` lines from stdin while watching the workbook
    Interactive {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// List searchable fields and the columns found in the workbook
    Fields,
    /// Summarize the loaded workbook
    Inspect,
}
