use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use bookdoum_core::{load_initial, QueryEngine, QueryError, RecordStore, SpreadsheetSource};
use tracing::info;

use crate::config::SearchConfig;
use crate::render::{no_results_message, render_result, OutputFormat};

const PROMPT: &str = "검색> ";

/// Workbook source and the store it was loaded into.
pub struct Ledger {
    pub source: Arc<SpreadsheetSource>,
    pub store: Arc<RecordStore>,
}

impl Ledger {
    pub fn engine(&self) -> QueryEngine {
        QueryEngine::new(Arc::clone(&self.store))
    }
}

/// Eager startup load. A missing workbook or one without any usable year
/// sheet ends the program.
pub fn open_ledger(config: &SearchConfig) -> Result<Ledger> {
    let source = Arc::new(SpreadsheetSource::new(&config.source_path));
    let store = Arc::new(RecordStore::new());
    let snapshot = load_initial(source.as_ref(), &store)
        .with_context(|| format!("cannot load ledger {}", config.source_path.display()))?;
    info!(
        path = %config.source_path.display(),
        rows = snapshot.records.len(),
        sheets = snapshot.records.sheets().len(),
        "ledger loaded"
    );
    Ok(Ledger { source, store })
}

/// One-shot search. Request errors are returned so the process exits
/// non-zero; zero hits is not an error.
pub fn run_search<W: Write>(
    engine: &QueryEngine,
    config: &SearchConfig,
    field: &str,
    term: &str,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    let result = engine.search(field, term)?;
    if result.is_empty() {
        writeln!(out, "{}", no_results_message(result.term()))?;
        return Ok(());
    }
    let columns = result.display_columns(config.display_columns.as_slice());
    render_result(&result, &columns, format, out)
}

#[derive(Debug, PartialEq, Eq)]
pub enum Request {
    Search { field: String, term: String },
    Fields,
    Status,
    Help,
    Quit,
    Blank,
}

/// Parses one interactive line: `<field> <term>` where the field may also
/// be given as its 1-based position in `categories`, or a `:command`.
pub fn parse_request(line: &str, categories: &[String]) -> Request {
    let line = line.trim();
    match line {
        "" => return Request::Blank,
        ":q" | ":quit" | ":exit" => return Request::Quit,
        ":fields" => return Request::Fields,
        ":status" => return Request::Status,
        ":help" | "?" => return Request::Help,
        _ => {}
    }
    let (field, term) = match line.split_once(char::is_whitespace) {
        Some((field, term)) => (field, term.trim()),
        None => (line, ""),
    };
    let field = match field.parse::<usize>() {
        Ok(index) if index >= 1 && index <= categories.len() => categories[index - 1].clone(),
        _ => field.to_string(),
    };
    Request::Search {
        field,
        term: term.to_string(),
    }
}

/// Reads requests from `input` until EOF or `:quit`. Request errors are
/// printed and the loop goes on.
pub fn run_interactive<R: BufRead, W: Write>(
    engine: &QueryEngine,
    store: &RecordStore,
    config: &SearchConfig,
    format: OutputFormat,
    input: R,
    out: &mut W,
) -> Result<()> {
    write_help(config, out)?;
    write!(out, "{PROMPT}")?;
    out.flush()?;
    for line in input.lines() {
        let line = line.context("failed to read input")?;
        match parse_request(&line, &config.categories) {
            Request::Quit => break,
            Request::Blank => {}
            Request::Help => write_help(config, out)?,
            Request::Fields => run_fields(store, config, out)?,
            Request::Status => write_status(store, out)?,
            Request::Search { field, term } => match engine.search(&field, &term) {
                Ok(result) if result.is_empty() => {
                    writeln!(out, "{}", no_results_message(result.term()))?
                }
                Ok(result) => {
                    let columns = result.display_columns(config.display_columns.as_slice());
                    render_result(&result, &columns, format, out)?;
                }
                Err(QueryError::NotReady) => writeln!(out, "{}", QueryError::NotReady)?,
                Err(err) => writeln!(out, "error: {err}")?,
            },
        }
        write!(out, "{PROMPT}")?;
        out.flush()?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_help<W: Write>(config: &SearchConfig, out: &mut W) -> Result<()> {
    writeln!(out, "enter `<field> <term>`; fields:")?;
    for (idx, field) in config.categories.iter().enumerate() {
        writeln!(out, "  {}. {}", idx + 1, field)?;
    }
    writeln!(out, "commands: :fields :status :help :quit")?;
    Ok(())
}

fn write_status<W: Write>(store: &RecordStore, out: &mut W) -> Result<()> {
    match store.current_with_generation() {
        Some((snapshot, generation)) => writeln!(
            out,
            "snapshot {} ({} rows, generation {})",
            snapshot.identity,
            snapshot.records.len(),
            generation
        )?,
        None => writeln!(out, "{}", QueryError::NotReady)?,
    }
    Ok(())
}

/// Lists the configured categories, marking the ones the ledger lacks, and
/// the full column union.
pub fn run_fields<W: Write>(
    store: &RecordStore,
    config: &SearchConfig,
    out: &mut W,
) -> Result<()> {
    let snapshot = store.get_current().ok_or(QueryError::NotReady)?;
    for (idx, field) in config.categories.iter().enumerate() {
        let marker = if snapshot.records.has_column(field) {
            ""
        } else {
            " (not in ledger)"
        };
        writeln!(out, "{}. {}{}", idx + 1, field, marker)?;
    }
    writeln!(out, "columns: {}", snapshot.records.columns().join(", "))?;
    Ok(())
}

pub fn run_inspect<W: Write>(store: &RecordStore, source: &Path, out: &mut W) -> Result<()> {
    let snapshot = store.get_current().ok_or(QueryError::NotReady)?;
    writeln!(out, "source: {}", source.display())?;
    writeln!(out, "snapshot: {}", snapshot.identity)?;
    writeln!(out, "rows: {}", snapshot.records.len())?;
    for (label, rows) in snapshot.records.rows_per_year() {
        writeln!(out, "  {}: {}", label, rows)?;
    }
    for sheet in snapshot.records.sheets() {
        writeln!(
            out,
            "sheet {}: {} rows, {} columns",
            sheet.name,
            sheet.rows,
            sheet.columns.len()
        )?;
    }
    writeln!(out, "columns: {}", snapshot.records.columns().join(", "))?;
    Ok(())
}
