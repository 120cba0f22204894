//! Ingestion, normalization and search over the beneficiary ledger workbook.
//!
//! The workbook is read into a [`RecordSet`], published into a
//! [`RecordStore`] and kept fresh by a [`Watcher`]; a [`QueryEngine`]
//! answers substring searches against whatever snapshot is current.

mod error;
mod loader;
mod normalize;
mod query;
mod record;
mod store;
mod watcher;
mod workbook;

pub use error::{LedgerError, QueryError, Result};
pub use loader::{
    clean_header, is_eligible_sheet, load_workbook, year_label, RecordSource, SpreadsheetSource,
};
pub use normalize::{
    normalize_birthdate, normalize_field, normalize_phone, normalize_term, BIRTHDATE_FIELD,
    PHONE_FIELD,
};
pub use query::{
    search_snapshot, QueryEngine, SearchResult, DEFAULT_CATEGORIES, DEFAULT_DISPLAY_COLUMNS,
};
pub use record::{Record, RecordSet, SheetSummary, Snapshot, SnapshotIdentity, YEAR_LABEL_FIELD};
pub use store::RecordStore;
pub use watcher::{
    load_initial, log_outcome, ReloadHook, ReloadOutcome, Watcher, WatcherHandle,
    DEFAULT_POLL_INTERVAL,
};
pub use workbook::{cell_text, MemoryWorkbook, SheetTable, SpreadsheetWorkbook, WorkbookSource};
