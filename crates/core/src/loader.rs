use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{LedgerError, Result};
use crate::normalize::normalize_field;
use crate::record::{Record, RecordSet, Snapshot, SnapshotIdentity, YEAR_LABEL_FIELD};
use crate::workbook::{SheetTable, SpreadsheetWorkbook, WorkbookSource};

static ELIGIBLE_SHEET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}년").expect("static regex"));

const YEAR_LABEL_SUFFIX: &str = "년도신청자";

/// Something a full record set can be (re)loaded from.
pub trait RecordSource: Send + Sync {
    /// Where the records come from, for messages.
    fn location(&self) -> PathBuf;

    /// Current modification identity of the source.
    fn identity(&self) -> Result<SnapshotIdentity>;

    /// Reads the whole source. An empty record set is a successful load.
    fn load(&self) -> Result<Snapshot>;
}

/// The ledger workbook on disk.
#[derive(Debug, Clone)]
pub struct SpreadsheetSource {
    path: PathBuf,
}

impl SpreadsheetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for SpreadsheetSource {
    fn location(&self) -> PathBuf {
        self.path.clone()
    }

    fn identity(&self) -> Result<SnapshotIdentity> {
        let metadata = fs::metadata(&self.path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                LedgerError::SourceMissing(self.path.clone())
            } else {
                LedgerError::Io(err)
            }
        })?;
        Ok(SnapshotIdentity::new(metadata.modified()?))
    }

    fn load(&self) -> Result<Snapshot> {
        // Taken before reading so a write racing the read shows up as a
        // changed identity on the next poll.
        let identity = self.identity()?;
        let mut workbook = SpreadsheetWorkbook::open(&self.path)?;
        let records = load_workbook(&mut workbook);
        Ok(Snapshot { records, identity })
    }
}

/// Whether a sheet name starts with a four digit year followed by `년`.
pub fn is_eligible_sheet(name: &str) -> bool {
    ELIGIBLE_SHEET.is_match(name)
}

/// `"2025년신청"` becomes `"25년도신청자"`.
pub fn year_label(sheet_name: &str) -> Option<String> {
    if !is_eligible_sheet(sheet_name) {
        return None;
    }
    let year: String = sheet_name.chars().take(4).collect();
    Some(format!("{}{}", &year[2..], YEAR_LABEL_SUFFIX))
}

/// Merges every eligible, non-empty sheet into one record set.
///
/// Sheets that fail to read are skipped with a warning.
pub fn load_workbook<W: WorkbookSource + ?Sized>(workbook: &mut W) -> RecordSet {
    let mut set = RecordSet::new();
    for name in workbook.sheet_names() {
        let Some(label) = year_label(&name) else {
            debug!(sheet = %name, "skipping sheet without year prefix");
            continue;
        };
        let table = match workbook.read_sheet(&name) {
            Ok(table) => table,
            Err(err) => {
                warn!(sheet = %name, error = %err, "skipping unreadable sheet");
                continue;
            }
        };
        let (columns, records) = sheet_records(&name, &label, &table);
        if records.is_empty() {
            debug!(sheet = %name, "skipping sheet without rows");
            continue;
        }
        debug!(sheet = %name, rows = records.len(), "loaded sheet");
        set.append_sheet(&name, &label, columns, records);
    }
    set
}

fn sheet_records(name: &str, label: &str, table: &SheetTable) -> (Vec<String>, Vec<Record>) {
    let header = clean_header(table.header());
    let mut records = Vec::new();
    for row in table.data_rows() {
        if row.iter().all(Option::is_none) {
            continue;
        }
        let mut record = Record::new(name, label);
        for (column, cell) in header.iter().zip(row.iter()) {
            if column == YEAR_LABEL_FIELD {
                continue;
            }
            if let Some(value) = cell {
                record.insert(column.clone(), normalize_field(column, value));
            }
        }
        records.push(record);
    }
    let columns = header
        .into_iter()
        .filter(|column| column != YEAR_LABEL_FIELD)
        .collect();
    (columns, records)
}

/// Trims header names, names blank ones `Unnamed: <index>` and suffixes
/// repeats with `.1`, `.2`, ...
pub fn clean_header(header: &[Option<String>]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let base = match cell.as_deref().map(str::trim) {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => format!("Unnamed: {}", idx),
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}
