//! Spreadsheet access behind a small trait so the loader can be driven by a
//! real workbook file or an in-memory fixture.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader, Sheets};

use crate::error::{LedgerError, Result};

/// Raw cell grid of one sheet. The first row is the header row.
///
/// Blank cells are `None`; everything else is already rendered as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetTable {
    pub rows: Vec<Vec<Option<String>>>,
}

impl SheetTable {
    pub fn header(&self) -> &[Option<String>] {
        self.rows.first().map(|row| row.as_slice()).unwrap_or(&[])
    }

    pub fn data_rows(&self) -> &[Vec<Option<String>>] {
        self.rows.get(1..).unwrap_or(&[])
    }
}

/// A workbook with named sheets.
pub trait WorkbookSource {
    /// Sheet names in workbook order.
    fn sheet_names(&self) -> Vec<String>;

    /// Reads one sheet as text cells.
    fn read_sheet(&mut self, name: &str) -> Result<SheetTable>;
}

/// Workbook file opened through calamine. The format (xlsx, xlsm, xlsb,
/// xls, ods) is picked from the file extension.
pub struct SpreadsheetWorkbook {
    path: PathBuf,
    inner: Sheets<BufReader<File>>,
}

impl SpreadsheetWorkbook {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(LedgerError::SourceMissing(path.to_path_buf()));
        }
        let inner = open_workbook_auto(path).map_err(|err| {
            LedgerError::Workbook(format!("failed to open {}: {}", path.display(), err))
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            inner,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WorkbookSource for SpreadsheetWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.inner.sheet_names()
    }

    fn read_sheet(&mut self, name: &str) -> Result<SheetTable> {
        let range = self
            .inner
            .worksheet_range(name)
            .map_err(|err| LedgerError::InvalidSheet {
                sheet: name.to_string(),
                reason: err.to_string(),
            })?;
        let rows = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        Ok(SheetTable { rows })
    }
}

/// Renders a cell the way a read-everything-as-text reader would.
///
/// Date cells print as `YYYY-MM-DD`; the time of day is appended only when
/// it is not midnight.
pub fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(value) => Some(value.clone()),
        Data::Int(value) => Some(value.to_string()),
        Data::Float(value) => Some(float_text(*value)),
        Data::Bool(value) => Some(if *value { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(value) => match value.as_datetime() {
            Some(datetime) => Some(datetime_text(datetime)),
            None => Some(float_text(value.as_f64())),
        },
        Data::DateTimeIso(value) | Data::DurationIso(value) => Some(value.clone()),
    }
}

fn float_text(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn datetime_text(value: chrono::NaiveDateTime) -> String {
    if value.time() == chrono::NaiveTime::MIN {
        value.format("%Y-%m-%d").to_string()
    } else {
        value.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

enum MemorySheet {
    Table(SheetTable),
    Broken(String),
}

/// Workbook held entirely in memory. Empty strings are stored as blank
/// cells.
#[derive(Default)]
pub struct MemoryWorkbook {
    sheets: Vec<(String, MemorySheet)>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, name: &str, header: &[&str], rows: &[&[&str]]) -> Self {
        let mut grid = Vec::with_capacity(rows.len() + 1);
        grid.push(header.iter().map(|cell| memory_cell(cell)).collect());
        for row in rows {
            grid.push(row.iter().map(|cell| memory_cell(cell)).collect());
        }
        self.sheets
            .push((name.to_string(), MemorySheet::Table(SheetTable { rows: grid })));
        self
    }

    /// Adds a sheet whose read always fails with `reason`.
    pub fn with_broken_sheet(mut self, name: &str, reason: &str) -> Self {
        self.sheets
            .push((name.to_string(), MemorySheet::Broken(reason.to_string())));
        self
    }
}

fn memory_cell(cell: &str) -> Option<String> {
    if cell.is_empty() {
        None
    } else {
        Some(cell.to_string())
    }
}

impl WorkbookSource for MemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read_sheet(&mut self, name: &str) -> Result<SheetTable> {
        match self.sheets.iter().find(|(sheet, _)| sheet == name) {
            Some((_, MemorySheet::Table(table))) => Ok(table.clone()),
            Some((_, MemorySheet::Broken(reason))) => Err(LedgerError::InvalidSheet {
                sheet: name.to_string(),
                reason: reason.clone(),
            }),
            None => Err(LedgerError::InvalidSheet {
                sheet: name.to_string(),
                reason: "no such sheet".to_string(),
            }),
        }
    }
}
