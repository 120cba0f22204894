use std::fmt;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use indexmap::{IndexMap, IndexSet};

/// Pseudo-column carrying the application year label derived from the
/// sheet name, e.g. `25년도신청자`.
pub const YEAR_LABEL_FIELD: &str = "신청연도";

/// One normalized ledger row. Only non-blank cells have a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: IndexMap<String, String>,
    sheet: String,
    year_label: String,
}

impl Record {
    pub fn new(sheet: impl Into<String>, year_label: impl Into<String>) -> Self {
        let year_label = year_label.into();
        let mut fields = IndexMap::new();
        fields.insert(YEAR_LABEL_FIELD.to_string(), year_label.clone());
        Self {
            fields,
            sheet: sheet.into(),
            year_label,
        }
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn year_label(&self) -> &str {
        &self.year_label
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }
}

/// What one eligible sheet contributed to a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSummary {
    pub name: String,
    pub year_label: String,
    pub columns: Vec<String>,
    pub rows: usize,
}

/// All records of one load, in (sheet order, row order).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    records: Vec<Record>,
    sheets: Vec<SheetSummary>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the rows of one sheet. `columns` is the sheet's cleaned header.
    pub fn append_sheet(
        &mut self,
        name: &str,
        year_label: &str,
        columns: Vec<String>,
        records: Vec<Record>,
    ) {
        self.sheets.push(SheetSummary {
            name: name.to_string(),
            year_label: year_label.to_string(),
            columns,
            rows: records.len(),
        });
        self.records.extend(records);
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn sheets(&self) -> &[SheetSummary] {
        &self.sheets
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Union of the columns of every contributing sheet, in first-appearance
    /// order, followed by the year label column. Empty for an empty set.
    pub fn columns(&self) -> Vec<String> {
        if self.sheets.is_empty() {
            return Vec::new();
        }
        let mut union: IndexSet<&str> = IndexSet::new();
        for sheet in &self.sheets {
            union.extend(sheet.columns.iter().map(String::as_str));
        }
        union.insert(YEAR_LABEL_FIELD);
        union.into_iter().map(str::to_string).collect()
    }

    pub fn has_column(&self, field: &str) -> bool {
        if self.sheets.is_empty() {
            return false;
        }
        field == YEAR_LABEL_FIELD
            || self
                .sheets
                .iter()
                .any(|sheet| sheet.columns.iter().any(|column| column == field))
    }

    /// Row counts per year label, in sheet order. Sheets sharing a year are
    /// summed.
    pub fn rows_per_year(&self) -> IndexMap<String, usize> {
        let mut counts = IndexMap::new();
        for sheet in &self.sheets {
            *counts.entry(sheet.year_label.clone()).or_insert(0) += sheet.rows;
        }
        counts
    }
}

/// Modification time of the source file at the moment it was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotIdentity(SystemTime);

impl SnapshotIdentity {
    pub fn new(modified: SystemTime) -> Self {
        Self(modified)
    }

    pub fn modified(&self) -> SystemTime {
        self.0
    }
}

impl fmt::Display for SnapshotIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let local: DateTime<Local> = self.0.into();
        write!(f, "{}", local.format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// A record set paired with the identity of the file it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub records: RecordSet,
    pub identity: SnapshotIdentity,
}
