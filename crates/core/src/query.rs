use std::sync::Arc;

use crate::error::QueryError;
use crate::normalize::normalize_term;
use crate::record::{Record, Snapshot, SnapshotIdentity, YEAR_LABEL_FIELD};
use crate::store::RecordStore;

/// Columns shown for each hit, in order, when present in the record set.
pub const DEFAULT_DISPLAY_COLUMNS: &[&str] = &[
    "부모이름",
    "생년월일",
    "임신부/부모",
    "임신확인일/출산예정일",
    "영아이름",
    "영아생년월일",
    "주소",
    "연락처",
    YEAR_LABEL_FIELD,
];

/// Fields offered for searching.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "부모이름",
    "생년월일",
    "임신부/부모",
    "영아이름",
    "영아생년월일",
    "주소",
    "연락처",
    YEAR_LABEL_FIELD,
];

/// Answers substring queries against whatever the store currently holds.
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<RecordStore>,
}

impl QueryEngine {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// Finds every record whose `field` contains `term`, ignoring case.
    ///
    /// The search runs against a single snapshot taken at the start, so a
    /// reload landing mid-query does not affect the result.
    pub fn search(&self, field: &str, term: &str) -> Result<SearchResult, QueryError> {
        let snapshot = self.store.get_current().ok_or(QueryError::NotReady)?;
        search_snapshot(snapshot, field, term)
    }
}

pub fn search_snapshot(
    snapshot: Arc<Snapshot>,
    field: &str,
    term: &str,
) -> Result<SearchResult, QueryError> {
    let field = field.trim();
    let term = term.trim();
    if term.is_empty() {
        return Err(QueryError::EmptyTerm);
    }
    let term = normalize_term(field, term);
    if !snapshot.records.has_column(field) {
        return Err(QueryError::UnknownField(field.to_string()));
    }
    let needle = term.to_lowercase();
    let matches = snapshot
        .records
        .records()
        .iter()
        .enumerate()
        .filter(|(_, record)| {
            record
                .get(field)
                .map(|value| value.to_lowercase().contains(&needle))
                .unwrap_or(false)
        })
        .map(|(idx, _)| idx)
        .collect();
    Ok(SearchResult {
        snapshot,
        field: field.to_string(),
        term,
        matches,
    })
}

/// Hits of one query, tied to the snapshot they were found in.
#[derive(Debug, Clone)]
pub struct SearchResult {
    snapshot: Arc<Snapshot>,
    field: String,
    term: String,
    matches: Vec<usize>,
}

impl SearchResult {
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The term as compared, after trimming and field normalization.
    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn identity(&self) -> SnapshotIdentity {
        self.snapshot.identity
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> + '_ {
        let records = self.snapshot.records.records();
        self.matches.iter().map(move |idx| &records[*idx])
    }

    /// The wanted columns that exist in the record set, in the given order.
    pub fn display_columns<S: AsRef<str>>(&self, wanted: &[S]) -> Vec<String> {
        wanted
            .iter()
            .map(|column| column.as_ref())
            .filter(|column| self.snapshot.records.has_column(column))
            .map(str::to_string)
            .collect()
    }

    /// One row of values per hit, blank where the record lacks the column.
    pub fn rows(&self, columns: &[String]) -> Vec<Vec<String>> {
        self.records()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| record.get(column).unwrap_or_default().to_string())
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_workbook;
    use crate::workbook::MemoryWorkbook;
    use std::time::SystemTime;

    fn store_with_ledger() -> Arc<RecordStore> {
        let mut workbook = MemoryWorkbook::new()
            .with_sheet(
                "2024년신청",
                &["부모이름", "생년월일", "연락처"],
                &[
                    &["Kim Hana", "50101", "01012345678"],
                    &["이두리", "950101", ""],
                ],
            )
            .with_sheet(
                "2025년신청",
                &["부모이름", "생년월일", "주소"],
                &[&["KIM minsu", "", "서울 마포구"], &["박세나", "050101", "부산"]],
            );
        let store = Arc::new(RecordStore::new());
        store.publish(
            load_workbook(&mut workbook),
            SnapshotIdentity::new(SystemTime::UNIX_EPOCH),
        );
        store
    }

    fn names(result: &SearchResult) -> Vec<String> {
        result
            .records()
            .map(|r| r.get("부모이름").unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn not_ready_before_first_publish() {
        let engine = QueryEngine::new(Arc::new(RecordStore::new()));
        assert_eq!(
            engine.search("부모이름", "김").unwrap_err(),
            QueryError::NotReady
        );
    }

    #[test]
    fn blank_terms_are_rejected() {
        let engine = QueryEngine::new(store_with_ledger());
        assert_eq!(engine.search("부모이름", "   ").unwrap_err(), QueryError::EmptyTerm);
        assert_eq!(engine.search("부모이름", "").unwrap_err(), QueryError::EmptyTerm);
    }

    #[test]
    fn unknown_field_is_named() {
        let engine = QueryEngine::new(store_with_ledger());
        assert_eq!(
            engine.search("영아이름", "김").unwrap_err(),
            QueryError::UnknownField("영아이름".to_string())
        );
    }

    #[test]
    fn matching_is_case_insensitive_substring_in_row_order() {
        let engine = QueryEngine::new(store_with_ledger());
        let result = engine.search("부모이름", " kim ").unwrap();
        assert_eq!(names(&result), vec!["Kim Hana", "KIM minsu"]);
        assert_eq!(result.term(), "kim");
    }

    #[test]
    fn zero_matches_is_a_successful_empty_result() {
        let engine = QueryEngine::new(store_with_ledger());
        let result = engine.search("부모이름", "최").unwrap();
        assert!(result.is_empty());
        assert_eq!(result.len(), 0);
    }

    #[test]
    fn birthdate_term_is_padded_like_stored_values() {
        let engine = QueryEngine::new(store_with_ledger());
        let result = engine.search("생년월일", "50101").unwrap();
        assert_eq!(result.term(), "050101");
        assert_eq!(names(&result), vec!["Kim Hana", "박세나"]);
    }

    #[test]
    fn rows_missing_the_field_never_match() {
        let engine = QueryEngine::new(store_with_ledger());
        let result = engine.search("주소", "서울").unwrap();
        assert_eq!(names(&result), vec!["KIM minsu"]);
        let result = engine.search("연락처", "010").unwrap();
        assert_eq!(names(&result), vec!["Kim Hana"]);
    }

    #[test]
    fn year_label_is_searchable() {
        let engine = QueryEngine::new(store_with_ledger());
        let result = engine.search(YEAR_LABEL_FIELD, "25년도").unwrap();
        assert_eq!(names(&result), vec!["KIM minsu", "박세나"]);
    }

    #[test]
    fn display_columns_are_restricted_to_present_ones() {
        let engine = QueryEngine::new(store_with_ledger());
        let result = engine.search("부모이름", "이두리").unwrap();
        let columns = result.display_columns(DEFAULT_DISPLAY_COLUMNS);
        assert_eq!(
            columns,
            vec!["부모이름", "생년월일", "주소", "연락처", YEAR_LABEL_FIELD]
        );
        assert_eq!(
            result.rows(&columns),
            vec![vec!["이두리", "950101", "", "", "24년도신청자"]]
        );
    }

    #[test]
    fn query_keeps_its_snapshot_across_a_publish() {
        let store = store_with_ledger();
        let engine = QueryEngine::new(Arc::clone(&store));
        let result = engine.search("부모이름", "kim").unwrap();
        store.publish(
            crate::record::RecordSet::new(),
            SnapshotIdentity::new(SystemTime::now()),
        );
        assert_eq!(result.len(), 2);
        assert_eq!(names(&result), vec!["Kim Hana", "KIM minsu"]);
        assert_eq!(result.identity(), SnapshotIdentity::new(SystemTime::UNIX_EPOCH));
    }
}
