use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use bookdoum_core::{
    load_initial, load_workbook, LedgerError, MemoryWorkbook, QueryEngine, QueryError,
    RecordSource, RecordStore, ReloadOutcome, Snapshot, SnapshotIdentity, SpreadsheetSource,
    Watcher, YEAR_LABEL_FIELD,
};
use tempfile::tempdir;

type Sheet = (String, Vec<String>, Vec<Vec<String>>);

/// In-memory stand-in for the ledger file that tests can rewrite or lock.
struct LedgerFile {
    state: Mutex<LedgerState>,
}

struct LedgerState {
    version: u64,
    locked: bool,
    sheets: Vec<Sheet>,
}

impl LedgerFile {
    fn new(sheets: Vec<Sheet>) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                version: 1,
                locked: false,
                sheets,
            }),
        }
    }

    fn rewrite(&self, sheets: Vec<Sheet>) {
        let mut state = self.state.lock().unwrap();
        state.version += 1;
        state.sheets = sheets;
    }

    fn set_locked(&self, locked: bool) {
        let mut state = self.state.lock().unwrap();
        state.locked = locked;
        if locked {
            state.version += 1;
        }
    }
}

fn identity(version: u64) -> SnapshotIdentity {
    SnapshotIdentity::new(SystemTime::UNIX_EPOCH + Duration::from_secs(version))
}

impl RecordSource for LedgerFile {
    fn location(&self) -> PathBuf {
        PathBuf::from("북돋움관리대장.xlsx")
    }

    fn identity(&self) -> bookdoum_core::Result<SnapshotIdentity> {
        Ok(identity(self.state.lock().unwrap().version))
    }

    fn load(&self) -> bookdoum_core::Result<Snapshot> {
        let state = self.state.lock().unwrap();
        if state.locked {
            return Err(LedgerError::Workbook("file is locked by another process".into()));
        }
        let mut workbook = MemoryWorkbook::new();
        for (name, header, rows) in &state.sheets {
            let header: Vec<&str> = header.iter().map(String::as_str).collect();
            let rows: Vec<Vec<&str>> = rows
                .iter()
                .map(|row| row.iter().map(String::as_str).collect())
                .collect();
            let rows: Vec<&[&str]> = rows.iter().map(Vec::as_slice).collect();
            workbook = workbook.with_sheet(name, &header, &rows);
        }
        Ok(Snapshot {
            records: load_workbook(&mut workbook),
            identity: identity(state.version),
        })
    }
}

fn sheet(name: &str, header: &[&str], rows: &[&[&str]]) -> Sheet {
    (
        name.to_string(),
        header.iter().map(|c| c.to_string()).collect(),
        rows.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect(),
    )
}

fn first_ledger() -> Vec<Sheet> {
    vec![
        sheet(
            "2024년신청",
            &["부모이름", "생년월일", "연락처"],
            &[&["김하나", "50101", "01012345678"]],
        ),
        sheet(
            "2025년신청",
            &["부모이름", "생년월일", "연락처", "주소"],
            &[&["이두리", "950101", "0212345678", "서울"]],
        ),
        sheet("메모", &["내용"], &[&["김하나 연락 요망"]]),
    ]
}

#[test]
fn startup_load_then_query() {
    let file = LedgerFile::new(first_ledger());
    let store = Arc::new(RecordStore::new());
    let engine = QueryEngine::new(Arc::clone(&store));
    assert_eq!(engine.search("부모이름", "김").unwrap_err(), QueryError::NotReady);

    load_initial(&file, &store).unwrap();

    let result = engine.search("생년월일", "50101").unwrap();
    assert_eq!(result.len(), 1);
    let hit = result.records().next().unwrap();
    assert_eq!(hit.get("부모이름"), Some("김하나"));
    assert_eq!(hit.get("생년월일"), Some("050101"));
    assert_eq!(hit.get("연락처"), Some("010-1234-5678"));
    assert_eq!(hit.get(YEAR_LABEL_FIELD), Some("24년도신청자"));

    assert_eq!(
        engine.search("내용", "김").unwrap_err(),
        QueryError::UnknownField("내용".to_string())
    );
    assert!(engine.search("부모이름", "박").unwrap().is_empty());
}

#[test]
fn failed_reload_keeps_serving_the_previous_ledger() {
    let file = Arc::new(LedgerFile::new(first_ledger()));
    let store = Arc::new(RecordStore::new());
    let engine = QueryEngine::new(Arc::clone(&store));
    load_initial(file.as_ref(), &store).unwrap();
    let watcher = Watcher::new(Arc::clone(&file), Arc::clone(&store), Duration::from_millis(5));

    file.set_locked(true);
    assert!(watcher.tick().is_failure());
    assert_eq!(engine.search("부모이름", "이두리").unwrap().len(), 1);
    assert_eq!(store.identity(), Some(identity(1)));

    file.set_locked(false);
    file.rewrite(vec![sheet(
        "2026년신청",
        &["부모이름", "영아이름"],
        &[&["박세나", "박아기"]],
    )]);
    match watcher.tick() {
        ReloadOutcome::Reloaded { rows, .. } => assert_eq!(rows, 1),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(engine.search("부모이름", "이두리").unwrap().is_empty());
    let result = engine.search("영아이름", "아기").unwrap();
    assert_eq!(
        result.records().next().unwrap().year_label(),
        "26년도신청자"
    );
    assert_eq!(
        engine.search("연락처", "010").unwrap_err(),
        QueryError::UnknownField("연락처".to_string())
    );
}

#[test]
fn queries_during_background_reloads_see_whole_ledgers() {
    let file = Arc::new(LedgerFile::new(vec![sheet(
        "2024년신청",
        &["부모이름"],
        &[&["가1"], &["가2"]],
    )]));
    let store = Arc::new(RecordStore::new());
    load_initial(file.as_ref(), &store).unwrap();
    let handle =
        Watcher::new(Arc::clone(&file), Arc::clone(&store), Duration::from_millis(1)).spawn();

    let done = Arc::new(AtomicBool::new(false));
    let readers: Vec<_> = (0..3)
        .map(|_| {
            let engine = QueryEngine::new(Arc::clone(&store));
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    let result = engine.search(YEAR_LABEL_FIELD, "년도").unwrap();
                    let labels: Vec<_> = result.records().map(|r| r.year_label()).collect();
                    // every generation is a single sheet of two rows
                    assert_eq!(labels.len(), 2);
                    assert_eq!(labels[0], labels[1]);
                }
            })
        })
        .collect();

    for year in 2025..2035 {
        let name = format!("{year}년신청");
        file.rewrite(vec![sheet(&name, &["부모이름"], &[&["가1"], &["가2"]])]);
        let target = store.generation() + 1;
        let deadline = Instant::now() + Duration::from_secs(5);
        while store.generation() < target && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
    }
    done.store(true, Ordering::Relaxed);
    for reader in readers {
        reader.join().unwrap();
    }
    handle.stop();
    let snapshot = store.get_current().unwrap();
    assert_eq!(snapshot.records.records()[0].year_label(), "34년도신청자");
}

#[test]
fn missing_workbook_is_fatal_at_startup() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("북돋움관리대장.xlsx");
    let source = SpreadsheetSource::new(&path);
    let store = RecordStore::new();
    match load_initial(&source, &store) {
        Err(LedgerError::SourceMissing(missing)) => assert_eq!(missing, path),
        other => panic!("unexpected result {:?}", other.map(|s| s.records.len())),
    }
    assert!(store.get_current().is_none());
}

#[test]
fn workbook_without_year_sheets_is_fatal_at_startup() {
    let file = LedgerFile::new(vec![sheet("메모", &["내용"], &[&["참고"]])]);
    let store = RecordStore::new();
    assert!(matches!(
        load_initial(&file, &store),
        Err(LedgerError::EmptyCorpus(_))
    ));
}
