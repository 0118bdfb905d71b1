use super::*;
use st_db::DuckDbBackend;

fn version(v: &str) -> VersionKey {
    VersionKey::parse(v).unwrap()
}

#[test]
fn test_ensure_schema_is_idempotent() {
    let db = DuckDbBackend::in_memory().unwrap();
    let ledger = Ledger::new(&db);
    ledger.ensure_schema().unwrap();
    ledger.ensure_schema().unwrap();
    assert!(db.relation_exists(LEDGER_TABLE).unwrap());
}

#[test]
fn test_installed_without_table_is_empty() {
    let db = DuckDbBackend::in_memory().unwrap();
    let ledger = Ledger::new(&db);
    assert!(ledger.installed().unwrap().is_empty());
    assert!(!db.relation_exists(LEDGER_TABLE).unwrap());
}

#[test]
fn test_installed_is_ascending() {
    let db = DuckDbBackend::in_memory().unwrap();
    let ledger = Ledger::new(&db);
    ledger.ensure_schema().unwrap();
    ledger.mark_applied(&version("20200103000000")).unwrap();
    ledger.mark_applied(&version("20200101000000")).unwrap();
    ledger.mark_applied(&version("20200102000000")).unwrap();

    let installed: Vec<String> = ledger
        .installed()
        .unwrap()
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(
        installed,
        vec!["20200101000000", "20200102000000", "20200103000000"]
    );
}

#[test]
fn test_mark_applied_twice_is_noop() {
    let db = DuckDbBackend::in_memory().unwrap();
    let ledger = Ledger::new(&db);
    ledger.ensure_schema().unwrap();
    let v = version("20200101000000");

    assert!(ledger.mark_applied(&v).unwrap());
    assert!(!ledger.mark_applied(&v).unwrap());
    assert_eq!(ledger.installed().unwrap().len(), 1);
}

#[test]
fn test_mark_reverted_absent_is_noop() {
    let db = DuckDbBackend::in_memory().unwrap();
    let ledger = Ledger::new(&db);
    ledger.ensure_schema().unwrap();
    let v = version("20200101000000");

    assert!(!ledger.mark_reverted(&v).unwrap());
    ledger.mark_applied(&v).unwrap();
    assert!(ledger.mark_reverted(&v).unwrap());
    assert!(ledger.installed().unwrap().is_empty());
}

#[test]
fn test_malformed_rows_are_skipped() {
    let db = DuckDbBackend::in_memory().unwrap();
    let ledger = Ledger::new(&db);
    ledger.ensure_schema().unwrap();
    db.execute("INSERT INTO _schema_versions VALUES ('garbage')")
        .unwrap();
    ledger.mark_applied(&version("20200101000000")).unwrap();

    let installed = ledger.installed().unwrap();
    assert_eq!(installed.len(), 1);
}

#[test]
fn test_write_without_table_fails() {
    let db = DuckDbBackend::in_memory().unwrap();
    let ledger = Ledger::new(&db);
    let err = ledger.mark_applied(&version("20200101000000")).unwrap_err();
    assert!(matches!(err, MigrateError::LedgerWrite { .. }));
}

#[test]
fn test_ledger_joins_open_transaction() {
    let db = DuckDbBackend::in_memory().unwrap();
    let ledger = Ledger::new(&db);
    ledger.ensure_schema().unwrap();

    db.begin().unwrap();
    ledger.mark_applied(&version("20200101000000")).unwrap();
    db.rollback().unwrap();

    assert!(ledger.installed().unwrap().is_empty());
}
