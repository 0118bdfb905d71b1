//! End-to-end tests for the migration engine.
//!
//! Each test lays out script files in a temp directory and runs the
//! [`Migrator`] against an in-memory DuckDB database.

use st_core::{AbortPolicy, Config, VersionKey};
use st_db::{Database, DuckDbBackend};
use st_engine::{
    Direction, MigrateError, Migration, MigrationContext, MigrationRegistry, MigrationState,
    Migrator, MigratorOptions, Reporter, ScriptResult, Target, VersionOp, LEDGER_TABLE,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

// ── Helpers ────────────────────────────────────────────────────────────

fn version(v: &str) -> VersionKey {
    VersionKey::parse(v).unwrap()
}

fn write_script(dir: &Path, file: &str, body: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(file), body).unwrap();
}

fn project(config_yaml: &str) -> (TempDir, Config) {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("strata.yml"), config_yaml).unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    (dir, config)
}

fn migrator_for(
    root: &Path,
    config: &Config,
    db: Arc<DuckDbBackend>,
) -> (Migrator, st_engine::CapturedOutput) {
    let options = MigratorOptions::from_config(config, root);
    let (reporter, output) = Reporter::captured(options.verbose);
    (Migrator::new(db, options).with_reporter(reporter), output)
}

const INIT: &str = "\
-- Creates the first tables

-- migrate:up
-- say: Creating accounts
CREATE TABLE accounts (id INTEGER PRIMARY KEY, email VARCHAR NOT NULL);
CREATE TABLE sessions (id INTEGER, account_id INTEGER);

-- migrate:down
DROP TABLE sessions;
DROP TABLE accounts;
";

// ── Scenarios ──────────────────────────────────────────────────────────

#[test]
fn test_init_scenario_migrates_and_reports_status() {
    let (dir, config) = project("name: shop\n");
    write_script(
        &dir.path().join("migrations"),
        "20200101000000_init.sql",
        INIT,
    );
    let db = Arc::new(DuckDbBackend::in_memory().unwrap());
    let (migrator, output) = migrator_for(dir.path(), &config, db.clone());

    let report = migrator.migrate(&Target::Latest, false).unwrap();

    assert_eq!(report.applied, vec![version("20200101000000")]);
    assert!(db.relation_exists("accounts").unwrap());
    assert!(db.relation_exists("sessions").unwrap());
    assert!(migrator
        .installed()
        .unwrap()
        .contains(&version("20200101000000")));
    assert!(output.contains("== 20200101000000 Init: migrating"));
    assert!(output.contains("-- Creating accounts"));

    let status = migrator.status(None).unwrap();
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].state, MigrationState::Migrated);
    assert!(status[0].to_string().contains("migrated"));
}

#[test]
fn test_round_trip_restores_ledger_and_schema() {
    let (dir, config) = project("name: shop\n");
    write_script(
        &dir.path().join("migrations"),
        "20200101000000_init.sql",
        INIT,
    );
    let db = Arc::new(DuckDbBackend::in_memory().unwrap());
    let (migrator, _output) = migrator_for(dir.path(), &config, db.clone());
    let key = version("20200101000000");

    migrator.execute(&key, Direction::Up, false, false).unwrap();
    migrator.execute(&key, Direction::Down, false, false).unwrap();

    assert!(migrator.installed().unwrap().is_empty());
    assert!(!db.relation_exists("accounts").unwrap());
    assert!(db.relation_exists(LEDGER_TABLE).unwrap());
}

#[test]
fn test_file_database_persists_between_migrators() {
    let (dir, config) = project("name: shop\n");
    write_script(
        &dir.path().join("migrations"),
        "20200101000000_init.sql",
        INIT,
    );
    let db_path = dir.path().join("shop.duckdb");

    {
        let db = Arc::new(DuckDbBackend::from_path(&db_path).unwrap());
        let (migrator, _output) = migrator_for(dir.path(), &config, db);
        migrator.migrate(&Target::Latest, false).unwrap();
    }

    let db = Arc::new(DuckDbBackend::from_path(&db_path).unwrap());
    let (migrator, _output) = migrator_for(dir.path(), &config, db);
    let report = migrator.migrate(&Target::Latest, false).unwrap();
    assert!(report.applied.is_empty());
    assert_eq!(migrator.installed().unwrap().len(), 1);
}

#[test]
fn test_multiple_locations_first_wins() {
    let (dir, config) =
        project("name: shop\nmigration_paths: [migrations/app, migrations/vendor]\n");
    write_script(
        &dir.path().join("migrations/app"),
        "20200101000000_init.sql",
        INIT,
    );
    write_script(
        &dir.path().join("migrations/vendor"),
        "20200101000000_vendor_init.sql",
        "-- migrate:up\nCREATE TABLE vendor (id INTEGER);\n-- migrate:down\nDROP TABLE vendor;\n",
    );
    write_script(
        &dir.path().join("migrations/vendor"),
        "20200102000000_vendor_extra.sql",
        "-- migrate:up\nCREATE TABLE extra (id INTEGER);\n-- migrate:down\nDROP TABLE extra;\n",
    );
    let db = Arc::new(DuckDbBackend::in_memory().unwrap());
    let (migrator, output) = migrator_for(dir.path(), &config, db.clone());

    let available = migrator.available().unwrap();
    let names: Vec<&str> = available.values().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Init", "VendorExtra"]);
    assert!(output.contains("Overridden migration"));

    migrator.migrate(&Target::Latest, false).unwrap();
    assert!(db.relation_exists("accounts").unwrap());
    assert!(db.relation_exists("extra").unwrap());
    assert!(!db.relation_exists("vendor").unwrap());
}

#[test]
fn test_failed_up_rolls_back_and_stays_not_migrated() {
    let (dir, config) = project("name: shop\non_abort: report\nverbose: false\n");
    let migrations = dir.path().join("migrations");
    write_script(&migrations, "20200101000000_init.sql", INIT);
    write_script(
        &migrations,
        "20200102000000_add_orders.sql",
        "-- migrate:up\nCREATE TABLE orders (id INTEGER);\nALTER TABLE missing ADD COLUMN x INTEGER;\n",
    );
    let db = Arc::new(DuckDbBackend::in_memory().unwrap());
    let (migrator, output) = migrator_for(dir.path(), &config, db.clone());

    let report = migrator.migrate(&Target::Latest, false).unwrap();

    assert!(!report.succeeded());
    assert!(output.contains("Migration aborted and changes rolled back"));
    assert!(migrator.installed().unwrap().is_empty());
    assert!(!db.relation_exists("orders").unwrap());

    let status = migrator
        .status(Some(&version("20200102000000")))
        .unwrap();
    assert_eq!(status[0].state, MigrationState::NotMigrated);
}

struct DropLedger;

impl Migration for DropLedger {
    fn up(&self, ctx: &MigrationContext<'_>) -> ScriptResult<()> {
        ctx.exec("CREATE TABLE side_effect (id INTEGER)")?;
        ctx.exec(&format!("DROP TABLE {LEDGER_TABLE}"))
    }

    fn down(&self, _ctx: &MigrationContext<'_>) -> ScriptResult<()> {
        Ok(())
    }
}

#[test]
fn test_ledger_write_failure_rolls_back() {
    let (dir, config) = project("name: shop\non_abort: propagate\n");
    std::fs::create_dir(dir.path().join("migrations")).unwrap();
    let db = Arc::new(DuckDbBackend::in_memory().unwrap());
    let mut registry = MigrationRegistry::new();
    registry.register(version("20200101000000"), "DropLedger", || {
        Box::new(DropLedger)
    });
    let (migrator, output) = migrator_for(dir.path(), &config, db.clone());
    let migrator = migrator.with_registry(registry);

    let err = migrator.migrate(&Target::Latest, false).unwrap_err();

    assert!(matches!(err, MigrateError::LedgerWrite { .. }));
    assert!(output.contains("Migration aborted and changes rolled back"));
    assert!(db.relation_exists(LEDGER_TABLE).unwrap());
    assert!(!db.relation_exists("side_effect").unwrap());
    assert!(migrator.installed().unwrap().is_empty());
}

#[test]
fn test_reset_then_latest_skips_recorded_versions() {
    let (dir, config) = project("name: shop\n");
    write_script(
        &dir.path().join("migrations"),
        "20200101000000_init.sql",
        INIT,
    );
    let db = Arc::new(DuckDbBackend::in_memory().unwrap());
    let (migrator, _output) = migrator_for(dir.path(), &config, db.clone());
    migrator.migrate(&Target::Latest, false).unwrap();

    migrator.migrate(&Target::Reset, false).unwrap();
    assert_eq!(db.list_tables().unwrap(), vec![LEDGER_TABLE.to_string()]);

    // The ledger survives a reset, so the init script is considered applied
    let report = migrator.migrate(&Target::Latest, false).unwrap();
    assert!(report.applied.is_empty());

    migrator
        .record_version("20200101000000", VersionOp::Delete)
        .unwrap();
    let report = migrator.migrate(&Target::Latest, false).unwrap();
    assert_eq!(report.applied, vec![version("20200101000000")]);
    assert!(db.relation_exists("accounts").unwrap());
}

#[test]
fn test_custom_extension_and_abort_policy_from_config() {
    let (dir, config) =
        project("name: shop\nscript_extension: ddl\non_abort: propagate\n");
    assert_eq!(config.on_abort, AbortPolicy::Propagate);
    let migrations = dir.path().join("migrations");
    write_script(&migrations, "20200101000000_init.ddl", INIT);
    write_script(&migrations, "20200102000000_ignored.sql", "-- migrate:up\nBROKEN;\n");
    let db = Arc::new(DuckDbBackend::in_memory().unwrap());
    let (migrator, _output) = migrator_for(dir.path(), &config, db);

    let report = migrator.migrate(&Target::Latest, false).unwrap();
    assert_eq!(report.applied, vec![version("20200101000000")]);
}

#[test]
fn test_generate_then_migrate() {
    let (dir, config) = project("name: shop\n");
    let db = Arc::new(DuckDbBackend::in_memory().unwrap());
    let (migrator, _output) = migrator_for(dir.path(), &config, db);

    let path = migrator.generate("20240101120000_create_users").unwrap();
    assert!(path.starts_with(dir.path().join("migrations")));

    let pending = migrator.pending().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].name, "CreateUsers");

    migrator.migrate(&Target::Latest, false).unwrap();
    assert!(migrator.pending().unwrap().is_empty());
}
