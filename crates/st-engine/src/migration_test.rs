use super::*;
use st_core::ScriptLocation;
use st_db::DuckDbBackend;

struct Noop;

impl Migration for Noop {
    fn up(&self, ctx: &MigrationContext<'_>) -> ScriptResult<()> {
        ctx.say("noop up");
        Ok(())
    }

    fn down(&self, _ctx: &MigrationContext<'_>) -> ScriptResult<()> {
        Ok(())
    }
}

fn version(v: &str) -> VersionKey {
    VersionKey::parse(v).unwrap()
}

#[test]
fn test_direction_words() {
    assert_eq!(Direction::Up.to_string(), "up");
    assert_eq!(Direction::Down.starting(), "reverting");
    assert_eq!(Direction::Drop.finished(), "dropped tables");
}

#[test]
fn test_sql_migration_provides_follows_sections() {
    let both = SqlMigration::new(SqlScript::parse("-- migrate:up\n-- migrate:down\n"));
    assert!(both.provides(Direction::Up));
    assert!(both.provides(Direction::Down));
    assert!(!both.provides(Direction::Drop));

    let up_only = SqlMigration::new(SqlScript::parse("-- migrate:up\nSELECT 1;\n"));
    assert!(up_only.provides(Direction::Up));
    assert!(!up_only.provides(Direction::Down));
}

#[test]
fn test_sql_migration_runs_steps() {
    let db = DuckDbBackend::in_memory().unwrap();
    let (reporter, output) = Reporter::captured(true);
    let v = version("20200101000000");
    let ctx = MigrationContext::new(&v, "Init", &db, &reporter);

    let migration = SqlMigration::new(SqlScript::parse(
        "-- migrate:up\n-- say: creating\nCREATE TABLE users (id INTEGER);\n",
    ));
    migration.up(&ctx).unwrap();

    assert!(db.relation_exists("users").unwrap());
    assert_eq!(output.lines(), vec!["-- creating"]);
}

#[test]
fn test_exec_failure_echoes_statement() {
    let db = DuckDbBackend::in_memory().unwrap();
    let (reporter, output) = Reporter::captured(true);
    let v = version("20200101000000");
    let ctx = MigrationContext::new(&v, "Broken", &db, &reporter);

    let err = ctx.exec("SELEC nonsense").unwrap_err();
    assert!(matches!(err, ScriptError::Sql { ref statement, .. } if statement == "SELEC nonsense"));
    assert!(output.contains("SQL Error"));
    assert!(output.contains("When executing query\nSELEC nonsense"));
}

#[test]
fn test_exec_with_message_reports_rows() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE t (id INTEGER)").unwrap();
    let (reporter, output) = Reporter::captured(true);
    let v = version("20200101000000");
    let ctx = MigrationContext::new(&v, "Fill", &db, &reporter);

    let rows = ctx
        .exec_with_message("filling t", "INSERT INTO t VALUES (1), (2), (3)")
        .unwrap();
    assert_eq!(rows, 3);
    let lines = output.lines();
    assert_eq!(lines[0], "-- filling t");
    assert!(lines[1].starts_with("   -> ") && lines[1].ends_with(" s."));
    assert_eq!(lines[2], "   -> 3 rows");
}

#[test]
fn test_registry_descriptors_and_instantiate() {
    let mut registry = MigrationRegistry::new();
    registry
        .register(version("20200102000000"), "Second", || Box::new(Noop))
        .register(version("20200101000000"), "First", || Box::new(Noop));

    assert_eq!(registry.len(), 2);
    let descriptors: Vec<_> = registry.descriptors().collect();
    assert_eq!(descriptors[0].name, "First");
    assert_eq!(descriptors[0].script, ScriptLocation::Registered);
    assert_eq!(descriptors[1].version, "20200102000000");

    assert!(registry.instantiate(&version("20200101000000")).is_some());
    assert!(registry.instantiate(&version("20990101000000")).is_none());
}
