//! Migration orchestration.
//!
//! The [`Migrator`] ties discovery, the ledger and [`MigrationUnit`] together.
//! A batch of planned steps runs inside one transaction; on the first failure
//! the transaction is rolled back, an abort notice is always printed, and the
//! configured [`AbortPolicy`] decides whether the error is returned or folded
//! into the [`MigrationReport`].
//!
//! The engine assumes it is the only writer of the ledger while a call runs.
//! Nothing here guards against two processes migrating the same database.

use crate::error::{MigrateError, MigrateResult};
use crate::ledger::Ledger;
use crate::migration::{Direction, MigrationRegistry};
use crate::plan::{plan, PlannedStep, Target};
use crate::progress::Reporter;
use crate::unit::MigrationUnit;
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use st_core::version::{parse_generate_name, type_name};
use st_core::{
    discover_migrations, AbortPolicy, AvailableSet, Config, MigrationDescriptor, ScriptLocation,
    SqlScript, VersionKey,
};
use st_db::Database;
use std::collections::btree_map::Entry;
use std::collections::BTreeSet;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Format of generated version keys.
const VERSION_TIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// Engine settings, resolved from the project configuration.
#[derive(Debug, Clone)]
pub struct MigratorOptions {
    /// Absolute migration locations, in precedence order
    pub migration_paths: Vec<PathBuf>,

    /// Script file extension, without the dot
    pub script_extension: String,

    /// What to do with an error after rollback
    pub on_abort: AbortPolicy,

    /// Print progress lines
    pub verbose: bool,
}

impl MigratorOptions {
    /// Resolve options from `config`, anchoring relative paths at `root`.
    pub fn from_config(config: &Config, root: &Path) -> Self {
        Self {
            migration_paths: config.migration_paths_absolute(root),
            script_extension: config.script_extension.clone(),
            on_abort: config.on_abort,
            verbose: config.verbose,
        }
    }
}

impl Default for MigratorOptions {
    fn default() -> Self {
        Self {
            migration_paths: vec![PathBuf::from("migrations")],
            script_extension: "sql".to_string(),
            on_abort: AbortPolicy::default(),
            verbose: true,
        }
    }
}

/// Outcome of a `migrate` or `execute` call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    /// Versions migrated up and recorded, in run order
    pub applied: Vec<VersionKey>,

    /// Versions migrated down and removed from the ledger, in run order
    pub reverted: Vec<VersionKey>,

    /// Steps that would have run (dry-run only)
    pub planned: Vec<PlannedStep>,

    /// Versions left alone because the ledger already matched the request
    pub skipped: Vec<VersionKey>,

    /// Whether application tables were dropped
    pub reset: bool,

    /// Error that aborted and rolled back the batch
    pub aborted: Option<String>,
}

impl MigrationReport {
    /// True when the batch was not rolled back.
    pub fn succeeded(&self) -> bool {
        self.aborted.is_none()
    }
}

/// Per-version state shown by `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MigrationState {
    Migrated,
    NotMigrated,
    NoMigration,
}

impl MigrationState {
    pub fn as_str(self) -> &'static str {
        match self {
            MigrationState::Migrated => "migrated",
            MigrationState::NotMigrated => "not-migrated",
            MigrationState::NoMigration => "no-migration",
        }
    }
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One row of the status listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub version: VersionKey,
    pub state: MigrationState,
    pub script: Option<ScriptLocation>,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\t{}: {:<12} : ", self.version, self.state)?;
        if let Some(script) = &self.script {
            write!(f, "{script}")?;
        }
        Ok(())
    }
}

/// Manual ledger edit requested through `record_version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionOp {
    Add,
    Delete,
}

impl fmt::Display for VersionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionOp::Add => f.write_str("add"),
            VersionOp::Delete => f.write_str("delete"),
        }
    }
}

/// Runs migrations against one database.
pub struct Migrator {
    db: Arc<dyn Database>,
    options: MigratorOptions,
    registry: MigrationRegistry,
    reporter: Reporter,
}

impl Migrator {
    /// Create a migrator printing progress to stdout.
    pub fn new(db: Arc<dyn Database>, options: MigratorOptions) -> Self {
        let reporter = Reporter::stdout(options.verbose);
        Self {
            db,
            options,
            registry: MigrationRegistry::new(),
            reporter,
        }
    }

    /// Replace the progress reporter.
    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Add compiled migrations. Script files win on a version collision.
    pub fn with_registry(mut self, registry: MigrationRegistry) -> Self {
        self.registry = registry;
        self
    }

    fn ledger(&self) -> Ledger<'_> {
        Ledger::new(self.db.as_ref())
    }

    /// Discover script files and merge in registered migrations.
    pub fn available(&self) -> MigrateResult<AvailableSet> {
        let discovery = discover_migrations(
            &self.options.migration_paths,
            &self.options.script_extension,
        )?;
        for path in &discovery.overridden {
            self.reporter
                .write(&format!("Overridden migration {}", path.display()));
        }

        let mut available = discovery.available;
        for descriptor in self.registry.descriptors() {
            match available.entry(descriptor.version.clone()) {
                Entry::Occupied(existing) => {
                    log::warn!(
                        "Overridden migration {} (version already provided by {})",
                        descriptor,
                        existing.get().script
                    );
                    self.reporter
                        .write(&format!("Overridden migration {descriptor}"));
                }
                Entry::Vacant(slot) => {
                    slot.insert(descriptor);
                }
            }
        }
        Ok(available)
    }

    /// Versions recorded in the ledger, ascending.
    pub fn installed(&self) -> MigrateResult<BTreeSet<VersionKey>> {
        self.ledger().installed()
    }

    /// Applied versions that no longer have a migration.
    pub fn missing_applied(&self) -> MigrateResult<Vec<VersionKey>> {
        let available = self.available()?;
        let installed = self.installed()?;
        Ok(missing_applied(&available, &installed))
    }

    /// Available migrations not yet applied, ascending.
    pub fn pending(&self) -> MigrateResult<Vec<MigrationDescriptor>> {
        let available = self.available()?;
        let installed = self.installed()?;
        Ok(available
            .into_values()
            .filter(|d| !installed.contains(&d.version))
            .collect())
    }

    /// Bring the schema to `target`.
    pub fn migrate(&self, target: &Target, dry_run: bool) -> MigrateResult<MigrationReport> {
        log::debug!(
            "Migrating {} database to {target} (dry run: {dry_run})",
            self.db.db_type()
        );

        if *target == Target::Reset {
            return self.reset(dry_run);
        }

        let available = self.available()?;
        let installed = self.ledger().installed()?;

        for version in missing_applied(&available, &installed) {
            log::warn!("Applied migration {version} has no script");
            self.reporter
                .write(&format!("Warning missing already applied migration {version}"));
        }

        let steps = plan(&available, &installed, target);
        if steps.is_empty() {
            log::debug!("Nothing to migrate");
        }
        self.run_batch(&steps, dry_run, MigrationReport::default())
    }

    /// Run the migration `version` in `direction`.
    ///
    /// Without `force`, an up for an applied version or a down for an
    /// unapplied one is skipped.
    pub fn execute(
        &self,
        version: &VersionKey,
        direction: Direction,
        force: bool,
        dry_run: bool,
    ) -> MigrateResult<MigrationReport> {
        let available = self.available()?;
        let descriptor = available
            .get(version)
            .ok_or_else(|| MigrateError::NoMigration {
                version: version.clone(),
            })?;

        if direction == Direction::Drop {
            return Err(MigrateError::Contract {
                version: version.clone(),
                name: descriptor.name.clone(),
                direction,
                reason: "dropping tables is not tied to a migration, migrate to 0 instead"
                    .to_string(),
            });
        }

        let ledger = self.ledger();
        if !dry_run {
            ledger.ensure_schema()?;
        }

        let applied = ledger.installed()?.contains(version);
        let mut report = MigrationReport::default();
        if !force {
            let skip = match direction {
                Direction::Up if applied => Some(format!(
                    "There is migration applied for the key given - skipping up for {version}, may be use --force"
                )),
                Direction::Down if !applied => Some(format!(
                    "There is NO migration applied for the key given - skipping down for {version}, may be use --force"
                )),
                _ => None,
            };
            if let Some(message) = skip {
                self.reporter.always(&message);
                report.skipped.push(version.clone());
                return Ok(report);
            }
        }

        let step = PlannedStep::new(descriptor, direction);
        self.run_batch(&[step], dry_run, report)
    }

    /// Report the state of every available migration, or only of `version`.
    ///
    /// Read-only: the ledger table is not created if missing.
    pub fn status(&self, version: Option<&VersionKey>) -> MigrateResult<Vec<StatusLine>> {
        let available = self.available()?;

        if let Some(version) = version {
            if !available.contains_key(version) {
                return Ok(vec![StatusLine {
                    version: version.clone(),
                    state: MigrationState::NoMigration,
                    script: None,
                }]);
            }
        }

        let installed = self.installed()?;
        let lines = available
            .values()
            .filter(|d| version.map_or(true, |v| d.version == *v))
            .map(|d| StatusLine {
                version: d.version.clone(),
                state: if installed.contains(&d.version) {
                    MigrationState::Migrated
                } else {
                    MigrationState::NotMigrated
                },
                script: Some(d.script.clone()),
            })
            .collect();
        Ok(lines)
    }

    /// Add or remove a ledger row without running any migration.
    ///
    /// Returns false when the ledger already matched the request.
    pub fn record_version(&self, version: &str, op: VersionOp) -> MigrateResult<bool> {
        let version = VersionKey::parse(version)?;
        let ledger = self.ledger();
        ledger.ensure_schema()?;

        let changed = match op {
            VersionOp::Add => ledger.mark_applied(&version)?,
            VersionOp::Delete => ledger.mark_reverted(&version)?,
        };
        log::debug!("Ledger {op} {version}: changed = {changed}");
        Ok(changed)
    }

    /// Write an empty migration named `name`, versioned with the current local time
    /// unless `name` carries its own 14-digit prefix.
    pub fn generate(&self, name: &str) -> MigrateResult<PathBuf> {
        self.generate_at(name, Local::now().naive_local())
    }

    /// [`Migrator::generate`] with an explicit clock.
    pub fn generate_at(&self, name: &str, now: NaiveDateTime) -> MigrateResult<PathBuf> {
        let generation_error = |message: String| MigrateError::Generation {
            target: name.to_string(),
            message,
        };

        let (pinned, identifier) = parse_generate_name(name).ok_or_else(|| {
            generation_error(
                "expected [<14 digit version>_]<identifier> with an identifier starting with a letter"
                    .to_string(),
            )
        })?;
        let version = match pinned {
            Some(version) => version,
            None => VersionKey::parse(&now.format(VERSION_TIME_FORMAT).to_string())?,
        };

        let dir = self
            .options
            .migration_paths
            .first()
            .ok_or_else(|| generation_error("no migration path is configured".to_string()))?;
        std::fs::create_dir_all(dir)
            .map_err(|e| generation_error(format!("{}: {e}", dir.display())))?;

        let path = dir.join(format!(
            "{version}_{identifier}.{}",
            self.options.script_extension
        ));
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| generation_error(format!("{}: {e}", path.display())))?;
        file.write_all(SqlScript::scaffold(&type_name(identifier)).as_bytes())
            .map_err(|e| generation_error(format!("{}: {e}", path.display())))?;

        self.reporter.always(&format!(
            "An empty migration was generated for {version} in {}",
            path.display()
        ));
        Ok(path)
    }

    fn reset(&self, dry_run: bool) -> MigrateResult<MigrationReport> {
        let mut report = MigrationReport::default();
        if dry_run {
            self.reporter
                .always("Would drop every table except the migration ledger");
            return Ok(report);
        }

        MigrationUnit::new(self.db.as_ref(), &self.registry, &self.reporter).drop_all()?;
        report.reset = true;
        Ok(report)
    }

    /// Run `steps` in one transaction, or only describe them in dry-run mode.
    fn run_batch(
        &self,
        steps: &[PlannedStep],
        dry_run: bool,
        mut report: MigrationReport,
    ) -> MigrateResult<MigrationReport> {
        if dry_run {
            for step in steps {
                let verb = match step.direction {
                    Direction::Down => "revert",
                    _ => "migrate",
                };
                self.reporter.always(&format!("Would {verb} {}", step.script));
                report.planned.push(step.clone());
            }
            return Ok(report);
        }

        if steps.is_empty() {
            return Ok(report);
        }

        self.db.begin().map_err(MigrateError::Transaction)?;
        let outcome = self
            .run_steps(steps, &mut report)
            .and_then(|()| self.db.commit().map_err(MigrateError::Transaction));

        match outcome {
            Ok(()) => Ok(report),
            Err(err) => self.abort(err, report),
        }
    }

    fn run_steps(&self, steps: &[PlannedStep], report: &mut MigrationReport) -> MigrateResult<()> {
        let unit = MigrationUnit::new(self.db.as_ref(), &self.registry, &self.reporter);
        for step in steps {
            unit.run(&step.descriptor(), step.direction)?;
            match step.direction {
                Direction::Up => report.applied.push(step.version.clone()),
                Direction::Down => report.reverted.push(step.version.clone()),
                Direction::Drop => report.reset = true,
            }
        }
        Ok(())
    }

    fn abort(&self, err: MigrateError, mut report: MigrationReport) -> MigrateResult<MigrationReport> {
        if let Err(rollback_err) = self.db.rollback() {
            log::error!("Rollback failed: {rollback_err}");
        }
        log::error!("Migration aborted: {err}");
        self.reporter
            .announce_always(None, "ERROR", "Migration aborted and changes rolled back");

        report.applied.clear();
        report.reverted.clear();
        report.reset = false;

        match self.options.on_abort {
            AbortPolicy::Propagate => Err(err),
            AbortPolicy::Report => {
                self.reporter.always(&err.to_string());
                report.aborted = Some(err.to_string());
                Ok(report)
            }
        }
    }
}

fn missing_applied(available: &AvailableSet, installed: &BTreeSet<VersionKey>) -> Vec<VersionKey> {
    installed
        .iter()
        .filter(|v| !available.contains_key(*v))
        .cloned()
        .collect()
}

#[cfg(test)]
#[path = "migrator_test.rs"]
mod tests;
