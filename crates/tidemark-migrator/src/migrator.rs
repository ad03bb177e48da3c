use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;
use tidemark_common::{Error, Result, Version};
use tidemark_config::MigratorConfig;
use tidemark_db::DataStore;
use tracing::{debug, info, warn};

use crate::ledger::VersionLedger;
use crate::loader::MigrationLoader;
use crate::unit::Migration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => f.write_str("up"),
            Direction::Down => f.write_str("down"),
        }
    }
}

/// What a migrator operation did. `direction` is `None` when there was
/// nothing to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub direction: Option<Direction>,
    pub from_version: Version,
    pub to_version: Version,
    /// Versions applied or reverted, in execution order.
    pub executed: Vec<Version>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl MigrationReport {
    fn noop(version: Version, started: Instant) -> Self {
        Self {
            direction: None,
            from_version: version,
            to_version: version,
            executed: Vec::new(),
            elapsed: started.elapsed(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.executed.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationState {
    Applied,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub version: Version,
    pub name: String,
    pub filename: PathBuf,
    pub state: MigrationState,
}

/// Moves a data store between migration versions.
///
/// The migration set is re-read from disk on every call. The ledger is read
/// once per operation and written after each unit, so a failure part way
/// leaves it at the last unit that completed. Runs are strictly sequential
/// and take no lock; callers must not run two migrators against one store
/// at the same time.
pub struct Migrator<S> {
    ledger: VersionLedger<S>,
    loader: MigrationLoader,
    migrations_path: PathBuf,
    verbose: bool,
}

impl<S: DataStore> Migrator<S> {
    pub fn new(store: S, config: &MigratorConfig) -> Self {
        Self {
            ledger: VersionLedger::new(store),
            loader: MigrationLoader::new(),
            migrations_path: config.migrations_path.clone(),
            verbose: config.verbose,
        }
    }

    /// Replace the default `.sql` loader.
    pub fn with_loader(mut self, loader: MigrationLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_migrations_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.migrations_path = path.into();
        self
    }

    pub fn migrations_path(&self) -> &Path {
        &self.migrations_path
    }

    pub fn store(&self) -> &S {
        self.ledger.store()
    }

    pub fn current_version(&self) -> Result<Version> {
        self.ledger.get()
    }

    /// Every migration in the migrations path, ascending.
    pub fn migrations(&self) -> Result<Vec<Migration>> {
        self.loader.load(&self.migrations_path)
    }

    /// Migrations newer than the current version, ascending.
    pub fn pending_migrations(&self) -> Result<Vec<Migration>> {
        let current = self.current_version()?;
        Ok(self
            .migrations()?
            .into_iter()
            .filter(|m| m.version > current)
            .collect())
    }

    pub fn status(&self) -> Result<Vec<MigrationStatus>> {
        let current = self.current_version()?;
        Ok(self
            .migrations()?
            .into_iter()
            .map(|m| MigrationStatus {
                state: if m.version <= current {
                    MigrationState::Applied
                } else {
                    MigrationState::Pending
                },
                version: m.version,
                name: m.name,
                filename: m.filename,
            })
            .collect())
    }

    /// Apply pending migrations up to and including `target`, or all of them.
    pub fn up(&self, target: Option<Version>) -> Result<MigrationReport> {
        let started = Instant::now();
        let migrations = self.migrations()?;
        check_target(&migrations, target)?;
        let current = self.current_version()?;
        self.run_up(&migrations, current, target, started)
    }

    /// Revert applied migrations newer than `target`, or all of them.
    pub fn down(&self, target: Option<Version>) -> Result<MigrationReport> {
        let started = Instant::now();
        let migrations = self.migrations()?;
        check_target(&migrations, target)?;
        let current = self.current_version()?;
        self.run_down(&migrations, current, target, started)
    }

    pub fn forward(&self, target: Version) -> Result<MigrationReport> {
        self.up(Some(target))
    }

    /// Apply the next `steps` pending migrations.
    pub fn forward_steps(&self, steps: usize) -> Result<MigrationReport> {
        let started = Instant::now();
        let migrations = self.migrations()?;
        let current = self.current_version()?;

        let pending: Vec<Version> = migrations
            .iter()
            .map(|m| m.version)
            .filter(|&v| v > current)
            .take(steps)
            .collect();
        match pending.last() {
            Some(&target) => self.run_up(&migrations, current, Some(target), started),
            None => Ok(MigrationReport::noop(current, started)),
        }
    }

    /// Revert the most recently applied migration.
    pub fn rollback(&self) -> Result<MigrationReport> {
        self.rollback_steps(1)
    }

    /// Revert the `steps` most recently applied migrations, one at a time.
    pub fn rollback_steps(&self, steps: usize) -> Result<MigrationReport> {
        let started = Instant::now();
        let migrations = self.migrations()?;
        let current = self.current_version()?;

        let applied: Vec<Version> = migrations
            .iter()
            .map(|m| m.version)
            .filter(|&v| v <= current)
            .collect();
        if steps == 0 || applied.is_empty() {
            return Ok(MigrationReport::noop(current, started));
        }

        let target = if steps >= applied.len() {
            0
        } else {
            applied[applied.len() - 1 - steps]
        };
        self.run_down(&migrations, current, Some(target), started)
    }

    /// Bring the store to `target`, or apply everything pending when `target`
    /// is `None`. `Some(0)` reverts everything. `path` overrides the
    /// configured migrations path for this call only.
    pub fn migrate(&self, target: Option<Version>, path: Option<&Path>) -> Result<MigrationReport> {
        let started = Instant::now();
        let path = path.unwrap_or(self.migrations_path.as_path());
        let migrations = self.loader.load(path)?;
        check_target(&migrations, target)?;
        let current = self.current_version()?;

        match target {
            None => self.run_up(&migrations, current, None, started),
            Some(t) if t > current => self.run_up(&migrations, current, Some(t), started),
            Some(t) if t < current => self.run_down(&migrations, current, Some(t), started),
            Some(_) => {
                debug!("already at version {current}");
                Ok(MigrationReport::noop(current, started))
            }
        }
    }

    fn run_up(
        &self,
        migrations: &[Migration],
        current: Version,
        target: Option<Version>,
        started: Instant,
    ) -> Result<MigrationReport> {
        let runnable: Vec<&Migration> = migrations
            .iter()
            .filter(|m| m.version > current && target.is_none_or(|t| m.version <= t))
            .collect();
        if runnable.is_empty() {
            return Ok(MigrationReport::noop(current, started));
        }

        let mut version = current;
        let mut executed = Vec::with_capacity(runnable.len());
        for migration in runnable {
            self.announce(migration, "migrating");
            let unit_started = Instant::now();
            if let Err(e) = migration.apply(self.store()) {
                warn!(
                    "{} {} failed to apply, ledger left at {version}: {e}",
                    migration.version, migration.name
                );
                return Err(e);
            }
            self.ledger.set(migration.version)?;
            version = migration.version;
            executed.push(version);
            self.announce(
                migration,
                &format!("migrated ({:.4}s)", unit_started.elapsed().as_secs_f64()),
            );
        }

        Ok(MigrationReport {
            direction: Some(Direction::Up),
            from_version: current,
            to_version: version,
            executed,
            elapsed: started.elapsed(),
        })
    }

    fn run_down(
        &self,
        migrations: &[Migration],
        current: Version,
        target: Option<Version>,
        started: Instant,
    ) -> Result<MigrationReport> {
        let floor = target.unwrap_or(0);
        let runnable: Vec<&Migration> = migrations
            .iter()
            .rev()
            .filter(|m| m.version <= current && m.version > floor)
            .collect();
        if runnable.is_empty() {
            return Ok(MigrationReport::noop(current, started));
        }

        let mut version = current;
        let mut executed = Vec::with_capacity(runnable.len());
        for migration in runnable {
            self.announce(migration, "reverting");
            let unit_started = Instant::now();
            if let Err(e) = migration.revert(self.store()) {
                warn!(
                    "{} {} failed to revert, ledger left at {version}: {e}",
                    migration.version, migration.name
                );
                return Err(e);
            }
            version = previous_version(migrations, migration.version);
            self.ledger.set(version)?;
            executed.push(migration.version);
            self.announce(
                migration,
                &format!("reverted ({:.4}s)", unit_started.elapsed().as_secs_f64()),
            );
        }

        Ok(MigrationReport {
            direction: Some(Direction::Down),
            from_version: current,
            to_version: version,
            executed,
            elapsed: started.elapsed(),
        })
    }

    fn announce(&self, migration: &Migration, message: &str) {
        if self.verbose {
            info!("== {} {}: {message}", migration.version, migration.name);
        } else {
            debug!("== {} {}: {message}", migration.version, migration.name);
        }
    }
}

/// Reject non-zero targets that no loaded migration carries.
fn check_target(migrations: &[Migration], target: Option<Version>) -> Result<()> {
    match target {
        Some(t) if t != 0 && !migrations.iter().any(|m| m.version == t) => {
            Err(Error::UnknownMigrationVersion(t))
        }
        _ => Ok(()),
    }
}

/// The highest loaded version below `version`, or 0.
fn previous_version(migrations: &[Migration], version: Version) -> Version {
    migrations
        .iter()
        .rev()
        .map(|m| m.version)
        .find(|&v| v < version)
        .unwrap_or(0)
}
