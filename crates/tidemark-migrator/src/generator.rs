use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tidemark_common::{Error, Result, Version};
use tidemark_config::MigratorConfig;
use tracing::info;

use crate::naming::{camelize, parse_file_name, underscore};

const MIN_SEQUENTIAL_WIDTH: usize = 3;
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// The next version string for a new migration in `dir`.
///
/// Timestamped mode uses `now` as `YYYYMMDDHHMMSS`, bumped past the newest
/// existing version if the clock has not moved beyond it. Sequential mode
/// uses `last + 1`, zero-padded to the width of the existing versions.
pub fn next_migration_number(dir: &Path, timestamped: bool, now: DateTime<Utc>) -> Result<String> {
    let latest = latest_migration_number(dir)?;

    if timestamped {
        let stamp = now.format(TIMESTAMP_FORMAT).to_string();
        return match (stamp.parse::<Version>(), latest) {
            (Ok(value), Some((last, _))) if value <= last => Ok(successor(last)?.to_string()),
            _ => Ok(stamp),
        };
    }

    let (last, width) = latest.unwrap_or((0, MIN_SEQUENTIAL_WIDTH));
    let width = width.max(MIN_SEQUENTIAL_WIDTH);
    Ok(format!("{:0width$}", successor(last)?))
}

fn successor(last: Version) -> Result<Version> {
    last.checked_add(1).ok_or_else(|| {
        Error::InvalidMigrationFile(format!("no version number left after {last}"))
    })
}

/// Highest version in `dir` and the digit count it was written with.
fn latest_migration_number(dir: &Path) -> Result<Option<(Version, usize)>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut latest: Option<(Version, usize)> = None;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(parts) = file_name.to_str().and_then(parse_file_name) else {
            continue;
        };
        let Ok(version) = parts.version.parse::<Version>() else {
            continue;
        };
        let width = parts.version.len();
        latest = match latest {
            Some((v, w)) if v > version => Some((v, w)),
            Some((v, w)) if v == version => Some((v, w.max(width))),
            _ => Some((version, width)),
        };
    }
    Ok(latest)
}

/// Scaffolds new migration files.
#[derive(Debug, Clone)]
pub struct MigrationGenerator {
    migrations_path: PathBuf,
    timestamped: bool,
}

impl MigrationGenerator {
    pub fn new(migrations_path: impl Into<PathBuf>, timestamped: bool) -> Self {
        Self {
            migrations_path: migrations_path.into(),
            timestamped,
        }
    }

    pub fn from_config(config: &MigratorConfig) -> Self {
        Self::new(config.migrations_path.clone(), config.timestamped_migrations)
    }

    /// Write `<version>_<snake_name>.sql` and return its path.
    pub fn create(&self, name: &str) -> Result<PathBuf> {
        self.create_at(name, Utc::now())
    }

    pub fn create_at(&self, name: &str, now: DateTime<Utc>) -> Result<PathBuf> {
        let snake = underscore(name);
        if snake.is_empty() {
            return Err(Error::InvalidMigrationFile(format!(
                "migration name {name:?} has no usable characters"
            )));
        }
        let display = camelize(&snake);
        self.ensure_name_is_free(&display)?;

        std::fs::create_dir_all(&self.migrations_path)?;
        let number = next_migration_number(&self.migrations_path, self.timestamped, now)?;
        let path = self.migrations_path.join(format!("{number}_{snake}.sql"));

        std::fs::write(&path, template(&display, &number, now))?;
        info!("created migration {}", path.display());
        Ok(path)
    }

    fn ensure_name_is_free(&self, display: &str) -> Result<()> {
        if !self.migrations_path.is_dir() {
            return Ok(());
        }
        for entry in std::fs::read_dir(&self.migrations_path)? {
            let file_name = entry?.file_name();
            let taken = file_name
                .to_str()
                .and_then(parse_file_name)
                .is_some_and(|parts| camelize(parts.name) == display);
            if taken {
                return Err(Error::DuplicateMigrationName(display.to_string()));
            }
        }
        Ok(())
    }
}

fn template(name: &str, number: &str, now: DateTime<Utc>) -> String {
    format!(
        "-- Migration: {name}\n\
         -- Version: {number}\n\
         -- Created: {}\n\n\
         -- up\n\n\n\
         -- down\n\n",
        now.format("%Y-%m-%d %H:%M:%S UTC")
    )
}
