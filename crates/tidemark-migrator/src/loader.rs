use std::collections::HashSet;
use std::path::Path;

use tidemark_common::{Error, Result, Version};
use tracing::debug;

use crate::naming::{camelize, parse_file_name};
use crate::script::{ScriptFactory, SqlScriptFactory};
use crate::unit::Migration;

/// Scans a migrations directory into an ordered set of [`Migration`]s.
///
/// Nothing is cached: every call to [`load`](Self::load) reflects what is on
/// disk at that moment.
pub struct MigrationLoader {
    factory: Box<dyn ScriptFactory>,
}

impl MigrationLoader {
    pub fn new() -> Self {
        Self::with_factory(SqlScriptFactory)
    }

    pub fn with_factory(factory: impl ScriptFactory + 'static) -> Self {
        Self {
            factory: Box::new(factory),
        }
    }

    /// Load every migration in `dir`, ascending by version.
    ///
    /// A missing directory is treated like an empty one. Two files with the
    /// same version, or whose names camelize to the same display name, fail
    /// the whole load.
    pub fn load(&self, dir: &Path) -> Result<Vec<Migration>> {
        if !dir.is_dir() {
            debug!("migrations directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        // Directory order is unspecified; sort so duplicate reports are stable.
        files.sort();

        let mut versions: HashSet<Version> = HashSet::new();
        let mut names: HashSet<String> = HashSet::new();
        let mut migrations = Vec::with_capacity(files.len());

        for path in files {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(parts) = parse_file_name(file_name) else {
                debug!("skipping {file_name}: not a migration file name");
                continue;
            };
            if !self.factory.accepts(parts.extension) {
                debug!("skipping {file_name}: unsupported extension");
                continue;
            }

            let version: Version = parts.version.parse().map_err(|e| {
                Error::InvalidMigrationFile(format!("{file_name}: bad version number: {e}"))
            })?;
            let name = camelize(parts.name);

            if !versions.insert(version) {
                return Err(Error::DuplicateMigrationVersion(version));
            }
            if !names.insert(name.clone()) {
                return Err(Error::DuplicateMigrationName(name));
            }

            let script = self.factory.build(&path)?;
            migrations.push(Migration::new(version, name, path, script));
        }

        migrations.sort_by_key(|m| m.version);
        debug!("loaded {} migrations from {}", migrations.len(), dir.display());
        Ok(migrations)
    }
}

impl Default for MigrationLoader {
    fn default() -> Self {
        Self::new()
    }
}
