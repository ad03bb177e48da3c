use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MIGRATIONS_PATH: &str = "db/migrate";
pub const DEFAULT_DATABASE: &str = "tidemark.db";

/// Settings shared by the migrator, the generator and the CLI.
///
/// Built once at startup and passed down explicitly; nothing reads it from
/// global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigratorConfig {
    /// Directory holding `<version>_<name>.<ext>` migration files.
    pub migrations_path: PathBuf,
    /// SQLite database file that holds the version ledger.
    pub database: PathBuf,
    /// Number new migrations with a UTC timestamp instead of `last + 1`.
    pub timestamped_migrations: bool,
    /// Announce every migration as it runs.
    pub verbose: bool,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            migrations_path: PathBuf::from(DEFAULT_MIGRATIONS_PATH),
            database: PathBuf::from(DEFAULT_DATABASE),
            timestamped_migrations: true,
            verbose: true,
        }
    }
}
