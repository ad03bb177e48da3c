use std::fmt;
use std::path::PathBuf;

use tidemark_common::{Result, Version};
use tidemark_db::DataStore;

/// The executable half of a migration. The engine never looks inside.
pub trait MigrationScript: Send + Sync {
    fn apply(&self, store: &dyn DataStore) -> Result<()>;
    fn revert(&self, store: &dyn DataStore) -> Result<()>;
}

/// One versioned, named, reversible change.
pub struct Migration {
    pub version: Version,
    /// CamelCase display name derived from the file name.
    pub name: String,
    pub filename: PathBuf,
    script: Box<dyn MigrationScript>,
}

impl Migration {
    pub fn new(
        version: Version,
        name: impl Into<String>,
        filename: impl Into<PathBuf>,
        script: Box<dyn MigrationScript>,
    ) -> Self {
        Self {
            version,
            name: name.into(),
            filename: filename.into(),
            script,
        }
    }

    pub fn apply(&self, store: &dyn DataStore) -> Result<()> {
        self.script.apply(store)
    }

    pub fn revert(&self, store: &dyn DataStore) -> Result<()> {
        self.script.revert(store)
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("version", &self.version)
            .field("name", &self.name)
            .field("filename", &self.filename)
            .finish_non_exhaustive()
    }
}
