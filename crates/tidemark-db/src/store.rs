use tidemark_common::{Result, Version};

/// The persistence backend a migrator runs against.
///
/// It owns a single "current version" record and can execute arbitrary
/// change scripts. Implementations report failures as errors; the migrator
/// passes them through untouched.
pub trait DataStore {
    /// The recorded version, or `0` when nothing is recorded.
    fn current_version(&self) -> Result<Version>;

    fn set_current_version(&self, version: Version) -> Result<()>;

    /// Drop the record so `current_version` reads `0` again.
    fn reset(&self) -> Result<()>;

    /// Run a change script. Either the whole script takes effect or none of it.
    fn execute(&self, script: &str) -> Result<()>;
}

impl<T: DataStore + ?Sized> DataStore for &T {
    fn current_version(&self) -> Result<Version> {
        (**self).current_version()
    }

    fn set_current_version(&self, version: Version) -> Result<()> {
        (**self).set_current_version(version)
    }

    fn reset(&self) -> Result<()> {
        (**self).reset()
    }

    fn execute(&self, script: &str) -> Result<()> {
        (**self).execute(script)
    }
}
