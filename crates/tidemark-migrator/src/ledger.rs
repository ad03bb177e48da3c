use tidemark_common::{Result, Version};
use tidemark_db::DataStore;

/// The persisted "current version" record, written once per completed unit.
pub struct VersionLedger<S> {
    store: S,
}

impl<S: DataStore> VersionLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn get(&self) -> Result<Version> {
        self.store.current_version()
    }

    /// Record `version`. Setting `0` clears the record.
    pub fn set(&self, version: Version) -> Result<()> {
        if version == 0 {
            self.store.reset()
        } else {
            self.store.set_current_version(version)
        }
    }
}
