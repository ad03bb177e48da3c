//! Versioned schema migrations.
//!
//! Migrations live in a directory as `<version>_<snake_name>.<ext>` files.
//! [`MigrationLoader`] turns the directory into an ordered set of
//! [`Migration`] units, and [`Migrator`] moves a [`DataStore`] between
//! versions, recording progress in a single-row version ledger after every
//! unit.
//!
//! [`DataStore`]: tidemark_db::DataStore

pub mod generator;
pub mod ledger;
pub mod loader;
pub mod migrator;
pub mod naming;
pub mod script;
pub mod unit;

pub use generator::{MigrationGenerator, next_migration_number};
pub use ledger::VersionLedger;
pub use loader::MigrationLoader;
pub use migrator::{Direction, MigrationReport, MigrationState, MigrationStatus, Migrator};
pub use script::{ScriptFactory, SqlScript, SqlScriptFactory};
pub use unit::{Migration, MigrationScript};
