use thiserror::Error;

use crate::Version;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("multiple migrations have the name {0}")]
    DuplicateMigrationName(String),

    #[error("multiple migrations have the version number {0}")]
    DuplicateMigrationVersion(Version),

    #[error("no migration with version number {0}")]
    UnknownMigrationVersion(Version),

    #[error("invalid migration file: {0}")]
    InvalidMigrationFile(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Process exit code for command-line front ends. Author and operator
    /// mistakes get their own codes so scripts can tell them apart.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::DuplicateMigrationName(_) => 3,
            Error::DuplicateMigrationVersion(_) => 4,
            Error::UnknownMigrationVersion(_) => 5,
            _ => 1,
        }
    }
}
