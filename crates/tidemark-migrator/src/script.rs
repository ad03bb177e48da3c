use std::path::Path;

use tidemark_common::{Error, Result};
use tidemark_db::DataStore;

use crate::unit::MigrationScript;

/// Builds the runtime for a migration file the loader matched.
pub trait ScriptFactory: Send + Sync {
    /// Whether files with this extension are migrations for this factory.
    fn accepts(&self, extension: &str) -> bool;

    fn build(&self, path: &Path) -> Result<Box<dyn MigrationScript>>;
}

/// Plain SQL migration split into an up part and a down part.
///
/// ```sql
/// -- up
/// CREATE TABLE surveys (label TEXT);
/// -- down
/// DROP TABLE surveys;
/// ```
///
/// A marker line holds nothing but `up` or `down`, optionally followed by
/// `:`. Anything before the first marker belongs to the up part.
///
/// Each part already runs inside a transaction opened by the store, so a
/// script must not issue its own `BEGIN` / `COMMIT`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlScript {
    pub up: String,
    pub down: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Up,
    Down,
}

impl SqlScript {
    pub fn parse(content: &str) -> Self {
        let mut up = Vec::new();
        let mut down = Vec::new();
        let mut section = Section::Up;

        for line in content.lines() {
            if let Some(marker) = section_marker(line) {
                section = marker;
                continue;
            }
            match section {
                Section::Up => up.push(line),
                Section::Down => down.push(line),
            }
        }

        Self {
            up: up.join("\n").trim().to_string(),
            down: down.join("\n").trim().to_string(),
        }
    }
}

fn section_marker(line: &str) -> Option<Section> {
    let comment = line.trim().strip_prefix("--")?;
    match comment.trim().trim_end_matches(':').to_ascii_lowercase().as_str() {
        "up" => Some(Section::Up),
        "down" => Some(Section::Down),
        _ => None,
    }
}

impl MigrationScript for SqlScript {
    fn apply(&self, store: &dyn DataStore) -> Result<()> {
        if self.up.is_empty() {
            return Ok(());
        }
        store.execute(&self.up)
    }

    fn revert(&self, store: &dyn DataStore) -> Result<()> {
        if self.down.is_empty() {
            return Ok(());
        }
        store.execute(&self.down)
    }
}

/// Loads `.sql` files as [`SqlScript`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlScriptFactory;

impl ScriptFactory for SqlScriptFactory {
    fn accepts(&self, extension: &str) -> bool {
        extension.eq_ignore_ascii_case("sql")
    }

    fn build(&self, path: &Path) -> Result<Box<dyn MigrationScript>> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidMigrationFile(format!("failed to read {}: {e}", path.display()))
        })?;
        Ok(Box::new(SqlScript::parse(&content)))
    }
}
