use std::path::{Path, PathBuf};

use tidemark_common::{Error, Result};
use tracing::{debug, info};

use crate::model::MigratorConfig;

const CONFIG_FILE_NAMES: &[&str] = &["tidemark.yml", "tidemark.yaml", "tidemark.toml"];

pub const ENV_MIGRATIONS_PATH: &str = "TIDEMARK_MIGRATIONS_PATH";
pub const ENV_DATABASE: &str = "TIDEMARK_DATABASE";
pub const ENV_TIMESTAMPED: &str = "TIDEMARK_TIMESTAMPED_MIGRATIONS";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Read a config file. The format is picked from the extension.
    pub fn load(path: &Path) -> Result<MigratorConfig> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", path.display()))
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config = match ext {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .map_err(|e| Error::Config(format!("YAML parse error: {e}")))?,
            "toml" => toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("TOML parse error: {e}")))?,
            other => {
                return Err(Error::Config(format!(
                    "unsupported config extension: {other}"
                )));
            }
        };

        info!("config loaded from {}", path.display());
        Ok(config)
    }

    /// Look for a `tidemark.{yml,yaml,toml}` in `dir`. Falls back to the
    /// defaults when none exists.
    pub fn discover(dir: &Path) -> Result<MigratorConfig> {
        match Self::find(dir) {
            Some(path) => Self::load(&path),
            None => {
                debug!("no config file in {}, using defaults", dir.display());
                Ok(MigratorConfig::default())
            }
        }
    }

    pub fn find(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.is_file())
    }

    /// Apply `TIDEMARK_*` overrides from the process environment.
    pub fn apply_env(config: MigratorConfig) -> Result<MigratorConfig> {
        Self::apply_overrides(config, |key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(mut config: MigratorConfig, lookup: F) -> Result<MigratorConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_MIGRATIONS_PATH) {
            config.migrations_path = PathBuf::from(path);
        }
        if let Some(db) = lookup(ENV_DATABASE) {
            config.database = PathBuf::from(db);
        }
        if let Some(flag) = lookup(ENV_TIMESTAMPED) {
            config.timestamped_migrations = parse_bool(&flag).ok_or_else(|| {
                Error::Config(format!("{ENV_TIMESTAMPED} must be a boolean, got {flag:?}"))
            })?;
        }
        Ok(config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
