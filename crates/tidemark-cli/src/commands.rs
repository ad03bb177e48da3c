use std::path::Path;

use anyhow::{Context, Result};
use tidemark_config::{ConfigLoader, MigratorConfig};
use tidemark_db::SqliteStore;
use tidemark_migrator::{MigrationGenerator, Migrator};
use tracing::{debug, info};

use crate::output;
use crate::{Cli, Command};

pub fn run(cli: Cli) -> Result<()> {
    let mut config = resolve_config(
        cli.config.as_deref(),
        cli.database.as_deref(),
        cli.path.as_deref(),
    )?;
    debug!(?config, "resolved configuration");

    match cli.command {
        Command::New { name, sequential } => {
            if sequential {
                config.timestamped_migrations = false;
            }
            let path = MigrationGenerator::from_config(&config).create(&name)?;
            println!("Created {}", path.display());
        }
        Command::Migrate { version } => {
            let report = open_migrator(&config)?.migrate(version, None)?;
            output::print_report(&report, cli.json)?;
        }
        Command::Up { to } => {
            let report = open_migrator(&config)?.up(to)?;
            output::print_report(&report, cli.json)?;
        }
        Command::Down { to } => {
            let report = open_migrator(&config)?.down(to)?;
            output::print_report(&report, cli.json)?;
        }
        Command::Forward { version, steps } => {
            let migrator = open_migrator(&config)?;
            let report = match version {
                Some(version) => migrator.forward(version)?,
                None => migrator.forward_steps(steps.unwrap_or(1))?,
            };
            output::print_report(&report, cli.json)?;
        }
        Command::Rollback { steps } => {
            let report = open_migrator(&config)?.rollback_steps(steps)?;
            output::print_report(&report, cli.json)?;
        }
        Command::Status => {
            let migrator = open_migrator(&config)?;
            let current = migrator.current_version()?;
            let statuses = migrator.status()?;
            output::print_status(&statuses, current, cli.json)?;
        }
        Command::Pending => {
            let pending = open_migrator(&config)?.pending_migrations()?;
            output::print_pending(&pending, cli.json)?;
        }
        Command::Version => {
            let current = open_migrator(&config)?.current_version()?;
            output::print_version(current, cli.json)?;
        }
    }

    Ok(())
}

/// Open the configured database, creating its parent directory if needed.
fn open_migrator(config: &MigratorConfig) -> Result<Migrator<SqliteStore>> {
    if let Some(parent) = config.database.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let store = SqliteStore::open(&config.database)?;
    let migrator = Migrator::new(store, config);
    info!(
        "using migrations in {} against {}",
        migrator.migrations_path().display(),
        config.database.display()
    );
    Ok(migrator)
}

/// Config file, then `TIDEMARK_*` environment, then command-line flags.
pub fn resolve_config(
    config_path: Option<&Path>,
    database: Option<&Path>,
    migrations_path: Option<&Path>,
) -> Result<MigratorConfig> {
    let config = match config_path {
        Some(path) => ConfigLoader::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ConfigLoader::discover(Path::new("."))?,
    };
    let mut config = ConfigLoader::apply_env(config)?;

    if let Some(database) = database {
        config.database = database.to_path_buf();
    }
    if let Some(path) = migrations_path {
        config.migrations_path = path.to_path_buf();
    }
    Ok(config)
}
