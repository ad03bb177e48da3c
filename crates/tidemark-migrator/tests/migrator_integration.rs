use std::path::Path;

use tempfile::TempDir;
use tidemark_common::Error;
use tidemark_config::MigratorConfig;
use tidemark_db::{DataStore, SqliteStore};
use tidemark_migrator::{Direction, Migrator};

const FIRST_MIGRATION: i64 = 20100513054656;
const SECOND_MIGRATION: i64 = 20100513063902;

/// Write the two-step survey fixture used across these tests.
fn valid_migrations() -> TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    std::fs::write(
        dir.path().join("20100513054656_add_baseline_survey_schema.sql"),
        "-- up\n\
         CREATE TABLE IF NOT EXISTS survey_schemas (label TEXT NOT NULL);\n\
         INSERT INTO survey_schemas (label) VALUES ('Baseline Survey');\n\
         -- down\n\
         DELETE FROM survey_schemas WHERE label = 'Baseline Survey';\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("20100513063902_add_improvement_plan_survey_schema.sql"),
        "-- up\n\
         INSERT INTO survey_schemas (label) VALUES ('Improvement Plan Survey');\n\
         -- down\n\
         DELETE FROM survey_schemas WHERE label = 'Improvement Plan Survey';\n",
    )
    .unwrap();
    dir
}

fn migrator<'a>(store: &'a SqliteStore, dir: &Path) -> Migrator<&'a SqliteStore> {
    let config = MigratorConfig {
        migrations_path: dir.to_path_buf(),
        ..Default::default()
    };
    Migrator::new(store, &config)
}

fn survey_count(store: &SqliteStore, label: Option<&str>) -> i64 {
    let sql = match label {
        Some(label) => format!("SELECT COUNT(*) FROM survey_schemas WHERE label = '{label}'"),
        None => "SELECT COUNT(*) FROM survey_schemas".to_string(),
    };
    store.query_count(&sql).unwrap()
}

#[test]
fn fresh_store_starts_at_version_zero() {
    let dir = valid_migrations();
    let store = SqliteStore::in_memory().unwrap();
    assert_eq!(migrator(&store, dir.path()).current_version().unwrap(), 0);
}

#[test]
fn finds_migrations() {
    let dir = valid_migrations();
    let store = SqliteStore::in_memory().unwrap();
    let migrator = migrator(&store, dir.path());

    let migrations = migrator.migrations().unwrap();
    assert_eq!(migrations.len(), 2);
    assert!(migrations.windows(2).all(|w| w[0].version < w[1].version));
    assert_eq!(migrator.pending_migrations().unwrap().len(), 2);
}

#[test]
fn migrate_to_a_version_sets_current_version() {
    let dir = valid_migrations();
    let store = SqliteStore::in_memory().unwrap();
    let migrator = migrator(&store, dir.path());

    migrator.migrate(Some(FIRST_MIGRATION), None).unwrap();
    assert_eq!(migrator.current_version().unwrap(), FIRST_MIGRATION);
}

#[test]
fn migrate_to_current_version_is_a_noop() {
    let dir = valid_migrations();
    let store = SqliteStore::in_memory().unwrap();
    let migrator = migrator(&store, dir.path());

    let first = migrator.migrate(Some(SECOND_MIGRATION), None).unwrap();
    assert_eq!(first.executed, vec![FIRST_MIGRATION, SECOND_MIGRATION]);

    let again = migrator.migrate(Some(SECOND_MIGRATION), None).unwrap();
    assert!(again.is_noop());
    assert_eq!(migrator.current_version().unwrap(), SECOND_MIGRATION);
    assert_eq!(survey_count(&store, None), 2);
}

#[test]
fn up_then_down_returns_to_zero() {
    let dir = valid_migrations();
    let store = SqliteStore::in_memory().unwrap();
    let migrator = migrator(&store, dir.path());

    migrator.up(None).unwrap();
    assert_eq!(migrator.current_version().unwrap(), SECOND_MIGRATION);
    assert_eq!(survey_count(&store, None), 2);

    let report = migrator.down(None).unwrap();
    assert_eq!(report.direction, Some(Direction::Down));
    assert_eq!(report.executed, vec![SECOND_MIGRATION, FIRST_MIGRATION]);
    assert_eq!(migrator.current_version().unwrap(), 0);

    // The table itself survives; only the seeded rows are gone.
    store
        .execute("INSERT INTO survey_schemas (label) VALUES ('Questionable Survey');")
        .unwrap();
    assert_eq!(survey_count(&store, None), 1);
}

#[test]
fn two_up_and_one_down() {
    let dir = valid_migrations();
    let store = SqliteStore::in_memory().unwrap();
    let migrator = migrator(&store, dir.path());

    migrator.up(Some(FIRST_MIGRATION)).unwrap();
    assert_eq!(migrator.current_version().unwrap(), FIRST_MIGRATION);
    assert_eq!(survey_count(&store, Some("Baseline Survey")), 1);
    assert_eq!(survey_count(&store, Some("Improvement Plan Survey")), 0);
    assert_eq!(survey_count(&store, None), 1);

    migrator.up(Some(SECOND_MIGRATION)).unwrap();
    assert_eq!(migrator.current_version().unwrap(), SECOND_MIGRATION);
    assert_eq!(survey_count(&store, Some("Improvement Plan Survey")), 1);
    assert_eq!(survey_count(&store, None), 2);

    migrator.down(Some(FIRST_MIGRATION)).unwrap();
    assert_eq!(migrator.current_version().unwrap(), FIRST_MIGRATION);
    assert_eq!(survey_count(&store, Some("Improvement Plan Survey")), 0);
    assert_eq!(survey_count(&store, Some("Baseline Survey")), 1);
    assert_eq!(survey_count(&store, None), 1);
}

#[test]
fn finds_pending_migrations() {
    let dir = valid_migrations();
    let store = SqliteStore::in_memory().unwrap();
    let migrator = migrator(&store, dir.path());

    migrator.up(Some(FIRST_MIGRATION)).unwrap();
    let pending = migrator.pending_migrations().unwrap();

    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].version, SECOND_MIGRATION);
    assert_eq!(pending[0].name, "AddImprovementPlanSurveySchema");
}

#[test]
fn rollback_undoes_one_migration_at_a_time() {
    let dir = valid_migrations();
    let store = SqliteStore::in_memory().unwrap();
    let migrator = migrator(&store, dir.path());

    migrator.migrate(None, None).unwrap();
    assert_eq!(migrator.current_version().unwrap(), SECOND_MIGRATION);

    let report = migrator.rollback().unwrap();
    assert_eq!(report.executed, vec![SECOND_MIGRATION]);
    assert_eq!(migrator.current_version().unwrap(), FIRST_MIGRATION);

    migrator.rollback().unwrap();
    assert_eq!(migrator.current_version().unwrap(), 0);
}

#[test]
fn forward_moves_to_a_later_version() {
    let dir = valid_migrations();
    let store = SqliteStore::in_memory().unwrap();
    let migrator = migrator(&store, dir.path());

    migrator.migrate(Some(FIRST_MIGRATION), None).unwrap();
    assert_eq!(migrator.current_version().unwrap(), FIRST_MIGRATION);

    migrator.forward(SECOND_MIGRATION).unwrap();
    assert_eq!(migrator.current_version().unwrap(), SECOND_MIGRATION);
}

#[test]
fn migrate_to_an_earlier_known_version_only_reverts() {
    let dir = valid_migrations();
    let store = SqliteStore::in_memory().unwrap();
    let migrator = migrator(&store, dir.path());

    migrator.up(None).unwrap();
    let report = migrator.migrate(Some(FIRST_MIGRATION), None).unwrap();
    assert_eq!(report.direction, Some(Direction::Down));
    assert_eq!(report.executed, vec![SECOND_MIGRATION]);

    let report = migrator.migrate(Some(0), None).unwrap();
    assert_eq!(report.executed, vec![FIRST_MIGRATION]);
    assert_eq!(migrator.current_version().unwrap(), 0);
}

#[test]
fn duplicate_names_fail_to_migrate() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("20100513054656_add_survey.sql"), "").unwrap();
    std::fs::write(dir.path().join("20100513063902_add_survey.sql"), "").unwrap();

    let store = SqliteStore::in_memory().unwrap();
    let valid = valid_migrations();
    let migrator = migrator(&store, valid.path());

    let err = migrator.migrate(None, Some(dir.path())).unwrap_err();
    assert!(matches!(err, Error::DuplicateMigrationName(_)));
    assert_eq!(err.exit_code(), 3);
    assert_eq!(migrator.current_version().unwrap(), 0);
}

#[test]
fn duplicate_versions_fail_to_migrate() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("20100513054656_add_survey.sql"), "").unwrap();
    std::fs::write(dir.path().join("20100513054656_add_other_survey.sql"), "").unwrap();

    let store = SqliteStore::in_memory().unwrap();
    let valid = valid_migrations();
    let migrator = migrator(&store, valid.path());

    let err = migrator.migrate(None, Some(dir.path())).unwrap_err();
    assert!(matches!(err, Error::DuplicateMigrationVersion(FIRST_MIGRATION)));
}

#[test]
fn unknown_target_runs_nothing() {
    let dir = valid_migrations();
    let store = SqliteStore::in_memory().unwrap();
    let migrator = migrator(&store, dir.path());

    migrator.up(Some(FIRST_MIGRATION)).unwrap();

    let err = migrator.migrate(Some(500), None).unwrap_err();
    assert!(matches!(err, Error::UnknownMigrationVersion(500)));
    assert_eq!(migrator.current_version().unwrap(), FIRST_MIGRATION);
    assert_eq!(survey_count(&store, None), 1);
}

#[test]
fn failing_migration_leaves_ledger_at_last_success() {
    let dir = valid_migrations();
    std::fs::write(
        dir.path().join("20100514000000_break_things.sql"),
        "-- up\nINSERT INTO no_such_table (x) VALUES (1);\n-- down\n",
    )
    .unwrap();
    let store = SqliteStore::in_memory().unwrap();
    let migrator = migrator(&store, dir.path());

    let err = migrator.up(None).unwrap_err();
    assert!(matches!(err, Error::Database(_)));
    assert_eq!(migrator.current_version().unwrap(), SECOND_MIGRATION);
    assert_eq!(survey_count(&store, None), 2);
    assert_eq!(migrator.pending_migrations().unwrap().len(), 1);
}

#[test]
fn failing_revert_stops_the_down_run() {
    let dir = valid_migrations();
    std::fs::write(
        dir.path().join("20100514000000_irreversible.sql"),
        "-- up\n-- down\nSELECT * FROM no_such_table;\n",
    )
    .unwrap();
    let store = SqliteStore::in_memory().unwrap();
    let migrator = migrator(&store, dir.path());

    migrator.up(None).unwrap();
    assert!(migrator.down(None).is_err());
    assert_eq!(migrator.current_version().unwrap(), 20100514000000);
    assert_eq!(survey_count(&store, None), 2);
}

#[test]
fn rollback_k_times_lands_on_earlier_versions() {
    let dir = tempfile::tempdir().unwrap();
    let versions = [3_i64, 8, 21, 34, 55];
    for (i, v) in versions.iter().enumerate() {
        std::fs::write(dir.path().join(format!("{v}_step_{i}.sql")), "-- up\n-- down\n").unwrap();
    }
    let store = SqliteStore::in_memory().unwrap();
    let migrator = migrator(&store, dir.path());

    for k in 0..=versions.len() + 1 {
        migrator.up(None).unwrap();
        for _ in 0..k {
            migrator.rollback().unwrap();
        }
        let expected = if k >= versions.len() {
            0
        } else {
            versions[versions.len() - 1 - k]
        };
        assert_eq!(migrator.current_version().unwrap(), expected, "k = {k}");
    }
}

#[test]
fn directory_changes_are_picked_up_between_calls() {
    let dir = valid_migrations();
    let store = SqliteStore::in_memory().unwrap();
    let migrator = migrator(&store, dir.path());

    migrator.up(None).unwrap();
    std::fs::write(
        dir.path().join("20100601000000_add_followup_survey.sql"),
        "-- up\nINSERT INTO survey_schemas (label) VALUES ('Followup');\n-- down\nDELETE FROM survey_schemas WHERE label = 'Followup';\n",
    )
    .unwrap();

    assert_eq!(migrator.pending_migrations().unwrap().len(), 1);
    migrator.up(None).unwrap();
    assert_eq!(migrator.current_version().unwrap(), 20100601000000);
}

#[test]
fn ledger_persists_across_store_handles() {
    let dir = valid_migrations();
    let db_dir = tempfile::tempdir().unwrap();
    let db_path = db_dir.path().join("app.db");

    {
        let store = SqliteStore::open(&db_path).unwrap();
        migrator(&store, dir.path()).up(Some(FIRST_MIGRATION)).unwrap();
    }

    let store = SqliteStore::open(&db_path).unwrap();
    let migrator = migrator(&store, dir.path());
    assert_eq!(migrator.current_version().unwrap(), FIRST_MIGRATION);
    assert_eq!(migrator.pending_migrations().unwrap().len(), 1);
}
