use anyhow::Result;
use serde_json::json;
use tidemark_common::Version;
use tidemark_migrator::{Migration, MigrationReport, MigrationState, MigrationStatus};

pub fn print_report(report: &MigrationReport, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", format_report(report));
    }
    Ok(())
}

pub fn format_report(report: &MigrationReport) -> String {
    match report.direction {
        None => format!("Nothing to do; at version {}", report.to_version),
        Some(direction) => {
            let count = report.executed.len();
            format!(
                "Ran {count} migration{} {direction}: {} -> {} ({:.2}s)",
                if count == 1 { "" } else { "s" },
                report.from_version,
                report.to_version,
                report.elapsed.as_secs_f64()
            )
        }
    }
}

pub fn print_status(statuses: &[MigrationStatus], current: Version, as_json: bool) -> Result<()> {
    if as_json {
        let value = json!({ "current_version": current, "migrations": statuses });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", format_status(statuses, current));
    }
    Ok(())
}

pub fn format_status(statuses: &[MigrationStatus], current: Version) -> String {
    let id_w = statuses
        .iter()
        .map(|s| s.version.to_string().len())
        .max()
        .unwrap_or(0)
        .max("Migration ID".len());

    let mut out = format!("Current version: {current}\n\n");
    let header = format!(" Status   {:<id_w$}  Migration Name", "Migration ID");
    out.push_str(&header);
    out.push('\n');
    out.push_str(&"-".repeat(header.len().max(50)));
    out.push('\n');
    for status in statuses {
        let state = match status.state {
            MigrationState::Applied => "up",
            MigrationState::Pending => "down",
        };
        out.push_str(&format!(
            "  {state:^6}  {:<id_w$}  {}\n",
            status.version, status.name
        ));
    }
    if statuses.is_empty() {
        out.push_str("  (no migrations found)\n");
    }
    out
}

pub fn print_pending(pending: &[Migration], as_json: bool) -> Result<()> {
    if as_json {
        let items: Vec<_> = pending
            .iter()
            .map(|m| json!({ "version": m.version, "name": m.name, "filename": m.filename }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if pending.is_empty() {
        println!("No pending migrations.");
    }
    for migration in pending {
        println!("{} {}", migration.version, migration.name);
    }
    Ok(())
}

pub fn print_version(current: Version, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", json!({ "current_version": current }));
    } else {
        println!("{current}");
    }
    Ok(())
}
