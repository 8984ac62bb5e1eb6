use crate::cli::MigrateCommand;
use crate::db::MigrationStatus;
use crate::{Config, Database};
use anyhow::Result;
use std::path::Path;

pub async fn run(config_path: &Path, command: Option<MigrateCommand>) -> Result<()> {
    let config = Config::load(config_path)?;
    let db = Database::open(&config.database.path)?;

    match command {
        None => {
            db.migrate()?;
            tracing::info!(database = %config.database.path, "Database is up to date");
        }
        Some(MigrateCommand::Status) => print_status(&db.migration_status()?),
    }

    Ok(())
}

fn print_status(statuses: &[MigrationStatus]) {
    println!("{:<8} {:<48} APPLIED", "VERSION", "DESCRIPTION");
    for status in statuses {
        println!(
            "{:<8} {:<48} {}",
            format!("{:03}", status.version),
            status.description,
            status.applied_at.as_deref().unwrap_or("pending")
        );
    }

    let pending = statuses.iter().filter(|s| s.applied_at.is_none()).count();
    if pending > 0 {
        println!("\n{} pending; run `quillpost migrate` to apply.", pending);
    }
}
