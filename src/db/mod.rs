use anyhow::{Context, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// A schema step, applied once and in version order.
pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    sql: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "Users, sessions, posts, categories, tags",
    sql: include_str!("migrations/001_initial.sql"),
}];

/// Where a known migration stands in this database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub version: i32,
    pub description: &'static str,
    pub applied_at: Option<String>,
}

#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    pub fn open(path: &str) -> Result<Self> {
        Self::open_with_pool_size(path, 10)
    }

    pub fn open_with_pool_size(path: &str, pool_size: u32) -> Result<Self> {
        let path = Path::new(path);
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating database directory {}", dir.display()))?;
        }

        // pragmas and functions are per-connection, so every pooled connection sets them
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys=ON; PRAGMA busy_timeout=5000;")?;
            register_functions(conn)
        });
        let pool = Pool::builder().max_size(pool_size.max(1)).build(manager)?;

        pool.get()?.execute_batch("PRAGMA journal_mode=WAL;")?;
        tracing::debug!(path = %path.display(), pool_size, "Opened database");

        Ok(Self { pool })
    }

    pub fn get(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Applies every pending migration, each in its own transaction.
    pub fn migrate(&self) -> Result<()> {
        let mut conn = self.get()?;
        ensure_migrations_table(&conn)?;

        let current: i32 = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )?;

        for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
            tracing::info!(version = migration.version, "Applying migration: {}", migration.description);
            let tx = conn.transaction()?;
            tx.execute_batch(migration.sql)
                .with_context(|| format!("migration {:03} failed", migration.version))?;
            tx.execute(
                "INSERT INTO schema_migrations (version) VALUES (?1)",
                [migration.version],
            )?;
            tx.commit()?;
        }

        Ok(())
    }

    pub fn migration_status(&self) -> Result<Vec<MigrationStatus>> {
        let conn = self.get()?;
        ensure_migrations_table(&conn)?;

        MIGRATIONS
            .iter()
            .map(|migration| -> Result<MigrationStatus> {
                let applied_at = conn
                    .query_row(
                        "SELECT applied_at FROM schema_migrations WHERE version = ?1",
                        [migration.version],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(MigrationStatus {
                    version: migration.version,
                    description: migration.description,
                    applied_at,
                })
            })
            .collect()
    }
}

/// SQLite's LOWER and LIKE only fold ASCII; `fold_case` lowercases any script.
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )
}

fn ensure_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
             version INTEGER PRIMARY KEY,
             applied_at TEXT DEFAULT CURRENT_TIMESTAMP
         );",
    )?;
    Ok(())
}
