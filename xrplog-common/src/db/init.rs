//! Database initialization
//!
//! Creates the log database on first run; opening an existing database is a
//! no-op beyond connecting. Table creation is idempotent.

use crate::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

/// Initialize the database connection pool and create the logs table if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL allows the coordinator to append while maintenance reads run
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_logs_table(&pool).await?;

    Ok(pool)
}

/// Create the logs table (idempotent)
///
/// AUTOINCREMENT keeps row ids monotonically increasing and never reused
/// after deletion. One row per classified record; the nullable columns are
/// populated according to the row's `type` discriminant.
async fn create_logs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            type INTEGER NOT NULL,
            account TEXT,
            destination TEXT,
            balance TEXT,
            amount INTEGER,
            peers INTEGER,
            fee REAL,
            sequence TEXT,
            message TEXT,
            time_created INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
