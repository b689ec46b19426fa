use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;

use atende_core::config::DatabaseConfig;

pub type DbPool = sqlx::SqlitePool;

/// Opens the checkpoint-store pool with the pragmas the store relies on:
/// WAL for concurrent thread reads, foreign keys on, and a busy timeout
/// so interleaved appends from independent threads queue instead of
/// failing.
pub async fn connect(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .acquire_timeout(Duration::from_secs(config.timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect(&config.url)
        .await
}
