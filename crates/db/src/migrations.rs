use sqlx::migrate::{MigrateError, Migrator};

use crate::DbPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run_pending(pool: &DbPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

#[cfg(test)]
mod tests {
    use sqlx::Row;

    use super::run_pending;
    use crate::test_pool;

    const MANAGED_SCHEMA_OBJECTS: &[&str] =
        &["conversation_turns", "idx_conversation_turns_thread_order"];

    #[tokio::test]
    async fn migrations_create_the_checkpoint_schema() {
        let pool = test_pool().await;
        run_pending(&pool).await.expect("migrations apply");

        for object in MANAGED_SCHEMA_OBJECTS {
            let found = sqlx::query(
                "SELECT name FROM sqlite_master WHERE name = ?1 AND type IN ('table', 'index')",
            )
            .bind(object)
            .fetch_optional(&pool)
            .await
            .expect("schema query");
            assert!(found.is_some(), "missing schema object {object}");
        }

        // idempotent re-run
        run_pending(&pool).await.expect("second run is a no-op");

        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM conversation_turns")
            .fetch_one(&pool)
            .await
            .expect("count query")
            .get("n");
        assert_eq!(count, 0);
    }
}
