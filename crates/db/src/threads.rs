use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::Row as SqlxRow;
use thiserror::Error;
use tokio::sync::RwLock;

use atende_core::{ConversationTurn, Role};

use crate::DbPool;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("checkpoint store query failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("checkpoint store holds a corrupt row: {0}")]
    Corrupt(String),
}

/// Opaque per-thread conversation checkpoint store. The pipeline core
/// only ever loads prior turns before a run and appends the new turns
/// after it; everything else about persistence is this crate's business.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Prior turns of a thread in append order; empty for a new thread.
    async fn load(&self, thread_id: &str) -> Result<Vec<ConversationTurn>, StoreError>;

    /// Appends turns at the end of the thread, preserving their order.
    async fn append(
        &self,
        thread_id: &str,
        turns: &[ConversationTurn],
    ) -> Result<(), StoreError>;
}

pub struct SqliteConversationStore {
    pool: DbPool,
}

impl SqliteConversationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    async fn load(&self, thread_id: &str) -> Result<Vec<ConversationTurn>, StoreError> {
        let rows = sqlx::query(
            "SELECT role, content FROM conversation_turns \
             WHERE thread_id = ?1 ORDER BY turn_index",
        )
        .bind(thread_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let role: String = row.get("role");
                let content: String = row.get("content");
                let role = role
                    .parse::<Role>()
                    .map_err(|unknown| StoreError::Corrupt(unknown.to_string()))?;
                Ok(ConversationTurn { role, content })
            })
            .collect()
    }

    async fn append(
        &self,
        thread_id: &str,
        turns: &[ConversationTurn],
    ) -> Result<(), StoreError> {
        if turns.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        let next_index: i64 = sqlx::query(
            "SELECT COALESCE(MAX(turn_index) + 1, 0) AS next_index \
             FROM conversation_turns WHERE thread_id = ?1",
        )
        .bind(thread_id)
        .fetch_one(&mut *tx)
        .await?
        .get("next_index");

        for (offset, turn) in turns.iter().enumerate() {
            sqlx::query(
                "INSERT INTO conversation_turns (thread_id, turn_index, role, content) \
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(thread_id)
            .bind(next_index + offset as i64)
            .bind(turn.role.as_str())
            .bind(&turn.content)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Test and single-process stand-in keyed the same way as the sqlite
/// store.
#[derive(Default)]
pub struct InMemoryConversationStore {
    threads: RwLock<HashMap<String, Vec<ConversationTurn>>>,
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn load(&self, thread_id: &str) -> Result<Vec<ConversationTurn>, StoreError> {
        let threads = self.threads.read().await;
        Ok(threads.get(thread_id).cloned().unwrap_or_default())
    }

    async fn append(
        &self,
        thread_id: &str,
        turns: &[ConversationTurn],
    ) -> Result<(), StoreError> {
        let mut threads = self.threads.write().await;
        threads.entry(thread_id.to_string()).or_default().extend_from_slice(turns);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use atende_core::ConversationTurn;

    use super::{ConversationStore, InMemoryConversationStore, SqliteConversationStore};
    use crate::{migrations, test_pool};

    fn exchange() -> Vec<ConversationTurn> {
        vec![
            ConversationTurn::user("How many calls in 2023?"),
            ConversationTurn::assistant("There were 1,234 calls."),
        ]
    }

    #[tokio::test]
    async fn sqlite_store_round_trips_turns_in_order() {
        let pool = test_pool().await;
        migrations::run_pending(&pool).await.expect("migrations apply");
        let store = SqliteConversationStore::new(pool);

        assert!(store.load("thread-1").await.expect("load empty").is_empty());

        store.append("thread-1", &exchange()).await.expect("first append");
        store
            .append("thread-1", &[ConversationTurn::user("And in 2024?")])
            .await
            .expect("second append");

        let turns = store.load("thread-1").await.expect("load");
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].content, "How many calls in 2023?");
        assert_eq!(turns[1].content, "There were 1,234 calls.");
        assert_eq!(turns[2].content, "And in 2024?");
    }

    #[tokio::test]
    async fn sqlite_store_keeps_threads_independent() {
        let pool = test_pool().await;
        migrations::run_pending(&pool).await.expect("migrations apply");
        let store = SqliteConversationStore::new(pool);

        store.append("thread-a", &exchange()).await.expect("append a");
        store
            .append("thread-b", &[ConversationTurn::user("unrelated")])
            .await
            .expect("append b");

        assert_eq!(store.load("thread-a").await.expect("load a").len(), 2);
        assert_eq!(store.load("thread-b").await.expect("load b").len(), 1);
    }

    #[tokio::test]
    async fn in_memory_store_round_trips_turns() {
        let store = InMemoryConversationStore::default();
        store.append("t", &exchange()).await.expect("append");

        let turns = store.load("t").await.expect("load");
        assert_eq!(turns, exchange());
        assert!(store.load("other").await.expect("load other").is_empty());
    }
}
