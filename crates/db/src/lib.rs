//! Conversation checkpoint persistence for `atende`.
//!
//! Thread history is the only durable state the pipeline touches; it is
//! modeled as an opaque key-value store keyed by thread identifier, with
//! a sqlite implementation for the CLI and an in-memory one for tests.

pub mod connection;
pub mod migrations;
pub mod threads;

pub use connection::{connect, DbPool};
pub use threads::{
    ConversationStore, InMemoryConversationStore, SqliteConversationStore, StoreError,
};

/// Fresh private in-memory database for tests. One connection, so every
/// query sees the same memory instance.
#[cfg(test)]
pub(crate) async fn test_pool() -> DbPool {
    use atende_core::config::DatabaseConfig;

    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        timeout_secs: 5,
    };
    connect(&config).await.expect("in-memory pool")
}
