use async_trait::async_trait;
use thiserror::Error;

use atende_core::Row;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSchema {
    pub table_id: String,
    pub columns: Vec<ColumnInfo>,
}

#[derive(Clone, Debug, Error)]
pub enum WarehouseError {
    #[error("warehouse request failed: {0}")]
    Request(String),
    #[error("warehouse returned a malformed response: {0}")]
    Malformed(String),
}

/// Read-only warehouse collaborator. The pipeline never issues writes;
/// the safety policy additionally rejects any mutating statement before
/// `execute` is reached.
#[async_trait]
pub trait Warehouse: Send + Sync {
    async fn table_schema(&self, table_id: &str) -> Result<TableSchema, WarehouseError>;

    /// Distinct non-null values of one column, ordered for determinism.
    async fn distinct_values(
        &self,
        table_id: &str,
        column: &str,
    ) -> Result<Vec<String>, WarehouseError>;

    async fn execute(&self, sql: &str) -> Result<Vec<Row>, WarehouseError>;
}
