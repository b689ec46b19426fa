use tracing::{error, info};

use atende_core::{dataset, AgentState, PipelineError};

use crate::warehouse::{TableSchema, Warehouse};

/// Fetches and formats column metadata for every allowed table. Any
/// failure here is fatal: generating SQL against an unknown schema is not
/// worth attempting.
pub async fn fetch_schema(warehouse: &dyn Warehouse, state: &mut AgentState) {
    let mut sections = Vec::new();

    for table_id in dataset::ALLOWED_TABLES {
        match warehouse.table_schema(table_id).await {
            Ok(schema) => sections.push(format_table(&schema)),
            Err(fetch_error) => {
                error!(%fetch_error, table_id, "schema fetch failed");
                state.fail(PipelineError::SchemaFetch(fetch_error.to_string()));
                return;
            }
        }
    }

    info!(table_count = sections.len(), "schema formatted for generation");
    state.schema = sections.join("\n");
}

fn format_table(schema: &TableSchema) -> String {
    let mut block = format!("Table: `{}`\n", schema.table_id);
    for column in &schema.columns {
        block.push_str(&format!("- {} ({})\n", column.name, column.data_type));
    }
    block
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use async_trait::async_trait;

    use atende_core::{AgentState, PipelineError};

    use super::fetch_schema;
    use crate::warehouse::{ColumnInfo, TableSchema, Warehouse, WarehouseError};

    struct StubWarehouse {
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl Warehouse for StubWarehouse {
        async fn table_schema(&self, table_id: &str) -> Result<TableSchema, WarehouseError> {
            if self.fail_on.is_some_and(|failing| table_id.contains(failing)) {
                return Err(WarehouseError::Request("permission denied".to_string()));
            }
            Ok(TableSchema {
                table_id: table_id.to_string(),
                columns: vec![
                    ColumnInfo { name: "tipo".to_string(), data_type: "STRING".to_string() },
                    ColumnInfo {
                        name: "data_inicio".to_string(),
                        data_type: "TIMESTAMP".to_string(),
                    },
                ],
            })
        }

        async fn distinct_values(
            &self,
            _table_id: &str,
            _column: &str,
        ) -> Result<Vec<String>, WarehouseError> {
            unreachable!("schema stage never enumerates values")
        }

        async fn execute(
            &self,
            _sql: &str,
        ) -> Result<Vec<atende_core::Row>, WarehouseError> {
            unreachable!("schema stage never executes queries")
        }
    }

    #[tokio::test]
    async fn formats_every_allowed_table() {
        let mut state = AgentState::for_question(Vec::new(), "q");
        fetch_schema(&StubWarehouse { fail_on: None }, &mut state).await;

        assert!(state.error.is_none());
        assert!(state
            .schema
            .contains("Table: `datario.adm_central_atendimento_1746.chamado`"));
        assert!(state.schema.contains("Table: `datario.dados_mestres.bairro`"));
        assert!(state.schema.contains("- tipo (STRING)"));
        assert!(state.schema.contains("- data_inicio (TIMESTAMP)"));
    }

    #[tokio::test]
    async fn any_table_failure_is_fatal() {
        let mut state = AgentState::for_question(Vec::new(), "q");
        fetch_schema(&StubWarehouse { fail_on: Some("bairro") }, &mut state).await;

        assert!(matches!(state.error, Some(PipelineError::SchemaFetch(_))));
        assert!(state.schema.is_empty());
    }
}
