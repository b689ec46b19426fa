use std::collections::BTreeMap;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::debug;

use atende_agent::warehouse::{ColumnInfo, TableSchema, Warehouse, WarehouseError};
use atende_core::config::WarehouseConfig;
use atende_core::Row;

const DEFAULT_ENDPOINT: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// BigQuery REST warehouse client: synchronous `jobs/query` for
/// execution and `tables.get` for schema metadata. Strictly read-only
/// from this crate's perspective; mutation is already rejected upstream
/// by the safety policy.
pub struct BigQueryWarehouse {
    http: reqwest::Client,
    endpoint: String,
    project: String,
    access_token: Option<SecretString>,
}

impl BigQueryWarehouse {
    pub fn from_config(config: &WarehouseConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            project: config.project.clone(),
            access_token: config.access_token.clone(),
        }
    }

    /// Points the client at a non-default endpoint (emulators, proxies).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    async fn fetch_json(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Value, WarehouseError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|transport| WarehouseError::Request(transport.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|transport| WarehouseError::Request(transport.to_string()))?;
        if !status.is_success() {
            return Err(WarehouseError::Request(format!("status {status}: {body}")));
        }

        serde_json::from_str(&body)
            .map_err(|parse_error| WarehouseError::Malformed(parse_error.to_string()))
    }
}

#[async_trait]
impl Warehouse for BigQueryWarehouse {
    async fn table_schema(&self, table_id: &str) -> Result<TableSchema, WarehouseError> {
        let (project, dataset, table) = split_table_id(table_id)?;
        let url = format!(
            "{}/projects/{project}/datasets/{dataset}/tables/{table}",
            self.endpoint
        );
        let response = self.fetch_json(self.http.get(url)).await?;
        parse_table_schema(table_id, &response)
    }

    async fn distinct_values(
        &self,
        table_id: &str,
        column: &str,
    ) -> Result<Vec<String>, WarehouseError> {
        let sql = format!(
            "SELECT DISTINCT {column} FROM `{table_id}` \
             WHERE {column} IS NOT NULL ORDER BY {column}"
        );
        let rows = self.execute(&sql).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                row.into_values().next().and_then(|value| match value {
                    Value::String(text) => Some(text),
                    other => Some(other.to_string()),
                })
            })
            .collect())
    }

    async fn execute(&self, sql: &str) -> Result<Vec<Row>, WarehouseError> {
        debug!(%sql, "submitting warehouse query");
        let url = format!("{}/projects/{}/queries", self.endpoint, self.project);
        let body = json!({ "query": sql, "useLegacySql": false });
        let response = self.fetch_json(self.http.post(url).json(&body)).await?;
        parse_query_rows(&response)
    }
}

fn split_table_id(table_id: &str) -> Result<(&str, &str, &str), WarehouseError> {
    let mut parts = table_id.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(project), Some(dataset), Some(table), None) => Ok((project, dataset, table)),
        _ => Err(WarehouseError::Malformed(format!(
            "table id `{table_id}` is not fully qualified"
        ))),
    }
}

fn parse_table_schema(table_id: &str, response: &Value) -> Result<TableSchema, WarehouseError> {
    let fields = response["schema"]["fields"]
        .as_array()
        .ok_or_else(|| WarehouseError::Malformed("table without schema.fields".to_string()))?;

    let columns = fields
        .iter()
        .map(|field| {
            let name = field["name"]
                .as_str()
                .ok_or_else(|| WarehouseError::Malformed("field without name".to_string()))?;
            let data_type = field["type"]
                .as_str()
                .ok_or_else(|| WarehouseError::Malformed("field without type".to_string()))?;
            Ok(ColumnInfo { name: name.to_string(), data_type: data_type.to_string() })
        })
        .collect::<Result<Vec<_>, WarehouseError>>()?;

    Ok(TableSchema { table_id: table_id.to_string(), columns })
}

/// Flattens the `schema.fields` + `rows[].f[].v` wire shape into ordered
/// name → value records, decoding numeric and boolean fields out of
/// BigQuery's all-strings representation.
fn parse_query_rows(response: &Value) -> Result<Vec<Row>, WarehouseError> {
    if let Some(errors) = response["errors"].as_array() {
        if !errors.is_empty() {
            let message = errors[0]["message"].as_str().unwrap_or("unknown query error");
            return Err(WarehouseError::Request(message.to_string()));
        }
    }

    let fields = response["schema"]["fields"]
        .as_array()
        .ok_or_else(|| WarehouseError::Malformed("result without schema.fields".to_string()))?;
    let field_specs = fields
        .iter()
        .map(|field| {
            (
                field["name"].as_str().unwrap_or_default().to_string(),
                field["type"].as_str().unwrap_or_default().to_string(),
            )
        })
        .collect::<Vec<_>>();

    let Some(rows) = response["rows"].as_array() else {
        // Zero-row results omit `rows` entirely.
        return Ok(Vec::new());
    };

    rows.iter()
        .map(|row| {
            let cells = row["f"]
                .as_array()
                .ok_or_else(|| WarehouseError::Malformed("row without cells".to_string()))?;
            let mut record = BTreeMap::new();
            for ((name, data_type), cell) in field_specs.iter().zip(cells) {
                record.insert(name.clone(), decode_cell(&cell["v"], data_type));
            }
            Ok(record)
        })
        .collect()
}

fn decode_cell(value: &Value, data_type: &str) -> Value {
    let Some(text) = value.as_str() else {
        return value.clone();
    };

    match data_type {
        "INTEGER" | "INT64" => text
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(text.to_string())),
        "FLOAT" | "FLOAT64" | "NUMERIC" => text
            .parse::<f64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(text.to_string())),
        "BOOLEAN" | "BOOL" => match text {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(text.to_string()),
        },
        _ => Value::String(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{parse_query_rows, parse_table_schema, split_table_id};

    #[test]
    fn table_id_must_have_three_parts() {
        let (project, dataset, table) =
            split_table_id("datario.adm_central_atendimento_1746.chamado").expect("splits");
        assert_eq!(project, "datario");
        assert_eq!(dataset, "adm_central_atendimento_1746");
        assert_eq!(table, "chamado");

        assert!(split_table_id("dataset.table").is_err());
        assert!(split_table_id("a.b.c.d").is_err());
    }

    #[test]
    fn query_rows_decode_types_and_preserve_row_order() {
        let response = json!({
            "schema": { "fields": [
                { "name": "bairro", "type": "STRING" },
                { "name": "total", "type": "INTEGER" },
            ]},
            "rows": [
                { "f": [{ "v": "Tijuca" }, { "v": "42" }] },
                { "f": [{ "v": "Centro" }, { "v": "17" }] },
            ],
        });

        let rows = parse_query_rows(&response).expect("rows parse");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["bairro"], json!("Tijuca"));
        assert_eq!(rows[0]["total"], json!(42));
        assert_eq!(rows[1]["bairro"], json!("Centro"));
    }

    #[test]
    fn zero_row_result_without_rows_key_is_empty() {
        let response = json!({
            "schema": { "fields": [{ "name": "total", "type": "INTEGER" }] },
            "totalRows": "0",
        });
        assert!(parse_query_rows(&response).expect("parses").is_empty());
    }

    #[test]
    fn inline_errors_surface_as_request_failures() {
        let response = json!({
            "schema": { "fields": [] },
            "errors": [{ "message": "Syntax error at [1:8]" }],
        });
        assert!(parse_query_rows(&response).is_err());
    }

    #[test]
    fn table_schema_parses_name_and_type_pairs() {
        let response = json!({
            "schema": { "fields": [
                { "name": "tipo", "type": "STRING" },
                { "name": "data_inicio", "type": "TIMESTAMP" },
            ]},
        });

        let schema =
            parse_table_schema("datario.adm_central_atendimento_1746.chamado", &response)
                .expect("schema parses");
        assert_eq!(schema.columns.len(), 2);
        assert_eq!(schema.columns[0].name, "tipo");
        assert_eq!(schema.columns[1].data_type, "TIMESTAMP");
    }
}
