use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use atende_agent::index::{CategoryHit, CategoryIndex, IndexUnavailable};
use atende_core::config::IndexConfig;

use crate::error::ClientError;
use crate::openai::OpenAiClient;

/// Chroma REST client for the category index.
///
/// The pipeline only reads through [`CategoryIndex::search`]; the write
/// operations exist for the batch indexing job and are never called from
/// the orchestration core.
pub struct ChromaIndex {
    http: reqwest::Client,
    base_url: String,
    collection: String,
    embedder: Arc<OpenAiClient>,
}

impl ChromaIndex {
    pub fn new(config: &IndexConfig, embedder: Arc<OpenAiClient>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            embedder,
        }
    }

    async fn collection_id(&self) -> Result<String, ClientError> {
        let url = format!("{}/api/v1/collections/{}", self.base_url, self.collection);
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status: status.as_u16(), body });
        }
        let parsed: Value = response.json().await?;
        parsed["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ClientError::Malformed("collection without `id`".to_string()))
    }

    async fn post_collection(&self, collection_id: &str, op: &str, body: Value) -> Result<Value, ClientError> {
        let url = format!("{}/api/v1/collections/{collection_id}/{op}", self.base_url);
        let response = self.http.post(url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status: status.as_u16(), body });
        }
        Ok(response.json().await?)
    }

    /// Drops and recreates the collection; the indexing job always
    /// rebuilds from scratch. Returns the fresh collection id.
    pub async fn recreate_collection(&self) -> Result<String, ClientError> {
        let delete_url = format!("{}/api/v1/collections/{}", self.base_url, self.collection);
        // A 404 here just means there was nothing to drop.
        let _ = self.http.delete(delete_url).send().await?;

        let create_url = format!("{}/api/v1/collections", self.base_url);
        let response = self
            .http
            .post(create_url)
            .json(&json!({ "name": self.collection, "get_or_create": true }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status: status.as_u16(), body });
        }
        let parsed: Value = response.json().await?;
        parsed["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ClientError::Malformed("created collection without `id`".to_string()))
    }

    /// Adds one batch of already-embedded documents.
    pub async fn add_batch(
        &self,
        collection_id: &str,
        ids: &[String],
        embeddings: &[Vec<f32>],
        documents: &[String],
        source_columns: &[String],
    ) -> Result<(), ClientError> {
        let metadatas = source_columns
            .iter()
            .map(|column| json!({ "source_column": column }))
            .collect::<Vec<_>>();

        self.post_collection(
            collection_id,
            "add",
            json!({
                "ids": ids,
                "embeddings": embeddings,
                "documents": documents,
                "metadatas": metadatas,
            }),
        )
        .await?;
        Ok(())
    }

    async fn query(&self, embedding: Vec<f32>, limit: usize) -> Result<Vec<CategoryHit>, ClientError> {
        let collection_id = self.collection_id().await?;
        let response = self
            .post_collection(
                &collection_id,
                "query",
                json!({
                    "query_embeddings": [embedding],
                    "n_results": limit,
                    "include": ["documents", "metadatas"],
                }),
            )
            .await?;
        parse_query_hits(&response)
    }
}

#[async_trait]
impl CategoryIndex for ChromaIndex {
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CategoryHit>, IndexUnavailable> {
        // Any failure along the way (embedding, missing collection,
        // transport, malformed body) means this tier cannot answer, which
        // is exactly what IndexUnavailable signals.
        let embedding = self
            .embedder
            .embed(std::slice::from_ref(&query.to_string()))
            .await
            .map_err(|embed_error| IndexUnavailable(embed_error.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| IndexUnavailable("embedder returned no vector".to_string()))?;

        let hits = self
            .query(embedding, limit)
            .await
            .map_err(|query_error| IndexUnavailable(query_error.to_string()))?;
        debug!(hit_count = hits.len(), "chroma query answered");
        Ok(hits)
    }
}

/// Chroma nests results one level per query embedding; we always send
/// exactly one.
fn parse_query_hits(response: &Value) -> Result<Vec<CategoryHit>, ClientError> {
    let documents = response["documents"][0]
        .as_array()
        .ok_or_else(|| ClientError::Malformed("missing documents[0]".to_string()))?;
    let metadatas = response["metadatas"][0]
        .as_array()
        .ok_or_else(|| ClientError::Malformed("missing metadatas[0]".to_string()))?;

    documents
        .iter()
        .zip(metadatas)
        .map(|(document, metadata)| {
            let value = document
                .as_str()
                .ok_or_else(|| ClientError::Malformed("non-text document".to_string()))?;
            let source_column = metadata["source_column"]
                .as_str()
                .ok_or_else(|| ClientError::Malformed("hit without source_column".to_string()))?;
            Ok(CategoryHit {
                value: value.to_string(),
                source_column: source_column.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::parse_query_hits;

    #[test]
    fn query_hits_zip_documents_with_their_source_columns() {
        let response = json!({
            "documents": [["Reparo de Luminária", "Poda de Árvore"]],
            "metadatas": [[
                {"source_column": "subtipo"},
                {"source_column": "tipo"},
            ]],
        });

        let hits = parse_query_hits(&response).expect("hits parse");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].value, "Reparo de Luminária");
        assert_eq!(hits[0].source_column, "subtipo");
        assert_eq!(hits[1].source_column, "tipo");
    }

    #[test]
    fn empty_result_set_parses_to_no_hits() {
        let response = json!({ "documents": [[]], "metadatas": [[]] });
        assert!(parse_query_hits(&response).expect("parses").is_empty());
    }

    #[test]
    fn malformed_body_is_an_error_not_a_miss() {
        let response = json!({ "documents": "nope" });
        assert!(parse_query_hits(&response).is_err());
    }
}
