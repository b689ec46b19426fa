use tracing::info;

use atende_agent::warehouse::Warehouse;
use atende_core::dataset;

use crate::chroma::ChromaIndex;
use crate::error::ClientError;
use crate::openai::OpenAiClient;

/// Documents are embedded and uploaded in chunks of this size.
const BATCH_SIZE: usize = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexReport {
    pub documents: usize,
    pub batches: usize,
}

/// Batch job that (re)builds the category vector index: enumerate the
/// distinct values of every categorical column, embed them, and upload
/// them with their source column as metadata. The pipeline itself never
/// calls this; it only searches the result.
pub async fn rebuild_category_index(
    warehouse: &dyn Warehouse,
    embedder: &OpenAiClient,
    index: &ChromaIndex,
) -> Result<IndexReport, ClientError> {
    let mut documents = Vec::new();
    for column in dataset::CATEGORICAL_COLUMNS {
        let values = warehouse
            .distinct_values(dataset::CALLS_TABLE, column)
            .await
            .map_err(|enumeration_error| ClientError::Warehouse(enumeration_error.to_string()))?;
        info!(column, value_count = values.len(), "enumerated categorical column");
        documents.extend(values.into_iter().map(|value| (value, column.to_string())));
    }

    let collection_id = index.recreate_collection().await?;

    let mut batches = 0;
    for (batch_number, chunk) in documents.chunks(BATCH_SIZE).enumerate() {
        let texts = chunk.iter().map(|(value, _)| value.clone()).collect::<Vec<_>>();
        let source_columns =
            chunk.iter().map(|(_, column)| column.clone()).collect::<Vec<_>>();
        let ids = (0..chunk.len())
            .map(|offset| format!("cat_{}", batch_number * BATCH_SIZE + offset))
            .collect::<Vec<_>>();

        let embeddings = embedder.embed(&texts).await?;
        index.add_batch(&collection_id, &ids, &embeddings, &texts, &source_columns).await?;

        batches += 1;
        info!(batch = batches, uploaded = texts.len(), "indexed batch");
    }

    Ok(IndexReport { documents: documents.len(), batches })
}
