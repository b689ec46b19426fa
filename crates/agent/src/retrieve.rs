use tracing::{info, warn};

use atende_core::{dataset, ConversationTurn};

use crate::index::{CategoryHit, CategoryIndex};
use crate::llm::LlmClient;
use crate::rewrite::rewrite_for_retrieval;
use crate::warehouse::Warehouse;

/// Fetches textual grounding for categorical filter values.
///
/// Two tiers, never both for one request: vector search over the category
/// index first, and only when that tier is *unavailable* (not when it
/// finds nothing) a direct distinct-value enumeration against the
/// warehouse. Total fallback failure degrades to empty context so
/// generation can still proceed ungrounded.
pub async fn fetch_category_context(
    llm: &dyn LlmClient,
    index: &dyn CategoryIndex,
    warehouse: &dyn Warehouse,
    top_k: usize,
    prior: &[ConversationTurn],
    question: &str,
) -> String {
    let retrieval_query = rewrite_for_retrieval(llm, prior, question).await;

    match index.search(&retrieval_query, top_k).await {
        Ok(hits) => {
            info!(hit_count = hits.len(), "category index answered");
            format_hits(&hits)
        }
        Err(unavailable) => {
            warn!(%unavailable, "category index unavailable, enumerating values directly");
            enumerate_directly(warehouse).await
        }
    }
}

fn format_hits(hits: &[CategoryHit]) -> String {
    // A reachable index with zero matches is a terminal primary result;
    // it must not read as "context missing" downstream.
    if hits.is_empty() {
        return "No catalogued category value resembles the question.".to_string();
    }

    let mut block = String::from("Category values similar to the question:\n");
    for hit in hits {
        block.push_str(&format!("- '{}' (from column `{}`)\n", hit.value, hit.source_column));
    }
    block
}

async fn enumerate_directly(warehouse: &dyn Warehouse) -> String {
    let mut sections = Vec::new();
    for column in dataset::CATEGORICAL_COLUMNS {
        match warehouse.distinct_values(dataset::CALLS_TABLE, column).await {
            Ok(values) => {
                sections.push(format!(
                    "Possible values for column `{column}`:\n{}",
                    values.join(", ")
                ));
            }
            Err(error) => {
                warn!(%error, column, "category fallback failed, proceeding without context");
                return String::new();
            }
        }
    }
    sections.join("\n\n")
}
