use tracing::{debug, error, info};

use atende_core::{format_history, AgentState, PipelineError};

use crate::llm::LlmClient;
use crate::prompts;

/// Generates the SQL query from question, schema, history, and (when
/// present) category context.
pub async fn generate_sql(llm: &dyn LlmClient, state: &mut AgentState) {
    let history_block = format_history(state.prior_turns());
    let prompt = prompts::sql(
        &history_block,
        &state.schema,
        &state.category_context,
        state.question(),
    );
    debug!(%prompt, "sql generation prompt assembled");

    match llm.complete(&prompt).await {
        Ok(raw) => {
            let sql = strip_code_fences(&raw);
            info!(%sql, "sql generated");
            state.query = sql;
        }
        Err(generation_error) => {
            error!(%generation_error, "sql generation failed");
            state.fail(PipelineError::Generation(generation_error.to_string()));
        }
    }
}

/// Models occasionally wrap output in markdown fences despite the
/// output-format rule; strip them rather than executing fence text.
fn strip_code_fences(text: &str) -> String {
    text.trim().replace("```sql", "").replace("```", "").trim().to_string()
}
