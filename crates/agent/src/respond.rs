use tracing::{error, info};

use atende_core::{format_history, AgentState, PipelineError};

use crate::llm::LlmClient;
use crate::prompts;

/// Fixed answer for an empty result set; no generation call is spent on
/// summarizing nothing.
pub const NO_DATA_ANSWER: &str = "I could not find any data to answer your question.";

/// Turns executed query rows into a natural-language answer.
pub async fn synthesize_sql_answer(llm: &dyn LlmClient, state: &mut AgentState) {
    if state.rows.is_empty() {
        info!("query returned no rows, answering without synthesis");
        state.answer = NO_DATA_ANSWER.to_string();
        return;
    }

    let rows_json = serde_json::to_string(&state.rows).unwrap_or_else(|_| "[]".to_string());
    match llm.complete(&prompts::synthesis(state.question(), &rows_json)).await {
        Ok(answer) => {
            info!("answer synthesized from query rows");
            state.answer = answer.trim().to_string();
        }
        Err(synthesis_error) => {
            error!(%synthesis_error, "answer synthesis failed");
            state.fail(PipelineError::Synthesis(synthesis_error.to_string()));
        }
    }
}

/// Conversational branch: replies from history alone, no data access.
pub async fn respond_chat(llm: &dyn LlmClient, state: &mut AgentState) {
    let history_block = format_history(state.prior_turns());
    match llm.complete(&prompts::chat(&history_block, state.question())).await {
        Ok(answer) => {
            info!("conversational answer generated");
            state.answer = answer.trim().to_string();
        }
        Err(chat_error) => {
            error!(%chat_error, "conversational response failed");
            state.fail(PipelineError::Synthesis(chat_error.to_string()));
        }
    }
}
