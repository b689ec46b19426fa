use thiserror::Error;

use crate::policy::SqlRejection;

/// Fatal failures a pipeline stage can record into the agent state.
///
/// Recoverable degradations (rewriter fallback, retrieval fallback) never
/// surface here; they are handled inside their stages.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// The router could not produce a valid plan label. No default plan is
    /// ever assumed in this case.
    #[error("could not classify the question into an execution plan")]
    Classification,
    #[error("failed to fetch table schema: {0}")]
    SchemaFetch(String),
    #[error("failed to generate the data query: {0}")]
    Generation(String),
    #[error(transparent)]
    Validation(#[from] SqlRejection),
    #[error("query execution failed: {0}")]
    Execution(String),
    #[error("failed to synthesize the final answer: {0}")]
    Synthesis(String),
}

impl PipelineError {
    /// What the end user sees on any failure. Deliberately uniform: the
    /// detailed variant text goes to logs only, so table names and query
    /// text never leak into the conversation.
    pub fn user_message(&self) -> &'static str {
        "Sorry, something went wrong while answering your question. Please try again."
    }
}
