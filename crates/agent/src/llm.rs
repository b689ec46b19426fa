use anyhow::Result;
use async_trait::async_trait;

/// Generation collaborator. Implementations are injected at construction
/// time so tests can script deterministic outputs.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Free-text completion for a single prompt.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Constrained generation: the model must answer with one of `labels`.
    /// Implementations enforce the constraint at the transport level (not
    /// by parsing free text) and return the chosen label verbatim.
    async fn classify(&self, prompt: &str, labels: &[&str]) -> Result<String>;
}
