use tracing::warn;

use atende_core::{format_history, ConversationTurn};

use crate::llm::LlmClient;
use crate::prompts;

/// Expands a follow-up question into a self-contained query for
/// similarity search.
///
/// Best-effort by design: with no prior turns the question is already
/// self-contained and no generation call is made; a failed generation
/// call falls back to the unmodified question rather than failing the
/// pipeline.
pub async fn rewrite_for_retrieval(
    llm: &dyn LlmClient,
    prior: &[ConversationTurn],
    question: &str,
) -> String {
    if prior.is_empty() {
        return question.to_string();
    }

    let history_block = format_history(prior);
    match llm.complete(&prompts::rewrite(&history_block, question)).await {
        Ok(rewritten) => strip_wrapping_quotes(rewritten.trim()).to_string(),
        Err(error) => {
            warn!(%error, "query rewrite failed, searching with the original question");
            question.to_string()
        }
    }
}

fn strip_wrapping_quotes(text: &str) -> &str {
    text.trim_matches('"').trim_matches('\'')
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    use atende_core::ConversationTurn;

    use super::rewrite_for_retrieval;
    use crate::llm::LlmClient;

    struct CountingLlm {
        calls: AtomicUsize,
        response: Result<&'static str, &'static str>,
    }

    impl CountingLlm {
        fn replying(text: &'static str) -> Self {
            Self { calls: AtomicUsize::new(0), response: Ok(text) }
        }

        fn failing(message: &'static str) -> Self {
            Self { calls: AtomicUsize::new(0), response: Err(message) }
        }
    }

    #[async_trait]
    impl LlmClient for CountingLlm {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.response {
                Ok(text) => Ok(text.to_string()),
                Err(message) => Err(anyhow!(message)),
            }
        }

        async fn classify(&self, _prompt: &str, _labels: &[&str]) -> Result<String> {
            unreachable!("rewrite never classifies")
        }
    }

    fn prior() -> Vec<ConversationTurn> {
        vec![
            ConversationTurn::user("calls about Estrutura de Imóvel"),
            ConversationTurn::assistant("There were 52 such calls."),
        ]
    }

    #[tokio::test]
    async fn empty_history_returns_question_without_generation() {
        let llm = CountingLlm::replying("should not be used");
        let rewritten = rewrite_for_retrieval(&llm, &[], "potholes in Tijuca").await;

        assert_eq!(rewritten, "potholes in Tijuca");
        assert_eq!(llm.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn wrapping_quotes_are_stripped() {
        let llm = CountingLlm::replying("\"Estrutura de Imóvel subtypes\"");
        let rewritten = rewrite_for_retrieval(&llm, &prior(), "which subtypes?").await;

        assert_eq!(rewritten, "Estrutura de Imóvel subtypes");
        assert_eq!(llm.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn generation_failure_falls_back_to_original_question() {
        let llm = CountingLlm::failing("model offline");
        let rewritten = rewrite_for_retrieval(&llm, &prior(), "which subtypes?").await;

        assert_eq!(rewritten, "which subtypes?");
    }
}
