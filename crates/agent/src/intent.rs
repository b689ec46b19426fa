use tracing::{error, info};

use atende_core::{format_history, AgentState, PipelineError, Plan};

use crate::llm::LlmClient;
use crate::prompts;

/// Classifies the current question into exactly one plan.
///
/// The label set is closed at the transport level; an out-of-set label or
/// a failed call both record a classification error — the pipeline never
/// guesses a default plan, since a wrong data-access path is worse than
/// an honest failure.
pub async fn classify_intent(llm: &dyn LlmClient, state: &mut AgentState) {
    let history_block = format_history(state.prior_turns());
    let prompt = prompts::intent(&history_block, state.question());

    match llm.classify(&prompt, &Plan::LABELS).await {
        Ok(label) => match label.parse::<Plan>() {
            Ok(plan) => {
                info!(plan = plan.as_label(), "intent classified");
                state.plan = Some(plan);
            }
            Err(unknown) => {
                error!(%unknown, "router produced a label outside the plan set");
                state.fail(PipelineError::Classification);
            }
        },
        Err(error) => {
            error!(%error, "intent classification failed");
            state.fail(PipelineError::Classification);
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    use atende_core::{AgentState, PipelineError, Plan};

    use super::classify_intent;
    use crate::llm::LlmClient;

    struct ScriptedClassifier(Result<&'static str, &'static str>);

    #[async_trait]
    impl LlmClient for ScriptedClassifier {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            unreachable!("router only classifies")
        }

        async fn classify(&self, _prompt: &str, labels: &[&str]) -> Result<String> {
            assert_eq!(labels, Plan::LABELS);
            match self.0 {
                Ok(label) => Ok(label.to_string()),
                Err(message) => Err(anyhow!(message)),
            }
        }
    }

    #[tokio::test]
    async fn valid_label_sets_the_plan() {
        let mut state = AgentState::for_question(Vec::new(), "how many calls in 2024?");
        classify_intent(&ScriptedClassifier(Ok("sql_direct")), &mut state).await;

        assert_eq!(state.plan, Some(Plan::SqlDirect));
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn failed_call_records_a_classification_error_not_a_default() {
        let mut state = AgentState::for_question(Vec::new(), "hello");
        classify_intent(&ScriptedClassifier(Err("timeout")), &mut state).await;

        assert_eq!(state.plan, None);
        assert_eq!(state.error, Some(PipelineError::Classification));
    }

    #[tokio::test]
    async fn out_of_set_label_is_a_classification_error() {
        let mut state = AgentState::for_question(Vec::new(), "hello");
        classify_intent(&ScriptedClassifier(Ok("sql_fancy")), &mut state).await;

        assert_eq!(state.plan, None);
        assert_eq!(state.error, Some(PipelineError::Classification));
    }
}
