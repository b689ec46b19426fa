use std::sync::Arc;

use tracing::{error, info, warn};

use atende_core::{
    pipeline::{successor, Stage},
    AgentState, ConversationTurn, PipelineError, SqlPolicy,
};

use crate::index::CategoryIndex;
use crate::llm::LlmClient;
use crate::warehouse::Warehouse;
use crate::{generate, intent, respond, retrieve, schema};

/// Drives one question through the pipeline state machine.
///
/// Collaborators are injected at construction so tests substitute
/// deterministic stubs. The runtime owns no cross-invocation state: each
/// call to [`AgentRuntime::answer`] builds a fresh [`AgentState`] and
/// walks it from `Intent` to a terminal stage.
pub struct AgentRuntime {
    llm: Arc<dyn LlmClient>,
    index: Arc<dyn CategoryIndex>,
    warehouse: Arc<dyn Warehouse>,
    policy: SqlPolicy,
    top_k: usize,
}

impl AgentRuntime {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        index: Arc<dyn CategoryIndex>,
        warehouse: Arc<dyn Warehouse>,
    ) -> Self {
        Self { llm, index, warehouse, policy: SqlPolicy::default(), top_k: 5 }
    }

    pub fn with_policy(mut self, policy: SqlPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Answers one question given the thread's prior turns. Returns the
    /// final state; callers read `answer` on success and map `error` to
    /// the generic user-facing apology.
    pub async fn answer(
        &self,
        prior: Vec<ConversationTurn>,
        question: impl Into<String>,
    ) -> AgentState {
        self.run(AgentState::for_question(prior, question)).await
    }

    pub async fn run(&self, mut state: AgentState) -> AgentState {
        let mut stage = Stage::Intent;

        while !stage.is_terminal() {
            self.run_stage(stage, &mut state).await;
            stage = successor(stage, &state);
        }

        // Detail stays in the logs; callers show the generic apology so
        // internals never reach the end user.
        match (stage, &state.error) {
            (Stage::Error, Some(pipeline_error)) => {
                error!(%pipeline_error, "pipeline terminated in error state");
            }
            (Stage::Error, None) => {
                error!("pipeline terminated in error state without a recorded cause");
            }
            _ => info!("pipeline finished"),
        }

        state
    }

    async fn run_stage(&self, stage: Stage, state: &mut AgentState) {
        match stage {
            Stage::Intent => intent::classify_intent(self.llm.as_ref(), state).await,
            Stage::Schema => schema::fetch_schema(self.warehouse.as_ref(), state).await,
            Stage::Category => {
                let context = retrieve::fetch_category_context(
                    self.llm.as_ref(),
                    self.index.as_ref(),
                    self.warehouse.as_ref(),
                    self.top_k,
                    state.prior_turns(),
                    state.question(),
                )
                .await;
                state.category_context = context;
            }
            Stage::Generate => generate::generate_sql(self.llm.as_ref(), state).await,
            Stage::Execute => self.execute(state).await,
            Stage::RespondSql => respond::synthesize_sql_answer(self.llm.as_ref(), state).await,
            Stage::RespondChat => respond::respond_chat(self.llm.as_ref(), state).await,
            Stage::Error | Stage::Done => {}
        }
    }

    /// The validator gates execution inline: a rejected query is cleared
    /// from the state and never reaches the warehouse.
    async fn execute(&self, state: &mut AgentState) {
        if let Err(rejection) = self.policy.validate(&state.query) {
            warn!(%rejection, "generated query rejected by the safety policy");
            state.query.clear();
            state.fail(PipelineError::Validation(rejection));
            return;
        }

        match self.warehouse.execute(&state.query).await {
            Ok(rows) => {
                info!(row_count = rows.len(), "query executed");
                state.rows = rows;
            }
            Err(execution_error) => {
                error!(%execution_error, "query execution failed");
                state.fail(PipelineError::Execution(execution_error.to_string()));
            }
        }
    }
}
