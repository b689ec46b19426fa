use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::PipelineError;
use crate::history::ConversationTurn;

/// One result record: column name to value, as returned by the warehouse.
pub type Row = BTreeMap<String, serde_json::Value>;

/// The execution path chosen for a question.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    /// Deterministic/structural question, no textual category filter.
    SqlDirect,
    /// Question that filters on a categorical text column.
    SqlContextual,
    /// Conversational input that needs no data access.
    Chat,
}

impl Plan {
    /// The closed label set offered to the classifier.
    pub const LABELS: [&'static str; 3] = ["sql_direct", "sql_contextual", "chat"];

    pub fn as_label(self) -> &'static str {
        match self {
            Self::SqlDirect => "sql_direct",
            Self::SqlContextual => "sql_contextual",
            Self::Chat => "chat",
        }
    }

    pub fn needs_data_access(self) -> bool {
        !matches!(self, Self::Chat)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown execution plan `{0}`")]
pub struct UnknownPlan(pub String);

impl std::str::FromStr for Plan {
    type Err = UnknownPlan;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "sql_direct" => Ok(Self::SqlDirect),
            "sql_contextual" => Ok(Self::SqlContextual),
            "chat" => Ok(Self::Chat),
            other => Err(UnknownPlan(other.to_string())),
        }
    }
}

/// The record threaded through one pipeline invocation.
///
/// Created fresh per question; `history` is the only field seeded from the
/// checkpoint store and already contains the new user turn as its last
/// element. Every other field starts empty and is populated by exactly one
/// stage. `error` is sticky: once set, no further stage runs.
#[derive(Clone, Debug, Default)]
pub struct AgentState {
    pub history: Vec<ConversationTurn>,
    pub plan: Option<Plan>,
    pub schema: String,
    pub category_context: String,
    pub query: String,
    pub rows: Vec<Row>,
    pub answer: String,
    pub error: Option<PipelineError>,
}

impl AgentState {
    /// Seeds a fresh state from prior turns plus the incoming question.
    pub fn for_question(prior: Vec<ConversationTurn>, question: impl Into<String>) -> Self {
        let mut history = prior;
        history.push(ConversationTurn::user(question));
        Self { history, ..Self::default() }
    }

    /// The question under answer: the last turn of the history.
    pub fn question(&self) -> &str {
        self.history.last().map(|turn| turn.content.as_str()).unwrap_or_default()
    }

    /// Every turn before the current question.
    pub fn prior_turns(&self) -> &[ConversationTurn] {
        match self.history.len() {
            0 => &[],
            len => &self.history[..len - 1],
        }
    }

    /// Records a stage failure. The first error wins; later failures are
    /// ignored so the terminal error reflects where the pipeline broke.
    pub fn fail(&mut self, error: PipelineError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::{AgentState, Plan};
    use crate::errors::PipelineError;
    use crate::history::ConversationTurn;

    #[test]
    fn plan_labels_round_trip() {
        for label in Plan::LABELS {
            let plan = label.parse::<Plan>().expect("label parses");
            assert_eq!(plan.as_label(), label);
        }
        assert!("sql".parse::<Plan>().is_err());
    }

    #[test]
    fn fresh_state_exposes_question_and_prior_turns() {
        let prior = vec![
            ConversationTurn::user("hello"),
            ConversationTurn::assistant("hi, how can I help?"),
        ];
        let state = AgentState::for_question(prior.clone(), "how many calls today?");

        assert_eq!(state.question(), "how many calls today?");
        assert_eq!(state.prior_turns(), prior.as_slice());
        assert!(state.plan.is_none());
        assert!(state.schema.is_empty());
        assert!(state.answer.is_empty());
    }

    #[test]
    fn first_recorded_error_wins() {
        let mut state = AgentState::for_question(Vec::new(), "q");
        state.fail(PipelineError::Classification);
        state.fail(PipelineError::Execution("late failure".to_string()));

        assert_eq!(state.error, Some(PipelineError::Classification));
    }
}
