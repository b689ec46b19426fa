//! Domain core for the 1746 service-call answering pipeline.
//!
//! This crate holds everything that is pure and synchronous: conversation
//! history, the per-invocation agent state, the pipeline state machine
//! with its sticky-error transition rule, the static SQL safety policy,
//! the error taxonomy, and configuration loading. The async stages that
//! drive external collaborators live in `atende-agent`.

pub mod config;
pub mod dataset;
pub mod errors;
pub mod history;
pub mod pipeline;
pub mod policy;
pub mod state;

pub use errors::PipelineError;
pub use history::{format_history, ConversationTurn, Role};
pub use pipeline::{successor, Stage};
pub use policy::{SqlPolicy, SqlRejection};
pub use state::{AgentState, Plan, Row};
