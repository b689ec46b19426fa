//! Pipeline stages and orchestration for the 1746 answering agent.
//!
//! Each stage is a small async function that reads and mutates the
//! [`atende_core::AgentState`] threaded through one invocation:
//!
//! 1. **Intent routing** (`intent`) — classify the question into a plan
//! 2. **Schema retrieval** (`schema`) — format table metadata
//! 3. **Category retrieval** (`retrieve` + `rewrite`) — two-tier textual
//!    grounding for categorical filters
//! 4. **SQL generation** (`generate`) — one constrained generation call
//! 5. **Execution** — gated by the safety policy inside `runtime`
//! 6. **Response** (`respond`) — synthesis over rows, or plain chat
//!
//! The [`runtime::AgentRuntime`] walks these stages over the typed
//! transition table in `atende_core::pipeline`; collaborator traits
//! (`llm`, `index`, `warehouse`) are the only seams to the outside
//! world and are injected at construction.

pub mod generate;
pub mod index;
pub mod intent;
pub mod llm;
pub mod prompts;
pub mod respond;
pub mod retrieve;
pub mod rewrite;
pub mod runtime;
pub mod schema;
pub mod warehouse;

pub use index::{CategoryHit, CategoryIndex, IndexUnavailable};
pub use llm::LlmClient;
pub use runtime::AgentRuntime;
pub use warehouse::{ColumnInfo, TableSchema, Warehouse, WarehouseError};
