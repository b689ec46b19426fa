//! Concrete collaborator clients for the answering pipeline.
//!
//! Implements the `atende-agent` seams over the wire: an
//! OpenAI-compatible generation/embedding client, a Chroma client for
//! the category vector index, and a BigQuery REST client for the
//! warehouse, plus the batch job that builds the index. Everything takes
//! its dependencies explicitly at construction; nothing here is a
//! process-wide singleton.

pub mod bigquery;
pub mod chroma;
pub mod error;
pub mod indexer;
pub mod openai;

pub use bigquery::BigQueryWarehouse;
pub use chroma::ChromaIndex;
pub use error::ClientError;
pub use indexer::{rebuild_category_index, IndexReport};
pub use openai::OpenAiClient;
