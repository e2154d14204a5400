//! Agentic retrieval-augmented product assistant.
//!
//! A question is routed by intent, answered from catalogue evidence when
//! that evidence is graded relevant, and reformulated (up to a configured
//! budget) when it is not. See [`graph::AgenticRag`] for the entrypoint.

pub mod core;
pub mod graph;
pub mod history;
pub mod llm;
pub mod prompts;
pub mod rag;
pub mod server;
pub mod state;

pub use crate::core::errors::ApiError;
pub use crate::graph::{AgenticRag, GraphError, GraphErrorKind, RunOutcome};
