// Product Assistant Graph Module
// LangGraph-style StateGraph for the agentic retrieval workflow

pub mod builder;
pub mod engine;
pub mod node;
pub mod runtime;
pub mod state;

pub mod nodes;

#[cfg(test)]
pub(crate) mod testing;

pub use builder::build_workflow_graph;
pub use engine::{AgenticRag, RunOutcome};
pub use node::{GraphError, GraphErrorKind, Node, NodeContext, NodeOutput};
pub use runtime::GraphRuntime;
pub use state::{
    ConversationState, RelevanceVerdict, RouteDecision, Turn, TurnOrigin, WorkflowStage,
};
