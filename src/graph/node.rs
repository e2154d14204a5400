// Node trait and types
// Base abstraction for graph nodes

use async_trait::async_trait;

use crate::core::config::WorkflowSettings;
use crate::core::errors::ApiError;
use crate::history::CheckpointStore;
use crate::llm::LlmService;
use crate::prompts::PromptRegistry;
use crate::rag::Retriever;

use super::state::ConversationState;

/// Collaborators passed to nodes during execution
pub struct NodeContext<'a> {
    pub llm: &'a LlmService,
    pub retriever: &'a dyn Retriever,
    pub prompts: &'a PromptRegistry,
    pub settings: &'a WorkflowSettings,
    /// When set, the runtime saves the state after every successful step.
    pub checkpoints: Option<&'a dyn CheckpointStore>,
}

/// Output from a node execution
#[derive(Debug, Clone)]
pub enum NodeOutput {
    /// Continue to the specified next node (None = use default edge)
    Continue(Option<String>),
    /// Branch to one of the specified nodes based on condition
    Branch(String),
    /// Graph execution complete
    Final,
    /// Error occurred
    Error(String),
}

/// Failure category of a graph run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphErrorKind {
    /// Missing template, unknown provider, invalid settings.
    Config,
    /// Language model, retrieval or checkpoint store failed.
    Collaborator,
    /// Rewrite budget spent under the `fail` policy.
    RewriteLimit,
    /// Global step limit reached.
    StepLimit,
    /// Rejected input (empty question).
    InvalidInput,
    /// Malformed graph or unexpected node output.
    Runtime,
}

impl GraphErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphErrorKind::Config => "config",
            GraphErrorKind::Collaborator => "collaborator",
            GraphErrorKind::RewriteLimit => "rewrite_limit",
            GraphErrorKind::StepLimit => "step_limit",
            GraphErrorKind::InvalidInput => "invalid_input",
            GraphErrorKind::Runtime => "runtime",
        }
    }
}

/// Graph execution error
///
/// Includes an `execution_trace` to record the sequence of node IDs
/// visited before the error occurred.
#[derive(Debug, Clone)]
pub struct GraphError {
    pub node_id: String,
    pub kind: GraphErrorKind,
    pub message: String,
    /// Ordered list of node IDs executed before this error, most-recent last.
    pub execution_trace: Vec<String>,
}

impl GraphError {
    pub fn new(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_kind(node_id, GraphErrorKind::Runtime, message)
    }

    pub fn with_kind(
        node_id: impl Into<String>,
        kind: GraphErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            kind,
            message: message.into(),
            execution_trace: Vec::new(),
        }
    }

    /// Wraps a collaborator failure raised inside a node.
    pub fn from_api(node_id: impl Into<String>, err: ApiError) -> Self {
        let kind = match &err {
            ApiError::Config(_) => GraphErrorKind::Config,
            ApiError::BadRequest(_) => GraphErrorKind::InvalidInput,
            ApiError::Upstream(_) | ApiError::NotFound(_) | ApiError::Internal(_) => {
                GraphErrorKind::Collaborator
            }
            ApiError::Unanswerable(_) => GraphErrorKind::RewriteLimit,
        };
        Self::with_kind(node_id, kind, err.to_string())
    }

    /// Replaces the execution trace (set by the runtime after failure).
    pub fn with_trace(mut self, trace: Vec<String>) -> Self {
        self.execution_trace = trace;
        self
    }
}

impl From<GraphError> for ApiError {
    fn from(err: GraphError) -> Self {
        let message = if err.execution_trace.is_empty() {
            format!("{} failed: {}", err.node_id, err.message)
        } else {
            format!(
                "{} failed (trace: {}): {}",
                err.node_id,
                err.execution_trace.join(" -> "),
                err.message
            )
        };

        match err.kind {
            GraphErrorKind::Config => ApiError::Config(message),
            GraphErrorKind::Collaborator => ApiError::Upstream(message),
            GraphErrorKind::RewriteLimit | GraphErrorKind::StepLimit => {
                ApiError::Unanswerable(message)
            }
            GraphErrorKind::InvalidInput => ApiError::BadRequest(message),
            GraphErrorKind::Runtime => ApiError::Internal(message),
        }
    }
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.execution_trace.is_empty() {
            write!(
                f,
                "GraphError[{}] in {}: {}",
                self.kind.as_str(),
                self.node_id,
                self.message
            )
        } else {
            write!(
                f,
                "GraphError[{}] in {} (trace: {}): {}",
                self.kind.as_str(),
                self.node_id,
                self.execution_trace.join(" -> "),
                self.message
            )
        }
    }
}

impl std::error::Error for GraphError {}

/// Node trait - all graph nodes implement this
#[async_trait]
pub trait Node: Send + Sync {
    /// Unique identifier for this node
    fn id(&self) -> &'static str;

    /// Human-readable name for display
    fn name(&self) -> &'static str {
        self.id()
    }

    /// Execute the node logic
    async fn execute(
        &self,
        state: &mut ConversationState,
        ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError>;
}
