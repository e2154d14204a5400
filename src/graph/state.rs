// Graph State
// ConversationState and related types for the workflow graph

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rag::EvidenceItem;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOrigin {
    User,
    Assistant,
    ToolResult,
}

/// Role-tagged conversation content. Fields are read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    origin: TurnOrigin,
    content: String,
}

impl Turn {
    pub fn new(origin: TurnOrigin, content: impl Into<String>) -> Self {
        Self {
            origin,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnOrigin::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnOrigin::Assistant, content)
    }

    pub fn tool_result(content: impl Into<String>) -> Self {
        Self::new(TurnOrigin::ToolResult, content)
    }

    pub fn origin(&self) -> TurnOrigin {
        self.origin
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Workflow states, in the order a full retrieval turn visits them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    Routing,
    Retrieving,
    Grading,
    Generating,
    Rewriting,
    Done,
}

impl WorkflowStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStage::Routing => "routing",
            WorkflowStage::Retrieving => "retrieving",
            WorkflowStage::Grading => "grading",
            WorkflowStage::Generating => "generating",
            WorkflowStage::Rewriting => "rewriting",
            WorkflowStage::Done => "done",
        }
    }
}

/// Intent router outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteDecision {
    /// Product-information intent: fetch catalogue evidence first.
    Retrieve,
    /// Answer from the model alone.
    Direct,
}

/// Relevance grader outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelevanceVerdict {
    Relevant,
    Irrelevant,
}

impl RelevanceVerdict {
    /// Relevant only when some alphanumeric token of the reply is `yes`
    /// (any case). Empty or malformed replies are irrelevant.
    pub fn from_response(response: &str) -> Self {
        let affirmative = response
            .split(|c: char| !c.is_alphanumeric())
            .any(|token| token.eq_ignore_ascii_case("yes"));

        if affirmative {
            RelevanceVerdict::Relevant
        } else {
            RelevanceVerdict::Irrelevant
        }
    }

    pub fn is_relevant(&self) -> bool {
        matches!(self, RelevanceVerdict::Relevant)
    }
}

/// Per-run workflow state.
///
/// `turns` holds the current run only: its first entry is the user's
/// question and its last entry is the most recently produced content.
/// Turns of earlier runs in the same session live in `history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub session_id: String,
    pub history: Vec<Turn>,
    turns: Vec<Turn>,

    // Questions
    pub question: String,
    pub current_query: String,

    // Stage outputs
    pub route: Option<RouteDecision>,
    pub evidence: Vec<EvidenceItem>,
    pub context: Option<String>,
    pub verdict: Option<RelevanceVerdict>,
    pub rewrite_count: u32,
    pub answer: Option<String>,

    pub stages: Vec<WorkflowStage>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationState {
    pub fn new(session_id: impl Into<String>, question: impl Into<String>) -> Self {
        let question = question.into();
        Self {
            session_id: session_id.into(),
            history: Vec::new(),
            turns: vec![Turn::user(question.clone())],
            current_query: question.clone(),
            question,
            route: None,
            evidence: Vec::new(),
            context: None,
            verdict: None,
            rewrite_count: 0,
            answer: None,
            stages: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Starts a new run on top of a persisted state: earlier turns move to
    /// `history`, of which only the newest `history_window` are kept. Every
    /// per-run field starts fresh.
    pub fn resume(
        previous: ConversationState,
        question: impl Into<String>,
        history_window: usize,
    ) -> Self {
        let ConversationState {
            session_id,
            mut history,
            turns,
            ..
        } = previous;
        history.extend(turns);
        let overflow = history.len().saturating_sub(history_window);
        history.drain(..overflow);

        let mut state = Self::new(session_id, question);
        state.history = history;
        state
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn push_turn(&mut self, turn: Turn) {
        self.turns.push(turn);
        self.updated_at = Utc::now();
    }

    pub fn visit(&mut self, stage: WorkflowStage) {
        self.stages.push(stage);
        self.updated_at = Utc::now();
    }

    pub fn is_done(&self) -> bool {
        self.stages.last() == Some(&WorkflowStage::Done)
    }
}
