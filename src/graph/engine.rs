// Workflow Engine
// Owns the graph and its collaborators; one `run` per user turn

use std::sync::Arc;

use serde::Serialize;

use super::builder::build_workflow_graph;
use super::node::{GraphError, GraphErrorKind, NodeContext};
use super::runtime::GraphRuntime;
use super::state::{ConversationState, RouteDecision, WorkflowStage};
use crate::core::config::{AppConfig, WorkflowSettings};
use crate::core::errors::ApiError;
use crate::history::CheckpointStore;
use crate::llm::LlmService;
use crate::prompts::PromptRegistry;
use crate::rag::Retriever;

/// Result of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub session_id: String,
    pub answer: String,
    pub stages: Vec<WorkflowStage>,
    pub rewrites: u32,
    pub route: Option<RouteDecision>,
}

pub struct AgenticRag {
    graph: GraphRuntime,
    llm: LlmService,
    retriever: Arc<dyn Retriever>,
    prompts: PromptRegistry,
    settings: WorkflowSettings,
    checkpoints: Arc<dyn CheckpointStore>,
}

impl AgenticRag {
    pub fn new(
        llm: LlmService,
        retriever: Arc<dyn Retriever>,
        prompts: PromptRegistry,
        settings: WorkflowSettings,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Result<Self, GraphError> {
        settings
            .check_step_budget()
            .map_err(|e| GraphError::from_api("workflow", e))?;
        let graph = build_workflow_graph(settings.max_steps)?;
        Ok(Self {
            graph,
            llm,
            retriever,
            prompts,
            settings,
            checkpoints,
        })
    }

    /// Prompt overrides and workflow settings come from config.
    pub fn from_config(
        config: &AppConfig,
        llm: LlmService,
        retriever: Arc<dyn Retriever>,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Result<Self, ApiError> {
        let prompts = PromptRegistry::from_overrides(&config.prompts)?;
        Ok(Self::new(
            llm,
            retriever,
            prompts,
            config.workflow.clone(),
            checkpoints,
        )?)
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    pub fn checkpoints(&self) -> &Arc<dyn CheckpointStore> {
        &self.checkpoints
    }

    /// Answers one question in the given session.
    pub async fn run(&self, question: &str, session_id: &str) -> Result<String, GraphError> {
        self.run_detailed(question, session_id)
            .await
            .map(|outcome| outcome.answer)
    }

    /// Like `run`, also reporting the visited stages and rewrite count.
    pub async fn run_detailed(
        &self,
        question: &str,
        session_id: &str,
    ) -> Result<RunOutcome, GraphError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(GraphError::with_kind(
                "workflow",
                GraphErrorKind::InvalidInput,
                "Question must not be empty",
            ));
        }
        if session_id.trim().is_empty() {
            return Err(GraphError::with_kind(
                "workflow",
                GraphErrorKind::InvalidInput,
                "Session id must not be empty",
            ));
        }

        let previous = self
            .checkpoints
            .load(session_id)
            .await
            .map_err(|e| GraphError::from_api("checkpoint", e))?;

        let mut state = match previous {
            Some(previous) => {
                tracing::debug!(
                    "Resuming session {} with {} earlier turns",
                    session_id,
                    previous.history.len() + previous.turns().len()
                );
                ConversationState::resume(previous, question, self.settings.history_window)
            }
            None => ConversationState::new(session_id, question),
        };

        let ctx = NodeContext {
            llm: &self.llm,
            retriever: self.retriever.as_ref(),
            prompts: &self.prompts,
            settings: &self.settings,
            checkpoints: self
                .settings
                .checkpoint_each_step
                .then_some(self.checkpoints.as_ref()),
        };

        if let Err(err) = self.graph.run(&mut state, &ctx).await {
            tracing::error!("Run failed for session {}: {}", session_id, err);
            return Err(err);
        }

        let answer = state.answer.clone().ok_or_else(|| {
            GraphError::new("workflow", "Graph finished without producing an answer")
        })?;
        state.visit(WorkflowStage::Done);
        self.checkpoints
            .save(&state)
            .await
            .map_err(|e| GraphError::from_api("checkpoint", e))?;

        tracing::info!(
            "Run complete: session={}, stages={}, rewrites={}",
            session_id,
            state
                .stages
                .iter()
                .map(WorkflowStage::as_str)
                .collect::<Vec<_>>()
                .join("->"),
            state.rewrite_count
        );

        Ok(RunOutcome {
            session_id: state.session_id,
            answer,
            stages: state.stages,
            rewrites: state.rewrite_count,
            route: state.route,
        })
    }
}
