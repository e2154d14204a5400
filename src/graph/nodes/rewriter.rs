// Rewriter Node
// Reformulates the original question and loops back to routing

use async_trait::async_trait;

use crate::core::config::ExhaustedPolicy;
use crate::core::errors::ApiError;
use crate::graph::node::{GraphError, GraphErrorKind, Node, NodeContext, NodeOutput};
use crate::graph::state::{ConversationState, Turn, WorkflowStage};
use crate::llm::LlmService;
use crate::prompts::{PromptKind, PromptRegistry};

/// One model call, no retry. A blank rewrite is an upstream error.
pub async fn rewrite_question(
    llm: &LlmService,
    prompts: &PromptRegistry,
    question: &str,
) -> Result<String, ApiError> {
    let prompt = prompts.render(PromptKind::Rewriter, &[("question", question)])?;
    let rewritten = llm.complete(prompt).await?.trim().to_string();

    if rewritten.is_empty() {
        return Err(ApiError::upstream("Query rewriter returned an empty question"));
    }
    Ok(rewritten)
}

pub struct RewriterNode;

impl RewriterNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RewriterNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for RewriterNode {
    fn id(&self) -> &'static str {
        super::REWRITING
    }

    fn name(&self) -> &'static str {
        "Query Rewriter"
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        state.visit(WorkflowStage::Rewriting);

        if state.rewrite_count >= ctx.settings.max_rewrites {
            return match ctx.settings.exhausted_policy {
                ExhaustedPolicy::BestEffort => {
                    tracing::warn!(
                        "Rewriter: budget of {} rewrites spent for session {}, answering from latest context",
                        ctx.settings.max_rewrites,
                        state.session_id
                    );
                    Ok(NodeOutput::Branch("exhausted".to_string()))
                }
                ExhaustedPolicy::Fail => Err(GraphError::with_kind(
                    self.id(),
                    GraphErrorKind::RewriteLimit,
                    format!(
                        "Rewrite limit of {} exceeded without relevant evidence",
                        ctx.settings.max_rewrites
                    ),
                )),
            };
        }

        let rewritten = rewrite_question(ctx.llm, ctx.prompts, &state.question)
            .await
            .map_err(|e| GraphError::from_api(self.id(), e))?;

        if rewritten == state.current_query {
            tracing::warn!("Rewriter: rewrite did not change the query '{}'", rewritten);
        }

        state.rewrite_count += 1;
        tracing::info!(
            "Rewriter: attempt {} of {}: '{}'",
            state.rewrite_count,
            ctx.settings.max_rewrites,
            rewritten
        );
        state.current_query = rewritten.clone();
        state.push_turn(Turn::user(rewritten));

        Ok(NodeOutput::Continue(None))
    }
}
