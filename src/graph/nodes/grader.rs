// Grader Node
// Yes/no relevance judgment of the retrieved context

use async_trait::async_trait;

use crate::core::errors::ApiError;
use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput};
use crate::graph::state::{ConversationState, RelevanceVerdict, WorkflowStage};
use crate::llm::LlmService;
use crate::prompts::{PromptKind, PromptRegistry};
use crate::rag::NO_DOCUMENTS_SENTINEL;

/// One model call, no retry. Ambiguous replies grade as irrelevant.
pub async fn grade_relevance(
    llm: &LlmService,
    prompts: &PromptRegistry,
    question: &str,
    context: &str,
) -> Result<RelevanceVerdict, ApiError> {
    let prompt = prompts.render(
        PromptKind::Grader,
        &[("question", question), ("context", context)],
    )?;
    let response = llm.complete(prompt).await?;
    let verdict = RelevanceVerdict::from_response(&response);
    tracing::debug!("Grader reply {:?} -> {:?}", response.trim(), verdict);
    Ok(verdict)
}

pub struct GraderNode;

impl GraderNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GraderNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for GraderNode {
    fn id(&self) -> &'static str {
        super::GRADING
    }

    fn name(&self) -> &'static str {
        "Relevance Grader"
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        state.visit(WorkflowStage::Grading);

        let verdict = if state.evidence.is_empty() {
            tracing::debug!("Grader: no evidence, skipping model call");
            RelevanceVerdict::Irrelevant
        } else {
            let context = state.context.as_deref().unwrap_or(NO_DOCUMENTS_SENTINEL);
            grade_relevance(ctx.llm, ctx.prompts, &state.question, context)
                .await
                .map_err(|e| GraphError::from_api(self.id(), e))?
        };
        state.verdict = Some(verdict);

        let branch = if verdict.is_relevant() {
            "relevant"
        } else {
            "irrelevant"
        };
        tracing::info!("Grader: session={}, verdict={}", state.session_id, branch);

        Ok(NodeOutput::Branch(branch.to_string()))
    }
}
