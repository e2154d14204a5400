// Generator Node
// Produces the final answer, with or without retrieved context

use async_trait::async_trait;

use crate::core::errors::ApiError;
use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput};
use crate::graph::state::{ConversationState, RouteDecision, Turn, WorkflowStage};
use crate::llm::LlmService;
use crate::prompts::{PromptKind, PromptRegistry};
use crate::rag::NO_DOCUMENTS_SENTINEL;

/// `context = None` answers directly from the model.
pub async fn generate_answer(
    llm: &LlmService,
    prompts: &PromptRegistry,
    question: &str,
    context: Option<&str>,
) -> Result<String, ApiError> {
    let prompt = match context {
        Some(context) => prompts.render(
            PromptKind::ProductBot,
            &[("context", context), ("question", question)],
        )?,
        None => prompts.render(PromptKind::DirectAnswer, &[("question", question)])?,
    };

    let answer = llm.complete(prompt).await?.trim().to_string();
    if answer.is_empty() {
        return Err(ApiError::upstream("Language model returned an empty answer"));
    }
    Ok(answer)
}

pub struct GeneratorNode;

impl GeneratorNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GeneratorNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for GeneratorNode {
    fn id(&self) -> &'static str {
        super::GENERATING
    }

    fn name(&self) -> &'static str {
        "Answer Generator"
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        state.visit(WorkflowStage::Generating);

        let answer = match state.route {
            Some(RouteDecision::Direct) => {
                generate_answer(ctx.llm, ctx.prompts, &state.current_query, None).await
            }
            _ => {
                let context = state.context.as_deref().unwrap_or(NO_DOCUMENTS_SENTINEL);
                generate_answer(ctx.llm, ctx.prompts, &state.question, Some(context)).await
            }
        }
        .map_err(|e| GraphError::from_api(self.id(), e))?;

        tracing::info!(
            "Generator: session={}, answer of {} chars",
            state.session_id,
            answer.len()
        );
        state.answer = Some(answer.clone());
        state.push_turn(Turn::assistant(answer));

        Ok(NodeOutput::Final)
    }
}
