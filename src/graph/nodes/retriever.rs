// Retriever Node
// Fetches catalogue evidence for the current query and formats it

use async_trait::async_trait;

use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput};
use crate::graph::state::{ConversationState, Turn, WorkflowStage};
use crate::rag::format_documents;

pub struct RetrieverNode;

impl RetrieverNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RetrieverNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for RetrieverNode {
    fn id(&self) -> &'static str {
        super::RETRIEVING
    }

    fn name(&self) -> &'static str {
        "Catalogue Retriever"
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        state.visit(WorkflowStage::Retrieving);

        let evidence = ctx
            .retriever
            .retrieve(&state.current_query)
            .await
            .map_err(|e| GraphError::from_api(self.id(), e))?;

        let context = format_documents(&evidence);
        tracing::info!(
            "Retriever: {} evidence items for '{}'",
            evidence.len(),
            state.current_query
        );

        state.evidence = evidence;
        state.context = Some(context.clone());
        state.push_turn(Turn::tool_result(context));

        Ok(NodeOutput::Continue(None))
    }
}
