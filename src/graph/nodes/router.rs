// Router Node
// Entry point that decides between retrieval and a direct answer

use async_trait::async_trait;

use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput};
use crate::graph::state::{ConversationState, RouteDecision, WorkflowStage};

/// Case-insensitive substring scan of the question for any keyword.
pub fn classify_intent(question: &str, keywords: &[String]) -> RouteDecision {
    let lowered = question.to_lowercase();
    let product_intent = keywords
        .iter()
        .map(|keyword| keyword.trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty())
        .any(|keyword| lowered.contains(&keyword));

    if product_intent {
        RouteDecision::Retrieve
    } else {
        RouteDecision::Direct
    }
}

pub struct RouterNode;

impl RouterNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RouterNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for RouterNode {
    fn id(&self) -> &'static str {
        super::ROUTING
    }

    fn name(&self) -> &'static str {
        "Intent Router"
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        state.visit(WorkflowStage::Routing);

        let decision = classify_intent(&state.current_query, &ctx.settings.router_keywords);
        state.route = Some(decision);

        let branch = match decision {
            RouteDecision::Retrieve => "retrieve",
            RouteDecision::Direct => "direct",
        };
        tracing::info!(
            "Router: session={}, rewrites={}, routing to {}",
            state.session_id,
            state.rewrite_count,
            branch
        );

        Ok(NodeOutput::Branch(branch.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::testing::TestHarness;

    fn keywords() -> Vec<String> {
        vec!["price".into(), "review".into(), "product".into()]
    }

    #[test]
    fn keyword_in_any_case_routes_to_retrieval() {
        assert_eq!(
            classify_intent("What is the PRICE of iPhone 15?", &keywords()),
            RouteDecision::Retrieve
        );
        assert_eq!(
            classify_intent("Show me Reviews please", &keywords()),
            RouteDecision::Retrieve
        );
        // Substring match, as in "products".
        assert_eq!(
            classify_intent("best products under 10k", &keywords()),
            RouteDecision::Retrieve
        );
    }

    #[test]
    fn no_keyword_routes_direct() {
        assert_eq!(classify_intent("Hello", &keywords()), RouteDecision::Direct);
        assert_eq!(classify_intent("", &keywords()), RouteDecision::Direct);
        assert_eq!(classify_intent("anything", &[]), RouteDecision::Direct);
    }

    #[tokio::test]
    async fn node_records_decision_on_state() {
        let harness = TestHarness::new(|_| Ok(String::new()), Vec::new());
        let mut state = ConversationState::new("s1", "Any review of boat earbuds?");

        let output = RouterNode::new()
            .execute(&mut state, &harness.context())
            .await
            .unwrap();

        assert!(matches!(output, NodeOutput::Branch(ref b) if b == "retrieve"));
        assert_eq!(state.route, Some(RouteDecision::Retrieve));
        assert_eq!(state.stages, vec![WorkflowStage::Routing]);
        // Routing never appends content.
        assert_eq!(state.turns().len(), 1);
    }
}
