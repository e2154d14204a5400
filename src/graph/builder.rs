// Graph Builder
// Constructs the product assistant workflow graph using petgraph

use super::node::GraphError;
use super::nodes::{
    GeneratorNode, GraderNode, RetrieverNode, RewriterNode, RouterNode, GENERATING, GRADING,
    RETRIEVING, REWRITING, ROUTING,
};
use super::runtime::{GraphBuilder, GraphRuntime};

/// Build the retrieve / grade / rewrite workflow
pub fn build_workflow_graph(max_steps: usize) -> Result<GraphRuntime, GraphError> {
    GraphBuilder::new()
        .entry(ROUTING)
        .max_steps(max_steps)
        .node(Box::new(RouterNode::new()))
        .node(Box::new(RetrieverNode::new()))
        .node(Box::new(GraderNode::new()))
        .node(Box::new(GeneratorNode::new()))
        .node(Box::new(RewriterNode::new()))
        // Router edges (intent)
        .conditional_edge(ROUTING, RETRIEVING, "retrieve")
        .conditional_edge(ROUTING, GENERATING, "direct")
        // Retrieval always goes to grading
        .edge(RETRIEVING, GRADING)
        // Grader edges (verdict)
        .conditional_edge(GRADING, GENERATING, "relevant")
        .conditional_edge(GRADING, REWRITING, "irrelevant")
        // Rewriter loops back unless the budget is spent
        .edge(REWRITING, ROUTING)
        .conditional_edge(REWRITING, GENERATING, "exhausted")
        .build()
}
