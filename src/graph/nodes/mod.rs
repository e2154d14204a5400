// Graph Nodes Module
// One node per workflow stage

pub mod generator;
pub mod grader;
pub mod retriever;
pub mod rewriter;
pub mod router;

pub use generator::{generate_answer, GeneratorNode};
pub use grader::{grade_relevance, GraderNode};
pub use retriever::RetrieverNode;
pub use rewriter::{rewrite_question, RewriterNode};
pub use router::{classify_intent, RouterNode};

pub const ROUTING: &str = "routing";
pub const RETRIEVING: &str = "retrieving";
pub const GRADING: &str = "grading";
pub const GENERATING: &str = "generating";
pub const REWRITING: &str = "rewriting";
