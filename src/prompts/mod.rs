//! Prompt templates addressed by symbolic kind.

mod registry;
mod template;

pub use registry::{PromptKind, PromptRegistry};
pub use template::PromptTemplate;
