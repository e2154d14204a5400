pub mod openai;
pub mod provider;
pub mod scripted;
pub mod service;
pub mod types;

pub use openai::OpenAiCompatibleProvider;
pub use provider::LlmProvider;
pub use scripted::ScriptedProvider;
pub use service::LlmService;
pub use types::{ChatMessage, ChatRequest};
