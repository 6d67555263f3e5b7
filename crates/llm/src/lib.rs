//! LLM integration for the model conversation path
//!
//! Features:
//! - OpenAI-compatible chat completions (Azure OpenAI deployments or api.openai.com)
//! - Native tool calling with a second pass over tool results
//! - System prompt with a pinned reply language, and greetings

pub mod backend;
pub mod prompt;

pub use backend::{build_language_model, OpenAIBackend, OpenAIConfig};
pub use prompt::{greeting, language_override, system_prompt, PromptBuilder};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for utility_agent_core::Error {
    fn from(err: LlmError) -> Self {
        utility_agent_core::Error::Llm(err.to_string())
    }
}
