//! Customer-service agent for water and electricity outages
//!
//! Features:
//! - Account resolution by contract number, with leading-segment fallback
//! - Reactivation window after a recent payment
//! - Deterministic diagnosis with localized templates (ar/fr/en)
//! - Turn router: mismatch correction, contract requests, water-then-electricity flow
//! - Payment action extraction
//! - Model conversation path with lookup tools
//! - `ChatService` producing the response envelope

pub mod action;
pub mod diagnosis;
pub mod lookup;
pub mod model;
pub mod reactivation;
pub mod resolver;
pub mod router;
pub mod service;
pub mod templates;
pub mod tools;

pub use action::{Action, ActionExtractor};
pub use diagnosis::{diagnose, Diagnosis, DiagnosisKind};
pub use lookup::{Diagnostician, Found, Lookup};
pub use model::{ModelPath, MAX_TOOL_ROUNDS};
pub use reactivation::{Advisory, ReactivationWindow};
pub use resolver::AccountResolver;
pub use router::{decide, Decision, Router, TurnOutcome};
pub use service::{ChatResponse, ChatService};
pub use tools::{lookup_registry, CheckMaintenanceTool, CheckPaymentTool};

use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Integration error: {0}")]
    Integration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AgentError {
    /// Label for the `type` dimension of the error counter
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Store(_) => "store",
            Self::Llm(_) => "llm",
            Self::Tool(_) => "tool",
            Self::Integration(_) => "integration",
            Self::Internal(_) => "internal",
        }
    }

    /// True for failures of an external collaborator rather than the caller
    pub fn is_collaborator_failure(&self) -> bool {
        !matches!(self, Self::InvalidInput(_) | Self::Internal(_))
    }
}

impl From<utility_agent_core::Error> for AgentError {
    fn from(err: utility_agent_core::Error) -> Self {
        use utility_agent_core::Error;
        match err {
            Error::Store(msg) => AgentError::Store(msg),
            Error::Llm(msg) => AgentError::Llm(msg),
            Error::Tool(msg) => AgentError::Tool(msg),
            Error::Integration(msg) => AgentError::Integration(msg),
            other => AgentError::Internal(other.to_string()),
        }
    }
}

impl From<utility_agent_llm::LlmError> for AgentError {
    fn from(err: utility_agent_llm::LlmError) -> Self {
        AgentError::Llm(err.to_string())
    }
}

impl From<utility_agent_tools::ToolError> for AgentError {
    fn from(err: utility_agent_tools::ToolError) -> Self {
        AgentError::Tool(err.to_string())
    }
}

impl From<utility_agent_tools::IntegrationError> for AgentError {
    fn from(err: utility_agent_tools::IntegrationError) -> Self {
        AgentError::Integration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_mapping() {
        let err: AgentError = utility_agent_core::Error::store("unreachable").into();
        assert_eq!(err.kind(), "store");
        assert!(err.is_collaborator_failure());

        let err: AgentError = utility_agent_core::Error::config("bad").into();
        assert_eq!(err.kind(), "internal");
        assert!(!err.is_collaborator_failure());
    }
}
