//! Utility Agent Server
//!
//! HTTP API over the chat service, bill OCR and speech collaborators.

pub mod http;
pub mod metrics;
pub mod state;

pub use http::create_router;
pub use metrics::{init_metrics, metrics_handler, record_error, record_request};
pub use state::AppState;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use utility_agent_agent::AgentError;
use utility_agent_tools::IntegrationError;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Collaborator disabled or without credentials
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Collaborator call failed
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ServerError::InvalidRequest(_) => "invalid_request",
            ServerError::NotFound(_) => "not_found",
            ServerError::Unavailable(_) => "unavailable",
            ServerError::Upstream(_) => "upstream",
            ServerError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
            record_error(self.kind());
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }
        let message = match &self {
            ServerError::InvalidRequest(m)
            | ServerError::NotFound(m)
            | ServerError::Unavailable(m)
            | ServerError::Upstream(m)
            | ServerError::Internal(m) => m.clone(),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<AgentError> for ServerError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::InvalidInput(msg) => ServerError::InvalidRequest(msg),
            AgentError::Internal(msg) => ServerError::Internal(msg),
            other => ServerError::Upstream(other.to_string()),
        }
    }
}

impl From<IntegrationError> for ServerError {
    fn from(err: IntegrationError) -> Self {
        match err {
            IntegrationError::NotConfigured(msg) => ServerError::Unavailable(msg),
            IntegrationError::InvalidRequest(msg) => ServerError::InvalidRequest(msg),
            IntegrationError::NoSpeech => ServerError::InvalidRequest(err.to_string()),
            other => ServerError::Upstream(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ServerError::from(AgentError::InvalidInput("empty".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::from(AgentError::Store("down".into())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ServerError::from(IntegrationError::NotConfigured("ocr".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ServerError::from(IntegrationError::RateLimited).status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
