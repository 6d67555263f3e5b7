//! External System Integrations
//!
//! Bill OCR and speech services. Azure REST clients are used when credentials are
//! configured; the stubs serve local runs and tests.

pub mod ocr;
pub mod speech;

pub use ocr::{AzureDocumentOcr, ExtractedContracts, OcrService, StubOcr};
pub use speech::{
    language_for_locale, locale_for_language, voice_for, AzureSpeech, SpeechService, StubSpeech,
    SynthesizedAudio, Transcription, VoiceGender,
};

use thiserror::Error;

/// Integration errors
#[derive(Error, Debug)]
pub enum IntegrationError {
    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("No speech recognized")]
    NoSpeech,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntegrationError {
    /// Map a non-success HTTP status from a collaborator
    pub(crate) fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => IntegrationError::AuthFailed(body),
            429 => IntegrationError::RateLimited,
            400..=499 => IntegrationError::InvalidRequest(format!("HTTP {}: {}", status, body)),
            _ => IntegrationError::ConnectionFailed(format!("HTTP {}: {}", status, body)),
        }
    }
}

impl From<reqwest::Error> for IntegrationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            IntegrationError::Timeout(err.to_string())
        } else {
            IntegrationError::ConnectionFailed(err.to_string())
        }
    }
}

impl From<IntegrationError> for crate::mcp::ToolError {
    fn from(err: IntegrationError) -> Self {
        match err {
            IntegrationError::InvalidRequest(msg) => crate::mcp::ToolError::invalid_params(msg),
            IntegrationError::RateLimited => {
                crate::mcp::ToolError::internal("Rate limited - please retry later")
            }
            _ => crate::mcp::ToolError::internal(err.to_string()),
        }
    }
}

impl From<IntegrationError> for utility_agent_core::Error {
    fn from(err: IntegrationError) -> Self {
        utility_agent_core::Error::Integration(err.to_string())
    }
}
