//! Tools and external integrations for the utility agent
//!
//! Implements an MCP (Model Context Protocol) compatible tool interface used by
//! the model conversation path, plus the bill OCR and speech collaborators.

pub mod integrations;
pub mod mcp;
pub mod registry;

pub use integrations::{
    language_for_locale, locale_for_language, voice_for, AzureDocumentOcr, AzureSpeech,
    ExtractedContracts, IntegrationError, OcrService, SpeechService, StubOcr, StubSpeech,
    SynthesizedAudio, Transcription, VoiceGender,
};
pub use mcp::{
    validate_property, ContentBlock, ErrorCode, InputSchema, PropertySchema, Tool, ToolError,
    ToolOutput, ToolSchema,
};
pub use registry::{ToolExecutor, ToolRegistry, DEFAULT_TOOL_TIMEOUT_SECS};
