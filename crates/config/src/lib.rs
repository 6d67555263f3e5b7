//! Configuration management for the utility agent
//!
//! Supports loading configuration from:
//! - `config/default.{toml,yaml}`
//! - `config/{env}.{toml,yaml}` (env from `UTILITY_AGENT_ENV`)
//! - Environment variables (`UTILITY_AGENT__SECTION__KEY`)

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, load_settings_from, AgentConfig, LlmConfig, ObservabilityConfig, OcrConfig,
    PersistenceConfig, RuntimeEnvironment, ServerConfig, Settings, SpeechConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
