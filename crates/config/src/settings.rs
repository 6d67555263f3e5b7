//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{company, conversation, endpoints, limits, llm, ocr, reactivation, speech};
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Relaxed validation, missing credentials only warn
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub ocr: OcrConfig,

    #[serde(default)]
    pub speech: SpeechConfig,

    #[serde(default)]
    pub persistence: PersistenceConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed origins; empty means any origin (development only)
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Upload limit for bill images and audio
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    endpoints::DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    endpoints::DEFAULT_PORT
}
fn default_timeout() -> u64 {
    limits::REQUEST_TIMEOUT_SECS
}
fn default_true() -> bool {
    true
}
fn default_max_upload_bytes() -> usize {
    limits::MAX_UPLOAD_BYTES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Conversation and diagnosis behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_company_name")]
    pub company_name: String,

    #[serde(default = "default_support_phone")]
    pub support_phone: String,

    #[serde(default = "default_support_email")]
    pub support_email: String,

    /// Grace period after a payment during which restoration may still be pending
    #[serde(default = "default_reactivation_window_secs")]
    pub reactivation_window_secs: u64,

    /// Offset used when showing payment times to customers
    #[serde(default = "default_display_utc_offset_minutes")]
    pub display_utc_offset_minutes: i32,

    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,
}

fn default_company_name() -> String {
    company::NAME.to_string()
}
fn default_support_phone() -> String {
    company::SUPPORT_PHONE.to_string()
}
fn default_support_email() -> String {
    company::SUPPORT_EMAIL.to_string()
}
fn default_reactivation_window_secs() -> u64 {
    reactivation::DEFAULT_WINDOW_SECS
}
fn default_display_utc_offset_minutes() -> i32 {
    reactivation::DEFAULT_DISPLAY_UTC_OFFSET_MINUTES
}
fn default_max_history_turns() -> usize {
    conversation::DEFAULT_MAX_HISTORY_TURNS
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            company_name: default_company_name(),
            support_phone: default_support_phone(),
            support_email: default_support_email(),
            reactivation_window_secs: default_reactivation_window_secs(),
            display_utc_offset_minutes: default_display_utc_offset_minutes(),
            max_history_turns: default_max_history_turns(),
        }
    }
}

/// Azure OpenAI chat completions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Resource endpoint, e.g. `https://<name>.openai.azure.com`
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_deployment")]
    pub deployment: String,

    #[serde(default = "default_llm_api_version")]
    pub api_version: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_deployment() -> String {
    llm::DEFAULT_DEPLOYMENT.to_string()
}
fn default_llm_api_version() -> String {
    llm::DEFAULT_API_VERSION.to_string()
}
fn default_temperature() -> f32 {
    llm::DEFAULT_TEMPERATURE
}
fn default_max_tokens() -> u32 {
    llm::DEFAULT_MAX_TOKENS
}
fn default_llm_timeout() -> u64 {
    llm::DEFAULT_TIMEOUT_SECS
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: None,
            api_key: None,
            deployment: default_deployment(),
            api_version: default_llm_api_version(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl LlmConfig {
    pub fn is_configured(&self) -> bool {
        self.enabled && is_set(&self.endpoint) && is_set(&self.api_key)
    }
}

/// Azure Document Intelligence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_ocr_model")]
    pub model: String,

    #[serde(default = "default_ocr_api_version")]
    pub api_version: String,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

fn default_ocr_model() -> String {
    ocr::DEFAULT_MODEL.to_string()
}
fn default_ocr_api_version() -> String {
    ocr::DEFAULT_API_VERSION.to_string()
}
fn default_poll_interval_ms() -> u64 {
    ocr::DEFAULT_POLL_INTERVAL_MS
}
fn default_max_polls() -> u32 {
    ocr::DEFAULT_MAX_POLLS
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: None,
            api_key: None,
            model: default_ocr_model(),
            api_version: default_ocr_api_version(),
            poll_interval_ms: default_poll_interval_ms(),
            max_polls: default_max_polls(),
        }
    }
}

impl OcrConfig {
    pub fn is_configured(&self) -> bool {
        self.enabled && is_set(&self.endpoint) && is_set(&self.api_key)
    }
}

/// Azure Speech (short-audio STT and TTS REST)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_candidate_languages")]
    pub candidate_languages: Vec<String>,

    #[serde(default = "default_tts_language")]
    pub default_tts_language: String,
}

fn default_region() -> String {
    speech::DEFAULT_REGION.to_string()
}
fn default_candidate_languages() -> Vec<String> {
    speech::CANDIDATE_LANGUAGES
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_tts_language() -> String {
    speech::DEFAULT_TTS_LANGUAGE.to_string()
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            region: default_region(),
            api_key: None,
            candidate_languages: default_candidate_languages(),
            default_tts_language: default_tts_language(),
        }
    }
}

impl SpeechConfig {
    pub fn is_configured(&self) -> bool {
        self.enabled && is_set(&self.api_key) && !self.region.trim().is_empty()
    }
}

/// Persistence configuration for ScyllaDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Enable ScyllaDB persistence (false = in-memory stores)
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_scylla_hosts")]
    pub scylla_hosts: Vec<String>,

    #[serde(default = "default_scylla_keyspace")]
    pub keyspace: String,

    #[serde(default = "default_replication_factor")]
    pub replication_factor: u8,

    /// Load the demo customers and zones at startup
    #[serde(default = "default_true")]
    pub seed_demo_data: bool,
}

fn default_scylla_hosts() -> Vec<String> {
    vec![endpoints::SCYLLA_DEFAULT.to_string()]
}
fn default_scylla_keyspace() -> String {
    endpoints::DEFAULT_KEYSPACE.to_string()
}
fn default_replication_factor() -> u8 {
    1
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            scylla_hosts: default_scylla_hosts(),
            keyspace: default_scylla_keyspace(),
            replication_factor: default_replication_factor(),
            seed_demo_data: true,
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// JSON log lines instead of human-readable
    #[serde(default)]
    pub log_json: bool,

    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_agent()?;
        self.validate_credentials()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if self.server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if self.environment.is_production()
            && self.server.cors_enabled
            && self.server.cors_origins.is_empty()
        {
            tracing::warn!(
                "CORS is enabled in production but no origins are configured. \
                 Any origin will be accepted."
            );
        }

        Ok(())
    }

    fn validate_agent(&self) -> Result<(), ConfigError> {
        if self.agent.reactivation_window_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "agent.reactivation_window_secs".to_string(),
                message: "Reactivation window must be positive".to_string(),
            });
        }

        if self.agent.display_utc_offset_minutes.abs() > reactivation::MAX_UTC_OFFSET_MINUTES {
            return Err(ConfigError::InvalidValue {
                field: "agent.display_utc_offset_minutes".to_string(),
                message: format!(
                    "Offset must be within +/-{} minutes, got {}",
                    reactivation::MAX_UTC_OFFSET_MINUTES,
                    self.agent.display_utc_offset_minutes
                ),
            });
        }

        if self.agent.max_history_turns == 0 {
            return Err(ConfigError::InvalidValue {
                field: "agent.max_history_turns".to_string(),
                message: "At least one history turn is required".to_string(),
            });
        }

        Ok(())
    }

    /// Missing credentials fail in staging/production and only warn otherwise
    fn validate_credentials(&self) -> Result<(), ConfigError> {
        let missing = self.missing_credentials();
        if missing.is_empty() {
            return Ok(());
        }

        if self.environment.is_strict() {
            return Err(ConfigError::MissingField(missing.join(", ")));
        }

        tracing::warn!(
            missing = ?missing,
            "Collaborator credentials missing; affected features will be unavailable"
        );
        Ok(())
    }

    /// Keys required by enabled collaborators that are unset
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();

        if self.llm.enabled {
            if !is_set(&self.llm.endpoint) {
                missing.push("llm.endpoint");
            }
            if !is_set(&self.llm.api_key) {
                missing.push("llm.api_key");
            }
        }

        if self.ocr.enabled {
            if !is_set(&self.ocr.endpoint) {
                missing.push("ocr.endpoint");
            }
            if !is_set(&self.ocr.api_key) {
                missing.push("ocr.api_key");
            }
        }

        if self.speech.enabled && !is_set(&self.speech.api_key) {
            missing.push("speech.api_key");
        }

        missing
    }
}

/// Load settings from `config/` relative to the working directory
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Load settings from a config directory, then the environment
pub fn load_settings_from(dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    let default_path = dir.join("default");
    builder = builder.add_source(File::with_name(&default_path.to_string_lossy()).required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        let env_path = dir.join(env_name);
        builder = builder.add_source(File::with_name(&env_path.to_string_lossy()).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("UTILITY_AGENT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.agent.reactivation_window_secs, 7200);
        assert_eq!(settings.agent.support_phone, "0800-000-000");
        assert_eq!(settings.llm.deployment, "gpt-4o");
        assert_eq!(settings.speech.candidate_languages.len(), 4);
        assert!(!settings.persistence.enabled);
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());

        settings.agent.reactivation_window_secs = 0;
        assert!(settings.validate().is_err());
        settings.agent.reactivation_window_secs = 120;

        settings.agent.display_utc_offset_minutes = 15 * 60;
        assert!(settings.validate().is_err());
        settings.agent.display_utc_offset_minutes = -60;
        assert!(settings.validate().is_ok());

        settings.server.port = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_missing_credentials() {
        let mut settings = Settings::default();
        let missing = settings.missing_credentials();
        assert!(missing.contains(&"llm.api_key"));
        assert!(missing.contains(&"ocr.endpoint"));
        assert!(missing.contains(&"speech.api_key"));

        settings.ocr.enabled = false;
        settings.speech.enabled = false;
        settings.llm.endpoint = Some("https://example.openai.azure.com".into());
        settings.llm.api_key = Some("key".into());
        assert!(settings.missing_credentials().is_empty());
        assert!(settings.llm.is_configured());
    }

    #[test]
    fn test_production_requires_credentials() {
        let mut settings = Settings::default();
        settings.environment = RuntimeEnvironment::Production;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::MissingField(_))
        ));

        settings.llm.enabled = false;
        settings.ocr.enabled = false;
        settings.speech.enabled = false;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_layered_files() {
        let dir = tempfile::tempdir().unwrap();

        let mut default = std::fs::File::create(dir.path().join("default.toml")).unwrap();
        writeln!(
            default,
            "[agent]\nreactivation_window_secs = 120\n\n[server]\nport = 9000"
        )
        .unwrap();

        let mut staging = std::fs::File::create(dir.path().join("staging.toml")).unwrap();
        writeln!(
            staging,
            "[server]\nport = 9100\n\n[llm]\nenabled = false\n\n[ocr]\nenabled = false\n\n[speech]\nenabled = false"
        )
        .unwrap();

        let settings = load_settings_from(dir.path(), None).unwrap();
        assert_eq!(settings.agent.reactivation_window_secs, 120);
        assert_eq!(settings.server.port, 9000);

        let settings = load_settings_from(dir.path(), Some("staging")).unwrap();
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.agent.reactivation_window_secs, 120);
        assert!(!settings.llm.enabled);
    }
}
