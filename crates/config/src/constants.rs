//! Defaults and fixed values shared across crates

/// Customer-facing company details
pub mod company {
    pub const NAME: &str = "SRM";
    pub const SERVICE_NAME: &str = "SRM AI Customer Service";
    pub const SUPPORT_PHONE: &str = "0800-000-000";
    pub const SUPPORT_EMAIL: &str = "support@srm.ma";
}

/// Post-payment reactivation grace period
pub mod reactivation {
    /// Two hours. Deployments that restore faster override this in config.
    pub const DEFAULT_WINDOW_SECS: u64 = 7200;

    /// Africa/Casablanca standard offset (UTC+1)
    pub const DEFAULT_DISPLAY_UTC_OFFSET_MINUTES: i32 = 60;

    pub const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;
}

pub mod conversation {
    /// Turns of history fed to the model and the classifiers
    pub const DEFAULT_MAX_HISTORY_TURNS: usize = 20;
}

/// Azure OpenAI defaults
pub mod llm {
    pub const DEFAULT_DEPLOYMENT: &str = "gpt-4o";
    pub const DEFAULT_API_VERSION: &str = "2024-08-01-preview";
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;
    pub const DEFAULT_MAX_TOKENS: u32 = 1000;
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
}

/// Azure Document Intelligence defaults
pub mod ocr {
    pub const DEFAULT_MODEL: &str = "prebuilt-read";
    pub const DEFAULT_API_VERSION: &str = "2024-11-30";
    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
    pub const DEFAULT_MAX_POLLS: u32 = 30;
}

/// Azure Speech defaults
pub mod speech {
    pub const DEFAULT_REGION: &str = "francecentral";
    pub const DEFAULT_TTS_LANGUAGE: &str = "ar-MA";
    /// Tried in order when the caller does not name a language
    pub const CANDIDATE_LANGUAGES: &[&str] = &["fr-FR", "ar-MA", "ar-SA", "en-US"];

    /// Neural voices per locale: (locale, male, female)
    pub const VOICES: &[(&str, &str, &str)] = &[
        ("ar-MA", "ar-MA-JamalNeural", "ar-MA-MounaNeural"),
        ("ar-SA", "ar-SA-HamedNeural", "ar-SA-ZariyahNeural"),
        ("ar-EG", "ar-EG-ShakirNeural", "ar-EG-SalmaNeural"),
        ("fr-FR", "fr-FR-HenriNeural", "fr-FR-DeniseNeural"),
        ("en-US", "en-US-GuyNeural", "en-US-JennyNeural"),
    ];
}

/// Service endpoints
pub mod endpoints {
    pub const DEFAULT_HOST: &str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 8080;
    pub const SCYLLA_DEFAULT: &str = "127.0.0.1:9042";
    pub const DEFAULT_KEYSPACE: &str = "utility_agent";
}

/// Request limits
pub mod limits {
    pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;
}
