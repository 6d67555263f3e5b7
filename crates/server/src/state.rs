//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use utility_agent_agent::ChatService;
use utility_agent_config::Settings;
use utility_agent_core::LanguageModel;
use utility_agent_persistence::PersistenceLayer;
use utility_agent_tools::{AzureDocumentOcr, AzureSpeech, OcrService, SpeechService};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub chat: Arc<ChatService>,
    /// `None` when OCR is disabled or missing credentials
    pub ocr: Option<Arc<dyn OcrService>>,
    /// `None` when speech is disabled or missing credentials
    pub speech: Option<Arc<dyn SpeechService>>,
}

impl AppState {
    /// Wire the chat service and build the configured collaborators
    pub fn new(
        settings: Settings,
        persistence: PersistenceLayer,
        llm: Option<Arc<dyn LanguageModel>>,
    ) -> Self {
        let chat = ChatService::new(
            settings.agent.clone(),
            persistence.accounts,
            persistence.conversations,
        )
        .with_llm(llm);

        let ocr = build_ocr(&settings);
        let speech = build_speech(&settings);

        Self {
            settings: Arc::new(settings),
            chat: Arc::new(chat),
            ocr,
            speech,
        }
    }

    /// In-memory stores, no model; seeded per `persistence.seed_demo_data`
    pub fn in_memory(settings: Settings) -> Self {
        let persistence = utility_agent_persistence::in_memory(settings.persistence.seed_demo_data);
        Self::new(settings, persistence, None)
    }

    pub fn with_ocr(mut self, ocr: Arc<dyn OcrService>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn with_speech(mut self, speech: Arc<dyn SpeechService>) -> Self {
        self.speech = Some(speech);
        self
    }
}

fn build_ocr(settings: &Settings) -> Option<Arc<dyn OcrService>> {
    if !settings.ocr.enabled {
        tracing::info!("OCR disabled by configuration");
        return None;
    }
    match AzureDocumentOcr::new(&settings.ocr) {
        Ok(ocr) => {
            tracing::info!(model = %settings.ocr.model, "Azure Document Intelligence OCR ready");
            Some(Arc::new(ocr))
        }
        Err(e) => {
            tracing::warn!(error = %e, "OCR unavailable");
            None
        }
    }
}

fn build_speech(settings: &Settings) -> Option<Arc<dyn SpeechService>> {
    if !settings.speech.enabled {
        tracing::info!("Speech disabled by configuration");
        return None;
    }
    match AzureSpeech::new(&settings.speech) {
        Ok(speech) => {
            tracing::info!(region = %settings.speech.region, "Azure Speech ready");
            Some(Arc::new(speech))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Speech unavailable");
            None
        }
    }
}
