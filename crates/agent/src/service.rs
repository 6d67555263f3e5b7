//! Chat service
//!
//! One turn end to end: open or create the conversation, infer the reply
//! language, route, extract the payment action, persist the exchange and
//! produce the response envelope. Collaborator failures are logged and
//! answered with the localized apology; nothing is persisted for such turns.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use utility_agent_config::AgentConfig;
use utility_agent_core::{
    AccountStore, Clock, Conversation, ConversationStore, DiagnosisPath, Language, LanguageModel,
    Turn, TurnMetadata,
};
use utility_agent_llm::greeting;
use utility_agent_text_processing::infer_language;

use crate::action::{Action, ActionExtractor};
use crate::lookup::Diagnostician;
use crate::router::{Router, TurnOutcome};
use crate::templates;
use crate::AgentError;

/// Response envelope for one turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response_text: String,
    pub conversation_id: String,
    pub action: Action,
    pub diagnosis_path: DiagnosisPath,
    pub language: Language,
}

pub struct ChatService {
    agent: Arc<AgentConfig>,
    diagnostician: Arc<Diagnostician>,
    llm: Option<Arc<dyn LanguageModel>>,
    router: Router,
    actions: ActionExtractor,
    conversations: Arc<dyn ConversationStore>,
}

impl ChatService {
    pub fn new(
        agent: AgentConfig,
        accounts: Arc<dyn AccountStore>,
        conversations: Arc<dyn ConversationStore>,
    ) -> Self {
        let agent = Arc::new(agent);
        let diagnostician = Arc::new(Diagnostician::new(accounts, &agent));
        let router = Router::new(diagnostician.clone(), agent.clone(), None);
        Self {
            agent,
            diagnostician,
            llm: None,
            router,
            actions: ActionExtractor::new(),
            conversations,
        }
    }

    /// Enable the model conversation path
    pub fn with_llm(mut self, llm: Option<Arc<dyn LanguageModel>>) -> Self {
        self.llm = llm;
        self.rebuild_router();
        self
    }

    /// Fallback clock for accounts the store did not stamp with its own time
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.diagnostician = Arc::new((*self.diagnostician).clone().with_clock(clock));
        self.rebuild_router();
        self
    }

    fn rebuild_router(&mut self) {
        self.router = Router::new(
            self.diagnostician.clone(),
            self.agent.clone(),
            self.llm.clone(),
        );
    }

    pub fn agent_config(&self) -> &AgentConfig {
        &self.agent
    }

    pub fn has_model(&self) -> bool {
        self.router.has_model()
    }

    pub fn greeting(&self, language: Language) -> String {
        greeting(&self.agent.company_name, language)
    }

    /// Start a fresh conversation. Earlier conversations are kept.
    pub async fn reset(&self) -> Result<String, AgentError> {
        let id = self.conversations.create().await?;
        tracing::info!(conversation_id = %id, "Conversation reset");
        Ok(id)
    }

    pub async fn conversation(&self, id: &str) -> Result<Option<Conversation>, AgentError> {
        Ok(self.conversations.get(id).await?)
    }

    pub async fn chat(
        &self,
        message: &str,
        conversation_id: Option<&str>,
    ) -> Result<ChatResponse, AgentError> {
        let text = message.trim();
        if text.is_empty() {
            return Err(AgentError::InvalidInput("message must not be empty".to_string()));
        }

        let started = Instant::now();
        let conversation = self.open(conversation_id).await?;
        let history = conversation.recent(self.agent.max_history_turns);
        let language = infer_language(text, history);

        let (outcome, action) = match self.respond(&conversation.id, text, history, language).await {
            Ok(done) => done,
            Err(e) => return Ok(self.failed_turn(conversation.id, language, e)),
        };

        let latency = started.elapsed();
        metrics::counter!("utility_agent_turns_total", "path" => outcome.path.as_str()).increment(1);
        metrics::histogram!("utility_agent_turn_duration_seconds").record(latency.as_secs_f64());

        tracing::info!(
            conversation_id = %conversation.id,
            path = %outcome.path,
            language = %language,
            diagnosis = outcome.diagnosis.map(|d| d.as_str()).unwrap_or("none"),
            action = action.kind(),
            latency_ms = latency.as_millis() as u64,
            "Turn completed"
        );

        Ok(ChatResponse {
            response_text: outcome.text,
            conversation_id: conversation.id,
            action,
            diagnosis_path: outcome.path,
            language,
        })
    }

    /// Route, extract the action and persist the exchange. Any error here
    /// fails the whole turn.
    async fn respond(
        &self,
        conversation_id: &str,
        text: &str,
        history: &[Turn],
        language: Language,
    ) -> Result<(TurnOutcome, Action), AgentError> {
        let started = Instant::now();
        let outcome = self.router.route(text, history, language).await?;
        let action = self.actions.extract(text, history);
        if !action.is_none() {
            metrics::counter!("utility_agent_actions_total", "type" => action.kind()).increment(1);
        }

        let mut metadata = TurnMetadata::new()
            .with_path(outcome.path)
            .with_language(language)
            .with_latency(started.elapsed().as_millis() as u64);
        if let Some(service) = outcome.diagnosed_service {
            metadata = metadata.with_diagnosed_service(service);
        }

        let stored = self
            .conversations
            .append_exchange(
                conversation_id,
                Turn::user(text),
                Turn::assistant(outcome.text.clone()).with_metadata(metadata),
            )
            .await?;
        if !stored {
            return Err(AgentError::Store(format!(
                "conversation {} disappeared before the exchange was stored",
                conversation_id
            )));
        }

        Ok((outcome, action))
    }

    /// Existing conversation, or a new one when the id is absent or unknown
    async fn open(&self, conversation_id: Option<&str>) -> Result<Conversation, AgentError> {
        if let Some(id) = conversation_id.map(str::trim).filter(|id| !id.is_empty()) {
            if let Some(conversation) = self.conversations.get(id).await? {
                return Ok(conversation);
            }
            tracing::warn!(conversation_id = %id, "Unknown conversation id, starting a new conversation");
        }

        let id = self.conversations.create().await?;
        tracing::debug!(conversation_id = %id, "Conversation created");
        Ok(self.conversations.get(&id).await?.unwrap_or_else(|| Conversation {
            id,
            ..Conversation::new()
        }))
    }

    fn failed_turn(&self, conversation_id: String, language: Language, error: AgentError) -> ChatResponse {
        tracing::error!(
            conversation_id = %conversation_id,
            error = %error,
            kind = error.kind(),
            "Turn failed"
        );
        metrics::counter!("utility_agent_errors_total", "type" => error.kind()).increment(1);
        ChatResponse {
            response_text: templates::apology(language, &self.agent),
            conversation_id,
            action: Action::None,
            diagnosis_path: DiagnosisPath::Deterministic,
            language,
        }
    }
}
