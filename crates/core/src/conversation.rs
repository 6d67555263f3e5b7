//! Conversation types: turns, metadata and the append-only conversation log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Language, Service};

/// Role in a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(TurnRole::User),
            "assistant" => Some(TurnRole::Assistant),
            _ => None,
        }
    }
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How an assistant reply was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosisPath {
    /// Store lookups and fixed templates only
    Deterministic,
    /// Generative model, possibly with tool calls
    Model,
}

impl DiagnosisPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deterministic => "deterministic",
            Self::Model => "model",
        }
    }
}

impl std::fmt::Display for DiagnosisPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single turn in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TurnMetadata>,
}

impl Turn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }

    pub fn with_metadata(mut self, metadata: TurnMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn is_user(&self) -> bool {
        self.role == TurnRole::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == TurnRole::Assistant
    }

    /// Service whose diagnosis this (assistant) turn delivered, if any
    pub fn diagnosed_service(&self) -> Option<Service> {
        self.metadata.as_ref().and_then(|m| m.diagnosed_service)
    }
}

/// Metadata recorded on assistant turns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TurnMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosed_service: Option<Service>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis_path: Option<DiagnosisPath>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl TurnMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_diagnosed_service(mut self, service: Service) -> Self {
        self.diagnosed_service = Some(service);
        self
    }

    pub fn with_path(mut self, path: DiagnosisPath) -> Self {
        self.diagnosis_path = Some(path);
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }
}

/// Ordered, append-only sequence of turns keyed by an opaque id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub turns: Vec<Turn>,
}

impl Conversation {
    /// New empty conversation with a random id
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            turns: Vec::new(),
        }
    }

    /// Last `max` turns, oldest first
    pub fn recent(&self, max: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(max);
        &self.turns[start..]
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// Most recent assistant turn in `history`
pub fn last_assistant_turn(history: &[Turn]) -> Option<&Turn> {
    history.iter().rev().find(|t| t.is_assistant())
}

/// User turns, most recent first
pub fn user_turns_newest_first(history: &[Turn]) -> impl Iterator<Item = &Turn> {
    history.iter().rev().filter(|t| t.is_user())
}
