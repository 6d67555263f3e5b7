//! Core types and traits for the utility customer-service agent
//!
//! This crate provides foundational types used across all other crates:
//! - Service, contract number, account and zone snapshots
//! - Reply languages and script detection
//! - Conversation turns with per-turn metadata
//! - Backend-neutral LLM request/response types
//! - Collaborator traits (language model, account store, conversation store)
//! - Error types

pub mod account;
pub mod clock;
pub mod contract;
pub mod conversation;
pub mod error;
pub mod language;
pub mod llm_types;
pub mod service;
pub mod traits;

pub use account::{Account, CutStatus, MaintenanceStatus, Zone};
pub use clock::{Clock, FixedClock, SystemClock};
pub use contract::{service_of, ContractNumber, ContractQuery};
pub use conversation::{
    last_assistant_turn, user_turns_newest_first, Conversation, DiagnosisPath, Turn, TurnMetadata,
    TurnRole,
};
pub use error::{Error, Result};
pub use language::{Language, Script};
pub use llm_types::{
    FinishReason, GenerateRequest, GenerateResponse, Message, Role, TokenUsage, ToolCall,
    ToolDefinition,
};
pub use service::{Service, ServiceScope};
pub use traits::{AccountStore, ConversationStore, LanguageModel};
