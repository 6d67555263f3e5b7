//! Collaborator traits
//!
//! ```text
//! LanguageModel:      chat completion with tool calling
//! AccountStore:       read-only account and zone lookups
//! ConversationStore:  append-only conversation log
//! ```
//!
//! Implementations live in the `llm` and `persistence` crates; the agent only
//! sees these seams.

mod llm;
mod store;

pub use llm::LanguageModel;
pub use store::{AccountStore, ConversationStore};
