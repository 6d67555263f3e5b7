//! Data-store traits

use async_trait::async_trait;

use crate::{Account, Conversation, ContractNumber, Result, Service, Turn, Zone};

/// Read-only account and zone lookups.
///
/// "Not found" is `Ok(None)`; `Err` means the store itself failed.
#[async_trait]
pub trait AccountStore: Send + Sync + 'static {
    /// Exact match on the canonical contract number
    async fn find_account(
        &self,
        service: Service,
        contract: &ContractNumber,
    ) -> Result<Option<Account>>;

    /// First account whose leading segment equals `lead`
    async fn find_account_by_lead(&self, service: Service, lead: &str) -> Result<Option<Account>>;

    async fn get_zone(&self, zone_id: i32) -> Result<Option<Zone>>;
}

/// Append-only conversation log
#[async_trait]
pub trait ConversationStore: Send + Sync + 'static {
    /// Create an empty conversation and return its id
    async fn create(&self) -> Result<String>;

    async fn get(&self, id: &str) -> Result<Option<Conversation>>;

    /// Append one turn. Returns false if the conversation does not exist.
    async fn append(&self, id: &str, turn: Turn) -> Result<bool>;

    /// Append a user turn and its reply together, so history never shows a
    /// user turn without the answer.
    async fn append_exchange(&self, id: &str, user: Turn, assistant: Turn) -> Result<bool>;

    /// Turns in order; empty if the conversation does not exist
    async fn history(&self, id: &str) -> Result<Vec<Turn>> {
        Ok(self.get(id).await?.map(|c| c.turns).unwrap_or_default())
    }
}
