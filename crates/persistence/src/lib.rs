//! Persistence layer for the utility agent
//!
//! Provides storage for:
//! - Customer accounts per service, with a leading-segment index
//! - Zone maintenance status
//! - Conversations and their turns
//!
//! ScyllaDB backs production deployments; the in-memory stores cover local
//! runs and tests behind the same core traits.

pub mod accounts;
pub mod client;
pub mod conversations;
pub mod error;
pub mod memory;
pub mod schema;
pub mod seed;

use std::sync::Arc;

use chrono::Utc;
use utility_agent_core::{AccountStore, ConversationStore};

pub use accounts::ScyllaAccountStore;
pub use client::{ScyllaClient, ScyllaConfig};
pub use conversations::ScyllaConversationStore;
pub use error::PersistenceError;
pub use memory::{InMemoryAccountStore, InMemoryConversationStore};
pub use seed::{demo_accounts, demo_zones, seed_in_memory, seed_scylla};

/// Initialize the persistence layer with ScyllaDB
///
/// # Arguments
/// * `config` - ScyllaDB configuration
/// * `seed_demo_data` - upsert the demo accounts and zones after schema creation
pub async fn init(
    config: ScyllaConfig,
    seed_demo_data: bool,
) -> Result<PersistenceLayer, PersistenceError> {
    let client = ScyllaClient::connect(config).await?;
    client.ensure_schema().await?;

    let accounts = ScyllaAccountStore::new(client.clone());
    if seed_demo_data {
        seed_scylla(&accounts).await?;
    }

    Ok(PersistenceLayer {
        accounts: Arc::new(accounts),
        conversations: Arc::new(ScyllaConversationStore::new(client)),
    })
}

/// Process-local persistence, optionally seeded with the demo data
pub fn in_memory(seed_demo_data: bool) -> PersistenceLayer {
    let accounts = InMemoryAccountStore::new();
    if seed_demo_data {
        seed_in_memory(&accounts, Utc::now());
    }
    PersistenceLayer {
        accounts: Arc::new(accounts),
        conversations: Arc::new(InMemoryConversationStore::new()),
    }
}

/// Combined persistence layer
#[derive(Clone)]
pub struct PersistenceLayer {
    pub accounts: Arc<dyn AccountStore>,
    pub conversations: Arc<dyn ConversationStore>,
}
