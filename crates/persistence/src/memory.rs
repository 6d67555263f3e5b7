//! In-memory stores
//!
//! Used when ScyllaDB persistence is disabled and in tests. Accounts and zones
//! sit behind a `parking_lot::RwLock`; conversations live in a `DashMap` so
//! concurrent sessions do not contend on one lock.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use utility_agent_core::{
    Account, AccountStore, Clock, ContractNumber, Conversation, ConversationStore, Result,
    Service, SystemClock, Turn, Zone,
};

/// Account and zone lookups backed by hash maps
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<(Service, String), Account>>,
    zones: RwLock<HashMap<i32, Zone>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Store whose reads are stamped with `clock` instead of the wall clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            zones: RwLock::new(HashMap::new()),
            clock,
        }
    }

    pub fn insert_account(&self, account: Account) {
        let key = (account.service, account.contract_number.as_canonical());
        self.accounts.write().insert(key, account);
    }

    pub fn insert_zone(&self, zone: Zone) {
        self.zones.write().insert(zone.zone_id, zone);
    }

    pub fn account_count(&self) -> usize {
        self.accounts.read().len()
    }

    fn stamp(&self, mut account: Account) -> Account {
        account.observed_at = Some(self.clock.now());
        account
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_account(
        &self,
        service: Service,
        contract: &ContractNumber,
    ) -> Result<Option<Account>> {
        let found = self
            .accounts
            .read()
            .get(&(service, contract.as_canonical()))
            .cloned();
        Ok(found.map(|a| self.stamp(a)))
    }

    async fn find_account_by_lead(&self, service: Service, lead: &str) -> Result<Option<Account>> {
        // Smallest canonical number wins so repeated lookups are stable
        let found = self
            .accounts
            .read()
            .iter()
            .filter(|((s, _), a)| *s == service && a.contract_number.lead() == lead)
            .min_by(|(a, _), (b, _)| a.1.cmp(&b.1))
            .map(|(_, a)| a.clone());
        Ok(found.map(|a| self.stamp(a)))
    }

    async fn get_zone(&self, zone_id: i32) -> Result<Option<Zone>> {
        Ok(self
            .zones
            .read()
            .get(&zone_id)
            .cloned()
            .map(Zone::normalized))
    }
}

/// Conversation log kept in process memory
#[derive(Default)]
pub struct InMemoryConversationStore {
    conversations: DashMap<String, Conversation>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create(&self) -> Result<String> {
        let conversation = Conversation::new();
        let id = conversation.id.clone();
        self.conversations.insert(id.clone(), conversation);
        tracing::debug!(conversation_id = %id, "Conversation created");
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<Conversation>> {
        Ok(self.conversations.get(id).map(|c| c.value().clone()))
    }

    async fn append(&self, id: &str, turn: Turn) -> Result<bool> {
        match self.conversations.get_mut(id) {
            Some(mut conversation) => {
                conversation.turns.push(turn);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn append_exchange(&self, id: &str, user: Turn, assistant: Turn) -> Result<bool> {
        // Both pushes happen under the same shard guard
        match self.conversations.get_mut(id) {
            Some(mut conversation) => {
                conversation.turns.push(user);
                conversation.turns.push(assistant);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use utility_agent_core::{CutStatus, FixedClock, MaintenanceStatus};

    fn account(contract: &str) -> Account {
        let contract_number = ContractNumber::parse(contract).unwrap();
        Account {
            service: contract_number.service(),
            contract_number,
            customer_name: "Test".to_string(),
            address: "Somewhere".to_string(),
            phone: "0600000000".to_string(),
            zone_id: 1,
            is_paid: true,
            outstanding_balance: 0.0,
            last_payment_at: None,
            cut_status: CutStatus::Ok,
            cut_reason: None,
            observed_at: None,
        }
    }

    #[tokio::test]
    async fn test_exact_lookup_is_stamped_with_clock() {
        let now = Utc.with_ymd_and_hms(2024, 12, 1, 10, 0, 0).unwrap();
        let store = InMemoryAccountStore::with_clock(Arc::new(FixedClock(now)));
        store.insert_account(account("3701455886 / 1014871"));

        let contract = ContractNumber::parse("3701455886/1014871").unwrap();
        let found = store
            .find_account(Service::Water, &contract)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.observed_at, Some(now));

        // Right number, wrong service
        assert!(store
            .find_account(Service::Electricity, &contract)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_lead_lookup_matches_whole_segment() {
        let store = InMemoryAccountStore::new();
        store.insert_account(account("3701455886 / 1014871"));

        assert!(store
            .find_account_by_lead(Service::Water, "3701455886")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find_account_by_lead(Service::Water, "370145588")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_zone_is_normalized_on_read() {
        let store = InMemoryAccountStore::new();
        store.insert_zone(Zone {
            zone_id: 2,
            name: "Zone".to_string(),
            maintenance_status: MaintenanceStatus::None,
            outage_reason: Some("stale".to_string()),
            estimated_restoration: Some("2024-12-04 18:00".to_string()),
            affected_services: vec![],
            status_updated: None,
        });

        let zone = store.get_zone(2).await.unwrap().unwrap();
        assert!(zone.outage_reason.is_none());
        assert!(zone.estimated_restoration.is_none());
        assert!(store.get_zone(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_exchange_appends_both_turns_in_order() {
        let store = InMemoryConversationStore::new();
        let id = store.create().await.unwrap();

        let ok = store
            .append_exchange(&id, Turn::user("hello"), Turn::assistant("hi"))
            .await
            .unwrap();
        assert!(ok);

        let history = store.history(&id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].is_user());
        assert!(history[1].is_assistant());
    }

    #[tokio::test]
    async fn test_unknown_conversation() {
        let store = InMemoryConversationStore::new();
        assert!(!store.append("missing", Turn::user("x")).await.unwrap());
        assert!(store.get("missing").await.unwrap().is_none());
        assert!(store.history("missing").await.unwrap().is_empty());
    }
}
