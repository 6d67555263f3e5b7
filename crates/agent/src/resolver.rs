//! Account Resolver
//!
//! Turns a caller-supplied contract string into an account snapshot. An exact
//! match on the canonical form is tried first; a bare leading segment (no
//! separator) falls back to the stored leads. "Nothing matched" is `Ok(None)`.

use std::sync::Arc;

use utility_agent_core::{Account, AccountStore, ContractQuery, Result, Service, Zone};

#[derive(Clone)]
pub struct AccountResolver {
    store: Arc<dyn AccountStore>,
}

impl AccountResolver {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Resolve free-form input under `service`. Malformed input and contracts
    /// from the other service's namespace resolve to `None`.
    pub async fn resolve(&self, input: &str, service: Service) -> Result<Option<Account>> {
        match ContractQuery::from_input(input) {
            Some(query) if query.service() == service => self.resolve_query(&query).await,
            Some(query) => {
                tracing::debug!(
                    expected = %service,
                    found = %query.service(),
                    "Contract belongs to the other service"
                );
                Ok(None)
            }
            None => {
                tracing::debug!(service = %service, "Malformed contract input");
                Ok(None)
            }
        }
    }

    pub async fn resolve_query(&self, query: &ContractQuery) -> Result<Option<Account>> {
        let account = match query {
            ContractQuery::Exact(contract) => {
                self.store.find_account(contract.service(), contract).await?
            }
            ContractQuery::Lead { service, lead } => {
                self.store.find_account_by_lead(*service, lead).await?
            }
        };

        tracing::debug!(
            service = %query.service(),
            found = account.is_some(),
            "Account lookup"
        );
        Ok(account)
    }

    pub async fn resolve_zone(&self, zone_id: i32) -> Result<Option<Zone>> {
        let zone = self.store.get_zone(zone_id).await?;
        if zone.is_none() {
            tracing::warn!(zone_id, "Account references a missing zone");
        }
        Ok(zone.map(Zone::normalized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use utility_agent_core::FixedClock;
    use utility_agent_persistence::{seed, InMemoryAccountStore};

    fn resolver() -> AccountResolver {
        let now = Utc.with_ymd_and_hms(2024, 12, 4, 10, 0, 0).unwrap();
        let store = InMemoryAccountStore::with_clock(Arc::new(FixedClock(now)));
        seed::seed_in_memory(&store, now);
        AccountResolver::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_exact_and_unspaced_input() {
        let r = resolver();
        let a = r.resolve("3701455886 / 1014871", Service::Water).await.unwrap();
        let b = r.resolve("3701455886/1014871", Service::Water).await.unwrap();
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_lead_fallback() {
        let r = resolver();
        let account = r.resolve("4801566997", Service::Electricity).await.unwrap().unwrap();
        assert_eq!(account.contract_number.as_canonical(), "4801566997 / 2025982");
    }

    #[tokio::test]
    async fn test_wrong_namespace_and_malformed() {
        let r = resolver();
        assert!(r.resolve("4801566997 / 2025982", Service::Water).await.unwrap().is_none());
        assert!(r.resolve("3701-455886", Service::Water).await.unwrap().is_none());
        assert!(r.resolve("3701455886 / 10", Service::Water).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let r = resolver();
        let first = r.resolve("3701677008 / 3036093", Service::Water).await.unwrap();
        let second = r.resolve("3701677008 / 3036093", Service::Water).await.unwrap();
        assert_eq!(first, second);
    }
}
