//! Deterministic lookup: resolver, reactivation window and diagnosis wired
//! together. Shared by the router and the model-facing tools.

use std::sync::Arc;

use utility_agent_config::AgentConfig;
use utility_agent_core::{
    Account, AccountStore, Clock, ContractQuery, Result, Service, SystemClock, Zone,
};

use crate::diagnosis::{diagnose, Diagnosis};
use crate::reactivation::{Advisory, ReactivationWindow};
use crate::resolver::AccountResolver;

/// Outcome of looking up one contract for one service
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// No account, or input that is not a contract number of this service
    NotFound,
    /// The contract belongs to the other service
    WrongService { found: Service },
    Found(Box<Found>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Found {
    pub account: Account,
    pub zone: Option<Zone>,
    pub advisory: Option<Advisory>,
    pub diagnosis: Diagnosis,
}

#[derive(Clone)]
pub struct Diagnostician {
    resolver: AccountResolver,
    window: ReactivationWindow,
    clock: Arc<dyn Clock>,
}

impl Diagnostician {
    pub fn new(store: Arc<dyn AccountStore>, agent: &AgentConfig) -> Self {
        Self {
            resolver: AccountResolver::new(store),
            window: ReactivationWindow::from_config(agent),
            clock: Arc::new(SystemClock),
        }
    }

    /// Fallback clock for accounts the store did not stamp
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_window(mut self, window: ReactivationWindow) -> Self {
        self.window = window;
        self
    }

    pub fn resolver(&self) -> &AccountResolver {
        &self.resolver
    }

    pub async fn lookup(&self, input: &str, service: Service) -> Result<Lookup> {
        if let Some(query) = ContractQuery::from_input(input) {
            if query.service() != service {
                return Ok(Lookup::WrongService {
                    found: query.service(),
                });
            }
        }

        let Some(account) = self.resolver.resolve(input, service).await? else {
            return Ok(Lookup::NotFound);
        };
        let zone = self.resolver.resolve_zone(account.zone_id).await?;
        let now = account.now_or(self.clock.now());
        let advisory = self.window.evaluate(service, account.last_payment_at, now);
        let diagnosis = diagnose(&account, zone.as_ref(), advisory.clone());

        tracing::info!(
            service = %service,
            zone_id = account.zone_id,
            diagnosis = %diagnosis.kind(),
            advisory = advisory.is_some(),
            "Diagnosis computed"
        );

        Ok(Lookup::Found(Box::new(Found {
            account,
            zone,
            advisory,
            diagnosis,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use utility_agent_core::FixedClock;
    use utility_agent_persistence::{seed, InMemoryAccountStore};

    use crate::diagnosis::DiagnosisKind;

    fn diagnostician() -> Diagnostician {
        let now = Utc.with_ymd_and_hms(2024, 12, 4, 10, 0, 0).unwrap();
        let store = InMemoryAccountStore::with_clock(Arc::new(FixedClock(now)));
        seed::seed_in_memory(&store, now);
        Diagnostician::new(Arc::new(store), &AgentConfig::default())
    }

    #[tokio::test]
    async fn test_seeded_outcomes() {
        let d = diagnostician();
        let kind = |lookup: Lookup| match lookup {
            Lookup::Found(found) => Some(found.diagnosis.kind()),
            _ => None,
        };

        // Zone 1 has water maintenance
        let water = d.lookup("3701455886 / 1014871", Service::Water).await.unwrap();
        assert_eq!(kind(water), Some(DiagnosisKind::Maintenance));

        let unpaid = d.lookup("4801566997 / 2025982", Service::Electricity).await.unwrap();
        assert_eq!(kind(unpaid), Some(DiagnosisKind::Unpaid));

        let technical = d.lookup("4801788119 / 4047104", Service::Electricity).await.unwrap();
        assert_eq!(kind(technical), Some(DiagnosisKind::TechnicalUnknown));
    }

    #[tokio::test]
    async fn test_wrong_service_and_missing() {
        let d = diagnostician();
        assert_eq!(
            d.lookup("4801566997 / 2025982", Service::Water).await.unwrap(),
            Lookup::WrongService {
                found: Service::Electricity
            }
        );
        assert_eq!(
            d.lookup("3701000000 / 0000000", Service::Water).await.unwrap(),
            Lookup::NotFound
        );
        assert_eq!(d.lookup("hello", Service::Water).await.unwrap(), Lookup::NotFound);
    }
}
