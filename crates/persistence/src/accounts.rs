//! Account and zone persistence using ScyllaDB

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use scylla::frame::response::result::Row;
use utility_agent_core::{
    Account, AccountStore, ContractNumber, CutStatus, MaintenanceStatus, Service, Zone,
};

use crate::{PersistenceError, ScyllaClient};

pub(crate) fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

fn parse_service(s: &str) -> Result<Service, PersistenceError> {
    Service::parse(s).ok_or_else(|| PersistenceError::InvalidData(format!("unknown service: {s}")))
}

/// ScyllaDB implementation of the account store
#[derive(Clone)]
pub struct ScyllaAccountStore {
    client: ScyllaClient,
}

impl ScyllaAccountStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }

    /// Insert or replace an account and its leading-segment index row
    pub async fn upsert_account(&self, account: &Account) -> Result<(), PersistenceError> {
        let ks = self.client.keyspace();
        let contract = account.contract_number.as_canonical();

        let query = format!(
            "INSERT INTO {}.accounts (
                service, contract_number, contract_lead, customer_name, address, phone,
                zone_id, is_paid, outstanding_balance, last_payment_ms, cut_status, cut_reason
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            ks
        );
        self.client
            .session()
            .query_unpaged(
                query,
                (
                    account.service.as_str(),
                    &contract,
                    account.contract_number.lead(),
                    &account.customer_name,
                    &account.address,
                    &account.phone,
                    account.zone_id,
                    account.is_paid,
                    account.outstanding_balance,
                    account.last_payment_at.map(|t| t.timestamp_millis()),
                    account.cut_status.as_str(),
                    &account.cut_reason,
                ),
            )
            .await?;

        let index = format!(
            "INSERT INTO {}.account_prefixes (service, contract_prefix, contract_number) VALUES (?, ?, ?)",
            ks
        );
        self.client
            .session()
            .query_unpaged(
                index,
                (
                    account.service.as_str(),
                    account.contract_number.lead(),
                    &contract,
                ),
            )
            .await?;

        tracing::debug!(service = %account.service, contract = %contract, "Account upserted");
        Ok(())
    }

    pub async fn upsert_zone(&self, zone: &Zone) -> Result<(), PersistenceError> {
        let query = format!(
            "INSERT INTO {}.zones (
                zone_id, name, maintenance_status, outage_reason,
                estimated_restoration, affected_services, status_updated_ms
            ) VALUES (?, ?, ?, ?, ?, ?, ?)",
            self.client.keyspace()
        );
        let affected: Vec<String> = zone
            .affected_services
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        self.client
            .session()
            .query_unpaged(
                query,
                (
                    zone.zone_id,
                    &zone.name,
                    zone.maintenance_status.as_str(),
                    &zone.outage_reason,
                    &zone.estimated_restoration,
                    affected,
                    zone.status_updated.map(|t| t.timestamp_millis()),
                ),
            )
            .await?;

        tracing::debug!(zone_id = zone.zone_id, "Zone upserted");
        Ok(())
    }

    async fn select_account(
        &self,
        service: Service,
        contract: &str,
    ) -> Result<Option<Account>, PersistenceError> {
        // toUnixTimestamp(now()) stamps the row with store time
        let query = format!(
            "SELECT service, contract_number, customer_name, address, phone, zone_id,
                    is_paid, outstanding_balance, last_payment_ms, cut_status, cut_reason,
                    toUnixTimestamp(now())
             FROM {}.accounts WHERE service = ? AND contract_number = ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (service.as_str(), contract))
            .await?;

        if let Some(rows) = result.rows {
            if let Some(row) = rows.into_iter().next() {
                return Ok(Some(row_to_account(row)?));
            }
        }
        Ok(None)
    }

    async fn find_by_lead(
        &self,
        service: Service,
        lead: &str,
    ) -> Result<Option<Account>, PersistenceError> {
        let query = format!(
            "SELECT contract_number FROM {}.account_prefixes
             WHERE service = ? AND contract_prefix = ? LIMIT 1",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (service.as_str(), lead))
            .await?;

        let contract = match result.rows.and_then(|rows| rows.into_iter().next()) {
            Some(row) => {
                let (contract,): (String,) = row
                    .into_typed()
                    .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;
                contract
            }
            None => return Ok(None),
        };

        self.select_account(service, &contract).await
    }

    async fn select_zone(&self, zone_id: i32) -> Result<Option<Zone>, PersistenceError> {
        let query = format!(
            "SELECT zone_id, name, maintenance_status, outage_reason,
                    estimated_restoration, affected_services, status_updated_ms
             FROM {}.zones WHERE zone_id = ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (zone_id,))
            .await?;

        if let Some(rows) = result.rows {
            if let Some(row) = rows.into_iter().next() {
                return Ok(Some(row_to_zone(row)?));
            }
        }
        Ok(None)
    }
}

fn row_to_account(row: Row) -> Result<Account, PersistenceError> {
    let (
        service,
        contract_number,
        customer_name,
        address,
        phone,
        zone_id,
        is_paid,
        outstanding_balance,
        last_payment_ms,
        cut_status,
        cut_reason,
        store_now_ms,
    ): (
        String,
        String,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<i32>,
        Option<bool>,
        Option<f64>,
        Option<i64>,
        Option<String>,
        Option<String>,
        Option<i64>,
    ) = row
        .into_typed()
        .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;

    let contract_number = ContractNumber::parse(&contract_number).ok_or_else(|| {
        PersistenceError::InvalidData(format!("malformed stored contract: {contract_number}"))
    })?;
    let zone_id =
        zone_id.ok_or_else(|| PersistenceError::InvalidData("account without zone".into()))?;

    Ok(Account {
        service: parse_service(&service)?,
        contract_number,
        customer_name: customer_name.unwrap_or_default(),
        address: address.unwrap_or_default(),
        phone: phone.unwrap_or_default(),
        zone_id,
        is_paid: is_paid.unwrap_or(false),
        outstanding_balance: outstanding_balance.unwrap_or(0.0),
        last_payment_at: last_payment_ms.and_then(from_millis),
        cut_status: cut_status
            .as_deref()
            .map(CutStatus::parse)
            .unwrap_or_default(),
        cut_reason,
        observed_at: store_now_ms.and_then(from_millis),
    })
}

fn row_to_zone(row: Row) -> Result<Zone, PersistenceError> {
    let (
        zone_id,
        name,
        maintenance_status,
        outage_reason,
        estimated_restoration,
        affected_services,
        status_updated_ms,
    ): (
        i32,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<Vec<String>>,
        Option<i64>,
    ) = row
        .into_typed()
        .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;

    let affected_services = affected_services
        .unwrap_or_default()
        .iter()
        .map(|s| parse_service(s))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Zone {
        zone_id,
        name: name.unwrap_or_default(),
        maintenance_status: maintenance_status
            .as_deref()
            .map(MaintenanceStatus::parse)
            .unwrap_or_default(),
        outage_reason,
        estimated_restoration,
        affected_services,
        status_updated: status_updated_ms.and_then(from_millis),
    }
    .normalized())
}

#[async_trait]
impl AccountStore for ScyllaAccountStore {
    async fn find_account(
        &self,
        service: Service,
        contract: &ContractNumber,
    ) -> utility_agent_core::Result<Option<Account>> {
        Ok(self
            .select_account(service, &contract.as_canonical())
            .await?)
    }

    async fn find_account_by_lead(
        &self,
        service: Service,
        lead: &str,
    ) -> utility_agent_core::Result<Option<Account>> {
        Ok(self.find_by_lead(service, lead).await?)
    }

    async fn get_zone(&self, zone_id: i32) -> utility_agent_core::Result<Option<Zone>> {
        Ok(self.select_zone(zone_id).await?)
    }
}
