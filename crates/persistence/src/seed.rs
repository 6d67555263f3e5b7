//! Demo accounts and zones
//!
//! Five customers across four zones, covering a fresh payment, a cut-off
//! account with debt, an unpaid but connected account and two zones under
//! maintenance.

use chrono::{DateTime, Duration, TimeZone, Utc};
use utility_agent_core::{Account, ContractNumber, CutStatus, MaintenanceStatus, Service, Zone};

use crate::{InMemoryAccountStore, PersistenceError, ScyllaAccountStore};

struct DemoAccount {
    contract: &'static str,
    name: &'static str,
    address: &'static str,
    phone: &'static str,
    zone_id: i32,
    is_paid: bool,
    balance: f64,
    paid_ago: Option<Duration>,
    cut: Option<&'static str>,
}

fn demo_rows() -> Vec<DemoAccount> {
    const NAME_1: &str = "أحمد المرزوقي";
    const ADDR_1: &str = "شارع الحسن الثاني، الدار البيضاء";
    const NAME_2: &str = "فاطمة الزهراء";
    const ADDR_2: &str = "حي المحمدي، الرباط";
    const NAME_5: &str = "يوسف السباعي";
    const ADDR_5: &str = "المدينة القديمة، طنجة";

    vec![
        DemoAccount {
            contract: "3701455886 / 1014871",
            name: NAME_1,
            address: ADDR_1,
            phone: "0612345678",
            zone_id: 1,
            is_paid: true,
            balance: 0.0,
            paid_ago: Some(Duration::minutes(30)),
            cut: None,
        },
        DemoAccount {
            contract: "4801455886 / 1014872",
            name: NAME_1,
            address: ADDR_1,
            phone: "0612345678",
            zone_id: 1,
            is_paid: true,
            balance: 0.0,
            paid_ago: Some(Duration::days(5)),
            cut: None,
        },
        DemoAccount {
            contract: "4801566997 / 2025982",
            name: NAME_2,
            address: ADDR_2,
            phone: "0623456789",
            zone_id: 2,
            is_paid: false,
            balance: 450.0,
            paid_ago: Some(Duration::days(75)),
            cut: Some("عدم أداء الفواتير"),
        },
        DemoAccount {
            contract: "3701566997 / 2025981",
            name: NAME_2,
            address: ADDR_2,
            phone: "0623456789",
            zone_id: 2,
            is_paid: true,
            balance: 0.0,
            paid_ago: Some(Duration::days(12)),
            cut: None,
        },
        DemoAccount {
            contract: "3701677008 / 3036093",
            name: "محمد الإدريسي",
            address: "شارع محمد الخامس، الدار البيضاء",
            phone: "0634567890",
            zone_id: 1,
            is_paid: false,
            balance: 120.5,
            paid_ago: Some(Duration::days(40)),
            cut: None,
        },
        DemoAccount {
            contract: "4801788119 / 4047104",
            name: "خديجة العلوي",
            address: "حي القليعة، مراكش",
            phone: "0645678901",
            zone_id: 3,
            is_paid: true,
            balance: 0.0,
            paid_ago: Some(Duration::days(10)),
            cut: None,
        },
        DemoAccount {
            contract: "3701899220 / 5058215",
            name: NAME_5,
            address: ADDR_5,
            phone: "0656789012",
            zone_id: 4,
            is_paid: false,
            balance: 890.0,
            paid_ago: None,
            cut: Some("عدم أداء الفواتير"),
        },
        DemoAccount {
            contract: "4801899220 / 5058216",
            name: NAME_5,
            address: ADDR_5,
            phone: "0656789012",
            zone_id: 4,
            is_paid: true,
            balance: 0.0,
            paid_ago: Some(Duration::days(3)),
            cut: None,
        },
    ]
}

/// Demo accounts with payment times relative to `now`
pub fn demo_accounts(now: DateTime<Utc>) -> Vec<Account> {
    demo_rows()
        .into_iter()
        .filter_map(|row| {
            let contract_number = ContractNumber::parse(row.contract)?;
            Some(Account {
                service: contract_number.service(),
                contract_number,
                customer_name: row.name.to_string(),
                address: row.address.to_string(),
                phone: row.phone.to_string(),
                zone_id: row.zone_id,
                is_paid: row.is_paid,
                outstanding_balance: row.balance,
                last_payment_at: row.paid_ago.map(|ago| now - ago),
                cut_status: if row.cut.is_some() {
                    CutStatus::CutOff
                } else {
                    CutStatus::Ok
                },
                cut_reason: row.cut.map(str::to_string),
                observed_at: None,
            })
        })
        .collect()
}

pub fn demo_zones() -> Vec<Zone> {
    let updated = |d: u32, h: u32| Utc.with_ymd_and_hms(2024, 12, d, h, 0, 0).single();

    vec![
        Zone {
            zone_id: 1,
            name: "الدار البيضاء - وسط المدينة".to_string(),
            maintenance_status: MaintenanceStatus::InProgress,
            outage_reason: Some("إصلاح أنابيب المياه الرئيسية".to_string()),
            estimated_restoration: Some("2024-12-04 18:00".to_string()),
            affected_services: vec![Service::Water],
            status_updated: updated(4, 8),
        },
        Zone {
            zone_id: 2,
            name: "الرباط - حي المحمدي".to_string(),
            maintenance_status: MaintenanceStatus::None,
            outage_reason: None,
            estimated_restoration: None,
            affected_services: vec![],
            status_updated: updated(1, 9),
        },
        Zone {
            zone_id: 3,
            name: "مراكش - القليعة".to_string(),
            maintenance_status: MaintenanceStatus::None,
            outage_reason: None,
            estimated_restoration: None,
            affected_services: vec![],
            status_updated: updated(1, 9),
        },
        Zone {
            zone_id: 4,
            name: "طنجة - المدينة القديمة".to_string(),
            maintenance_status: MaintenanceStatus::InProgress,
            outage_reason: Some("صيانة محولات الكهرباء".to_string()),
            estimated_restoration: Some("2024-12-05 14:00".to_string()),
            affected_services: vec![Service::Electricity],
            status_updated: updated(5, 7),
        },
    ]
}

pub fn seed_in_memory(store: &InMemoryAccountStore, now: DateTime<Utc>) {
    for account in demo_accounts(now) {
        store.insert_account(account);
    }
    for zone in demo_zones() {
        store.insert_zone(zone);
    }
    tracing::info!(accounts = store.account_count(), "Seeded in-memory demo data");
}

pub async fn seed_scylla(store: &ScyllaAccountStore) -> Result<(), PersistenceError> {
    let accounts = demo_accounts(Utc::now());
    for account in &accounts {
        store.upsert_account(account).await?;
    }
    for zone in demo_zones() {
        store.upsert_zone(&zone).await?;
    }
    tracing::info!(accounts = accounts.len(), "Seeded ScyllaDB demo data");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_demo_contracts_parse() {
        assert_eq!(demo_accounts(Utc::now()).len(), demo_rows().len());
    }

    #[test]
    fn test_contract_prefix_matches_service() {
        for account in demo_accounts(Utc::now()) {
            assert!(account
                .contract_number
                .lead()
                .starts_with(account.service.contract_prefix()));
        }
    }

    #[test]
    fn test_cut_accounts_carry_debt() {
        for account in demo_accounts(Utc::now()) {
            if account.cut_status == CutStatus::CutOff {
                assert!(account.has_debt());
                assert!(account.cut_reason.is_some());
            }
        }
    }

    #[test]
    fn test_every_account_zone_exists() {
        let zones = demo_zones();
        for account in demo_accounts(Utc::now()) {
            assert!(zones.iter().any(|z| z.zone_id == account.zone_id));
        }
    }
}
