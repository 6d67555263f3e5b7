//! Account and zone snapshots read from the data store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ContractNumber, Service};

/// Physical connection state of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CutStatus {
    #[default]
    Ok,
    CutOff,
}

impl CutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::CutOff => "CUT_OFF",
        }
    }

    /// Lenient parse for store values; anything unrecognised is treated as connected
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().replace([' ', '-'], "_").as_str() {
            "CUT_OFF" | "CUT" | "CUTOFF" => Self::CutOff,
            _ => Self::Ok,
        }
    }
}

/// One customer's subscription to one service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub service: Service,
    pub contract_number: ContractNumber,
    pub customer_name: String,
    pub address: String,
    pub phone: String,
    pub zone_id: i32,
    pub is_paid: bool,
    /// Outstanding balance in MAD
    pub outstanding_balance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_payment_at: Option<DateTime<Utc>>,
    pub cut_status: CutStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cut_reason: Option<String>,
    /// The store's clock at read time. Elapsed-since-payment is measured
    /// against this when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Unpaid flag or any positive balance counts as owing
    pub fn has_debt(&self) -> bool {
        !self.is_paid || self.outstanding_balance > 0.0
    }

    /// Reference instant for time-window checks: store time, else `fallback`
    pub fn now_or(&self, fallback: DateTime<Utc>) -> DateTime<Utc> {
        self.observed_at.unwrap_or(fallback)
    }
}

/// Maintenance state of a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenanceStatus {
    InProgress,
    #[default]
    None,
}

impl MaintenanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::None => "NONE",
        }
    }

    pub fn parse(s: &str) -> Self {
        if s.trim() == "جاري الصيانة" {
            return Self::InProgress;
        }
        match s.trim().to_uppercase().replace([' ', '-'], "_").as_str() {
            "IN_PROGRESS" | "INPROGRESS" => Self::InProgress,
            _ => Self::None,
        }
    }
}

/// A geographic service area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub zone_id: i32,
    pub name: String,
    pub maintenance_status: MaintenanceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outage_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_restoration: Option<String>,
    #[serde(default)]
    pub affected_services: Vec<Service>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_updated: Option<DateTime<Utc>>,
}

impl Zone {
    /// Enforce that outage details exist only while maintenance is in progress
    pub fn normalized(mut self) -> Self {
        if self.maintenance_status != MaintenanceStatus::InProgress {
            self.outage_reason = None;
            self.estimated_restoration = None;
        }
        self.affected_services.sort_by_key(|s| s.as_str());
        self.affected_services.dedup();
        self
    }

    /// True when maintenance is in progress and covers `service`
    pub fn disrupts(&self, service: Service) -> bool {
        self.maintenance_status == MaintenanceStatus::InProgress
            && self.affected_services.contains(&service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(status: MaintenanceStatus, services: Vec<Service>) -> Zone {
        Zone {
            zone_id: 1,
            name: "Zone".into(),
            maintenance_status: status,
            outage_reason: Some("pipe repair".into()),
            estimated_restoration: Some("2024-12-04 18:00".into()),
            affected_services: services,
            status_updated: None,
        }
    }

    #[test]
    fn test_zone_disrupts_only_affected_service() {
        let z = zone(MaintenanceStatus::InProgress, vec![Service::Water]);
        assert!(z.disrupts(Service::Water));
        assert!(!z.disrupts(Service::Electricity));
        let z = zone(MaintenanceStatus::None, vec![Service::Water]);
        assert!(!z.disrupts(Service::Water));
    }

    #[test]
    fn test_normalized_clears_outage_fields() {
        let z = zone(MaintenanceStatus::None, vec![Service::Water, Service::Water]).normalized();
        assert!(z.outage_reason.is_none());
        assert!(z.estimated_restoration.is_none());
        assert_eq!(z.affected_services, vec![Service::Water]);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(CutStatus::parse("cut off"), CutStatus::CutOff);
        assert_eq!(CutStatus::parse("OK"), CutStatus::Ok);
        assert_eq!(MaintenanceStatus::parse("in_progress"), MaintenanceStatus::InProgress);
        assert_eq!(MaintenanceStatus::parse("جاري الصيانة"), MaintenanceStatus::InProgress);
        assert_eq!(MaintenanceStatus::parse(""), MaintenanceStatus::None);
    }
}
