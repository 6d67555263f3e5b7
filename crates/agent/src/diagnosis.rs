//! Diagnosis Engine
//!
//! Reconciles one account with its zone and the reactivation window into
//! exactly one outcome, checked in fixed precedence:
//!
//! ```text
//! MAINTENANCE          zone maintenance in progress and covering the service
//! UNPAID               unpaid flag or positive balance
//! REACTIVATION_PENDING paid, payment still inside the reactivation window
//! TECHNICAL_UNKNOWN    paid, no maintenance; likely a local fault
//! ```
//!
//! A reactivation note is carried by MAINTENANCE as well, so a fresh payment is
//! never hidden behind an outage explanation.

use serde::Serialize;
use utility_agent_config::AgentConfig;
use utility_agent_core::{Account, CutStatus, Language, Service, Zone};

use crate::reactivation::Advisory;
use crate::templates;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosisKind {
    Maintenance,
    Unpaid,
    ReactivationPending,
    TechnicalUnknown,
}

impl DiagnosisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Maintenance => "MAINTENANCE",
            Self::Unpaid => "UNPAID",
            Self::ReactivationPending => "REACTIVATION_PENDING",
            Self::TechnicalUnknown => "TECHNICAL_UNKNOWN",
        }
    }
}

impl std::fmt::Display for DiagnosisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome for one service, with what is needed to render it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Diagnosis {
    Maintenance {
        service: Service,
        zone_name: String,
        outage_reason: Option<String>,
        estimated_restoration: Option<String>,
        advisory: Option<Advisory>,
    },
    Unpaid {
        service: Service,
        contract_number: String,
        balance: f64,
    },
    ReactivationPending {
        service: Service,
        advisory: Advisory,
    },
    TechnicalUnknown {
        service: Service,
        /// Set when the store records the service as disconnected
        cut_reason: Option<String>,
        cut_off: bool,
    },
}

impl Diagnosis {
    pub fn kind(&self) -> DiagnosisKind {
        match self {
            Self::Maintenance { .. } => DiagnosisKind::Maintenance,
            Self::Unpaid { .. } => DiagnosisKind::Unpaid,
            Self::ReactivationPending { .. } => DiagnosisKind::ReactivationPending,
            Self::TechnicalUnknown { .. } => DiagnosisKind::TechnicalUnknown,
        }
    }

    pub fn service(&self) -> Service {
        match self {
            Self::Maintenance { service, .. }
            | Self::Unpaid { service, .. }
            | Self::ReactivationPending { service, .. }
            | Self::TechnicalUnknown { service, .. } => *service,
        }
    }

    pub fn advisory(&self) -> Option<&Advisory> {
        match self {
            Self::Maintenance { advisory, .. } => advisory.as_ref(),
            Self::ReactivationPending { advisory, .. } => Some(advisory),
            Self::Unpaid { .. } | Self::TechnicalUnknown { .. } => None,
        }
    }

    /// Single plain paragraph in `language`; the advisory, if any, comes first
    pub fn render(&self, language: Language, agent: &AgentConfig) -> String {
        let body = match self {
            Self::Maintenance {
                service,
                zone_name,
                outage_reason,
                estimated_restoration,
                ..
            } => templates::maintenance(
                *service,
                zone_name,
                outage_reason.as_deref(),
                estimated_restoration.as_deref(),
                language,
            ),
            Self::Unpaid {
                service,
                contract_number,
                balance,
            } => templates::unpaid(*service, contract_number, *balance, language, agent),
            Self::ReactivationPending { service, .. } => {
                templates::technical_unknown(*service, None, language, agent)
            }
            Self::TechnicalUnknown {
                service,
                cut_off,
                cut_reason,
            } => {
                let cut = cut_off.then(|| cut_reason.as_deref().unwrap_or(""));
                templates::technical_unknown(*service, cut, language, agent)
            }
        };

        match self.advisory() {
            Some(advisory) => format!("{} {}", advisory.render(language), body),
            None => body,
        }
    }
}

/// First matching outcome wins
pub fn diagnose(account: &Account, zone: Option<&Zone>, advisory: Option<Advisory>) -> Diagnosis {
    let service = account.service;

    if let Some(zone) = zone.filter(|z| z.disrupts(service)) {
        return Diagnosis::Maintenance {
            service,
            zone_name: zone.name.clone(),
            outage_reason: zone.outage_reason.clone(),
            estimated_restoration: zone.estimated_restoration.clone(),
            advisory,
        };
    }

    if account.has_debt() {
        return Diagnosis::Unpaid {
            service,
            contract_number: account.contract_number.as_canonical(),
            balance: account.outstanding_balance,
        };
    }

    if let Some(advisory) = advisory {
        return Diagnosis::ReactivationPending { service, advisory };
    }

    Diagnosis::TechnicalUnknown {
        service,
        cut_off: account.cut_status == CutStatus::CutOff,
        cut_reason: account.cut_reason.clone(),
    }
}
