//! Contract numbers
//!
//! A contract number identifies one subscription to one service. Its service
//! is derived from the prefix of the leading segment and nothing else.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::Service;

static CONTRACT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^((?:3701|4801)\d{6,})\s*/\s*(\d{4,})$").unwrap());
static LEAD_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:3701|4801)\d{6,}$").unwrap());

/// A validated contract number in canonical `"<lead> / <tail>"` form
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContractNumber {
    lead: String,
    tail: String,
}

impl ContractNumber {
    /// Parse and normalise. Returns `None` for anything that does not satisfy
    /// the prefix and format rules.
    pub fn parse(input: &str) -> Option<Self> {
        let caps = CONTRACT_PATTERN.captures(input.trim())?;
        Some(Self {
            lead: caps.get(1)?.as_str().to_string(),
            tail: caps.get(2)?.as_str().to_string(),
        })
    }

    pub fn service(&self) -> Service {
        // The pattern only admits the two known prefixes
        if self.lead.starts_with(Service::Water.contract_prefix()) {
            Service::Water
        } else {
            Service::Electricity
        }
    }

    /// Leading numeric segment (before the separator)
    pub fn lead(&self) -> &str {
        &self.lead
    }

    pub fn tail(&self) -> &str {
        &self.tail
    }

    pub fn as_canonical(&self) -> String {
        format!("{} / {}", self.lead, self.tail)
    }
}

impl std::fmt::Display for ContractNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.lead, self.tail)
    }
}

impl TryFrom<String> for ContractNumber {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid contract number: {value}"))
    }
}

impl From<ContractNumber> for String {
    fn from(contract: ContractNumber) -> Self {
        contract.as_canonical()
    }
}

/// Service owning a contract string, or `None` (unknown) when the string is
/// not a well-formed contract number.
pub fn service_of(contract: &str) -> Option<Service> {
    ContractNumber::parse(contract).map(|c| c.service())
}

/// How a caller-supplied contract string should be looked up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractQuery {
    /// Full contract number, matched exactly
    Exact(ContractNumber),
    /// Only the leading segment was given; matched against stored leads
    Lead { service: Service, lead: String },
}

impl ContractQuery {
    /// Interpret user input. A string with a separator must be a full
    /// contract number; one without may be a bare leading segment.
    pub fn from_input(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if let Some(contract) = ContractNumber::parse(trimmed) {
            return Some(Self::Exact(contract));
        }
        if trimmed.contains('/') || !LEAD_PATTERN.is_match(trimmed) {
            return None;
        }
        let service = if trimmed.starts_with(Service::Water.contract_prefix()) {
            Service::Water
        } else {
            Service::Electricity
        };
        Some(Self::Lead {
            service,
            lead: trimmed.to_string(),
        })
    }

    pub fn service(&self) -> Service {
        match self {
            Self::Exact(contract) => contract.service(),
            Self::Lead { service, .. } => *service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalises_spacing() {
        let c = ContractNumber::parse("3701455886/1014871").unwrap();
        assert_eq!(c.to_string(), "3701455886 / 1014871");
        let c = ContractNumber::parse("  4801566997   /  2025982 ").unwrap();
        assert_eq!(c.as_canonical(), "4801566997 / 2025982");
    }

    #[test]
    fn test_service_of() {
        assert_eq!(service_of("3701455886 / 1014871"), Some(Service::Water));
        assert_eq!(service_of("4801566997 / 2025982"), Some(Service::Electricity));
        assert_eq!(service_of("5501566997 / 2025982"), None);
        assert_eq!(service_of("370145 / 1014871"), None);
        assert_eq!(service_of("3701455886 / 101"), None);
        assert_eq!(service_of("hello"), None);
    }

    #[test]
    fn test_query_from_input() {
        assert!(matches!(
            ContractQuery::from_input("3701455886 / 1014871"),
            Some(ContractQuery::Exact(_))
        ));
        assert_eq!(
            ContractQuery::from_input("4801566997"),
            Some(ContractQuery::Lead {
                service: Service::Electricity,
                lead: "4801566997".into()
            })
        );
        // A separator means the full form was intended
        assert_eq!(ContractQuery::from_input("3701455886 / 10"), None);
    }

    #[test]
    fn test_serde_roundtrip_is_canonical() {
        let c: ContractNumber = serde_json::from_str("\"3701455886/1014871\"").unwrap();
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"3701455886 / 1014871\"");
        assert!(serde_json::from_str::<ContractNumber>("\"12\"").is_err());
    }
}
