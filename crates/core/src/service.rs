//! Utility services and service classification outcomes

use serde::{Deserialize, Serialize};

/// A metered utility service. Every contract number belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    Water,
    Electricity,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::Electricity => "electricity",
        }
    }

    /// Contract-number prefix owned by this service
    pub fn contract_prefix(&self) -> &'static str {
        match self {
            Self::Water => "3701",
            Self::Electricity => "4801",
        }
    }

    /// The other service
    pub fn other(&self) -> Self {
        match self {
            Self::Water => Self::Electricity,
            Self::Electricity => Self::Water,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "water" | "eau" | "ماء" => Some(Self::Water),
            "electricity" | "electricite" | "électricité" | "كهرباء" => Some(Self::Electricity),
            _ => None,
        }
    }

    pub fn all() -> &'static [Service] {
        &[Self::Water, Self::Electricity]
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which service(s) a message is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServiceScope {
    Water,
    Electricity,
    Both,
    #[default]
    Unknown,
}

impl ServiceScope {
    pub fn from_matches(water: bool, electricity: bool) -> Self {
        match (water, electricity) {
            (true, true) => Self::Both,
            (true, false) => Self::Water,
            (false, true) => Self::Electricity,
            (false, false) => Self::Unknown,
        }
    }

    /// The single service in scope, if exactly one
    pub fn single(&self) -> Option<Service> {
        match self {
            Self::Water => Some(Service::Water),
            Self::Electricity => Some(Service::Electricity),
            Self::Both | Self::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::Electricity => "electricity",
            Self::Both => "both",
            Self::Unknown => "unknown",
        }
    }
}

impl From<Service> for ServiceScope {
    fn from(service: Service) -> Self {
        match service {
            Service::Water => Self::Water,
            Service::Electricity => Self::Electricity,
        }
    }
}

impl std::fmt::Display for ServiceScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_from_matches() {
        assert_eq!(ServiceScope::from_matches(true, true), ServiceScope::Both);
        assert_eq!(ServiceScope::from_matches(false, true), ServiceScope::Electricity);
        assert_eq!(ServiceScope::from_matches(false, false), ServiceScope::Unknown);
    }

    #[test]
    fn test_single() {
        assert_eq!(ServiceScope::Water.single(), Some(Service::Water));
        assert_eq!(ServiceScope::Both.single(), None);
        assert_eq!(Service::Water.other(), Service::Electricity);
    }

    #[test]
    fn test_parse_multilingual() {
        assert_eq!(Service::parse("Eau"), Some(Service::Water));
        assert_eq!(Service::parse("كهرباء"), Some(Service::Electricity));
        assert_eq!(Service::parse("gas"), None);
    }
}
