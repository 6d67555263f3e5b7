//! Contract Identifier
//!
//! Scans free text for water (`3701…`) and electricity (`4801…`) contract
//! numbers. Each service is scanned independently, so one message can carry
//! both.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use utility_agent_core::{ContractNumber, ContractQuery, Service};

/// Lead segment, optionally followed by a separator and tail. A lead preceded
/// by another digit is part of some longer number and is ignored.
static CONTRACT_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\D)((?:3701|4801)\d{6,})(\s*/\s*(\d*))?").unwrap());

/// Full contract numbers found in a message, at most one per service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContractMatches {
    pub water: Option<ContractNumber>,
    pub electricity: Option<ContractNumber>,
}

impl ContractMatches {
    pub fn get(&self, service: Service) -> Option<&ContractNumber> {
        match service {
            Service::Water => self.water.as_ref(),
            Service::Electricity => self.electricity.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.water.is_none() && self.electricity.is_none()
    }
}

/// Contract mentions including bare leading segments, at most one per service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractMentions {
    pub water: Option<ContractQuery>,
    pub electricity: Option<ContractQuery>,
}

impl ContractMentions {
    pub fn get(&self, service: Service) -> Option<&ContractQuery> {
        match service {
            Service::Water => self.water.as_ref(),
            Service::Electricity => self.electricity.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.water.is_none() && self.electricity.is_none()
    }

    /// The only service mentioned, if exactly one
    pub fn single(&self) -> Option<(Service, &ContractQuery)> {
        match (&self.water, &self.electricity) {
            (Some(q), None) => Some((Service::Water, q)),
            (None, Some(q)) => Some((Service::Electricity, q)),
            _ => None,
        }
    }

    fn slot(&mut self, service: Service) -> &mut Option<ContractQuery> {
        match service {
            Service::Water => &mut self.water,
            Service::Electricity => &mut self.electricity,
        }
    }
}

/// Full-form contract numbers in `text`. No match yields an empty result.
pub fn find_contracts(text: &str) -> ContractMatches {
    let mut matches = ContractMatches::default();
    for caps in CONTRACT_MENTION.captures_iter(text) {
        if let Some(ContractQuery::Exact(contract)) = mention_from_captures(&caps) {
            let slot = match contract.service() {
                Service::Water => &mut matches.water,
                Service::Electricity => &mut matches.electricity,
            };
            if slot.is_none() {
                *slot = Some(contract);
            }
        }
    }
    matches
}

/// Contract mentions in `text`, accepting a bare leading segment when no
/// separator follows it. A full-form mention wins over a bare lead for the
/// same service. A separator followed by a malformed tail is ignored.
pub fn find_contract_mentions(text: &str) -> ContractMentions {
    let mut mentions = ContractMentions::default();
    for caps in CONTRACT_MENTION.captures_iter(text) {
        let Some(query) = mention_from_captures(&caps) else {
            continue;
        };
        let slot = mentions.slot(query.service());
        match (&slot, &query) {
            (None, _) | (Some(ContractQuery::Lead { .. }), ContractQuery::Exact(_)) => {
                *slot = Some(query);
            }
            _ => {}
        }
    }
    mentions
}

fn mention_from_captures(caps: &regex::Captures<'_>) -> Option<ContractQuery> {
    let lead = caps.get(1)?.as_str();
    match caps.get(2) {
        None => ContractQuery::from_input(lead),
        Some(_) => {
            let tail = caps.get(3).map(|t| t.as_str()).unwrap_or("");
            ContractNumber::parse(&format!("{lead} / {tail}")).map(ContractQuery::Exact)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use utility_agent_core::service_of;

    #[test]
    fn test_find_water_contract() {
        let m = find_contracts("3701455886 / 1014871");
        assert_eq!(m.water.unwrap().to_string(), "3701455886 / 1014871");
        assert!(m.electricity.is_none());
    }

    #[test]
    fn test_find_both_in_one_message() {
        let m = find_contracts("eau 3701455886/1014871 et courant 4801566997 / 2025982 svp");
        assert_eq!(m.water.unwrap().lead(), "3701455886");
        assert_eq!(m.electricity.unwrap().tail(), "2025982");
    }

    #[test]
    fn test_embedded_in_arabic_text() {
        let m = find_contracts("رقم العقد 4801566997 / 2025982 شكرا");
        assert_eq!(m.electricity.unwrap().service(), Service::Electricity);
        assert_eq!(
            service_of(&find_contracts("رقم 3701455886 / 1014871").water.unwrap().to_string()),
            Some(Service::Water)
        );
    }

    #[test]
    fn test_no_match_is_empty() {
        assert!(find_contracts("ma kaynach lma").is_empty());
        // Preceded by a digit: part of a longer number
        assert!(find_contracts("93701455886 / 1014871").is_empty());
        // Prefix not known
        assert!(find_contracts("5501455886 / 1014871").is_empty());
    }

    #[test]
    fn test_bare_lead_mention() {
        let m = find_contract_mentions("my number is 4801566997");
        assert_eq!(
            m.electricity,
            Some(ContractQuery::Lead {
                service: Service::Electricity,
                lead: "4801566997".into()
            })
        );
        assert!(find_contracts("my number is 4801566997").is_empty());
    }

    #[test]
    fn test_malformed_tail_ignored() {
        let m = find_contract_mentions("3701455886 / 12");
        assert!(m.is_empty());
    }

    #[test]
    fn test_full_form_preferred_over_lead() {
        let m = find_contract_mentions("3701455886 or rather 3701455886 / 1014871");
        assert!(matches!(m.water, Some(ContractQuery::Exact(_))));
        assert_eq!(m.single().map(|(s, _)| s), Some(Service::Water));
    }
}
