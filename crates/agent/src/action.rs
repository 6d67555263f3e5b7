//! Action Extractor
//!
//! Runs on every turn next to the diagnosis. A payment action needs an explicit
//! wish to pay; a contract number on its own never produces one.

use serde::{Deserialize, Serialize};
use utility_agent_core::{user_turns_newest_first, ContractNumber, Service, ServiceScope, Turn};
use utility_agent_text_processing::{classify_with_history, find_contracts, PaymentIntentDetector};

/// Structured action for the caller to act on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    #[default]
    None,
    NeedContract {
        #[serde(skip_serializing_if = "Option::is_none")]
        service: Option<Service>,
    },
    PayInvoice {
        service: Service,
        contract_number: String,
    },
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::NeedContract { .. } => "NEED_CONTRACT",
            Self::PayInvoice { .. } => "PAY_INVOICE",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ActionExtractor {
    intent: PaymentIntentDetector,
}

impl ActionExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extract(&self, text: &str, history: &[Turn]) -> Action {
        if !self.intent.wants_to_pay(text) {
            return Action::None;
        }

        let scope = classify_with_history(text, history);
        let contract = contract_for_payment(text, scope).or_else(|| {
            user_turns_newest_first(history).find_map(|turn| contract_for_payment(&turn.content, scope))
        });

        let action = match contract {
            Some(contract) => Action::PayInvoice {
                service: contract.service(),
                contract_number: contract.as_canonical(),
            },
            None => Action::NeedContract {
                service: scope.single(),
            },
        };
        tracing::info!(action = action.kind(), scope = %scope, "Payment action extracted");
        action
    }
}

/// Contract in `text` for the service in scope. With no single service in
/// scope, water is preferred when both are present.
fn contract_for_payment(text: &str, scope: ServiceScope) -> Option<ContractNumber> {
    let found = find_contracts(text);
    match scope.single() {
        Some(service) => found.get(service).cloned(),
        None => found.water.or(found.electricity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_without_intent_is_none() {
        let x = ActionExtractor::new();
        assert_eq!(x.extract("3701455886 / 1014871", &[]), Action::None);
        assert_eq!(x.extract("مشكل الماء 3701455886 / 1014871", &[]), Action::None);
    }

    #[test]
    fn test_pay_now_with_contract() {
        let x = ActionExtractor::new();
        assert_eq!(
            x.extract("I want to pay now, contract 3701455886 / 1014871", &[]),
            Action::PayInvoice {
                service: Service::Water,
                contract_number: "3701455886 / 1014871".into(),
            }
        );
    }

    #[test]
    fn test_contract_recovered_from_history() {
        let x = ActionExtractor::new();
        let history = vec![
            Turn::user("الكهرباء مقطوعة 4801566997/2025982"),
            Turn::assistant("يوجد مبلغ غير مؤدى"),
        ];
        assert_eq!(
            x.extract("بغيت نخلص دابا", &history),
            Action::PayInvoice {
                service: Service::Electricity,
                contract_number: "4801566997 / 2025982".into(),
            }
        );
    }

    #[test]
    fn test_intent_without_contract() {
        let x = ActionExtractor::new();
        assert_eq!(
            x.extract("Je veux payer ma facture d'électricité", &[]),
            Action::NeedContract {
                service: Some(Service::Electricity)
            }
        );
        assert_eq!(
            x.extract("I want to pay now", &[]),
            Action::NeedContract { service: None }
        );
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(Action::PayInvoice {
            service: Service::Water,
            contract_number: "3701455886 / 1014871".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "PAY_INVOICE");
        assert_eq!(json["service"], "water");
        assert_eq!(serde_json::to_value(Action::None).unwrap()["type"], "NONE");
    }
}
