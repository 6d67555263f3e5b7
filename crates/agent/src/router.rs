//! Mismatch/Fallback Router
//!
//! Decides per turn whether the reply can be produced from data and templates,
//! and only falls through to the model when no service and no contract number
//! can be pinned down.
//!
//! ```text
//! scope = classify(message), or classify(prior user turns) when the
//!         message carries a contract number
//! no scope and no contract in message     -> model
//! one service   contract for it          -> diagnose
//!               only the other's contract -> mismatch correction
//!               contract in earlier turns -> diagnose
//!               nothing                  -> ask for contract or bill photo
//! both          water first; electricity once water was delivered
//! unknown       contract in message      -> diagnose (or both flow)
//!               nothing                  -> model
//! ```

use std::sync::Arc;

use utility_agent_config::AgentConfig;
use utility_agent_core::{
    user_turns_newest_first, ContractQuery, DiagnosisPath, Language, LanguageModel, Service,
    ServiceScope, Turn,
};
use utility_agent_text_processing::{
    classify, classify_with_history, find_contract_mentions, ContractMentions,
};

use crate::diagnosis::DiagnosisKind;
use crate::lookup::{Diagnostician, Lookup};
use crate::model::ModelPath;
use crate::templates;
use crate::AgentError;

/// What to do with a turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The message's only contract belongs to the other service
    Mismatch { expected: Service, contract: String },
    AskContract { service: Service },
    Diagnose { service: Service, contract: String },
    Model,
}

impl Decision {
    pub fn path(&self) -> DiagnosisPath {
        match self {
            Self::Model => DiagnosisPath::Model,
            _ => DiagnosisPath::Deterministic,
        }
    }
}

/// The reply produced for one turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub text: String,
    pub path: DiagnosisPath,
    /// Set when a diagnosis for this service was delivered
    pub diagnosed_service: Option<Service>,
    pub diagnosis: Option<DiagnosisKind>,
}

impl TurnOutcome {
    fn deterministic(text: String) -> Self {
        Self {
            text,
            path: DiagnosisPath::Deterministic,
            diagnosed_service: None,
            diagnosis: None,
        }
    }
}

fn query_text(query: &ContractQuery) -> String {
    match query {
        ContractQuery::Exact(contract) => contract.as_canonical(),
        ContractQuery::Lead { lead, .. } => lead.clone(),
    }
}

/// Contract for `service` from earlier user turns, most recent first
fn recover_contract(history: &[Turn], service: Service) -> Option<String> {
    user_turns_newest_first(history)
        .find_map(|turn| find_contract_mentions(&turn.content).get(service).map(query_text))
}

/// Next service for the water-then-electricity flow. Electricity comes once
/// the latest delivered diagnosis was for water.
fn next_in_both_flow(history: &[Turn]) -> Service {
    let last_delivered = history
        .iter()
        .rev()
        .filter(|t| t.is_assistant())
        .find_map(|t| t.diagnosed_service());
    match last_delivered {
        Some(Service::Water) => Service::Electricity,
        _ => Service::Water,
    }
}

fn decide_single(service: Service, mentions: &ContractMentions, history: &[Turn]) -> Decision {
    if let Some(query) = mentions.get(service) {
        return Decision::Diagnose {
            service,
            contract: query_text(query),
        };
    }
    if let Some(query) = mentions.get(service.other()) {
        return Decision::Mismatch {
            expected: service,
            contract: query_text(query),
        };
    }
    match recover_contract(history, service) {
        Some(contract) => Decision::Diagnose { service, contract },
        None => Decision::AskContract { service },
    }
}

fn decide_both(mentions: &ContractMentions, history: &[Turn]) -> Decision {
    let service = next_in_both_flow(history);
    let contract = mentions
        .get(service)
        .map(query_text)
        .or_else(|| recover_contract(history, service));
    match contract {
        Some(contract) => Decision::Diagnose { service, contract },
        None => Decision::AskContract { service },
    }
}

/// Pure routing decision; performs no lookups
pub fn decide(text: &str, history: &[Turn]) -> Decision {
    let mentions = find_contract_mentions(text);
    // Earlier turns only set the scope for a message that brings a contract;
    // thanks, greetings and open questions go to the model.
    let scope = match classify(text) {
        ServiceScope::Unknown if !mentions.is_empty() => classify_with_history(text, history),
        scope => scope,
    };

    let decision = match scope {
        ServiceScope::Water => decide_single(Service::Water, &mentions, history),
        ServiceScope::Electricity => decide_single(Service::Electricity, &mentions, history),
        ServiceScope::Both => decide_both(&mentions, history),
        ServiceScope::Unknown => match mentions.single() {
            Some((service, query)) => Decision::Diagnose {
                service,
                contract: query_text(query),
            },
            None if mentions.is_empty() => Decision::Model,
            None => decide_both(&mentions, history),
        },
    };

    tracing::debug!(scope = %scope, decision = ?decision, "Turn routed");
    decision
}

pub struct Router {
    pub(crate) diagnostician: Arc<Diagnostician>,
    agent: Arc<AgentConfig>,
    model: ModelPath,
}

impl Router {
    pub fn new(
        diagnostician: Arc<Diagnostician>,
        agent: Arc<AgentConfig>,
        llm: Option<Arc<dyn LanguageModel>>,
    ) -> Self {
        let model = ModelPath::new(llm, diagnostician.clone(), agent.clone());
        Self {
            diagnostician,
            agent,
            model,
        }
    }

    pub fn has_model(&self) -> bool {
        self.model.has_model()
    }

    pub async fn route(
        &self,
        text: &str,
        history: &[Turn],
        language: Language,
    ) -> Result<TurnOutcome, AgentError> {
        match decide(text, history) {
            Decision::Mismatch { expected, contract } => Ok(TurnOutcome::deterministic(
                templates::mismatch(expected, &contract, language),
            )),
            Decision::AskContract { service } => Ok(TurnOutcome::deterministic(
                templates::ask_contract(service, language),
            )),
            Decision::Diagnose { service, contract } => {
                self.diagnose(service, &contract, language).await
            }
            Decision::Model => {
                let text = self.model.respond(text, history, language).await?;
                Ok(TurnOutcome {
                    text,
                    path: DiagnosisPath::Model,
                    diagnosed_service: None,
                    diagnosis: None,
                })
            }
        }
    }

    async fn diagnose(
        &self,
        service: Service,
        contract: &str,
        language: Language,
    ) -> Result<TurnOutcome, AgentError> {
        let outcome = match self.diagnostician.lookup(contract, service).await? {
            Lookup::Found(found) => TurnOutcome {
                text: found.diagnosis.render(language, &self.agent),
                path: DiagnosisPath::Deterministic,
                diagnosed_service: Some(service),
                diagnosis: Some(found.diagnosis.kind()),
            },
            Lookup::WrongService { .. } => {
                TurnOutcome::deterministic(templates::mismatch(service, contract, language))
            }
            Lookup::NotFound => {
                TurnOutcome::deterministic(templates::not_found(service, contract, language))
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use utility_agent_core::TurnMetadata;

    fn delivered(service: Service) -> Turn {
        Turn::assistant("...").with_metadata(TurnMetadata::new().with_diagnosed_service(service))
    }

    #[test]
    fn test_mismatch_electricity_contract_for_water() {
        assert_eq!(
            decide("عندي مشكل فالما 4801566997 / 2025982", &[]),
            Decision::Mismatch {
                expected: Service::Water,
                contract: "4801566997 / 2025982".into()
            }
        );
    }

    #[test]
    fn test_service_without_contract_asks() {
        assert_eq!(
            decide("مشكل الكهرباء", &[]),
            Decision::AskContract {
                service: Service::Electricity
            }
        );
    }

    #[test]
    fn test_bare_contract_diagnosed() {
        assert_eq!(
            decide("3701455886 / 1014871", &[]),
            Decision::Diagnose {
                service: Service::Water,
                contract: "3701455886 / 1014871".into()
            }
        );
        assert_eq!(
            decide("4801566997", &[]),
            Decision::Diagnose {
                service: Service::Electricity,
                contract: "4801566997".into()
            }
        );
    }

    #[test]
    fn test_service_from_history_then_number() {
        let history = vec![Turn::user("Pas d'eau à la maison"), Turn::assistant("Merci de m'envoyer votre numéro")];
        assert_eq!(
            decide("3701455886/1014871", &history),
            Decision::Diagnose {
                service: Service::Water,
                contract: "3701455886 / 1014871".into()
            }
        );
    }

    #[test]
    fn test_greeting_goes_to_model() {
        assert_eq!(decide("Bonjour", &[]), Decision::Model);
        assert_eq!(decide("hello there", &[]), Decision::Model);
    }

    #[test]
    fn test_both_flow_water_first() {
        let text = "no water and no electricity 3701455886 / 1014871 4801455886 / 1014872";
        assert_eq!(
            decide(text, &[]),
            Decision::Diagnose {
                service: Service::Water,
                contract: "3701455886 / 1014871".into()
            }
        );

        let history = vec![Turn::user(text), delivered(Service::Water)];
        assert_eq!(
            decide("and the electricity and water?", &history),
            Decision::Diagnose {
                service: Service::Electricity,
                contract: "4801455886 / 1014872".into()
            }
        );
    }

    #[test]
    fn test_both_flow_asks_for_missing_contract() {
        assert_eq!(
            decide("الماء والكهرباء مقطوعين", &[]),
            Decision::AskContract {
                service: Service::Water
            }
        );
        let history = vec![
            Turn::user("الماء والكهرباء مقطوعين 3701455886 / 1014871"),
            delivered(Service::Water),
        ];
        assert_eq!(
            decide("شكرا، والكهرباء والماء؟", &history),
            Decision::AskContract {
                service: Service::Electricity
            }
        );
    }

    #[test]
    fn test_follow_up_without_service_goes_to_model() {
        let history = vec![
            Turn::user("مشكل الماء 3701455886 / 1014871"),
            delivered(Service::Water),
        ];
        assert_eq!(decide("شكرا", &history), Decision::Model);
        assert_eq!(decide("hello", &history), Decision::Model);
        assert_eq!(decide("What are your opening hours?", &history), Decision::Model);
    }

    #[test]
    fn test_greeting_after_ask_goes_to_model() {
        let history = vec![Turn::user("مشكل الكهرباء"), Turn::assistant("أرسل رقم العقد")];
        assert_eq!(decide("bonjour", &history), Decision::Model);
        assert_eq!(
            decide("4801566997 / 2025982", &history),
            Decision::Diagnose {
                service: Service::Electricity,
                contract: "4801566997 / 2025982".into()
            }
        );
    }

    #[test]
    fn test_service_named_again_recovers_contract() {
        let history = vec![
            Turn::user("مشكل الماء 3701455886 / 1014871"),
            delivered(Service::Water),
        ];
        assert_eq!(
            decide("mazal ma kaynach lma", &history),
            Decision::Diagnose {
                service: Service::Water,
                contract: "3701455886 / 1014871".into()
            }
        );
    }

    #[test]
    fn test_decision_path() {
        assert_eq!(Decision::Model.path(), DiagnosisPath::Model);
        assert_eq!(
            Decision::AskContract {
                service: Service::Water
            }
            .path(),
            DiagnosisPath::Deterministic
        );
    }
}
