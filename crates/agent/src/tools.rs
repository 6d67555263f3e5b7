//! Lookup tools offered to the model
//!
//! Per-service payment and maintenance checks. Each runs the same deterministic
//! lookup as the router and returns structured fields plus a ready-to-use
//! summary in the turn's language, so the model has no facts to invent.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use utility_agent_config::AgentConfig;
use utility_agent_core::{Language, Service};
use utility_agent_tools::{
    InputSchema, PropertySchema, Tool, ToolError, ToolOutput, ToolRegistry, ToolSchema,
};

use crate::lookup::{Diagnostician, Lookup};
use crate::templates;

const CONTRACT_ARG: &str = "contract_number";

/// Registry with the four lookup tools, rendering summaries in `language`
pub fn lookup_registry(
    diagnostician: Arc<Diagnostician>,
    agent: Arc<AgentConfig>,
    language: Language,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for &service in Service::all() {
        registry.register(CheckPaymentTool::new(
            service,
            diagnostician.clone(),
            agent.clone(),
            language,
        ));
        registry.register(CheckMaintenanceTool::new(
            service,
            diagnostician.clone(),
            agent.clone(),
            language,
        ));
    }
    registry
}

fn contract_schema(service: Service) -> InputSchema {
    InputSchema::object().property(
        CONTRACT_ARG,
        PropertySchema::string(format!(
            "{} contract number, e.g. \"{}XXXXXX / XXXXXXX\", or only its first number group",
            service,
            service.contract_prefix()
        )),
        true,
    )
}

fn contract_arg(input: &Value) -> Result<&str, ToolError> {
    input
        .get(CONTRACT_ARG)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolError::invalid_params("contract_number is required"))
}

/// Output for lookups that found no usable account
fn unresolved(service: Service, input: &str, lookup: &Lookup, language: Language) -> ToolOutput {
    let (wrong_service, summary) = match lookup {
        Lookup::WrongService { .. } => (true, templates::mismatch(service, input, language)),
        _ => (false, templates::not_found(service, input, language)),
    };
    ToolOutput::json(json!({
        "found": false,
        "service": service,
        "contract_number": input,
        "wrong_service": wrong_service,
        "summary": summary,
    }))
}

/// Payment status for one service
pub struct CheckPaymentTool {
    service: Service,
    name: String,
    description: String,
    diagnostician: Arc<Diagnostician>,
    agent: Arc<AgentConfig>,
    language: Language,
}

impl CheckPaymentTool {
    pub fn new(
        service: Service,
        diagnostician: Arc<Diagnostician>,
        agent: Arc<AgentConfig>,
        language: Language,
    ) -> Self {
        Self {
            service,
            name: format!("check_{}_payment", service),
            description: format!(
                "Check payment status, outstanding balance and last payment of a {} contract",
                service
            ),
            diagnostician,
            agent,
            language,
        }
    }
}

#[async_trait]
impl Tool for CheckPaymentTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: contract_schema(self.service),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let contract = contract_arg(&input)?;
        let lookup = self
            .diagnostician
            .lookup(contract, self.service)
            .await
            .map_err(|e| ToolError::internal(e.to_string()))?;

        let Lookup::Found(found) = &lookup else {
            return Ok(unresolved(self.service, contract, &lookup, self.language));
        };

        let account = &found.account;
        let summary = if account.has_debt() {
            templates::unpaid(
                self.service,
                &account.contract_number.as_canonical(),
                account.outstanding_balance,
                self.language,
                &self.agent,
            )
        } else {
            let current = templates::payments_current(self.service, self.language);
            match &found.advisory {
                Some(advisory) => format!("{} {}", advisory.render(self.language), current),
                None => current,
            }
        };

        Ok(ToolOutput::json(json!({
            "found": true,
            "service": self.service,
            "contract_number": account.contract_number,
            "customer_name": account.customer_name,
            "is_paid": account.is_paid,
            "outstanding_balance": account.outstanding_balance,
            "last_payment_at": account.last_payment_at,
            "cut_status": account.cut_status,
            "cut_reason": account.cut_reason,
            "reactivation_pending_minutes": found.advisory.as_ref().map(|a| a.remaining_minutes),
            "summary": summary,
        })))
    }
}

/// Maintenance status of the zone serving a contract
pub struct CheckMaintenanceTool {
    service: Service,
    name: String,
    description: String,
    diagnostician: Arc<Diagnostician>,
    agent: Arc<AgentConfig>,
    language: Language,
}

impl CheckMaintenanceTool {
    pub fn new(
        service: Service,
        diagnostician: Arc<Diagnostician>,
        agent: Arc<AgentConfig>,
        language: Language,
    ) -> Self {
        Self {
            service,
            name: format!("check_{}_maintenance", service),
            description: format!(
                "Check whether maintenance in the customer's zone is interrupting {}, with the outage reason and expected restoration",
                service
            ),
            diagnostician,
            agent,
            language,
        }
    }
}

#[async_trait]
impl Tool for CheckMaintenanceTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: contract_schema(self.service),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let contract = contract_arg(&input)?;
        let lookup = self
            .diagnostician
            .lookup(contract, self.service)
            .await
            .map_err(|e| ToolError::internal(e.to_string()))?;

        let Lookup::Found(found) = &lookup else {
            return Ok(unresolved(self.service, contract, &lookup, self.language));
        };

        let Some(zone) = &found.zone else {
            return Ok(ToolOutput::json(json!({
                "found": true,
                "service": self.service,
                "zone_known": false,
                "summary": templates::technical_unknown(self.service, None, self.language, &self.agent),
            })));
        };

        let disrupted = zone.disrupts(self.service);
        let summary = if disrupted {
            found.diagnosis.render(self.language, &self.agent)
        } else {
            templates::no_maintenance(self.service, &zone.name, self.language)
        };

        Ok(ToolOutput::json(json!({
            "found": true,
            "service": self.service,
            "zone_known": true,
            "zone_name": zone.name,
            "maintenance_status": zone.maintenance_status,
            "affects_service": disrupted,
            "outage_reason": zone.outage_reason,
            "estimated_restoration": zone.estimated_restoration,
            "summary": summary,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use utility_agent_core::FixedClock;
    use utility_agent_persistence::{seed, InMemoryAccountStore};
    use utility_agent_tools::ToolExecutor;

    fn registry(language: Language) -> ToolRegistry {
        let now = Utc.with_ymd_and_hms(2024, 12, 4, 10, 0, 0).unwrap();
        let store = InMemoryAccountStore::with_clock(Arc::new(FixedClock(now)));
        seed::seed_in_memory(&store, now);
        let agent = Arc::new(AgentConfig::default());
        let diagnostician = Arc::new(Diagnostician::new(Arc::new(store), &agent));
        lookup_registry(diagnostician, agent, language)
    }

    fn parse(output: ToolOutput) -> Value {
        serde_json::from_str(&output.as_text()).unwrap()
    }

    #[test]
    fn test_tool_names() {
        assert_eq!(
            registry(Language::English).tool_names(),
            vec![
                "check_electricity_maintenance",
                "check_electricity_payment",
                "check_water_maintenance",
                "check_water_payment",
            ]
        );
    }

    #[tokio::test]
    async fn test_payment_unpaid() {
        let out = registry(Language::English)
            .execute(
                "check_electricity_payment",
                json!({ "contract_number": "4801566997 / 2025982" }),
            )
            .await
            .unwrap();
        let v = parse(out);
        assert_eq!(v["found"], true);
        assert_eq!(v["is_paid"], false);
        assert!(v["summary"].as_str().unwrap().contains("450.00 MAD"));
    }

    #[tokio::test]
    async fn test_maintenance_in_zone() {
        let out = registry(Language::Arabic)
            .execute(
                "check_water_maintenance",
                json!({ "contract_number": "3701455886" }),
            )
            .await
            .unwrap();
        let v = parse(out);
        assert_eq!(v["affects_service"], true);
        assert!(v["summary"].as_str().unwrap().contains("إصلاح أنابيب المياه الرئيسية"));
    }

    #[tokio::test]
    async fn test_wrong_service_contract() {
        let out = registry(Language::French)
            .execute(
                "check_water_payment",
                json!({ "contract_number": "4801566997 / 2025982" }),
            )
            .await
            .unwrap();
        let v = parse(out);
        assert_eq!(v["found"], false);
        assert_eq!(v["wrong_service"], true);
    }

    #[tokio::test]
    async fn test_missing_argument() {
        let err = registry(Language::English)
            .execute("check_water_payment", json!({}))
            .await
            .unwrap_err();
        assert!(err.message.contains("contract_number"));
    }
}
