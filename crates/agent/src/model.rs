//! Model conversation path
//!
//! Open-ended turns go to the language model with the lookup tools attached.
//! Tool calls run the deterministic lookups and their results are fed back
//! for another pass. Without a configured model the greeting is returned.

use std::sync::Arc;
use std::time::Instant;

use utility_agent_config::AgentConfig;
use utility_agent_core::{GenerateRequest, Language, LanguageModel, Message, Turn};
use utility_agent_llm::{greeting, PromptBuilder};
use utility_agent_tools::{ErrorCode, ToolExecutor, ToolRegistry};

use crate::lookup::Diagnostician;
use crate::templates::flatten_paragraph;
use crate::tools::lookup_registry;
use crate::AgentError;

/// Tool rounds before the model is asked for a final answer without tools
pub const MAX_TOOL_ROUNDS: usize = 3;

pub struct ModelPath {
    llm: Option<Arc<dyn LanguageModel>>,
    diagnostician: Arc<Diagnostician>,
    agent: Arc<AgentConfig>,
}

impl ModelPath {
    pub fn new(
        llm: Option<Arc<dyn LanguageModel>>,
        diagnostician: Arc<Diagnostician>,
        agent: Arc<AgentConfig>,
    ) -> Self {
        Self {
            llm,
            diagnostician,
            agent,
        }
    }

    pub fn has_model(&self) -> bool {
        self.llm.is_some()
    }

    pub async fn respond(
        &self,
        text: &str,
        history: &[Turn],
        language: Language,
    ) -> Result<String, AgentError> {
        let Some(llm) = &self.llm else {
            tracing::debug!("No language model configured, answering with greeting");
            return Ok(greeting(&self.agent.company_name, language));
        };

        let registry = lookup_registry(self.diagnostician.clone(), self.agent.clone(), language);
        let definitions = registry.definitions();
        let mut request = PromptBuilder::new(&self.agent, language)
            .with_history(history)
            .user_message(text)
            .build();

        for round in 0..MAX_TOOL_ROUNDS {
            let started = Instant::now();
            let response = llm.generate_with_tools(request.clone(), &definitions).await?;
            record_llm_latency(started);

            if !response.has_tool_calls() {
                return finish(&response.text);
            }

            tracing::info!(
                round,
                tool_calls = response.tool_calls.len(),
                model = llm.model_name(),
                "Model requested tool calls"
            );
            self.run_tool_calls(&registry, &mut request, response.text, response.tool_calls)
                .await?;
        }

        tracing::warn!(rounds = MAX_TOOL_ROUNDS, "Tool round limit reached, asking for final answer");
        let started = Instant::now();
        let response = llm.generate(request).await?;
        record_llm_latency(started);
        finish(&response.text)
    }

    async fn run_tool_calls(
        &self,
        registry: &ToolRegistry,
        request: &mut GenerateRequest,
        text: String,
        calls: Vec<utility_agent_core::ToolCall>,
    ) -> Result<(), AgentError> {
        request
            .messages
            .push(Message::assistant_tool_calls(text, calls.clone()));

        for call in calls {
            let result = match registry.execute(&call.name, call.arguments_json()).await {
                Ok(output) => {
                    tracing::debug!(tool = %call.name, "Tool execution successful");
                    output.as_text()
                }
                // The model can correct its own arguments on the next pass
                Err(e) if matches!(e.code, ErrorCode::InvalidParams | ErrorCode::MethodNotFound) => {
                    tracing::warn!(tool = %call.name, error = %e, "Tool call rejected");
                    format!("Tool '{}' failed: {}", call.name, e)
                }
                Err(e) => {
                    tracing::error!(tool = %call.name, error = %e, "Tool execution failed");
                    return Err(AgentError::Tool(e.to_string()));
                }
            };
            request.messages.push(Message::tool(result, call.id));
        }
        Ok(())
    }
}

fn finish(text: &str) -> Result<String, AgentError> {
    let reply = flatten_paragraph(text);
    if reply.is_empty() {
        return Err(AgentError::Llm("empty model response".to_string()));
    }
    Ok(reply)
}

fn record_llm_latency(started: Instant) {
    metrics::histogram!("utility_agent_llm_duration_seconds")
        .record(started.elapsed().as_secs_f64());
}
