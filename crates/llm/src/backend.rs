//! OpenAI-compatible chat-completions backend
//!
//! Talks to Azure OpenAI deployments (`api-key` header, versioned deployment URL)
//! or any endpoint speaking the OpenAI wire format (`Authorization: Bearer`).
//! Tool calls are requested natively through the `tools` field.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use utility_agent_config::LlmConfig;
use utility_agent_core::{
    FinishReason, GenerateRequest, GenerateResponse, LanguageModel, Message, Role, TokenUsage,
    ToolCall, ToolDefinition,
};

use crate::LlmError;

/// Configuration for OpenAI-compatible backends
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API endpoint (OpenAI: https://api.openai.com/v1, Azure: resource URL)
    pub endpoint: String,
    pub api_key: String,
    /// Model name, or deployment name on Azure
    pub model: String,
    pub max_tokens: u32,
    /// Temperature (0-2)
    pub temperature: f32,
    pub timeout: Duration,
    /// Azure API version; `None` selects the plain OpenAI URL layout
    pub api_version: Option<String>,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
            timeout: Duration::from_secs(60),
            api_version: None,
        }
    }
}

impl OpenAIConfig {
    /// Create config for Azure OpenAI
    pub fn azure(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: deployment.into(),
            api_version: Some(api_version.into()),
            ..Default::default()
        }
    }

    /// Azure config from the `llm` settings section
    pub fn from_settings(settings: &LlmConfig) -> Result<Self, LlmError> {
        let endpoint = settings
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| LlmError::Configuration("llm.endpoint is not set".to_string()))?;
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LlmError::Configuration("llm.api_key is not set".to_string()))?;

        Ok(Self {
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout: Duration::from_secs(settings.timeout_secs),
            ..Self::azure(endpoint, api_key, &settings.deployment, &settings.api_version)
        })
    }
}

/// OpenAI-compatible backend
pub struct OpenAIBackend {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIBackend {
    pub fn new(config: OpenAIConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() && !config.endpoint.starts_with("http://localhost") {
            return Err(LlmError::Configuration(
                "API key required for remote endpoints".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Get the full API URL for chat completions
    fn chat_url(&self) -> String {
        match self.config.api_version {
            // Azure: {endpoint}/openai/deployments/{deployment}/chat/completions?api-version={version}
            Some(ref api_version) => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                self.config.endpoint.trim_end_matches('/'),
                self.config.model,
                api_version
            ),
            None => format!(
                "{}/chat/completions",
                self.config.endpoint.trim_end_matches('/')
            ),
        }
    }

    fn build_headers(&self) -> reqwest::header::HeaderMap {
        use reqwest::header::HeaderValue;

        let mut headers = reqwest::header::HeaderMap::new();

        if self.config.api_version.is_some() {
            if let Ok(val) = HeaderValue::from_str(&self.config.api_key) {
                headers.insert("api-key", val);
            }
        } else {
            let auth_value = format!("Bearer {}", self.config.api_key);
            if let Ok(val) = HeaderValue::from_str(&auth_value) {
                headers.insert(reqwest::header::AUTHORIZATION, val);
            }
        }

        headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        headers
    }

    fn build_request(&self, request: &GenerateRequest, tools: &[ToolDefinition]) -> ChatRequest {
        ChatRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.config.model.clone()),
            messages: request.messages.iter().map(WireMessage::from).collect(),
            max_tokens: Some(request.max_tokens.unwrap_or(self.config.max_tokens)),
            temperature: Some(request.temperature.unwrap_or(self.config.temperature)),
            tools: if tools.is_empty() {
                None
            } else {
                Some(tools.iter().map(WireTool::from).collect())
            },
            tool_choice: if tools.is_empty() { None } else { Some("auto") },
        }
    }

    async fn execute(&self, body: &ChatRequest) -> Result<GenerateResponse, LlmError> {
        let start = Instant::now();

        let response = self
            .client
            .post(self.chat_url())
            .headers(self.build_headers())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, error_text)));
        }

        let response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let result = into_generate_response(response)?;
        tracing::debug!(
            model = %self.config.model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            tool_calls = result.tool_calls.len(),
            "Chat completion finished"
        );
        Ok(result)
    }
}

#[async_trait]
impl LanguageModel for OpenAIBackend {
    async fn generate(&self, request: GenerateRequest) -> utility_agent_core::Result<GenerateResponse> {
        let body = self.build_request(&request, &[]);
        Ok(self.execute(&body).await?)
    }

    async fn generate_with_tools(
        &self,
        request: GenerateRequest,
        tools: &[ToolDefinition],
    ) -> utility_agent_core::Result<GenerateResponse> {
        let body = self.build_request(&request, tools);
        Ok(self.execute(&body).await?)
    }

    async fn is_available(&self) -> bool {
        // Azure has no cheap deployment probe; treat configured as available
        if self.config.api_version.is_some() {
            return true;
        }
        let url = format!("{}/models", self.config.endpoint.trim_end_matches('/'));
        self.client
            .get(&url)
            .headers(self.build_headers())
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Build the configured language model, or `None` when the model path is
/// disabled or missing credentials.
pub fn build_language_model(
    settings: &LlmConfig,
) -> Result<Option<Arc<dyn LanguageModel>>, LlmError> {
    if !settings.enabled {
        tracing::info!("LLM disabled by configuration");
        return Ok(None);
    }
    if !settings.is_configured() {
        tracing::warn!("LLM enabled but endpoint or api_key missing; model path will use fallbacks");
        return Ok(None);
    }
    let backend = OpenAIBackend::new(OpenAIConfig::from_settings(settings)?)?;
    tracing::info!(deployment = %settings.deployment, "Azure OpenAI backend ready");
    Ok(Some(Arc::new(backend)))
}

fn into_generate_response(response: ChatResponse) -> Result<GenerateResponse, LlmError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(ToolCall::from)
        .collect::<Vec<_>>();

    let finish_reason = if tool_calls.is_empty() {
        FinishReason::from_wire(choice.finish_reason.as_deref())
    } else {
        FinishReason::ToolCalls
    };

    Ok(GenerateResponse {
        text: choice.message.content.unwrap_or_default(),
        finish_reason,
        usage: response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens)),
        tool_calls,
    })
}

// Wire types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl From<&Message> for WireMessage {
    fn from(msg: &Message) -> Self {
        let role = match msg.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };
        let tool_calls = if msg.tool_calls.is_empty() {
            None
        } else {
            Some(msg.tool_calls.iter().map(WireToolCall::from).collect())
        };
        Self {
            role: role.to_string(),
            content: Some(msg.content.clone()),
            tool_calls,
            tool_call_id: msg.tool_call_id.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunctionDef,
}

#[derive(Debug, Serialize)]
struct WireFunctionDef {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

impl From<&ToolDefinition> for WireTool {
    fn from(tool: &ToolDefinition) -> Self {
        Self {
            kind: "function",
            function: WireFunctionDef {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

/// `arguments` is a JSON document encoded as a string
#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

impl From<&ToolCall> for WireToolCall {
    fn from(call: &ToolCall) -> Self {
        Self {
            id: call.id.clone(),
            kind: function_kind(),
            function: WireFunctionCall {
                name: call.name.clone(),
                arguments: call.arguments_json().to_string(),
            },
        }
    }
}

impl From<WireToolCall> for ToolCall {
    fn from(call: WireToolCall) -> Self {
        let arguments = serde_json::from_str::<HashMap<String, serde_json::Value>>(
            &call.function.arguments,
        )
        .unwrap_or_else(|e| {
            tracing::warn!(tool = %call.function.name, error = %e, "Unparseable tool arguments");
            HashMap::new()
        });
        ToolCall::new(call.id, call.function.name, arguments)
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: WireMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn azure_backend() -> OpenAIBackend {
        OpenAIBackend::new(OpenAIConfig::azure(
            "https://example.openai.azure.com/",
            "key",
            "gpt-4o",
            "2024-08-01-preview",
        ))
        .unwrap()
    }

    #[test]
    fn test_azure_chat_url() {
        assert_eq!(
            azure_backend().chat_url(),
            "https://example.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-08-01-preview"
        );
    }

    #[test]
    fn test_remote_endpoint_requires_key() {
        let config = OpenAIConfig {
            api_key: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            OpenAIBackend::new(config),
            Err(LlmError::Configuration(_))
        ));
    }

    #[test]
    fn test_request_serializes_tools_and_tool_messages() {
        let backend = azure_backend();
        let tools = vec![ToolDefinition::new(
            "check_water_payment",
            "Check water payment",
            json!({"type": "object", "properties": {}}),
        )];
        let mut args = HashMap::new();
        args.insert("contract_number".to_string(), json!("3701455886 / 1014871"));
        let call = ToolCall::new("call_1", "check_water_payment", args);

        let request = GenerateRequest::new("system")
            .with_user_message("water is cut")
            .with_message(Message::assistant_tool_calls("", vec![call]))
            .with_message(Message::tool("paid", "call_1"));

        let body = serde_json::to_value(backend.build_request(&request, &tools)).unwrap();
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "check_water_payment");
        assert_eq!(body["messages"][2]["tool_calls"][0]["id"], "call_1");
        assert_eq!(body["messages"][3]["role"], "tool");
        assert_eq!(body["messages"][3]["tool_call_id"], "call_1");
    }

    #[test]
    fn test_no_tools_omits_tool_fields() {
        let backend = azure_backend();
        let request = GenerateRequest::new("system").with_user_message("hi");
        let body = serde_json::to_value(backend.build_request(&request, &[])).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn test_parse_tool_call_response() {
        let raw = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_9",
                        "type": "function",
                        "function": {
                            "name": "check_electricity_payment",
                            "arguments": "{\"contract_number\": \"4801566997 / 2025982\"}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 120, "completion_tokens": 20, "total_tokens": 140}
        });
        let response: ChatResponse = serde_json::from_value(raw).unwrap();
        let result = into_generate_response(response).unwrap();

        assert_eq!(result.finish_reason, FinishReason::ToolCalls);
        assert_eq!(result.text, "");
        assert_eq!(result.tool_calls.len(), 1);
        assert_eq!(
            result.tool_calls[0].get_string("contract_number"),
            Some("4801566997 / 2025982")
        );
        assert_eq!(result.usage.map(|u| u.total_tokens), Some(140));
    }

    #[test]
    fn test_parse_text_response() {
        let raw = json!({
            "choices": [{
                "message": {"role": "assistant", "content": "Bonjour"},
                "finish_reason": "stop"
            }]
        });
        let response: ChatResponse = serde_json::from_value(raw).unwrap();
        let result = into_generate_response(response).unwrap();
        assert_eq!(result.text, "Bonjour");
        assert!(!result.has_tool_calls());
    }

    #[test]
    fn test_build_language_model_without_credentials() {
        let settings = LlmConfig {
            endpoint: None,
            api_key: None,
            ..Default::default()
        };
        assert!(build_language_model(&settings).unwrap().is_none());
    }
}
