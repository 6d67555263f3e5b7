//! MCP (Model Context Protocol) tool interface
//!
//! Tools are described with a JSON Schema subset, validated before execution and
//! run with a per-tool timeout by the registry. Errors carry JSON-RPC 2.0 codes.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utility_agent_core::ToolDefinition;

/// Tool error with MCP error codes
#[derive(Debug, Clone)]
pub struct ToolError {
    pub code: ErrorCode,
    pub message: String,
}

impl ToolError {
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InvalidParams,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InternalError,
            message: message.into(),
        }
    }

    /// Unknown tool name
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::MethodNotFound,
            message: message.into(),
        }
    }

    pub fn timeout(tool_name: &str, timeout_secs: u64) -> Self {
        Self::internal(format!("Tool '{}' timed out after {}s", tool_name, timeout_secs))
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", i32::from(self.code), self.message)
    }
}

impl std::error::Error for ToolError {}

impl From<ToolError> for utility_agent_core::Error {
    fn from(err: ToolError) -> Self {
        utility_agent_core::Error::Tool(err.to_string())
    }
}

/// JSON-RPC 2.0 error codes raised by the registry and the lookup tools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    MethodNotFound,
    InvalidParams,
    InternalError,
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
        }
    }
}

/// Tool output with content blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: Vec<ContentBlock>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// JSON output, serialized as text
    pub fn json(value: impl Serialize) -> Self {
        let text = serde_json::to_string(&value).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Tool output serialization failed");
            "{}".to_string()
        });
        Self::text(text)
    }

    /// All text blocks joined, as fed back to the model
    pub fn as_text(&self) -> String {
        self.content
            .iter()
            .map(|block| match block {
                ContentBlock::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
}

/// Tool schema (JSON Schema format)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub input_schema: InputSchema,
}

impl ToolSchema {
    /// Definition handed to the language model
    pub fn to_definition(&self) -> ToolDefinition {
        let parameters = serde_json::to_value(&self.input_schema)
            .unwrap_or_else(|_| serde_json::json!({"type": "object"}));
        ToolDefinition::new(self.name.clone(), self.description.clone(), parameters)
    }
}

/// Input schema for tool parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSchema {
    /// Always "object" for tool inputs
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(default)]
    pub properties: HashMap<String, PropertySchema>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl InputSchema {
    pub fn object() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: HashMap::new(),
            required: Vec::new(),
        }
    }

    pub fn property(mut self, name: &str, schema: PropertySchema, required: bool) -> Self {
        self.properties.insert(name.to_string(), schema);
        if required {
            self.required.push(name.to_string());
        }
        self
    }
}

/// Property schema for input parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub prop_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PropertySchema {
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            prop_type: "string".to_string(),
            description: Some(description.into()),
        }
    }
}

/// Tool trait for MCP-compatible tool implementations
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name used for invocation
    fn name(&self) -> &str;

    /// Description shown to the model
    fn description(&self) -> &str;

    fn schema(&self) -> ToolSchema;

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError>;

    /// Checks required fields and property types
    fn validate(&self, input: &Value) -> Result<(), ToolError> {
        let schema = self.schema();

        match input {
            Value::Object(obj) => {
                for required in &schema.input_schema.required {
                    if !obj.contains_key(required) {
                        return Err(ToolError::invalid_params(format!(
                            "Missing required field: {}",
                            required
                        )));
                    }
                }
                for (name, value) in obj {
                    if let Some(prop_schema) = schema.input_schema.properties.get(name) {
                        validate_property(name, value, prop_schema)?;
                    }
                }
                Ok(())
            }
            _ if schema.input_schema.properties.is_empty() => Ok(()),
            _ => Err(ToolError::invalid_params("Input must be an object")),
        }
    }

    fn timeout_secs(&self) -> u64 {
        crate::registry::DEFAULT_TOOL_TIMEOUT_SECS
    }
}

/// Validate a property value against its schema
pub fn validate_property(
    name: &str,
    value: &Value,
    schema: &PropertySchema,
) -> Result<(), ToolError> {
    if schema.prop_type == "string" && !value.is_string() {
        return Err(ToolError::invalid_params(format!(
            "Field '{}' must be of type 'string', got '{}'",
            name,
            json_type_name(value)
        )));
    }
    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo a contract number"
        }

        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: self.name().to_string(),
                description: self.description().to_string(),
                input_schema: InputSchema::object().property(
                    "contract_number",
                    PropertySchema::string("Contract number"),
                    true,
                ),
            }
        }

        async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::json(input))
        }
    }

    #[test]
    fn test_default_validation() {
        let tool = EchoTool;
        assert!(tool.validate(&json!({"contract_number": "3701455886"})).is_ok());

        let missing = tool.validate(&json!({})).unwrap_err();
        assert_eq!(missing.code, ErrorCode::InvalidParams);

        assert!(tool.validate(&json!({"contract_number": 3701455886u64})).is_err());
        assert!(tool.validate(&json!("3701455886")).is_err());
    }

    #[test]
    fn test_schema_to_definition() {
        let definition = EchoTool.schema().to_definition();
        assert_eq!(definition.name, "echo");
        assert_eq!(definition.parameters["type"], "object");
        assert_eq!(definition.parameters["required"][0], "contract_number");
        assert_eq!(
            definition.parameters["properties"]["contract_number"]["type"],
            "string"
        );
    }

    #[test]
    fn test_validate_property_string() {
        let schema = PropertySchema::string("Contract number");
        assert!(validate_property("c", &json!("4801566997"), &schema).is_ok());
        let err = validate_property("c", &json!(null), &schema).unwrap_err();
        assert!(err.message.contains("got 'null'"));
    }

    #[test]
    fn test_output_text() {
        let out = ToolOutput::json(json!({"is_paid": true}));
        assert_eq!(out.as_text(), r#"{"is_paid":true}"#);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(i32::from(ErrorCode::InvalidParams), -32602);
        assert_eq!(
            ToolError::not_found("nope").to_string(),
            "[-32601] nope"
        );
        assert_eq!(ToolError::timeout("check", 5).code, ErrorCode::InternalError);
    }
}
