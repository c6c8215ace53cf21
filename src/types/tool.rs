//! Tool calling definitions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Tool definition (for function calling)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String, // "function"
    pub function: FunctionDefinition,
}

impl ToolDefinition {
    pub fn function(name: impl Into<String>) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: name.into(),
                description: None,
                parameters: None,
            },
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.function.description = Some(description.into());
        self
    }

    pub fn with_parameters(mut self, schema: Value) -> Self {
        self.function.parameters = Some(schema);
        self
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: Option<String>,
    pub parameters: Option<Value>, // JSON Schema
}

/// Tool call (invocation request from an agent loop).
///
/// `id` correlates the call with its result and must be unique within a batch;
/// `name` keys metrics and circuit breaker state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    #[serde(default, alias = "arguments")]
    pub parameters: Map<String, Value>,
}

impl ToolCall {
    /// Create a call with a freshly generated id.
    pub fn new(name: impl Into<String>, parameters: Map<String, Value>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), name, parameters)
    }

    pub fn with_id(
        id: impl Into<String>,
        name: impl Into<String>,
        parameters: Map<String, Value>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parameters,
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// Parameters as a JSON object value.
    pub fn parameters_value(&self) -> Value {
        Value::Object(self.parameters.clone())
    }
}

/// Tool result (response to tool call)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_use_id: String,
    pub content: Value,
    #[serde(default)]
    pub is_error: bool,
}
