//! Tool registry: name-based dispatch with parameter validation.
//!
//! The registry is itself a [`ToolExecutor`], so it can be handed straight
//! to [`ToolExecutionService::execute_tool_batch`](crate::ToolExecutionService::execute_tool_batch)
//! for a batch mixing several tools. Unknown tool names and parameters that
//! fail the tool's JSON Schema are reported as non-retryable
//! `VALIDATION_ERROR`s without invoking any executor.

use crate::error_code::ToolErrorCode;
use crate::executor::ToolExecutor;
use crate::types::{ToolCall, ToolDefinition, ToolError};
use crate::{Error, Result};
use async_trait::async_trait;
use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

struct RegisteredTool {
    definition: ToolDefinition,
    schema: Option<Arc<JSONSchema>>,
    executor: Arc<dyn ToolExecutor>,
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, RegisteredTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a tool. The parameter schema is compiled up front.
    pub fn register(
        &self,
        definition: ToolDefinition,
        executor: Arc<dyn ToolExecutor>,
    ) -> Result<()> {
        let name = definition.name().to_string();
        let schema = match &definition.function.parameters {
            Some(schema) => Some(Arc::new(compile_schema(&name, schema)?)),
            None => None,
        };
        debug!(tool_name = %name, validated = schema.is_some(), "registering tool");
        self.tools
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                name,
                RegisteredTool {
                    definition,
                    schema,
                    executor,
                },
            );
        Ok(())
    }

    pub fn unregister(&self, name: &str) -> Option<ToolDefinition> {
        self.tools
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .map(|t| t.definition)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Registered definitions, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<_> = self
            .tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|t| t.definition.clone())
            .collect();
        defs.sort_by(|a, b| a.name().cmp(b.name()));
        defs
    }

    pub fn len(&self) -> usize {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up the executor for `call` after validating its parameters.
    pub fn resolve(&self, call: &ToolCall) -> std::result::Result<Arc<dyn ToolExecutor>, ToolError> {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        let Some(tool) = tools.get(&call.name) else {
            return Err(ToolError::of(
                ToolErrorCode::ValidationError,
                format!("Unknown tool: {}", call.name),
            ));
        };

        if let Some(schema) = &tool.schema {
            let instance = call.parameters_value();
            let outcome = schema.validate(&instance);
            if let Err(errors) = outcome {
                let details: Vec<String> = errors
                    .map(|e| {
                        let path = e.instance_path.to_string();
                        if path.is_empty() {
                            e.to_string()
                        } else {
                            format!("{}: {}", path, e)
                        }
                    })
                    .collect();
                return Err(ToolError::of(
                    ToolErrorCode::ValidationError,
                    format!("Invalid parameters for {}: {}", call.name, details.join("; ")),
                ));
            }
        }

        Ok(tool.executor.clone())
    }
}

fn compile_schema(tool_name: &str, schema: &Value) -> Result<JSONSchema> {
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema)
        .map_err(|e| Error::Schema {
            tool_name: tool_name.to_string(),
            details: e.to_string(),
        })
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    async fn execute(&self, call: &ToolCall) -> anyhow::Result<Value> {
        let executor = self.resolve(call)?;
        executor.execute(call).await
    }
}
