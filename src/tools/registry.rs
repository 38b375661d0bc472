//! Tool registry for Scriba
//!
//! This module provides the `ToolRegistry` struct for managing and
//! dispatching tools. Registration order is preserved (some models are
//! sensitive to declaration order), duplicate names are rejected, and
//! dispatch never fails the loop: unknown tools, invalid arguments, and
//! execution faults all become error-flagged results the model can react to.

use std::collections::HashMap;
use std::time::Instant;

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use tracing::{error, info};

use crate::error::{Result, ScribaError};
use crate::providers::ToolDefinition;
use crate::session::ToolCall;

use super::{error_payload, Tool, ToolResult};

struct RegisteredTool {
    tool: Box<dyn Tool>,
    /// Compiled once at registration; arguments are validated against it
    /// before every execution.
    schema: JSONSchema,
}

/// A registry that holds and dispatches tools.
///
/// # Example
///
/// ```rust
/// use scriba::tools::{EchoTool, ToolRegistry};
/// use scriba::session::ToolCall;
///
/// # tokio_test::block_on(async {
/// let mut registry = ToolRegistry::new();
/// registry.register(Box::new(EchoTool)).unwrap();
///
/// let call = ToolCall::new("call_1", "echo", r#"{"message": "hello"}"#);
/// let result = registry.dispatch(&call).await;
/// assert!(!result.is_error);
/// # });
/// ```
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create a new empty tool registry.
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a new tool.
    ///
    /// Fails with [`ScribaError::DuplicateTool`] if a tool with the same
    /// name is already registered, and with [`ScribaError::Tool`] if the
    /// tool's input schema does not compile.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ScribaError::DuplicateTool(name));
        }

        let schema_value = tool.input_schema();
        let schema = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&schema_value)
            .map_err(|e| {
                ScribaError::Tool(format!("invalid input schema for '{}': {}", name, e))
            })?;

        info!(tool = %name, "Registering tool");
        self.index.insert(name, self.tools.len());
        self.tools.push(RegisteredTool { tool, schema });
        Ok(())
    }

    /// Get all tool declarations, in registration order.
    pub fn declarations(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|entry| {
                ToolDefinition::new(
                    entry.tool.name(),
                    entry.tool.description(),
                    entry.tool.input_schema(),
                )
            })
            .collect()
    }

    /// Dispatch one tool call and return its correlated result.
    ///
    /// Never returns an error: unknown tool names, malformed argument JSON,
    /// schema violations, and execution faults are all converted into
    /// error-flagged results so a single bad call cannot abort the
    /// conversation.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let entry = match self.index.get(&call.name) {
            Some(&i) => &self.tools[i],
            None => {
                return ToolResult::error(&call.id, &format!("unknown tool: {}", call.name));
            }
        };

        let args: Value = match serde_json::from_str(&call.arguments) {
            Ok(v) => v,
            Err(e) => {
                return ToolResult::error(&call.id, &format!("invalid arguments JSON: {}", e));
            }
        };

        if let Err(errors) = entry.schema.validate(&args) {
            let detail = errors
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return ToolResult::error(
                &call.id,
                &format!("invalid arguments for {}: {}", call.name, detail),
            );
        }

        let start = Instant::now();
        match entry.tool.execute(args).await {
            Ok(content) => {
                info!(
                    tool = %call.name,
                    call_id = %call.id,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Tool executed"
                );
                ToolResult::ok(&call.id, content)
            }
            Err(e) => {
                error!(
                    tool = %call.name,
                    call_id = %call.id,
                    duration_ms = start.elapsed().as_millis() as u64,
                    error = %e,
                    "Tool execution failed"
                );
                ToolResult {
                    call_id: call.id.clone(),
                    content: error_payload(&e.to_string()),
                    is_error: true,
                }
            }
        }
    }

    /// Get the names of all registered tools, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|e| e.tool.name()).collect()
    }

    /// Check if a tool exists in the registry.
    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Get the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::EchoTool;
    use async_trait::async_trait;
    use serde_json::json;

    /// Always fails with an infrastructure error.
    struct BrokenTool;

    #[async_trait]
    impl Tool for BrokenTool {
        fn name(&self) -> &str {
            "broken"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object", "properties": {}, "required": []})
        }

        async fn execute(&self, _args: Value) -> Result<String> {
            Err(ScribaError::Tool("wires crossed".to_string()))
        }
    }

    /// Tool with a required typed parameter, for validation tests.
    struct StrictTool;

    #[async_trait]
    impl Tool for StrictTool {
        fn name(&self) -> &str {
            "strict"
        }

        fn description(&self) -> &str {
            "Requires a numeric 'amount'"
        }

        fn input_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": {
                    "amount": { "type": "number" }
                },
                "required": ["amount"]
            })
        }

        async fn execute(&self, args: Value) -> Result<String> {
            Ok(json!({"success": true, "amount": args["amount"]}).to_string())
        }
    }

    #[test]
    fn test_registry_new() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_register_and_query() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();

        assert!(registry.has("echo"));
        assert!(!registry.has("nonexistent"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_register_fails() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();

        let err = registry.register(Box::new(EchoTool)).unwrap_err();
        assert!(matches!(err, ScribaError::DuplicateTool(name) if name == "echo"));
        // The original registration is untouched
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_declarations_in_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(StrictTool)).unwrap();
        registry.register(Box::new(EchoTool)).unwrap();
        registry.register(Box::new(BrokenTool)).unwrap();

        let defs = registry.declarations();
        let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["strict", "echo", "broken"]);
        assert_eq!(registry.names(), vec!["strict", "echo", "broken"]);
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();

        let call = ToolCall::new("call_1", "echo", r#"{"message": "hello"}"#);
        let result = registry.dispatch(&call).await;

        assert_eq!(result.call_id, "call_1");
        assert!(!result.is_error);
        let parsed: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(parsed["message"], "hello");
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let registry = ToolRegistry::new();
        let call = ToolCall::new("call_9", "weather_v2", "{}");

        let result = registry.dispatch(&call).await;

        assert_eq!(result.call_id, "call_9");
        assert!(result.is_error);
        let parsed: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(parsed["success"], false);
        assert_eq!(parsed["error"], "unknown tool: weather_v2");
    }

    #[tokio::test]
    async fn test_dispatch_invalid_arguments_json() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();

        let call = ToolCall::new("call_2", "echo", "{not json");
        let result = registry.dispatch(&call).await;

        assert!(result.is_error);
        assert!(result.content.contains("invalid arguments JSON"));
    }

    #[tokio::test]
    async fn test_dispatch_missing_required_field() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(StrictTool)).unwrap();

        let call = ToolCall::new("call_3", "strict", "{}");
        let result = registry.dispatch(&call).await;

        assert_eq!(result.call_id, "call_3");
        assert!(result.is_error);
        assert!(result.content.contains("invalid arguments for strict"));
    }

    #[tokio::test]
    async fn test_dispatch_wrong_argument_type() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(StrictTool)).unwrap();

        let call = ToolCall::new("call_4", "strict", r#"{"amount": "twelve"}"#);
        let result = registry.dispatch(&call).await;

        assert!(result.is_error);

        let call = ToolCall::new("call_5", "strict", r#"{"amount": 12.5}"#);
        let result = registry.dispatch(&call).await;
        assert!(!result.is_error);
    }

    #[tokio::test]
    async fn test_dispatch_execution_fault_is_contained() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(BrokenTool)).unwrap();

        let call = ToolCall::new("call_6", "broken", "{}");
        let result = registry.dispatch(&call).await;

        assert_eq!(result.call_id, "call_6");
        assert!(result.is_error);
        let parsed: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(parsed["success"], false);
        assert!(parsed["error"].as_str().unwrap().contains("wires crossed"));
    }
}
