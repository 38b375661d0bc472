//! Tool types for Scriba
//!
//! This module defines the core types for tool execution: the `Tool` trait
//! that all tools implement, the `ToolResult` produced by dispatch, and the
//! in-band JSON payload helpers tools use to report expected failures.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;

/// Trait that all tools must implement.
///
/// Tools are executable capabilities the model can invoke: computing a
/// value, calling an external service, reading or writing a note. A tool's
/// `description` must state unambiguously when and with what inputs it
/// applies — the model decides applicability from it alone.
///
/// Expected failures (bad input, unreachable service, missing entry) are
/// reported in-band via [`error_payload`]-style JSON, not via `Err`: the
/// result travels back to the model, which can react and retry. `Err` is
/// reserved for faults the tool cannot express in its payload; the registry
/// catches those at the dispatch boundary.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use serde_json::{json, Value};
/// use scriba::tools::Tool;
/// use scriba::error::Result;
///
/// struct MyTool;
///
/// #[async_trait]
/// impl Tool for MyTool {
///     fn name(&self) -> &str { "my_tool" }
///     fn description(&self) -> &str { "Does something useful" }
///     fn input_schema(&self) -> Value {
///         json!({
///             "type": "object",
///             "properties": {},
///             "required": []
///         })
///     }
///     async fn execute(&self, _args: Value) -> Result<String> {
///         Ok(json!({"success": true}).to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable unique identifier, used by the model to request this tool.
    fn name(&self) -> &str;

    /// Guidance text for the model: when and with what inputs to use this tool.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's arguments.
    ///
    /// Declares parameter names, types, and the `required` list. Used both
    /// to inform the model and to validate arguments before execution.
    fn input_schema(&self) -> Value;

    /// Execute the tool with already-validated arguments.
    ///
    /// Returns a serialized result payload. Side effects are not rolled
    /// back on failure; each tool owns its own atomicity.
    async fn execute(&self, args: Value) -> Result<String>;
}

/// The outcome of dispatching one tool call.
///
/// Correlated to its originating request by `call_id`. `is_error` flags
/// both expected failures reported by the tool and faults converted at the
/// dispatch boundary; either way the loop continues.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    /// The id of the tool call this result answers
    pub call_id: String,
    /// Serialized outcome payload (success or error)
    pub content: String,
    /// Whether this result reports a failure
    pub is_error: bool,
}

impl ToolResult {
    /// A successful result.
    pub fn ok(call_id: &str, content: String) -> Self {
        Self {
            call_id: call_id.to_string(),
            content,
            is_error: false,
        }
    }

    /// An error-flagged result with an in-band error payload.
    pub fn error(call_id: &str, message: &str) -> Self {
        Self {
            call_id: call_id.to_string(),
            content: error_payload(message),
            is_error: true,
        }
    }
}

/// Serialize an in-band error payload (`{"success": false, "error": …}`).
pub fn error_payload(message: &str) -> String {
    json!({"success": false, "error": message}).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_payload_shape() {
        let payload = error_payload("unknown tool: weather_v2");
        let parsed: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(parsed["success"], false);
        assert_eq!(parsed["error"], "unknown tool: weather_v2");
    }

    #[test]
    fn test_tool_result_ok() {
        let result = ToolResult::ok("call_1", r#"{"success": true}"#.to_string());
        assert_eq!(result.call_id, "call_1");
        assert!(!result.is_error);
    }

    #[test]
    fn test_tool_result_error() {
        let result = ToolResult::error("call_2", "boom");
        assert_eq!(result.call_id, "call_2");
        assert!(result.is_error);
        assert!(result.content.contains("boom"));
        assert!(result.content.contains(r#""success":false"#));
    }
}
