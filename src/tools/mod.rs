//! Tools module - tool definitions and execution for model function calling
//!
//! This module provides the infrastructure for defining and executing the
//! capabilities the model can invoke during a conversation.
//!
//! # Overview
//!
//! - `Tool` trait: the interface every tool implements
//! - `ToolRegistry`: order-preserving registry that validates and dispatches
//! - `ToolResult`: dispatch outcome, correlated by call id
//!
//! # Built-in Tools
//!
//! - `CalculatorTool`: arithmetic expression evaluation
//! - `WeatherTool`: current conditions via WeatherAPI.com
//! - `WebReaderTool`: webpage fetch and readable-text extraction
//! - `DateTimeTool`: current local date and time
//! - `NotesTool`: persistent named notes over a locked [`NoteStore`]
//! - `EchoTool`: trivial echo, for tests and wiring checks
//!
//! # Example
//!
//! ```rust
//! use scriba::tools::{CalculatorTool, EchoTool, ToolRegistry};
//! use scriba::session::ToolCall;
//!
//! # tokio_test::block_on(async {
//! let mut registry = ToolRegistry::new();
//! registry.register(Box::new(CalculatorTool)).unwrap();
//! registry.register(Box::new(EchoTool)).unwrap();
//!
//! let call = ToolCall::new("call_1", "calculator", r#"{"expression": "2 + 2"}"#);
//! let result = registry.dispatch(&call).await;
//! assert!(!result.is_error);
//!
//! let definitions = registry.declarations();
//! assert_eq!(definitions[0].name, "calculator");
//! # });
//! ```

pub mod calculator;
pub mod datetime;
pub mod notes;
mod registry;
mod types;
pub mod weather;
pub mod web;

pub use calculator::CalculatorTool;
pub use datetime::DateTimeTool;
pub use notes::{Note, NoteStore, NotesTool};
pub use registry::ToolRegistry;
pub use types::{error_payload, Tool, ToolResult};
pub use weather::WeatherTool;
pub use web::WebReaderTool;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::Config;
use crate::error::Result;

/// Create the default tool set, configured from `config`.
///
/// Registration order is what the model sees: calculator, weather, webpage
/// reader, date/time, notes.
pub fn default_tools(config: &Config) -> Vec<Box<dyn Tool>> {
    vec![
        Box::new(CalculatorTool),
        Box::new(WeatherTool::new(config.tools.weather.api_key.clone())),
        Box::new(WebReaderTool::new(config.tools.web.max_chars)),
        Box::new(DateTimeTool),
        Box::new(NotesTool::new(NoteStore::new(config.notes_path()))),
    ]
}

/// A simple echo tool for testing purposes.
///
/// Echoes back the message it is given. Useful for exercising the tool
/// infrastructure without side effects.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echoes back the provided message"
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "The message to echo"
                }
            },
            "required": ["message"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let message = args
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("(no message)");
        Ok(serde_json::json!({"success": true, "message": message}).to_string())
    }
}
