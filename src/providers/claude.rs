//! Claude (Anthropic) completion provider
//!
//! This module implements the `LLMProvider` trait for Anthropic's messages
//! API, handling message conversion, tool calls, and both buffered and
//! streaming (SSE) response parsing.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, Result, ScribaError};
use crate::session::{Message, Role};

use super::{
    parse_provider_error, ChatOptions, LLMProvider, LLMResponse, LLMToolCall, StreamEvent,
    ToolDefinition, Usage,
};

/// The Anthropic messages API endpoint.
const CLAUDE_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// The default model to use.
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// The Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Claude/Anthropic completion provider.
///
/// Handles message format conversion, tool calling, and response parsing
/// for the messages API.
pub struct ClaudeProvider {
    /// API key for authentication
    api_key: String,
    /// Endpoint URL (overridable for proxies and tests)
    api_url: String,
    /// HTTP client for making requests
    client: Client,
}

impl ClaudeProvider {
    /// Create a new Claude provider with the given API key.
    ///
    /// # Example
    /// ```
    /// use scriba::providers::{ClaudeProvider, LLMProvider};
    ///
    /// let provider = ClaudeProvider::new("sk-ant-api03-xxx");
    /// assert_eq!(provider.name(), "claude");
    /// ```
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            api_url: CLAUDE_API_URL.to_string(),
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    /// Override the endpoint base URL.
    ///
    /// `base` is the scheme+host part; `/v1/messages` is appended.
    pub fn with_api_base(mut self, base: &str) -> Self {
        self.api_url = format!("{}/v1/messages", base.trim_end_matches('/'));
        self
    }

    /// Create a provider with a custom HTTP client (timeouts, proxies).
    pub fn with_client(api_key: &str, client: Client) -> Self {
        Self {
            api_key: api_key.to_string(),
            api_url: CLAUDE_API_URL.to_string(),
            client,
        }
    }

    fn build_request(
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        model: &str,
        options: &ChatOptions,
        stream: bool,
    ) -> ClaudeRequest {
        let (system, claude_messages) = convert_messages(messages);

        ClaudeRequest {
            model: model.to_string(),
            max_tokens: options.max_tokens.unwrap_or(4096),
            messages: claude_messages,
            system,
            tools: if tools.is_empty() {
                None
            } else {
                Some(convert_tools(tools))
            },
            temperature: options.temperature,
            top_p: options.top_p,
            stop_sequences: options.stop.clone(),
            stream: if stream { Some(true) } else { None },
        }
    }

    async fn send(&self, request: &ClaudeRequest) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ScribaError::Provider(ProviderError::Timeout(e.to_string()))
                } else {
                    ScribaError::Http(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ScribaError::Provider(classify_api_error(
                status,
                &error_text,
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl LLMProvider for ClaudeProvider {
    async fn chat(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        model: Option<&str>,
        options: ChatOptions,
    ) -> Result<LLMResponse> {
        let model = model.unwrap_or(DEFAULT_MODEL);
        let request = Self::build_request(messages, tools, model, &options, false);

        let response = self.send(&request).await?;
        let body = response.text().await?;
        let claude_response: ClaudeResponse = serde_json::from_str(&body).map_err(|e| {
            ScribaError::Provider(ProviderError::MalformedResponse(format!(
                "unexpected response shape: {}",
                e
            )))
        })?;

        Ok(convert_response(claude_response))
    }

    async fn chat_stream(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        model: Option<&str>,
        options: ChatOptions,
    ) -> Result<tokio::sync::mpsc::Receiver<StreamEvent>> {
        use futures::StreamExt;

        let model = model.unwrap_or(DEFAULT_MODEL);
        let request = Self::build_request(messages, tools, model, &options, true);

        let response = self.send(&request).await?;

        let (tx, rx) = tokio::sync::mpsc::channel::<StreamEvent>(32);
        let byte_stream = response.bytes_stream();

        tokio::spawn(async move {
            let mut assembled_content = String::new();
            let mut tool_calls: Vec<LLMToolCall> = Vec::new();
            let mut current_tool_id: Option<String> = None;
            let mut current_tool_name: Option<String> = None;
            let mut current_tool_json = String::new();
            let mut input_tokens: u32 = 0;
            let mut output_tokens: u32 = 0;
            let mut line_buffer = String::new();

            tokio::pin!(byte_stream);

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = tx
                            .send(StreamEvent::Error(ScribaError::Provider(
                                ProviderError::Unknown(format!("stream read error: {}", e)),
                            )))
                            .await;
                        return;
                    }
                };

                line_buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(newline_pos) = line_buffer.find('\n') {
                    let line = line_buffer[..newline_pos].trim().to_string();
                    line_buffer = line_buffer[newline_pos + 1..].to_string();

                    if line.is_empty() || line.starts_with("event:") {
                        continue;
                    }

                    let data = match line.strip_prefix("data:") {
                        Some(stripped) => stripped.trim_start(),
                        None => continue,
                    };

                    let sse: SseEvent = match serde_json::from_str(data) {
                        Ok(v) => v,
                        Err(_) => continue,
                    };

                    match sse.event_type.as_str() {
                        "message_start" => {
                            if let Some(usage) = sse.message.as_ref().and_then(|m| m.usage.as_ref())
                            {
                                input_tokens = usage.input_tokens.unwrap_or(0);
                            }
                        }
                        "content_block_start" => {
                            if let Some(block) = &sse.content_block {
                                if block.block_type == "tool_use" {
                                    current_tool_id = block.id.clone();
                                    current_tool_name = block.name.clone();
                                    current_tool_json.clear();
                                }
                            }
                        }
                        "content_block_delta" => {
                            if let Some(delta) = &sse.delta {
                                match delta.delta_type.as_deref() {
                                    Some("text_delta") => {
                                        if let Some(text) = &delta.text {
                                            assembled_content.push_str(text);
                                            if tx
                                                .send(StreamEvent::Delta(text.clone()))
                                                .await
                                                .is_err()
                                            {
                                                return;
                                            }
                                        }
                                    }
                                    Some("input_json_delta") => {
                                        if let Some(json_chunk) = &delta.partial_json {
                                            current_tool_json.push_str(json_chunk);
                                        }
                                    }
                                    _ => {}
                                }
                            }
                        }
                        "content_block_stop" => {
                            if let (Some(id), Some(name)) =
                                (current_tool_id.take(), current_tool_name.take())
                            {
                                let args = if current_tool_json.is_empty() {
                                    "{}".to_string()
                                } else {
                                    std::mem::take(&mut current_tool_json)
                                };
                                tool_calls.push(LLMToolCall::new(&id, &name, &args));
                            }
                        }
                        "message_delta" => {
                            if let Some(usage) = &sse.usage {
                                output_tokens = usage.output_tokens.unwrap_or(0);
                            }
                        }
                        "message_stop" => {
                            if !tool_calls.is_empty() {
                                let _ = tx
                                    .send(StreamEvent::ToolCalls(std::mem::take(&mut tool_calls)))
                                    .await;
                            }
                            let _ = tx
                                .send(StreamEvent::Done {
                                    content: assembled_content.clone(),
                                    usage: Some(Usage::new(input_tokens, output_tokens)),
                                })
                                .await;
                            return;
                        }
                        _ => {}
                    }
                }
            }

            // Stream ended without a message_stop; flush what we have.
            if !tool_calls.is_empty() {
                let _ = tx
                    .send(StreamEvent::ToolCalls(std::mem::take(&mut tool_calls)))
                    .await;
            }
            let _ = tx
                .send(StreamEvent::Done {
                    content: assembled_content,
                    usage: Some(Usage::new(input_tokens, output_tokens)),
                })
                .await;
        });

        Ok(rx)
    }

    fn default_model(&self) -> &str {
        DEFAULT_MODEL
    }

    fn name(&self) -> &str {
        "claude"
    }
}

/// Classify an error body from the API into a typed [`ProviderError`].
///
/// Prefers the structured `error.type` field when present (the status code
/// alone cannot distinguish `overloaded_error` from other 5xx conditions).
fn classify_api_error(status: u16, error_text: &str) -> ProviderError {
    if let Ok(parsed) = serde_json::from_str::<ClaudeErrorResponse>(error_text) {
        let body = format!("{} - {}", parsed.error.r#type, parsed.error.message);
        return match parsed.error.r#type.as_str() {
            "authentication_error" | "permission_error" => ProviderError::Auth(body),
            "rate_limit_error" => ProviderError::RateLimit(body),
            "overloaded_error" => ProviderError::Overloaded(body),
            "invalid_request_error" => ProviderError::InvalidRequest(body),
            "not_found_error" => ProviderError::ModelNotFound(body),
            "api_error" => ProviderError::ServerError(body),
            _ => parse_provider_error(status, &body),
        };
    }
    parse_provider_error(status, error_text)
}

// ============================================================================
// Claude API Request Types
// ============================================================================

/// Claude API request body.
#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ClaudeMessage>,
    /// System prompt (separate from messages in the Claude API)
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ClaudeTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// A message in Claude's format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ClaudeMessage {
    /// Role: "user" or "assistant"
    role: String,
    content: ClaudeContent,
}

/// Claude message content - simple text or an array of blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ClaudeContent {
    Text(String),
    Blocks(Vec<ClaudeContentBlock>),
}

/// A content block within a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
enum ClaudeContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    /// Assistant requesting a tool call
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// Tool execution result, sent back inside a user message
    #[serde(rename = "tool_result")]
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

/// Claude tool declaration.
#[derive(Debug, Serialize)]
struct ClaudeTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

// ============================================================================
// Claude API Response Types
// ============================================================================

/// Claude API response body.
#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContentBlock>,
    usage: ClaudeUsage,
    #[allow(dead_code)]
    stop_reason: Option<String>,
}

/// Claude API error response.
#[derive(Debug, Deserialize)]
struct ClaudeErrorResponse {
    error: ClaudeError,
}

/// Claude API error details.
#[derive(Debug, Deserialize)]
struct ClaudeError {
    r#type: String,
    message: String,
}

/// Claude token usage.
#[derive(Debug, Deserialize)]
struct ClaudeUsage {
    input_tokens: u32,
    output_tokens: u32,
}

// ============================================================================
// Claude SSE Streaming Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct SseEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    delta: Option<SseDelta>,
    #[serde(default)]
    content_block: Option<SseContentBlock>,
    #[serde(default)]
    usage: Option<SseUsage>,
    #[serde(default)]
    message: Option<SseMessage>,
}

#[derive(Debug, Deserialize)]
struct SseDelta {
    #[serde(rename = "type", default)]
    delta_type: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    partial_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SseContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SseUsage {
    #[serde(default)]
    input_tokens: Option<u32>,
    #[serde(default)]
    output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SseMessage {
    #[serde(default)]
    usage: Option<SseUsage>,
}

// ============================================================================
// Conversion Functions
// ============================================================================

/// Convert Scriba messages to Claude API format.
///
/// Extracts the system message (if present) and converts the rest. Runs of
/// consecutive tool-result messages are grouped into a single user message
/// of `tool_result` blocks, as the API requires all results of one
/// assistant turn in the immediately following user turn.
fn convert_messages(messages: Vec<Message>) -> (Option<String>, Vec<ClaudeMessage>) {
    let mut system: Option<String> = None;
    let mut claude_messages: Vec<ClaudeMessage> = Vec::new();
    let mut pending_tool_results: Vec<ClaudeContentBlock> = Vec::new();

    fn flush(pending: &mut Vec<ClaudeContentBlock>, out: &mut Vec<ClaudeMessage>) {
        if !pending.is_empty() {
            out.push(ClaudeMessage {
                role: "user".to_string(),
                content: ClaudeContent::Blocks(std::mem::take(pending)),
            });
        }
    }

    for msg in messages {
        match msg.role {
            Role::System => {
                system = Some(msg.content);
            }
            Role::User => {
                flush(&mut pending_tool_results, &mut claude_messages);
                claude_messages.push(ClaudeMessage {
                    role: "user".to_string(),
                    content: ClaudeContent::Text(msg.content),
                });
            }
            Role::Assistant => {
                flush(&mut pending_tool_results, &mut claude_messages);

                if let Some(tool_calls) = msg.tool_calls {
                    let mut blocks: Vec<ClaudeContentBlock> = Vec::new();

                    if !msg.content.is_empty() {
                        blocks.push(ClaudeContentBlock::Text { text: msg.content });
                    }

                    for tc in tool_calls {
                        let input: serde_json::Value =
                            serde_json::from_str(&tc.arguments).unwrap_or(serde_json::json!({}));
                        blocks.push(ClaudeContentBlock::ToolUse {
                            id: tc.id,
                            name: tc.name,
                            input,
                        });
                    }

                    claude_messages.push(ClaudeMessage {
                        role: "assistant".to_string(),
                        content: ClaudeContent::Blocks(blocks),
                    });
                } else {
                    claude_messages.push(ClaudeMessage {
                        role: "assistant".to_string(),
                        content: ClaudeContent::Text(msg.content),
                    });
                }
            }
            Role::Tool => {
                if let Some(tool_call_id) = msg.tool_call_id {
                    pending_tool_results.push(ClaudeContentBlock::ToolResult {
                        tool_use_id: tool_call_id,
                        content: msg.content,
                        is_error: if msg.is_error { Some(true) } else { None },
                    });
                }
            }
        }
    }

    flush(&mut pending_tool_results, &mut claude_messages);

    (system, claude_messages)
}

/// Convert tool definitions to Claude API format.
fn convert_tools(tools: Vec<ToolDefinition>) -> Vec<ClaudeTool> {
    tools
        .into_iter()
        .map(|t| ClaudeTool {
            name: t.name,
            description: t.description,
            input_schema: t.input_schema,
        })
        .collect()
}

/// Convert a Claude API response to an [`LLMResponse`].
fn convert_response(response: ClaudeResponse) -> LLMResponse {
    let mut content = String::new();
    let mut tool_calls: Vec<LLMToolCall> = Vec::new();

    for block in response.content {
        match block {
            ClaudeContentBlock::Text { text } => {
                if !content.is_empty() {
                    content.push('\n');
                }
                content.push_str(&text);
            }
            ClaudeContentBlock::ToolUse { id, name, input } => {
                let arguments = serde_json::to_string(&input).unwrap_or_else(|_| "{}".to_string());
                tool_calls.push(LLMToolCall::new(&id, &name, &arguments));
            }
            ClaudeContentBlock::ToolResult { .. } => {
                // Tool results don't appear in responses; ignore gracefully.
            }
        }
    }

    let usage = Usage::new(response.usage.input_tokens, response.usage.output_tokens);

    LLMResponse {
        content,
        tool_calls,
        usage: Some(usage),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Message, ToolCall};

    #[test]
    fn test_claude_provider_creation() {
        let provider = ClaudeProvider::new("test-key");
        assert_eq!(provider.name(), "claude");
        assert_eq!(provider.default_model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_with_api_base() {
        let provider = ClaudeProvider::new("test-key").with_api_base("http://localhost:9999/");
        assert_eq!(provider.api_url, "http://localhost:9999/v1/messages");
    }

    #[test]
    fn test_message_conversion_simple() {
        let messages = vec![Message::user("Ciao"), Message::assistant("Ciao a te!")];

        let (system, claude_messages) = convert_messages(messages);

        assert!(system.is_none());
        assert_eq!(claude_messages.len(), 2);
        assert_eq!(claude_messages[0].role, "user");
        assert_eq!(claude_messages[1].role, "assistant");
    }

    #[test]
    fn test_message_conversion_with_system() {
        let messages = vec![
            Message::system("You are a helpful assistant"),
            Message::user("Hello"),
        ];

        let (system, claude_messages) = convert_messages(messages);

        assert_eq!(system, Some("You are a helpful assistant".to_string()));
        assert_eq!(claude_messages.len(), 1);
    }

    #[test]
    fn test_message_conversion_with_tool_calls() {
        let call = ToolCall::new("call_1", "calculator", r#"{"expression": "1250 * 0.15"}"#);
        let messages = vec![
            Message::user("Quanto fa il 15% di 1250?"),
            Message::assistant_with_tools("Calcolo subito.", vec![call]),
            Message::tool_result("call_1", r#"{"success": true, "result": 187.5}"#, false),
            Message::assistant("Il 15% di 1250 è 187,5."),
        ];

        let (system, claude_messages) = convert_messages(messages);

        assert!(system.is_none());
        assert_eq!(claude_messages.len(), 4);

        assert_eq!(claude_messages[1].role, "assistant");
        match &claude_messages[1].content {
            ClaudeContent::Blocks(blocks) => {
                assert_eq!(blocks.len(), 2); // text + tool_use
                assert!(matches!(blocks[0], ClaudeContentBlock::Text { .. }));
                assert!(matches!(blocks[1], ClaudeContentBlock::ToolUse { .. }));
            }
            ClaudeContent::Text(_) => panic!("expected blocks content for tool call message"),
        }

        // Tool result travels as a user message of tool_result blocks
        assert_eq!(claude_messages[2].role, "user");
        match &claude_messages[2].content {
            ClaudeContent::Blocks(blocks) => {
                assert_eq!(blocks.len(), 1);
                assert!(matches!(blocks[0], ClaudeContentBlock::ToolResult { .. }));
            }
            ClaudeContent::Text(_) => panic!("expected blocks content for tool result"),
        }
    }

    #[test]
    fn test_message_conversion_groups_tool_results() {
        let tc1 = ToolCall::new("call_1", "get_datetime", "{}");
        let tc2 = ToolCall::new("call_2", "get_weather", r#"{"city": "Roma"}"#);

        let messages = vec![
            Message::user("Che ore sono e che tempo fa a Roma?"),
            Message::assistant_with_tools("", vec![tc1, tc2]),
            Message::tool_result("call_1", "12:00", false),
            Message::tool_result("call_2", "Sereno, 28C", false),
            Message::assistant("Sono le 12 e a Roma c'è il sole."),
        ];

        let (_, claude_messages) = convert_messages(messages);

        assert_eq!(claude_messages.len(), 4);
        match &claude_messages[2].content {
            ClaudeContent::Blocks(blocks) => assert_eq!(blocks.len(), 2),
            ClaudeContent::Text(_) => panic!("expected grouped tool results"),
        }
    }

    #[test]
    fn test_tool_result_error_flag_propagates() {
        let messages = vec![
            Message::assistant_with_tools("", vec![ToolCall::new("c1", "weather_v2", "{}")]),
            Message::tool_result(
                "c1",
                r#"{"success": false, "error": "unknown tool: weather_v2"}"#,
                true,
            ),
        ];

        let (_, claude_messages) = convert_messages(messages);
        match &claude_messages[1].content {
            ClaudeContent::Blocks(blocks) => match &blocks[0] {
                ClaudeContentBlock::ToolResult { is_error, .. } => {
                    assert_eq!(*is_error, Some(true));
                }
                _ => panic!("expected tool result block"),
            },
            ClaudeContent::Text(_) => panic!("expected blocks content"),
        }
    }

    #[test]
    fn test_convert_tools() {
        let tools = vec![ToolDefinition::new(
            "calculator",
            "Evaluate arithmetic",
            serde_json::json!({
                "type": "object",
                "properties": { "expression": { "type": "string" } },
                "required": ["expression"]
            }),
        )];

        let claude_tools = convert_tools(tools);

        assert_eq!(claude_tools.len(), 1);
        assert_eq!(claude_tools[0].name, "calculator");
        let json = serde_json::to_string(&claude_tools[0]).unwrap();
        assert!(json.contains(r#""input_schema""#));
    }

    #[test]
    fn test_convert_response_text_only() {
        let response = ClaudeResponse {
            content: vec![ClaudeContentBlock::Text {
                text: "Ciao, mondo!".to_string(),
            }],
            usage: ClaudeUsage {
                input_tokens: 10,
                output_tokens: 5,
            },
            stop_reason: Some("end_turn".to_string()),
        };

        let llm_response = convert_response(response);

        assert_eq!(llm_response.content, "Ciao, mondo!");
        assert!(!llm_response.has_tool_calls());
        assert_eq!(llm_response.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn test_convert_response_with_tool_calls() {
        let response = ClaudeResponse {
            content: vec![
                ClaudeContentBlock::Text {
                    text: "Controllo il meteo.".to_string(),
                },
                ClaudeContentBlock::ToolUse {
                    id: "toolu_01".to_string(),
                    name: "get_weather".to_string(),
                    input: serde_json::json!({"city": "Milano"}),
                },
            ],
            usage: ClaudeUsage {
                input_tokens: 20,
                output_tokens: 30,
            },
            stop_reason: Some("tool_use".to_string()),
        };

        let llm_response = convert_response(response);

        assert_eq!(llm_response.content, "Controllo il meteo.");
        assert_eq!(llm_response.tool_calls.len(), 1);

        let tc = &llm_response.tool_calls[0];
        assert_eq!(tc.id, "toolu_01");
        assert_eq!(tc.name, "get_weather");
        assert!(tc.arguments.contains("Milano"));
    }

    #[test]
    fn test_convert_response_multiple_text_blocks() {
        let response = ClaudeResponse {
            content: vec![
                ClaudeContentBlock::Text {
                    text: "First part.".to_string(),
                },
                ClaudeContentBlock::Text {
                    text: "Second part.".to_string(),
                },
            ],
            usage: ClaudeUsage {
                input_tokens: 10,
                output_tokens: 10,
            },
            stop_reason: None,
        };

        assert_eq!(convert_response(response).content, "First part.\nSecond part.");
    }

    #[test]
    fn test_classify_api_error_typed() {
        let body = r#"{"error": {"type": "overloaded_error", "message": "busy"}}"#;
        let err = classify_api_error(529, body);
        assert!(matches!(err, ProviderError::Overloaded(_)));

        let body = r#"{"error": {"type": "authentication_error", "message": "bad key"}}"#;
        let err = classify_api_error(401, body);
        assert!(matches!(err, ProviderError::Auth(_)));

        let body = r#"{"error": {"type": "rate_limit_error", "message": "slow down"}}"#;
        let err = classify_api_error(429, body);
        assert!(matches!(err, ProviderError::RateLimit(_)));
    }

    #[test]
    fn test_classify_api_error_untyped_falls_back_to_status() {
        let err = classify_api_error(500, "<html>gateway</html>");
        assert!(matches!(err, ProviderError::ServerError(_)));
    }

    #[test]
    fn test_claude_request_serialization() {
        let request = ClaudeRequest {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 1000,
            messages: vec![ClaudeMessage {
                role: "user".to_string(),
                content: ClaudeContent::Text("Hello".to_string()),
            }],
            system: Some("You are helpful.".to_string()),
            tools: None,
            temperature: Some(0.7),
            top_p: None,
            stop_sequences: None,
            stream: None,
        };

        let json = serde_json::to_string(&request).unwrap();

        assert!(json.contains("max_tokens"));
        assert!(json.contains("You are helpful"));
        assert!(json.contains("temperature"));
        // Unset optional fields stay off the wire
        assert!(!json.contains("top_p"));
        assert!(!json.contains("stream"));
    }

    #[test]
    fn test_content_block_serialization() {
        let tool_use = ClaudeContentBlock::ToolUse {
            id: "call_1".to_string(),
            name: "calculator".to_string(),
            input: serde_json::json!({"expression": "2+2"}),
        };
        let json = serde_json::to_string(&tool_use).unwrap();
        assert!(json.contains(r#""type":"tool_use""#));
        assert!(json.contains(r#""id":"call_1""#));

        let tool_result = ClaudeContentBlock::ToolResult {
            tool_use_id: "call_1".to_string(),
            content: "4".to_string(),
            is_error: None,
        };
        let json = serde_json::to_string(&tool_result).unwrap();
        assert!(json.contains(r#""type":"tool_result""#));
        assert!(json.contains(r#""tool_use_id":"call_1""#));
        assert!(!json.contains("is_error"));
    }

    #[test]
    fn test_parse_sse_content_block_delta() {
        let data = r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Ciao"}}"#;
        let sse: SseEvent = serde_json::from_str(data).unwrap();
        assert_eq!(sse.event_type, "content_block_delta");
        assert_eq!(sse.delta.unwrap().text.as_deref(), Some("Ciao"));
    }

    #[test]
    fn test_parse_sse_tool_use_start() {
        let data = r#"{"type":"content_block_start","index":1,"content_block":{"type":"tool_use","id":"toolu_01","name":"get_weather","input":{}}}"#;
        let sse: SseEvent = serde_json::from_str(data).unwrap();
        let block = sse.content_block.unwrap();
        assert_eq!(block.block_type, "tool_use");
        assert_eq!(block.name.as_deref(), Some("get_weather"));
    }

    #[test]
    fn test_parse_sse_message_delta_with_usage() {
        let data = r#"{"type":"message_delta","delta":{"stop_reason":"end_turn"},"usage":{"output_tokens":42}}"#;
        let sse: SseEvent = serde_json::from_str(data).unwrap();
        assert_eq!(sse.usage.unwrap().output_tokens, Some(42));
    }

    #[test]
    fn test_empty_messages() {
        let (system, claude_messages) = convert_messages(vec![]);
        assert!(system.is_none());
        assert!(claude_messages.is_empty());
    }
}
