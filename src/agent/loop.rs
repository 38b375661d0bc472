//! Agent loop implementation
//!
//! This module provides the core agent loop: it appends the user's turn,
//! calls the completion provider, dispatches any requested tool calls, and
//! feeds the results back into the conversation until the model produces a
//! final answer (or the round ceiling is hit).

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::agent::context::ContextBuilder;
use crate::config::{AgentDefaults, Config};
use crate::error::{ProviderError, Result, ScribaError};
use crate::providers::{ChatOptions, LLMProvider, LLMToolCall, StreamEvent};
use crate::session::{Message, Session, ToolCall};
use crate::tools::{Tool, ToolRegistry, ToolResult};

/// An event on the caller-facing streaming channel.
///
/// A request's stream is a sequence of `Delta` text fragments terminated by
/// exactly one `Done` (carrying the final assistant text) or `Error`.
/// Tool activity between rounds produces no events; only human-facing text
/// is surfaced.
#[derive(Debug)]
pub enum AgentEvent {
    /// A fragment of assistant text, in emission order
    Delta(String),
    /// Terminal event: the request completed
    Done { final_text: String },
    /// Terminal event: the request failed; the conversation so far is kept
    Error(ScribaError),
}

/// The conversational agent: one session, one provider, one tool registry.
///
/// Processes one user request at a time (the session lock is held for the
/// whole request, nested tool rounds included). Within a round, independent
/// tool calls are dispatched concurrently; all results are collected and
/// appended before the next provider call.
///
/// # Example
///
/// ```rust,ignore
/// use scriba::agent::Agent;
/// use scriba::config::Config;
/// use scriba::providers::ClaudeProvider;
/// use scriba::tools::CalculatorTool;
///
/// let config = Config::load()?;
/// let provider = ClaudeProvider::new("api-key");
/// let agent = Agent::new(config, Box::new(provider));
/// agent.register_tool(Box::new(CalculatorTool)).await?;
///
/// let answer = agent.submit("Quanto fa il 15% di 1250?").await?;
/// ```
pub struct Agent {
    /// Loop defaults (model, token budget, round ceiling)
    defaults: AgentDefaults,
    /// The completion provider
    provider: Arc<dyn LLMProvider>,
    /// Registered tools
    tools: Arc<RwLock<ToolRegistry>>,
    /// Conversation state, serialized across requests by its lock
    session: Arc<Mutex<Session>>,
    /// System prompt and message assembly
    context_builder: ContextBuilder,
}

impl Agent {
    /// Create a new agent over the given provider.
    pub fn new(config: Config, provider: Box<dyn LLMProvider>) -> Self {
        let context_builder = match &config.agent.system_prompt {
            Some(prompt) => ContextBuilder::new().with_system_prompt(prompt),
            None => ContextBuilder::new(),
        };
        Self {
            defaults: config.agent,
            provider: Arc::from(provider),
            tools: Arc::new(RwLock::new(ToolRegistry::new())),
            session: Arc::new(Mutex::new(Session::new())),
            context_builder,
        }
    }

    /// Create a new agent with a custom context builder.
    pub fn with_context_builder(
        config: Config,
        provider: Box<dyn LLMProvider>,
        context_builder: ContextBuilder,
    ) -> Self {
        Self {
            defaults: config.agent,
            provider: Arc::from(provider),
            tools: Arc::new(RwLock::new(ToolRegistry::new())),
            session: Arc::new(Mutex::new(Session::new())),
            context_builder,
        }
    }

    /// Register a tool with the agent.
    ///
    /// Fails with [`ScribaError::DuplicateTool`] on a name collision.
    pub async fn register_tool(&self, tool: Box<dyn Tool>) -> Result<()> {
        let mut tools = self.tools.write().await;
        tools.register(tool)
    }

    /// Get the number of registered tools.
    pub async fn tool_count(&self) -> usize {
        self.tools.read().await.len()
    }

    /// Check if a tool is registered.
    pub async fn has_tool(&self, name: &str) -> bool {
        self.tools.read().await.has(name)
    }

    /// Submit a user message and block until the final answer.
    ///
    /// Runs the full tool loop. On a request-level failure the conversation
    /// up to that point is preserved, not rolled back.
    pub async fn submit(&self, user_text: &str) -> Result<String> {
        let request_id = Uuid::new_v4();
        let span = info_span!("request", request_id = %request_id);
        async {
            info!(text_len = user_text.len(), "Processing user request");
            let mut session = self.session.lock().await;
            session.add_message(Message::user(user_text));

            let options = self.chat_options();
            let mut rounds = 0usize;

            loop {
                let messages = self.context_builder.build_messages(&session.messages);
                let declarations = self.tools.read().await.declarations();

                let response = self
                    .provider
                    .chat(
                        messages,
                        declarations,
                        Some(&self.defaults.model),
                        options.clone(),
                    )
                    .await?;

                if !response.has_tool_calls() {
                    session.add_message(Message::assistant(&response.content));
                    info!(rounds, "Request completed");
                    return Ok(response.content);
                }

                if rounds >= self.defaults.max_tool_rounds {
                    warn!(
                        rounds,
                        "Round ceiling exhausted with tool calls still pending"
                    );
                    return Err(ScribaError::MaxRoundsExceeded {
                        rounds: self.defaults.max_tool_rounds,
                    });
                }
                rounds += 1;
                debug!(round = rounds, calls = response.tool_calls.len(), "Tool round");

                let calls = to_session_calls(&response.tool_calls);
                session.add_message(Message::assistant_with_tools(&response.content, calls.clone()));

                for result in self.dispatch_round(&calls).await {
                    session.add_message(Message::tool_result(
                        &result.call_id,
                        &result.content,
                        result.is_error,
                    ));
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Submit a user message and receive the answer incrementally.
    ///
    /// Returns immediately with a channel of [`AgentEvent`]s: text deltas
    /// as the model produces them, terminated by `Done` or `Error`. The
    /// loop still buffers each response fully before dispatching tools, so
    /// transitions are identical to [`Agent::submit`]. Dropping the
    /// receiver abandons the in-flight request.
    pub async fn submit_stream(&self, user_text: &str) -> mpsc::Receiver<AgentEvent> {
        let (tx, rx) = mpsc::channel::<AgentEvent>(32);

        let provider = Arc::clone(&self.provider);
        let tools = Arc::clone(&self.tools);
        let session = Arc::clone(&self.session);
        let context_builder = self.context_builder.clone();
        let defaults = self.defaults.clone();
        let options = self.chat_options();
        let user_text = user_text.to_string();

        tokio::spawn(async move {
            let request_id = Uuid::new_v4();
            let span = info_span!("request", request_id = %request_id, streaming = true);
            async {
                let mut session = session.lock().await;
                session.add_message(Message::user(&user_text));

                let mut rounds = 0usize;

                loop {
                    let messages = context_builder.build_messages(&session.messages);
                    let declarations = tools.read().await.declarations();

                    let mut stream = match provider
                        .chat_stream(messages, declarations, Some(&defaults.model), options.clone())
                        .await
                    {
                        Ok(stream) => stream,
                        Err(e) => {
                            let _ = tx.send(AgentEvent::Error(e)).await;
                            return;
                        }
                    };

                    // Drain the stream fully; tool-call structure is only
                    // known at the terminal event.
                    let mut content = String::new();
                    let mut tool_calls: Vec<LLMToolCall> = Vec::new();
                    let mut completed = false;

                    while let Some(event) = stream.recv().await {
                        match event {
                            StreamEvent::Delta(text) => {
                                content.push_str(&text);
                                if tx.send(AgentEvent::Delta(text)).await.is_err() {
                                    // Receiver dropped: request abandoned.
                                    return;
                                }
                            }
                            StreamEvent::ToolCalls(calls) => tool_calls = calls,
                            StreamEvent::Done { content: full, .. } => {
                                if !full.is_empty() {
                                    content = full;
                                }
                                completed = true;
                                break;
                            }
                            StreamEvent::Error(e) => {
                                let _ = tx.send(AgentEvent::Error(e)).await;
                                return;
                            }
                        }
                    }

                    if !completed {
                        let _ = tx
                            .send(AgentEvent::Error(ScribaError::Provider(
                                ProviderError::MalformedResponse(
                                    "stream ended without a completion event".to_string(),
                                ),
                            )))
                            .await;
                        return;
                    }

                    if tool_calls.is_empty() {
                        session.add_message(Message::assistant(&content));
                        info!(rounds, "Streaming request completed");
                        let _ = tx.send(AgentEvent::Done { final_text: content }).await;
                        return;
                    }

                    if rounds >= defaults.max_tool_rounds {
                        warn!(
                            rounds,
                            "Round ceiling exhausted with tool calls still pending"
                        );
                        let _ = tx
                            .send(AgentEvent::Error(ScribaError::MaxRoundsExceeded {
                                rounds: defaults.max_tool_rounds,
                            }))
                            .await;
                        return;
                    }
                    rounds += 1;
                    debug!(round = rounds, calls = tool_calls.len(), "Tool round");

                    let calls = to_session_calls(&tool_calls);
                    session.add_message(Message::assistant_with_tools(&content, calls.clone()));

                    let results = {
                        let tools = tools.read().await;
                        futures::future::join_all(calls.iter().map(|call| tools.dispatch(call)))
                            .await
                    };
                    for result in results {
                        session.add_message(Message::tool_result(
                            &result.call_id,
                            &result.content,
                            result.is_error,
                        ));
                    }
                }
            }
            .instrument(span)
            .await
        });

        rx
    }

    /// Read-only snapshot of the conversation history.
    ///
    /// The system prompt is not part of the history; it is prepended fresh
    /// on every provider call.
    pub async fn history(&self) -> Vec<Message> {
        self.session.lock().await.messages.clone()
    }

    /// Reset the conversation state to empty.
    pub async fn clear(&self) {
        self.session.lock().await.clear();
    }

    fn chat_options(&self) -> ChatOptions {
        ChatOptions::new()
            .with_max_tokens(self.defaults.max_tokens)
            .with_temperature(self.defaults.temperature)
    }

    /// Dispatch every call of one round concurrently and collect all
    /// results (in request order) before returning.
    async fn dispatch_round(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        let tools = self.tools.read().await;
        futures::future::join_all(calls.iter().map(|call| tools.dispatch(call))).await
    }
}

fn to_session_calls(calls: &[LLMToolCall]) -> Vec<ToolCall> {
    calls
        .iter()
        .map(|tc| ToolCall::new(&tc.id, &tc.name, &tc.arguments))
        .collect()
}
