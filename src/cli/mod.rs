//! CLI module — thin interactive glue over the agent library
//!
//! All CLI logic lives here; `main.rs` calls `cli::run()`. This layer only
//! reads lines, parses the few slash commands, and prints what the agent
//! streams back. All protocol logic lives in the library.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use scriba::agent::{Agent, AgentEvent};
use scriba::config::Config;
use scriba::providers::{ClaudeProvider, RetryProvider};
use scriba::session::Role;
use scriba::tools;

#[derive(Parser)]
#[command(name = "scriba")]
#[command(version)]
#[command(about = "Conversational AI assistant with tools", long_about = None)]
struct Cli {
    /// Model override (e.g. claude-sonnet-4-20250514)
    #[arg(long)]
    model: Option<String>,

    /// Disable incremental output
    #[arg(long)]
    no_stream: bool,

    /// Config file path (default: ~/.scriba/config.json)
    #[arg(long)]
    config: Option<PathBuf>,
}

const HELP_TEXT: &str = "\
Commands:
  /help      Show this help
  /history   Show the conversation so far
  /clear     Reset the conversation
  /exit      Quit (also: /quit, exit, quit)

Anything else is sent to the assistant.";

/// Entry point for the binary.
pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("scriba=warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    if let Some(model) = cli.model {
        config.agent.model = model;
    }

    let api_key = config.provider.api_key.clone().with_context(|| {
        format!(
            "no API key configured; set ANTHROPIC_API_KEY or add it to {:?}",
            Config::path()
        )
    })?;

    let mut claude = ClaudeProvider::new(&api_key);
    if let Some(base) = &config.provider.api_base {
        claude = claude.with_api_base(base);
    }
    let provider =
        RetryProvider::new(Box::new(claude)).with_max_retries(config.provider.max_retries);

    let agent = Agent::new(config.clone(), Box::new(provider));
    for tool in tools::default_tools(&config) {
        agent.register_tool(tool).await?;
    }

    println!("Scriba — type a message, or /help for commands.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }
        let input = line.trim();

        match input {
            "" => continue,
            "/help" => println!("{}\n", HELP_TEXT),
            "/clear" => {
                agent.clear().await;
                println!("Conversation cleared.\n");
            }
            "/history" => {
                print_history(&agent).await;
            }
            "/exit" | "/quit" | "exit" | "quit" => {
                println!("Goodbye!");
                break;
            }
            text => {
                if cli.no_stream {
                    match agent.submit(text).await {
                        Ok(answer) => println!("{}\n", answer),
                        Err(e) => eprintln!("Error: {}\n", e),
                    }
                } else {
                    stream_response(&agent, text).await;
                }
            }
        }
    }

    Ok(())
}

async fn stream_response(agent: &Agent, text: &str) {
    let mut rx = agent.submit_stream(text).await;
    let mut printed = false;

    while let Some(event) = rx.recv().await {
        match event {
            AgentEvent::Delta(fragment) => {
                print!("{}", fragment);
                let _ = io::stdout().flush();
                printed = true;
            }
            AgentEvent::Done { .. } => break,
            AgentEvent::Error(e) => {
                if printed {
                    println!();
                }
                eprintln!("Error: {}", e);
                break;
            }
        }
    }
    println!();
    println!();
}

async fn print_history(agent: &Agent) {
    let history = agent.history().await;
    if history.is_empty() {
        println!("(empty conversation)\n");
        return;
    }

    for message in &history {
        match message.role {
            Role::User => println!("you: {}", message.content),
            Role::Assistant => {
                if message.has_tool_calls() {
                    let names: Vec<_> = message
                        .tool_calls
                        .iter()
                        .flatten()
                        .map(|c| c.name.as_str())
                        .collect();
                    println!("assistant: [tools: {}] {}", names.join(", "), message.content);
                } else {
                    println!("assistant: {}", message.content);
                }
            }
            Role::Tool => {
                let preview: String = message.content.chars().take(80).collect();
                println!("  tool result ({}): {}", if message.is_error { "error" } else { "ok" }, preview);
            }
            Role::System => {}
        }
    }
    println!();
}
