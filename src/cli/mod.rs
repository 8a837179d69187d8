//! Command-line front-end.

pub mod repl;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::ChatConfig;
use crate::error::Result;
use crate::models::GeminiModel;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "GEMINI_CHAT_LOG";

/// Gemini chat CLI
#[derive(Parser, Debug)]
#[command(name = "gemini-chat", version, about = "Chat with Google Gemini in the browser or the terminal")]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter (e.g. info, debug, gemini_chat=trace); GEMINI_CHAT_LOG wins
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the web chat UI
    Serve(ServeArgs),
    /// Chat in the terminal
    Chat(ChatArgs),
}

/// Arguments for `gemini-chat serve`.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to listen on (default 127.0.0.1:8501)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Google API key (otherwise GOOGLE_API_KEY or the web form)
    #[arg(long)]
    pub api_key: Option<String>,
}

impl ServeArgs {
    pub fn apply(&self, config: &mut ChatConfig) {
        if let Some(ref bind) = self.bind {
            config.bind = bind.clone();
        }
        if let Some(ref key) = self.api_key {
            config.set_api_key(key);
        }
    }
}

/// Arguments for `gemini-chat chat`.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Model to use (gemini-2.0-flash, gemini-1.5-flash)
    #[arg(short, long)]
    pub model: Option<String>,

    /// System prompt, sent with the first message
    #[arg(short, long)]
    pub system: Option<String>,

    /// Temperature (0.0 - 2.0)
    #[arg(short, long)]
    pub temperature: Option<f64>,

    /// Max output tokens
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Wait for complete answers instead of streaming
    #[arg(long)]
    pub no_stream: bool,

    /// Google API key (otherwise GOOGLE_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,
}

impl ChatArgs {
    pub fn apply(&self, config: &mut ChatConfig) -> Result<()> {
        if let Some(ref model) = self.model {
            config.model = GeminiModel::parse(model)?;
        }
        if let Some(ref system) = self.system {
            config.system_prompt = Some(system.clone()).filter(|s| !s.trim().is_empty());
        }
        if let Some(t) = self.temperature {
            config.set_temperature(t)?;
        }
        if self.max_tokens.is_some() {
            config.max_output_tokens = self.max_tokens;
        }
        if let Some(ref key) = self.api_key {
            config.set_api_key(key);
        }
        Ok(())
    }
}

/// Install the global subscriber, logging to stderr.
pub fn init_tracing(level: Option<&str>, default_level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or(default_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
