//! gemini-chat: a small chat front-end over the Google Gemini API.
//!
//! The interesting part is [`agent::ConversationAgent`]: it owns the turn
//! history and rebuilds the complete message list on every call, because the
//! remote API keeps no conversation state. The web UI ([`server`]) and the
//! terminal REPL ([`cli`]) are thin front-ends over it.
//!
//! # Quick Start
//!
//! ```no_run
//! use gemini_chat::prelude::*;
//!
//! # async fn example() -> gemini_chat::error::Result<()> {
//! let config = ChatConfig::from_env()?;
//! let mut agent = ConversationAgent::from_config(&config)?;
//!
//! let reply = agent.send("Hi", Some("Be terse")).await;
//! println!("{}", reply.text);
//! if let Some(usage) = reply.usage {
//!     println!("{usage}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod models;
pub mod prelude;
pub mod provider;
pub mod session;
pub mod types;
pub mod util;

#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "cli")]
pub mod cli;
