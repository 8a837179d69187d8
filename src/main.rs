//! gemini-chat binary entry point.

use clap::Parser;
use gemini_chat::agent::ConversationAgent;
use gemini_chat::cli::{self, ChatArgs, Cli, Commands, ServeArgs};
use gemini_chat::config::ChatConfig;
use gemini_chat::server::{self, AppState};
use gemini_chat::session::{SessionStore, API_KEY_GUIDANCE};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Commands::Serve(_) => "info",
        Commands::Chat(_) => "warn",
    };
    cli::init_tracing(cli.log_level.as_deref(), default_level);

    let result = match ChatConfig::load(cli.config.as_deref()) {
        Ok(config) => match cli.command {
            Commands::Serve(args) => handle_serve(config, args).await,
            Commands::Chat(args) => handle_chat(config, args).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn handle_serve(mut config: ChatConfig, args: ServeArgs) -> gemini_chat::error::Result<()> {
    args.apply(&mut config);
    server::serve(AppState::new(config, SessionStore::default())).await
}

async fn handle_chat(mut config: ChatConfig, args: ChatArgs) -> gemini_chat::error::Result<()> {
    args.apply(&mut config)?;

    if !config.has_api_key() {
        println!("{API_KEY_GUIDANCE}");
        println!("Set GOOGLE_API_KEY (or add it to .env) and run again.");
        return Ok(());
    }

    let mut agent = ConversationAgent::from_config(&config)?;
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    cli::repl::run(
        &mut agent,
        config.system_prompt.as_deref(),
        !args.no_stream,
        stdin,
        &mut stdout,
    )
    .await
}
