use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use supportbot::app::ChatApp;
use supportbot::{logging, tui, ChatSession, CompletionClient, Config, LlmClient, SubmitOutcome};

#[derive(Parser)]
#[command(name = "supportbot")]
#[command(version)]
#[command(about = "AI customer support in your terminal", long_about = None)]
struct Cli {
    /// Model identifier, overrides the configured one
    #[arg(long, global = true)]
    model: Option<String>,

    /// Config file to use instead of ~/.supportbot/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat (default)
    Chat,
    /// Ask a single question and print the answer
    Ask { question: String },
    /// Write a default config file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(model) = cli.model {
        config.model = model;
    }

    if let Err(e) = logging::init(&config.home) {
        eprintln!("⚠️  Logging disabled: {e:#}");
    }

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(config).await,
        Commands::Ask { question } => ask(config, &question).await,
        Commands::Init => init_config(&config, cli.config.as_deref()),
    }
}

async fn run_chat(config: Config) -> Result<()> {
    if !config.has_api_key() {
        warn!(env = %config.api_key_env, "no API key configured");
    }
    info!(model = %config.model, endpoint = %config.endpoint, "starting chat");

    let client: Arc<dyn CompletionClient> = Arc::new(LlmClient::new(&config)?);
    let mut app = ChatApp::new(
        config.effective_system_prompt(),
        client,
        config.ui.show_welcome,
    );

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = app.run(&mut terminal).await;
    tui::restore()?;

    result
}

async fn ask(config: Config, question: &str) -> Result<()> {
    let client = LlmClient::new(&config)?;
    let mut session = ChatSession::new(config.effective_system_prompt());

    match session.submit(question, &client).await {
        SubmitOutcome::Replied => {
            if let Some(reply) = session.transcript().last() {
                println!("{}", reply.content);
            }
            Ok(())
        }
        SubmitOutcome::Failed(e) => {
            eprintln!("❌ {}", e.user_message());
            std::process::exit(1);
        }
        SubmitOutcome::Rejected => {
            eprintln!("❌ Nothing to ask. Pass a non-empty question.");
            std::process::exit(2);
        }
    }
}

fn init_config(config: &Config, explicit: Option<&Path>) -> Result<()> {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.config_path());
    if path.exists() {
        println!("📄 Config already exists at {}", path.display());
        return Ok(());
    }

    config.save_to(&path)?;
    println!("✅ Wrote default config to {}", path.display());
    println!(
        "   Set your API key there or export {}.",
        config.api_key_env
    );
    Ok(())
}
