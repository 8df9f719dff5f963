use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use antenatal_assistant::{
    config::{Config, LogFormat},
    console::{Console, MISSING_KEY_WARNING},
    feedback::{FeedbackEntry, FeedbackLedger},
    Session, SessionState,
};

/// Antenatal nutrition chat assistant
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start an interactive chat session (default)
    Chat,

    /// Answer a single question and exit
    Ask {
        /// The question to answer
        question: String,

        /// Extra clinician guidance appended after the default entry
        #[arg(long = "feedback")]
        feedback: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        model = %config.agent.model,
        guardrails = config.guardrails.enabled,
        "Antenatal assistant starting..."
    );

    if !config.has_api_key() {
        warn!("OPENAI_API_KEY not set; remote calls will fail");
    }

    let session = match Session::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Failed to initialize OpenAI client");
            return Err(e.into());
        }
    };

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let mut state = SessionState::new();
            let console = Console::new(&session).warn_missing_key(!config.has_api_key());
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            console.run(&mut state, stdin, tokio::io::stdout()).await?;
            info!(session_id = %state.id(), turns = state.transcript().len(), "Session ended");
        }
        Commands::Ask { question, feedback } => {
            if !config.has_api_key() {
                eprintln!("{}", MISSING_KEY_WARNING);
            }
            let mut ledger = FeedbackLedger::new();
            for text in feedback {
                ledger.append(FeedbackEntry::new(text));
            }
            let mut state = SessionState::with_ledger(ledger);
            let reply = session.ask(&mut state, &question).await.unwrap_or_default();
            println!("{}", reply);
            if reply.starts_with("Error: ") {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Initialize tracing/logging on stderr so stdout stays a clean transcript
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
