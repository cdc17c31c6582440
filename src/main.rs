//! Tallybot CLI entry point.
//!
//! Ships a deliberately thin line-oriented transport for local use: plain
//! lines become message events, lines prefixed with `!` become structured
//! actions, and `@<path>` attaches a file as a document answer.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tallybot::domain::models::{Document, InboundEvent};
use tallybot::services::clock::SystemClock;
use tallybot::{ConfigLoader, Dispatcher, DomainResult, LedgerStore, ReplySink, Services, TaskService, UserService};

#[derive(Parser)]
#[command(name = "tallybot", about = "Conversational productivity tracker", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and apply migrations
    Init,
    /// Interactive chat session on stdin/stdout
    Chat {
        /// Transport user id to act as
        #[arg(long, default_value_t = 1)]
        user: i64,
    },
}

struct StdoutSink;

#[async_trait]
impl ReplySink for StdoutSink {
    async fn answer(&self, text: &str) -> DomainResult<()> {
        println!("< {}", text.replace('\n', "\n< "));
        Ok(())
    }

    async fn answer_document(&self, file_name: &str, content: &str) -> DomainResult<()> {
        println!("< [document: {file_name}]");
        println!("{content}");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::load()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            tallybot::create_pool(&config.database.path, config.database.max_connections).await?;
            println!("Initialized database at {}", config.database.path);
            Ok(())
        }
        Commands::Chat { user } => chat(config, user).await,
    }
}

async fn chat(config: tallybot::Config, chat_user_id: i64) -> anyhow::Result<()> {
    let pool = tallybot::create_pool(&config.database.path, config.database.max_connections).await?;
    let store = LedgerStore::new(pool);
    let clock = Arc::new(SystemClock);

    let services = Arc::new(Services {
        tasks: TaskService::new(store.clone(), clock.clone(), config.tracker.clone()),
        users: UserService::new(store, clock),
    });
    let dispatcher = Arc::new(Dispatcher::new(services)?);

    let sink = Arc::new(StdoutSink);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("tallybot ready; try `/start`. `quit` exits.");
    while let Some(line) = lines.next_line().await.context("stdin read failed")? {
        let line = line.trim().to_string();

        let event = if line.is_empty() {
            continue;
        } else if line == "quit" {
            break;
        } else if let Some(data) = line.strip_prefix('!') {
            InboundEvent::Action { chat_user_id, data: data.trim().to_string() }
        } else if let Some(path) = line.strip_prefix('@') {
            let path = path.trim();
            let content = tokio::fs::read(path)
                .await
                .with_context(|| format!("cannot read {path}"))?;
            InboundEvent::Message {
                chat_user_id,
                text: String::new(),
                document: Some(Document {
                    file_name: path.to_string(),
                    mime_type: if path.ends_with(".json") {
                        "application/json".to_string()
                    } else {
                        "application/octet-stream".to_string()
                    },
                    content,
                }),
            }
        } else {
            InboundEvent::Message { chat_user_id, text: line, document: None }
        };

        dispatcher.dispatch(event, sink.as_ref()).await;
    }

    dispatcher
        .drain(Duration::from_secs(config.tracker.drain_grace_seconds))
        .await;
    Ok(())
}
