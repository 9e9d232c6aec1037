use anyhow::{Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand};
use rusqlite::Connection;
use shared_types::{CommunicationHistoryResponse, Extractor, InputModality, InputRecord};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncReadExt;
use tracing_subscriber::prelude::*;

use agentcomm_agents::delegation::DEFAULT_HISTORY_LIMIT;
use agentcomm_agents::storage::run_migrations;
use agentcomm_agents::{
    AgentCommConfig, CalendarAgent, CommunicationStore, ConsentProvider, EmailAgent,
    SqliteCommunicationStore, StaticConsent, StdinConsent,
};
use extractors::EmailInfoExtractor;

#[derive(Parser, Debug)]
#[command(
    name = "agentcomm",
    version,
    about = "Extract event details from messages and delegate them to a calendar agent"
)]
struct Cli {
    /// Config file (defaults to <config dir>/agentcomm/config.toml)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH", global = true)]
    log_file_path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the extraction result as JSON
    Extract {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Extract, ask for consent and draft a calendar event
    Delegate {
        #[command(flatten)]
        input: InputArgs,

        /// Approve without prompting
        #[arg(long)]
        yes: bool,
    },
    /// Show recent agent communications, newest first
    History {
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: usize,
    },
}

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("input")
        .args(["text", "file", "eml_path"]),
))]
struct InputArgs {
    /// Message text
    #[arg(long)]
    text: Option<String>,

    /// Path to a plain text file
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Path to a .eml file
    #[arg(long, value_name = "PATH")]
    eml_path: Option<PathBuf>,

    /// How the text was captured: text, image (OCR) or audio (transcript)
    #[arg(long, default_value = "text")]
    modality: InputModality,
}

impl InputArgs {
    fn reads_stdin(&self) -> bool {
        self.text.is_none() && self.file.is_none() && self.eml_path.is_none()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file_path.as_deref());

    let (config, config_path) =
        AgentCommConfig::load(cli.config.as_deref()).context("Failed to load agentcomm config")?;
    tracing::debug!("Using config at {:?}", config_path);

    let extractor = EmailInfoExtractor::with_config(config.extractor.clone())
        .with_context(|| format!("Invalid extractor settings in {:?}", config_path))?;

    match cli.command {
        Command::Extract { input } => {
            let record = read_input(&input).await?;
            let result = extractor.extract(&record);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Delegate { input, yes } => {
            if !yes && input.reads_stdin() {
                return Err(anyhow::anyhow!(
                    "Interactive consent reads stdin; pass --text, --file or --eml-path, or use --yes"
                ));
            }

            let record = read_input(&input).await?;
            let store = open_store(&config)?;

            let email_agent = EmailAgent::new(extractor, store.clone(), config.delegation.clone());
            let (_, mut token) = email_agent.process(&record).await?;

            let consent: Arc<dyn ConsentProvider> = if yes {
                Arc::new(StaticConsent(true))
            } else {
                Arc::new(StdinConsent)
            };
            let calendar_agent = CalendarAgent::new(store, consent);

            let output = if calendar_agent.request_access(&mut token).await? {
                let event = calendar_agent.create_event(&mut token).await?;
                serde_json::json!({ "token": token, "calendar_event": event })
            } else {
                tracing::warn!(token_id = %token.id, "Calendar access denied");
                serde_json::json!({ "token": token, "calendar_event": null })
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::History { limit } => {
            let store = open_store(&config)?;
            let calendar_agent = CalendarAgent::new(store, Arc::new(StaticConsent(false)));

            let response = CommunicationHistoryResponse {
                communications: calendar_agent.history(limit).await,
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

fn init_tracing(log_file_path: Option<&str>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = log_file_path {
        let log_path = Path::new(log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("agentcomm.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init();
    }
}

async fn read_input(input: &InputArgs) -> Result<InputRecord> {
    let content = match (&input.text, &input.file, &input.eml_path) {
        (Some(text), None, None) => text.clone(),
        (None, Some(path), None) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file at {:?}", path))?,
        (None, None, Some(path)) => load_email_from_eml(path)?,
        (None, None, None) => {
            let mut buffer = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buffer)
                .await
                .context("Failed to read message from stdin")?;
            buffer
        }
        _ => unreachable!("clap enforces at most one input"),
    };

    Ok(InputRecord::new(content, input.modality))
}

/// Render the headers the extractor understands above the body text
fn load_email_from_eml(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read .eml file at {:?}", path))?;
    let parser = mail_parser::MessageParser::default();
    let parsed = parser
        .parse(&bytes)
        .ok_or_else(|| anyhow::anyhow!("Failed to parse .eml file"))?;

    let from = parsed
        .from()
        .and_then(|address| address.first())
        .map(|addr| match (addr.name(), addr.address()) {
            (Some(name), Some(address)) => format!("{} <{}>", name, address),
            (None, Some(address)) => address.to_string(),
            (Some(name), None) => name.to_string(),
            (None, None) => String::new(),
        })
        .unwrap_or_default();
    let subject = parsed.subject().map(|s| s.to_string()).unwrap_or_default();
    let body = parsed
        .body_text(0)
        .map(|s| s.to_string())
        .or_else(|| parsed.body_html(0).map(|s| s.to_string()))
        .ok_or_else(|| anyhow::anyhow!("Email has no body text or HTML"))?;

    Ok(format!("From: {}\nSubject: {}\n\n{}", from, subject, body))
}

fn open_store(config: &AgentCommConfig) -> Result<Arc<dyn CommunicationStore>> {
    let db_path = config.resolve_db_path()?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory {:?}", parent))?;
    }

    let conn = Connection::open(&db_path)
        .with_context(|| format!("Failed to open db at {:?}", db_path))?;
    run_migrations(&conn).context("Failed to run database migrations")?;
    tracing::debug!("Database ready at {:?}", db_path);

    Ok(Arc::new(SqliteCommunicationStore::new(Arc::new(Mutex::new(conn)))))
}
