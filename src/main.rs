use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::fmt::Display;
use std::io::{self, StdoutLock, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use auditor_dashboard::app::App;
use auditor_dashboard::config::AppConfig;
use auditor_dashboard::dashboard::relative_time;
use auditor_dashboard::detail::{format_confidence, format_timestamp, history_versions};
use auditor_dashboard::knowledge::{KnowledgeBase, UploadPolicy};
use auditor_dashboard::logging::{init_logging, OperationTimer};
use auditor_dashboard::models::{ConfidenceRange, DateRange, KnowledgeItem, KnowledgeTypeFilter, Message, MessageStatus};
use auditor_dashboard::queue::MessageQueue;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Auditor whose queue and knowledge base to use
    #[arg(long, global = true)]
    auditor: Option<String>,

    /// Extra configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show counts, recent activity and quick actions
    Dashboard,
    /// Review AI-generated responses
    Messages {
        #[command(subcommand)]
        action: MessageCommand,
    },
    /// Manage the knowledge base
    Knowledge {
        #[command(subcommand)]
        action: KnowledgeCommand,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Args)]
struct ListArgs {
    /// Tab to open (pending, later, approved, rejected)
    #[arg(short, long, default_value = "pending")]
    status: MessageStatus,

    /// Case-insensitive search over question and response
    #[arg(long)]
    search: Option<String>,

    /// Lowest confidence to show (0.0 to 1.0)
    #[arg(long)]
    min_confidence: Option<f64>,

    /// Highest confidence to show (0.0 to 1.0)
    #[arg(long)]
    max_confidence: Option<f64>,

    /// Only messages created at or after this RFC 3339 time
    #[arg(long)]
    since: Option<DateTime<Utc>>,

    /// Only messages created at or before this RFC 3339 time
    #[arg(long)]
    until: Option<DateTime<Utc>>,
}

#[derive(Subcommand)]
enum MessageCommand {
    /// List messages of one status tab
    List(ListArgs),
    /// Show one message with its history
    Show { id: String },
    /// Approve a response
    Approve { id: String },
    /// Reject a response
    Reject { id: String },
    /// Defer a message for later
    Later { id: String },
    /// Regenerate a response with guidance
    Regenerate {
        id: String,

        /// How the new response should differ
        #[arg(short, long)]
        guidance: String,
    },
}

#[derive(Subcommand)]
enum KnowledgeCommand {
    /// List knowledge items
    List {
        /// Item type (all, file, text)
        #[arg(short = 't', long = "type", default_value = "all")]
        item_type: KnowledgeTypeFilter,

        /// Case-insensitive search over text content and filename
        #[arg(long)]
        search: Option<String>,
    },
    /// Add a free-text entry
    AddText { text: String },
    /// Upload a file
    Upload {
        path: PathBuf,

        /// Accepted extensions, overriding configuration (e.g. .pdf,.docx)
        #[arg(long, value_delimiter = ',')]
        accept: Option<Vec<String>>,
    },
    /// Replace the content of a text item or plain-text file
    Edit {
        id: String,

        #[arg(short, long)]
        content: String,
    },
    /// Delete an item
    Delete { id: String },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration as YAML
    Show,
}

/// Command output on stdout, as text or JSON
struct Output {
    json: bool,
    out: StdoutLock<'static>,
}

impl Output {
    fn new(json: bool) -> Self {
        Self { json, out: io::stdout().lock() }
    }

    fn value<T: Serialize>(&mut self, value: &T) -> Result<()> {
        writeln!(self.out, "{}", serde_json::to_string_pretty(value)?)?;
        Ok(())
    }

    fn line(&mut self, text: impl Display) -> Result<()> {
        writeln!(self.out, "{text}")?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(auditor) = &cli.auditor {
        config.auditor.id.clone_from(auditor);
    }

    // Initialize logging; the guard flushes the log file on exit
    let log_level = config.get_log_level();
    let _guard = init_logging(
        Some(log_level.as_str()),
        config.logging.file_path.as_deref().map(Path::new),
        config.logging.format == "json",
    )?;

    info!(auditor = %config.auditor.id, use_mock = config.api.use_mock, "Starting auditor dashboard");

    let app = App::from_config(config)?;
    let mut out = Output::new(cli.json);
    let timer = OperationTimer::new("command");

    match cli.command {
        Commands::Dashboard => show_dashboard(&app, &mut out).await?,
        Commands::Messages { action } => run_message_command(&app, action, &mut out).await?,
        Commands::Knowledge { action } => run_knowledge_command(&app, action, &mut out).await?,
        Commands::Config { action: ConfigCommand::Show } => out.line(app.config().to_yaml()?.trim_end())?,
    }

    timer.finish();
    let metrics = app.client().metrics();
    debug!(
        calls = metrics.calls_total(),
        errors = metrics.errors_total(),
        rejections = metrics.rejections_total(),
        "API call summary"
    );

    Ok(())
}

/// Dashboard counts, activity and quick actions
async fn show_dashboard(app: &App, out: &mut Output) -> Result<()> {
    let summary = app.dashboard().await?;
    if out.json {
        return out.value(&summary);
    }

    let now = Utc::now();
    out.line("Messages")?;
    for status in MessageStatus::ALL {
        out.line(format!("  {:<9} {}", status.label(), summary.counts.get(status)))?;
    }

    out.line("\nRecent activity")?;
    if summary.activity.is_empty() {
        out.line("  No recent activity")?;
    }
    for item in &summary.activity {
        out.line(format!("  {} ({})", item.action, relative_time(item.timestamp, now)))?;
    }

    out.line("\nQuick actions")?;
    for action in &summary.actions {
        match action.route {
            Some(route) => out.line(format!("  {:<16} {}", action.label, route.path()))?,
            None => out.line(format!("  {:<16} coming soon", action.label))?,
        }
    }
    Ok(())
}

async fn run_message_command(app: &App, command: MessageCommand, out: &mut Output) -> Result<()> {
    match command {
        MessageCommand::List(args) => list_messages(app, args, out).await,
        MessageCommand::Show { id } => {
            let queue = open_message(app, &id).await?;
            let state = queue.state().await;
            let message = state.detail().ok_or_else(|| anyhow!("Message {id} not loaded"))?;
            print_message(message, out)
        }
        MessageCommand::Approve { id } => change_status(app, &id, MessageStatus::Approved, out).await,
        MessageCommand::Reject { id } => change_status(app, &id, MessageStatus::Rejected, out).await,
        MessageCommand::Later { id } => change_status(app, &id, MessageStatus::Later, out).await,
        MessageCommand::Regenerate { id, guidance } => {
            let queue = open_message(app, &id).await?;
            queue.regenerate(&guidance).await;
            let state = queue.state().await;
            if let Some(error) = state.refinement().error() {
                bail!("{error}");
            }
            let message = state.detail().ok_or_else(|| anyhow!("Message {id} not loaded"))?;
            print_message(message, out)
        }
    }
}

async fn list_messages(app: &App, args: ListArgs, out: &mut Output) -> Result<()> {
    let queue = app.messages(args.status).await;
    let mut state = queue.state().await;
    if let Some(error) = state.list_error() {
        bail!("{error}");
    }
    if let Some(search) = args.search {
        state.set_search(search);
    }
    if args.min_confidence.is_some() || args.max_confidence.is_some() {
        let range = ConfidenceRange::new(args.min_confidence.unwrap_or(0.0), args.max_confidence.unwrap_or(1.0))?;
        state.set_confidence_range(Some(range));
    }
    if args.since.is_some() || args.until.is_some() {
        state.set_date_range(Some(DateRange { start: args.since, end: args.until }));
    }

    let summaries = state.summaries(Utc::now());
    if out.json {
        return out.value(&summaries);
    }
    if let Some(empty) = state.empty_text() {
        return out.line(empty);
    }
    for summary in summaries {
        out.line(format!("[{}] {} ({}, {})", summary.id, summary.question, summary.confidence, summary.updated))?;
    }
    Ok(())
}

/// Queue with `id` selected and its details loaded
async fn open_message(app: &App, id: &str) -> Result<MessageQueue> {
    let queue = MessageQueue::new(app.client().clone(), app.auditor_id());
    queue.select_message(id).await;
    if let Some(error) = queue.state().await.detail_error() {
        bail!("{error}");
    }
    Ok(queue)
}

async fn change_status(app: &App, id: &str, target: MessageStatus, out: &mut Output) -> Result<()> {
    let queue = open_message(app, id).await?;
    queue.update_status(target).await?;

    let state = queue.state().await;
    if let Some(error) = state.action_error() {
        bail!("{error}");
    }
    let message = state.detail().ok_or_else(|| anyhow!("Message {id} not loaded"))?;
    print_message(message, out)
}

fn print_message(message: &Message, out: &mut Output) -> Result<()> {
    if out.json {
        return out.value(message);
    }

    out.line(format!("Message {} [{}]", message.id, message.status))?;
    out.line(format!("Customer:   {}", message.customer_id))?;
    out.line(format!("Confidence: {}", format_confidence(message.confidence)))?;
    out.line(format!("Created:    {}", format_timestamp(message.created_at)))?;
    out.line(format!("Updated:    {}", format_timestamp(message.updated_at)))?;
    out.line(format!("\nQuestion\n  {}", message.question))?;
    out.line(format!("\nResponse\n  {}", message.response))?;

    let versions = history_versions(message);
    if !versions.is_empty() {
        out.line("\nHistory")?;
        for version in versions {
            out.line(format!("  Version {} ({}, {})", version.version, version.confidence, version.created_at))?;
            out.line(format!("    {}", version.response))?;
        }
    }
    Ok(())
}

async fn run_knowledge_command(app: &App, command: KnowledgeCommand, out: &mut Output) -> Result<()> {
    match command {
        KnowledgeCommand::List { item_type, search } => {
            let page = app.knowledge().await;
            let mut state = page.state().await;
            if let Some(error) = state.load_error() {
                bail!("{error}");
            }
            state.set_type_filter(item_type);
            if let Some(search) = search {
                state.set_search(search);
            }

            let visible = state.visible_items();
            if out.json {
                return out.value(&visible);
            }
            if visible.is_empty() {
                return out.line("No knowledge items found");
            }
            for item in visible {
                print_item_line(item, out)?;
            }
            Ok(())
        }
        KnowledgeCommand::AddText { text } => {
            let page = app.knowledge().await;
            if !page.add_text(&text).await {
                let state = page.state().await;
                bail!("{}", state.text_error().unwrap_or("Knowledge entry cannot be empty"));
            }
            print_last_item(&page, out).await
        }
        KnowledgeCommand::Upload { path, accept } => {
            let policy = accept.map_or_else(|| UploadPolicy::from_config(&app.config().knowledge), UploadPolicy::new);
            let page = KnowledgeBase::open(app.client().clone(), app.auditor_id(), policy).await;
            if !page.upload_path(&path).await? {
                let state = page.state().await;
                bail!("{}", state.upload_error().unwrap_or("Upload was not applied"));
            }
            print_last_item(&page, out).await
        }
        KnowledgeCommand::Edit { id, content } => {
            let page = app.knowledge().await;
            if !page.open_item(&id).await {
                bail!("Knowledge item {id} does not exist or cannot be edited");
            }
            if !page.save_dialog(&content).await {
                let state = page.state().await;
                bail!("{}", state.dialog().and_then(|d| d.error()).unwrap_or("Save was not applied"));
            }
            let state = page.state().await;
            let item = state.items().iter().find(|item| item.id == id).ok_or_else(|| anyhow!("Item {id} vanished"))?;
            print_item(item, out)
        }
        KnowledgeCommand::Delete { id } => {
            let page = app.knowledge().await;
            if !page.delete(&id).await {
                let state = page.state().await;
                bail!("{}", state.delete_error().unwrap_or("Delete was not applied"));
            }
            if out.json {
                return out.value(&serde_json::json!({ "deleted": id }));
            }
            out.line(format!("Deleted {id}"))
        }
    }
}

async fn print_last_item(page: &KnowledgeBase, out: &mut Output) -> Result<()> {
    let state = page.state().await;
    let item = state.items().last().ok_or_else(|| anyhow!("No item was added"))?;
    print_item(item, out)
}

fn print_item_line(item: &KnowledgeItem, out: &mut Output) -> Result<()> {
    let marker = if item.is_editable() { "" } else { " (read-only)" };
    out.line(format!("[{}] {:<4} {}{marker}", item.id, item.item_type, item.title()))
}

fn print_item(item: &KnowledgeItem, out: &mut Output) -> Result<()> {
    if out.json {
        return out.value(item);
    }
    print_item_line(item, out)?;
    if let Some(text) = item.content.as_text() {
        out.line(format!("  {text}"))?;
    }
    Ok(())
}
