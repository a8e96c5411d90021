#![forbid(unsafe_code)]

//! `audittrail` command-line client

use anyhow::{bail, Context, Result};
use audittrail_client::logging::{init_tracing, LogFormat};
use audittrail_client::resources::HTML_REPORT_FALLBACK;
use audittrail_client::{AuditTrail, ClientConfig, Download};
use audittrail_model::{Case, CaseFilters, CaseId, CaseStatus, EventId, ReportFormat, ReportMode, TimelineEvent};
use audittrail_views::{display, timeline_completeness, Completeness, CompletenessScore};
use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "audittrail")]
#[command(about = "AuditTrail case-management client")]
#[command(
    after_help = "Environment:\n  AUDITTRAIL_BASE_URL       API base URL\n  AUDITTRAIL_TOKEN_FILE     Session token file\n  AUDITTRAIL_TIMEOUT_SECS   Request timeout\n  AUDITTRAIL_UNDO_GRACE_MS  Undo window for deletes\n  RUST_LOG                  Log filter"
)]
struct Cli {
    /// Config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Session token file
    #[arg(long, global = true)]
    token_file: Option<PathBuf>,
    /// Print JSON instead of text
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    /// Log as JSON lines
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,
    /// More log output (-v debug, -vv trace)
    #[arg(long, short, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session token
    Login {
        username: String,
        #[arg(long, env = "AUDITTRAIL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List, inspect and move cases
    Cases {
        #[command(subcommand)]
        command: CasesCommand,
    },
    /// Timeline events of a case
    Events {
        #[command(subcommand)]
        command: EventsCommand,
    },
    /// Completeness of a case and its timeline
    Completeness { case: String },
    /// Download a report
    Report {
        case: String,
        #[arg(long, value_enum, default_value_t = ReportKind::Html)]
        format: ReportKind,
        #[arg(long, default_value = "timeline")]
        mode: ReportMode,
        /// Output directory
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
enum CasesCommand {
    /// Cases matching the filters, one page at a time
    List {
        #[arg(long, default_value = "")]
        status: String,
        #[arg(long, default_value = "")]
        audit_type: String,
        #[arg(long, default_value = "")]
        assignee: String,
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value_t = 0)]
        offset: u32,
        #[arg(long, default_value_t = CaseFilters::PAGE_SIZE)]
        limit: u32,
    },
    /// Details and available actions of one case
    Show {
        id: String,
    },
    /// Move a case along its lifecycle
    Transition {
        id: String,
        status: CaseStatus,
    },
}

#[derive(Subcommand)]
enum EventsCommand {
    /// Events of a case in chronological order
    List {
        case: String,
    },
    /// Delete an event; press Enter within the undo window to keep it
    Delete {
        case: String,
        event: String,
        /// Skip the undo window
        #[arg(long, default_value_t = false)]
        now: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportKind {
    Html,
    Pdf,
    Docx,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.verbose > 0 && std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", if cli.verbose > 1 { "audittrail=trace" } else { "audittrail=debug" });
    }
    init_tracing(if cli.log_json { LogFormat::Json } else { LogFormat::Pretty });

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let config = match &cli.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };
    let mut config = config.merge_env(|var| std::env::var(var).ok())?;
    if let Some(url) = &cli.base_url {
        config = config.with_base_url(url.clone());
    }
    if let Some(path) = &cli.token_file {
        config = config.with_token_file(path.clone());
    }
    if config.token_file.is_none() {
        if let Some(home) = std::env::var_os("HOME") {
            config = config.with_token_file(PathBuf::from(home).join(".audittrail").join("session.json"));
        }
    }
    debug!(base_url = %config.base_url, token_file = ?config.token_file, "configuration loaded");
    Ok(config)
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let app = AuditTrail::from_config(&config).context("failed to build client")?;
    let json = cli.json;

    match cli.command {
        Commands::Login { username, password } => {
            let identity = app.session().login(&username, &password).await?;
            emit(json, json!(identity), || format!("Signed in as {}", identity.full_name));
        }
        Commands::Logout => {
            app.session().logout();
            emit(json, json!({"signed_out": true}), || "Signed out".to_string());
        }
        Commands::Whoami => {
            let Some(identity) = app.session().initialize().await else {
                bail!("not signed in");
            };
            emit(json, json!(identity), || format!("{} ({})", identity.full_name, identity.username));
        }
        Commands::Cases { command } => cases(&app, json, command).await?,
        Commands::Events { command } => events(&app, json, command).await?,
        Commands::Completeness { case } => completeness(&app, json, &CaseId::new(case)).await?,
        Commands::Report {
            case,
            format,
            mode,
            output,
        } => {
            let case_id = CaseId::new(case);
            let (download, fallback) = match format {
                ReportKind::Html => (app.reports().html(&case_id).await?, HTML_REPORT_FALLBACK.to_string()),
                ReportKind::Pdf => (
                    app.reports().generate(&case_id, ReportFormat::Pdf, mode).await?,
                    ReportFormat::Pdf.fallback_filename(),
                ),
                ReportKind::Docx => (
                    app.reports().generate(&case_id, ReportFormat::Docx, mode).await?,
                    ReportFormat::Docx.fallback_filename(),
                ),
            };
            let path = save(&download, &output, &fallback).await?;
            emit(json, json!({"path": path, "bytes": download.bytes.len()}), || {
                format!("Saved {}", path.display())
            });
        }
    }
    Ok(())
}

async fn cases(app: &AuditTrail, json: bool, command: CasesCommand) -> Result<()> {
    match command {
        CasesCommand::List {
            status,
            audit_type,
            assignee,
            search,
            offset,
            limit,
        } => {
            let filters = CaseFilters::initial()
                .with_status(status)
                .with_audit_type(audit_type)
                .with_assignee(assignee)
                .with_search(search)
                .with_offset(offset)
                .with_limit(limit);
            let page = app.cases().list(&filters).await?;
            emit(json, json!(page), || {
                let mut out: Vec<String> = page.items.iter().map(case_line).collect();
                out.push(format!(
                    "{} of {} cases (offset {})",
                    page.items.len(),
                    page.total,
                    page.offset
                ));
                out.join("\n")
            });
        }
        CasesCommand::Show { id } => {
            let case = require_case(app, &CaseId::new(id)).await?;
            emit(json, json!(case), || {
                let mut out = vec![
                    display::case_heading(&case),
                    format!("Status:     {}", case.status),
                    format!("Type:       {}", display::audit_type_name(case.audit_type.as_ref())),
                    format!("Assignee:   {}", display::assignee_name(case.assigned_to.as_ref())),
                    format!("Created by: {}", display::creator_name(case.created_by.as_ref())),
                    format!("Updated:    {}", display::relative_time(case.updated_at, Utc::now())),
                ];
                let actions: Vec<String> = case
                    .status
                    .transitions()
                    .iter()
                    .map(|t| format!("{} -> {}", t.label, t.target))
                    .collect();
                out.push(format!("Actions:    {}", actions.join(", ")));
                out.join("\n")
            });
        }
        CasesCommand::Transition { id, status } => {
            let case = require_case(app, &CaseId::new(id)).await?;
            let updated = app.cases().transition(&case, status).await?;
            emit(json, json!(updated), || {
                format!("{} is now {}", display::case_heading(&updated), updated.status)
            });
        }
    }
    Ok(())
}

async fn events(app: &AuditTrail, json: bool, command: EventsCommand) -> Result<()> {
    match command {
        EventsCommand::List { case } => {
            let list = app
                .events()
                .list(&CaseId::new(case))
                .await?
                .context("case id must not be empty")?;
            emit(json, json!(list), || {
                let mut out: Vec<String> = list.items.iter().map(event_line).collect();
                out.push(format!("{} events", list.total));
                out.join("\n")
            });
        }
        EventsCommand::Delete { case, event, now } => {
            let timeline = app.timeline(CaseId::new(case));
            timeline.events().await?.context("case id must not be empty")?;
            let event_id = EventId::new(event);
            if !timeline.delete(&event_id).await {
                bail!("event {event_id} not found");
            }

            let undone = if now { false } else { wait_for_undo(timeline.grace()).await };
            if undone && timeline.undo().await {
                emit(json, json!({"event_id": event_id, "deleted": false}), || "Delete undone".to_string());
            } else {
                timeline.flush().await;
                emit(json, json!({"event_id": event_id, "deleted": true}), || {
                    format!("Deleted event {event_id}")
                });
            }
        }
    }
    Ok(())
}

/// True when a line arrives on stdin before `grace` runs out
async fn wait_for_undo(grace: Duration) -> bool {
    eprintln!("Press Enter within {}s to undo", grace.as_secs());
    let mut line = String::new();
    let mut stdin = BufReader::new(tokio::io::stdin());
    tokio::select! {
        read = stdin.read_line(&mut line) => matches!(read, Ok(n) if n > 0),
        () = tokio::time::sleep(grace) => false,
    }
}

async fn completeness(app: &AuditTrail, json: bool, case_id: &CaseId) -> Result<()> {
    let case = require_case(app, case_id).await?;
    let events = app.events().list(case_id).await?.map(|l| l.items).unwrap_or_default();
    let case_score = case.completeness();
    let timeline_score = timeline_completeness(&events);

    emit(
        json,
        json!({
            "case": case_score,
            "case_fields": case.field_statuses(),
            "timeline": timeline_score,
        }),
        || {
            let mut out = vec![format!("{}  {}", display::case_heading(&case), score_line(&case_score))];
            out.extend(
                case.field_statuses()
                    .iter()
                    .filter(|f| !f.filled)
                    .map(|f| format!("  missing {}{}", f.label, if f.required { " (required)" } else { "" })),
            );
            out.push(format!("Timeline  {}", score_line(&timeline_score)));
            for event in &events {
                out.push(format!("  {}  {}", event_line(event), score_line(&event.completeness())));
            }
            out.join("\n")
        },
    );
    Ok(())
}

async fn require_case(app: &AuditTrail, id: &CaseId) -> Result<Case> {
    app.cases()
        .get(id)
        .await?
        .with_context(|| format!("case id must not be empty: '{id}'"))
}

async fn save(download: &Download, dir: &Path, fallback: &str) -> Result<PathBuf> {
    let path = output_path(dir, &download.file_name, fallback);
    tokio::fs::write(&path, &download.bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = download.bytes.len(), "report saved");
    Ok(path)
}

/// `dir` joined with the last component of a server-supplied name
fn output_path(dir: &Path, file_name: &str, fallback: &str) -> PathBuf {
    match Path::new(file_name).file_name() {
        Some(name) => dir.join(name),
        None => dir.join(fallback),
    }
}

fn emit(json: bool, value: Value, text: impl FnOnce() -> String) {
    if json {
        println!("{value:#}");
    } else {
        println!("{}", text());
    }
}

fn case_line(case: &Case) -> String {
    format!(
        "{:<8} {:<7} {:<40} {}",
        format!("#{}", case.case_number),
        case.status,
        display::truncate(&case.title, 40),
        display::assignee_name(case.assigned_to.as_ref())
    )
}

fn event_line(event: &TimelineEvent) -> String {
    format!(
        "{} {:<5} {:<7} {} {}",
        event.event_date,
        event.event_time.as_deref().unwrap_or(""),
        event.event_type.as_str(),
        event.id,
        display::truncate(event.file_name.as_deref().unwrap_or(""), 40)
    )
}

fn score_line(score: &CompletenessScore) -> String {
    let marker = if score.all_required_filled { "" } else { " (required missing)" };
    format!("{}% ({}/{}){marker}", score.percentage, score.filled, score.total)
}
