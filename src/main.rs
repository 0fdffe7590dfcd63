//! CLI entry point for `gtdmail`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use gtdmail::config::{self, Config, ROOT_ENV};
use gtdmail::dispatch::Dispatcher;
use gtdmail::model::mailbox::Folder;
use gtdmail::model::message::{Attachment, GtdMetadata, Message, Priority};
use gtdmail::service::{MailboxService, MoveResult, SendRequest};
use gtdmail::store::FsStorage;
use gtdmail::workflow::{Clarification, InboxItem, Outcome};

#[derive(Parser)]
#[command(
    name = "gtdmail",
    version,
    about = "GTD workflow over cloud-synced Maildir mailboxes"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Workspace root holding Organization/, People/ and Team/
    #[arg(long, global = true, env = ROOT_ENV, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List every mailbox under Organization/ and People/
    Mailboxes,
    /// Show the newest messages in new/
    Inbox {
        address: String,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show the newest messages in a folder
    Folder {
        address: String,
        /// new, cur, Next-Actions, Waiting-For, Projects, Someday-Maybe, Reference
        folder: Folder,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Read one message from whichever folder holds it
    Read { address: String, filename: String },
    /// Deliver a new message into a mailbox's new/ folder
    Send {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(short, long)]
        subject: String,
        #[arg(short, long, default_value = "")]
        body: String,
        #[arg(long)]
        html: Option<String>,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        context: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        /// Attach a file (repeatable)
        #[arg(long = "attach", value_name = "FILE")]
        attachments: Vec<PathBuf>,
    },
    /// Record a clarification decision for a message
    Clarify {
        address: String,
        filename: String,
        /// next_action, project, waiting_for, reference, someday_maybe, trash
        #[arg(short, long)]
        outcome: Outcome,
        #[arg(short, long, default_value = "")]
        what: String,
        #[arg(long)]
        actionable: bool,
    },
    /// Move a message to the folder its outcome selects (trash deletes)
    Organize {
        address: String,
        filename: String,
        outcome: Outcome,
    },
    /// List work items in Team/inbox-{owner}-claude
    TeamInbox { owner: String },
    /// Archive a team inbox item into processed/
    Archive { owner: String, item: String },
    /// Glob search inside a mailbox
    Search { address: String, pattern: String },
    /// Serve line-delimited JSON tool requests on stdin/stdout
    Serve,
    /// Write a default config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let _guard = setup_logging(log_level, &config);

    let json = cli.json;
    match cli.command {
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
        Commands::InitConfig { force } => cmd_init_config(&config, cli.root, force),
        command => {
            let service = build_service(&config, cli.root)?;
            run(command, service, json).await
        }
    }
}

async fn run(command: Commands, service: MailboxService, json: bool) -> anyhow::Result<()> {
    match command {
        Commands::Mailboxes => {
            let listing = service.list_mailboxes().await;
            if json {
                return print_json(&listing);
            }
            println!();
            println!("  {:<40} {:<14} {}", "Address", "Category", "Kind");
            println!("  {}", "-".repeat(66));
            for mailbox in &listing.mailboxes {
                let kind = match mailbox.kind {
                    Some(gtdmail::model::mailbox::MailboxKind::AiAgent) => "ai-agent",
                    Some(gtdmail::model::mailbox::MailboxKind::Human) => "human",
                    None => "",
                };
                println!(
                    "  {:<40} {:<14} {}",
                    mailbox.address,
                    mailbox.category.parent_dir(),
                    kind
                );
            }
            for diagnostic in &listing.diagnostics {
                eprintln!("  warning: {diagnostic}");
            }
            println!();
            Ok(())
        }
        Commands::Inbox { address, limit } => {
            let messages = service.get_inbox(&address, limit).await?;
            print_messages(&messages, json)
        }
        Commands::Folder {
            address,
            folder,
            limit,
        } => {
            let messages = service.get_folder(&address, folder, limit).await?;
            print_messages(&messages, json)
        }
        Commands::Read { address, filename } => {
            match service.read_message(&address, &filename).await? {
                Some(message) if json => print_json(&message),
                Some(message) => {
                    print_message(&message);
                    Ok(())
                }
                None => anyhow::bail!("No folder of {address} holds {filename}"),
            }
        }
        Commands::Send {
            from,
            to,
            subject,
            body,
            html,
            project,
            context,
            priority,
            tags,
            attachments,
        } => {
            let attachments = attachments
                .iter()
                .map(|path| read_attachment(path))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let request = SendRequest {
                from,
                to,
                subject,
                text: body,
                html,
                gtd: Some(GtdMetadata {
                    project,
                    context,
                    priority,
                    status: None,
                    tags: (!tags.is_empty()).then_some(tags),
                }),
                attachments,
            };
            let sent = service.send_message(request).await?;
            if json {
                return print_json(&sent);
            }
            println!("  Delivered {}", sent.path);
            Ok(())
        }
        Commands::Clarify {
            address,
            filename,
            outcome,
            what,
            actionable,
        } => {
            let clarification = Clarification {
                what_is_it: what,
                is_actionable: actionable,
                outcome,
            };
            let item = service
                .clarify_item(&address, &filename, clarification)
                .await?;
            if json {
                return print_json(&item);
            }
            println!();
            println!("  {:<14} {}", "Subject", item.message.subject);
            println!("  {:<14} {}", "Outcome", item.decision.outcome);
            println!("  {:<14} {}", "Recommended", item.decision.recommended_action);
            match item.target_folder {
                Some(folder) => println!("  {:<14} {}", "Organize into", folder.dir_name()),
                None => println!("  {:<14} delete", "Organize into"),
            }
            println!();
            Ok(())
        }
        Commands::Organize {
            address,
            filename,
            outcome,
        } => {
            let result = service.organize_item(&address, &filename, outcome).await?;
            print_move(&result, json)
        }
        Commands::TeamInbox { owner } => {
            let items = service.collect_team_inbox(&owner).await?;
            print_team_items(&items, json)
        }
        Commands::Archive { owner, item } => {
            let record = service.archive_team_item(&owner, &item).await?;
            if json {
                return print_json(&record);
            }
            println!("  {}", record.instruction);
            Ok(())
        }
        Commands::Search { address, pattern } => {
            let paths = service.search_mailbox(&address, &pattern).await?;
            if json {
                return print_json(&paths);
            }
            for path in &paths {
                println!("{path}");
            }
            Ok(())
        }
        Commands::Serve => cmd_serve(Dispatcher::new(service)).await,
        Commands::InitConfig { .. } | Commands::Completions { .. } | Commands::Manpage => {
            unreachable!("handled before the workspace is opened")
        }
    }
}

fn build_service(config: &Config, cli_root: Option<PathBuf>) -> anyhow::Result<MailboxService> {
    let root = config.workspace_root(cli_root).ok_or_else(|| {
        anyhow::anyhow!(
            "No workspace root: pass --root, set {ROOT_ENV}, or set workspace.root in {}",
            config::config_file_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "the config file".to_string())
        )
    })?;
    if !root.is_dir() {
        anyhow::bail!("Workspace root is not a directory: {}", root.display());
    }
    tracing::debug!(root = %root.display(), "Opening workspace");

    let mut service =
        MailboxService::new(Arc::new(FsStorage::new(root))).with_limits(config.limits());
    if let Some(host) = &config.workspace.host {
        service = service.with_host(host.clone());
    }
    Ok(service)
}

/// Set up tracing with stderr output and optional file logging.
///
/// stdout carries command output and the `serve` protocol, so nothing logs there.
fn setup_logging(
    level: &str,
    config: &Config,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::daily(&log_dir, "gtdmail.log");
        let (writer, guard) = tracing_appender::non_blocking(file_appender);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
        Some(guard)
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
        None
    }
}

async fn cmd_serve(dispatcher: Dispatcher) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    tracing::info!("Serving tool requests on stdin");

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = dispatcher.handle_line(&line).await;
        stdout.write_all(reply.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }
    tracing::info!("stdin closed, stopping");
    Ok(())
}

fn cmd_init_config(current: &Config, cli_root: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    if let Some(path) = config::config_file_path() {
        if path.exists() && !force {
            anyhow::bail!(
                "{} already exists (use --force to overwrite)",
                path.display()
            );
        }
    }
    let mut cfg = current.clone();
    if cli_root.is_some() {
        cfg.workspace.root = cli_root;
    }
    let path = config::save_config(&cfg)?;
    println!("  Wrote {}", path.display());
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "gtdmail", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

fn read_attachment(path: &Path) -> anyhow::Result<Attachment> {
    let content = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow::anyhow!("{} has no file name", path.display()))?;
    Ok(Attachment::new(filename, "application/octet-stream", content))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print messages as a human-readable table.
fn print_messages(messages: &[Message], json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(messages);
    }

    println!();
    println!("  {} message(s)", messages.len());
    println!();
    if messages.is_empty() {
        return Ok(());
    }

    println!(
        "  {:<17} {:<25} {:<40} {:<6} {}",
        "Date", "From", "Subject", "Flags", "File"
    );
    println!("  {}", "-".repeat(120));
    for message in messages {
        let date = message.date.format("%Y-%m-%d %H:%M").to_string();
        let from = message
            .from
            .first()
            .map(|a| a.name.clone().unwrap_or_else(|| a.address.clone()))
            .unwrap_or_default();
        let from_trunc: String = from.chars().take(24).collect();
        let subj_trunc: String = message.subject.chars().take(39).collect();
        println!(
            "  {:<17} {:<25} {:<40} {:<6} {}",
            date,
            from_trunc,
            subj_trunc,
            message.flags.to_letters(),
            message.filename
        );
    }
    println!();
    Ok(())
}

fn print_message(message: &Message) {
    let join = |list: &[gtdmail::model::address::EmailAddress]| {
        list.iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };

    println!("{:<12} {}", "From:", join(&message.from));
    println!("{:<12} {}", "To:", join(&message.to));
    println!("{:<12} {}", "Subject:", message.subject);
    println!("{:<12} {}", "Date:", message.date.to_rfc2822());
    println!("{:<12} {}", "Message-ID:", message.message_id);
    if let Some(folder) = message.folder {
        println!("{:<12} {}", "Folder:", folder);
    }
    let gtd = &message.gtd;
    let fields = [
        ("Project:", gtd.project.clone()),
        ("Context:", gtd.context.clone()),
        ("Priority:", gtd.priority.map(|p| p.as_str().to_string())),
        ("Status:", gtd.status.clone()),
        ("Tags:", gtd.tags.as_ref().map(|t| t.join(", "))),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("{label:<12} {value}");
        }
    }
    for attachment in &message.attachments {
        println!(
            "{:<12} {} ({}, {} bytes)",
            "Attachment:", attachment.filename, attachment.content_type, attachment.size
        );
    }
    println!();
    println!("{}", message.text);
}

fn print_move(result: &MoveResult, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(result);
    }
    if result.success {
        println!("  {}", result.message);
        Ok(())
    } else {
        anyhow::bail!("{}", result.message)
    }
}

fn print_team_items(items: &[InboxItem], json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(items);
    }
    println!();
    println!("  {:<50} {:<12} {:<8} {:>10}", "Item", "Status", "Priority", "Size");
    println!("  {}", "-".repeat(84));
    for item in items {
        let name: String = item.name.chars().take(49).collect();
        println!(
            "  {:<50} {:<12} {:<8} {:>10}",
            name,
            format!("{:?}", item.status).to_lowercase(),
            format!("{:?}", item.priority).to_lowercase(),
            item.size.map(|s| s.to_string()).unwrap_or_default()
        );
    }
    println!();
    Ok(())
}
