use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use taskboard::{
    config::ServerConfig,
    storage::{Storage, StoreError, TaskRow},
    task::TaskSort,
    web::{self, csrf::TokenSigner},
    AppContext,
};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "taskboard",
    about = "taskboard — self-hosted task-list web service",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port
    #[arg(long, env = "TASKBOARD_PORT")]
    port: Option<u16>,

    /// Data directory for the SQLite database and config
    #[arg(long, env = "TASKBOARD_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TASKBOARD_LOG")]
    log: Option<String>,

    /// Bind address (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "TASKBOARD_BIND")]
    bind_address: Option<String>,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "TASKBOARD_LOG_FILE")]
    log_file: Option<std::path::PathBuf>,

    /// Suppress progress and informational output.
    ///
    /// Errors are still printed to stderr. JSON output (--json flags) is
    /// unaffected. Use this flag when piping output to other tools.
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Start the web server (default when no subcommand given).
    ///
    /// Runs taskboard in the foreground. When invoked with no subcommand,
    /// this is the default.
    ///
    /// Examples:
    ///   taskboard serve
    ///   taskboard
    Serve,
    /// Manage tasks directly from the command line.
    ///
    /// Operates on the SQLite database without a running server.
    ///
    /// Examples:
    ///   taskboard tasks list --sort status_pending
    ///   taskboard tasks add --title "Buy milk"
    ///   taskboard tasks done 3
    Tasks {
        #[command(subcommand)]
        action: TasksAction,
    },
}

#[derive(Subcommand)]
enum TasksAction {
    /// List all tasks.
    ///
    /// Accepts the same sort tokens as the web UI: date_asc, date_desc,
    /// status_done, status_pending. Unknown tokens fall back to the
    /// default ordering (newest first).
    ///
    /// Examples:
    ///   taskboard tasks list
    ///   taskboard tasks list --sort status_pending --json
    List {
        /// Sort token (date_asc, date_desc, status_done, status_pending)
        #[arg(long, short)]
        sort: Option<String>,
        /// Output as JSON array (for piping)
        #[arg(long)]
        json: bool,
    },
    /// Show the full detail of one task.
    Show { id: i64 },
    /// Create a new task.
    ///
    /// Examples:
    ///   taskboard tasks add --title "Buy milk"
    ///   taskboard tasks add --title "Call back" --description "before 5pm"
    Add {
        #[arg(long, short)]
        title: String,
        #[arg(long, short)]
        description: Option<String>,
        /// Create the task already marked done
        #[arg(long)]
        done: bool,
    },
    /// Mark a task done.
    Done { id: i64 },
    /// Mark a task pending again.
    Reopen { id: i64 },
    /// Delete a task.
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Init once — must happen before any tracing calls.
    let log_level = args.log.as_deref().unwrap_or("info").to_owned();
    let log_format =
        std::env::var("TASKBOARD_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let _file_guard = setup_logging(&log_level, args.log_file.as_deref(), &log_format);

    let quiet = args.quiet;
    match args.command {
        Some(Command::Tasks { action }) => {
            run_tasks(action, args.data_dir, quiet).await?;
        }
        None | Some(Command::Serve) => {
            run_server(args.port, args.data_dir, args.log, args.bind_address).await?;
        }
    }

    Ok(())
}

async fn run_server(
    port: Option<u16>,
    data_dir: Option<std::path::PathBuf>,
    log: Option<String>,
    bind_address: Option<String>,
) -> Result<()> {
    let config = Arc::new(ServerConfig::new(port, data_dir, log, bind_address));
    info!(data_dir = %config.data_dir.display(), port = config.port, "starting taskboard");

    let storage = Storage::open(&config.data_dir).await?;
    let signer = TokenSigner::load_or_create(&config.data_dir)?;
    let ctx = Arc::new(AppContext::new(config, storage, signer));

    web::start_server(ctx).await
}

async fn run_tasks(
    action: TasksAction,
    data_dir: Option<std::path::PathBuf>,
    quiet: bool,
) -> Result<()> {
    let config = ServerConfig::new(None, data_dir, Some("error".to_string()), None);
    let storage = Storage::open(&config.data_dir).await?;

    match action {
        TasksAction::List { sort, json } => {
            let tasks = storage.list_tasks(TaskSort::from_token(sort.as_deref())).await?;
            if json {
                println!("{}", serde_json::to_string(&tasks)?);
            } else if tasks.is_empty() {
                println!("No tasks found.");
            } else {
                println!("{:<6} {:<9} {:<27} TITLE", "ID", "STATUS", "CREATED");
                println!("{}", "-".repeat(72));
                for t in &tasks {
                    println!(
                        "{:<6} {:<9} {:<27} {}",
                        t.id,
                        if t.is_done { "done" } else { "pending" },
                        t.created_at,
                        t.title
                    );
                }
                println!("\n{} task(s)", tasks.len());
            }
        }

        TasksAction::Show { id } => match storage.get_task(id).await? {
            None => {
                eprintln!("Task not found: {id}");
                std::process::exit(1);
            }
            Some(t) => print_task_detail(&t),
        },

        TasksAction::Add {
            title,
            description,
            done,
        } => match storage.create_task(&title, description.as_deref(), done).await {
            Ok(t) => {
                if !quiet {
                    println!("Created task {}: {}", t.id, t.title);
                }
            }
            Err(StoreError::Invalid(errors)) => {
                for msg in &errors.title {
                    eprintln!("title: {msg}");
                }
                std::process::exit(1);
            }
            Err(e) => return Err(e.into()),
        },

        TasksAction::Done { id } => {
            let t = set_done_or_exit(&storage, id, true).await?;
            if !quiet {
                println!("Done: {} — {}", t.id, t.title);
            }
        }

        TasksAction::Reopen { id } => {
            let t = set_done_or_exit(&storage, id, false).await?;
            if !quiet {
                println!("Reopened: {} — {}", t.id, t.title);
            }
        }

        TasksAction::Delete { id, yes } => {
            let Some(t) = storage.get_task(id).await? else {
                eprintln!("Task not found: {id}");
                std::process::exit(1);
            };
            if !yes && !confirm(&format!("Delete task {} ({})?", t.id, t.title))? {
                println!("Aborted.");
                return Ok(());
            }
            storage.delete_task(id).await?;
            if !quiet {
                println!("Deleted: {id}");
            }
        }
    }

    Ok(())
}

async fn set_done_or_exit(storage: &Storage, id: i64, value: bool) -> Result<TaskRow> {
    match storage.set_done(id, value).await {
        Ok(t) => Ok(t),
        Err(StoreError::NotFound(_)) => {
            eprintln!("Task not found: {id}");
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

fn print_task_detail(t: &TaskRow) {
    println!("ID:          {}", t.id);
    println!("Title:       {}", t.title);
    println!("Status:      {}", if t.is_done { "done" } else { "pending" });
    println!("Created:     {}", t.created_at);
    println!(
        "Description: {}",
        t.description.as_deref().unwrap_or("(none)")
    );
}

/// Prompt for y/N on stdin. Anything other than "y"/"yes" is a no.
fn confirm(prompt: &str) -> Result<bool> {
    use std::io::Write as _;
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let answer = line.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

/// Initialize the tracing subscriber.
/// If `log_file` is set, logs go to both stdout and a daily-rolling file.
/// Returns a `WorkerGuard` that must stay alive for the process lifetime.
///
/// `log_format` may be `"pretty"` (default, human-readable compact format)
/// or `"json"` (structured JSON for log aggregators).
///
/// If the log directory cannot be created, falls back to stdout-only
/// logging with a warning — never panics.
fn setup_logging(
    log_level: &str,
    log_file: Option<&std::path::Path>,
    log_format: &str,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let use_json = log_format == "json";

    if let Some(path) = log_file {
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let filename = path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("taskboard.log"));

        // Ensure the directory exists before tracing-appender tries to open it.
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "warn: could not create log directory '{}': {e} — falling back to stdout",
                dir.display()
            );
            if use_json {
                tracing_subscriber::fmt().json().with_env_filter(log_level).init();
            } else {
                tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
            }
            return None;
        }

        let appender = tracing_appender::rolling::daily(dir, filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        if use_json {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().json())
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().compact())
                .with(fmt::layer().with_writer(non_blocking))
                .init();
        }

        Some(guard)
    } else if use_json {
        tracing_subscriber::fmt().json().with_env_filter(log_level).init();
        None
    } else {
        tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
        None
    }
}
