//! `nidina` command line.
//!
//! `serve` runs the Task Store server. Every other subcommand loads a
//! `TaskClient` against the server (or the offline cache), performs one
//! action and prints the result.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveTime, TimeZone};
use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tokio::net::TcpListener;

use nidina_core::app::views::{self, ListTab};
use nidina_core::app::{ClientError, TaskClient, TaskEdit, compose_due};
use nidina_core::domain::{StoreError, TaskKey};
use nidina_core::impls::{JsonFileTaskStore, LocalCacheStore};
use nidina_core::ports::{Clock, TaskStore};

use crate::config::{ConfigurationError, DEFAULT_API_URL, ServerConfig};
use crate::remote::HttpTaskStore;
use crate::render;
use crate::server::{self, AppState};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigurationError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("server failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Parser)]
#[command(name = "nidina", version, about = "Personal task tracker")]
pub struct Cli {
    /// Task Store server used by the client subcommands
    #[arg(long, global = true, env = "NIDINA_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Work against a local cache file instead of the server
    #[arg(long, global = true, value_name = "FILE")]
    pub offline: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the Task Store HTTP server
    Serve(ServeArgs),
    #[command(flatten)]
    Client(ClientCommand),
}

/// Subcommands that run against a loaded `TaskClient`.
#[derive(Debug, Subcommand)]
pub enum ClientCommand {
    /// List open tasks, or completed ones with --done
    List {
        #[arg(long)]
        done: bool,
    },
    /// Add a task
    Add(AddArgs),
    /// Change a task's text or due date
    Edit(EditArgs),
    /// Mark a task as done
    Done { key: TaskKey },
    /// Delete a task
    Rm { key: TaskKey },
    /// Counts, recent and upcoming tasks
    Overview,
    /// Tasks grouped by day
    Calendar,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub host: Option<String>,
    #[arg(long)]
    pub port: Option<u16>,
    #[arg(long, value_name = "FILE")]
    pub tasks_file: Option<PathBuf>,
}

impl ServeArgs {
    /// Flags win over the environment.
    pub fn apply(self, mut config: ServerConfig) -> ServerConfig {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(tasks_file) = self.tasks_file {
            config.tasks_file = tasks_file;
        }
        config
    }
}

#[derive(Debug, Args)]
pub struct AddArgs {
    pub text: String,
    /// Due day, YYYY-MM-DD
    #[arg(long)]
    pub date: NaiveDate,
    /// Due time, HH:MM (default 00:00)
    #[arg(long, value_parser = parse_time)]
    pub time: Option<NaiveTime>,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Task id, or position in the stored list
    pub key: TaskKey,
    #[arg(long)]
    pub text: Option<String>,
    #[arg(long)]
    pub date: Option<NaiveDate>,
    #[arg(long, value_parser = parse_time)]
    pub time: Option<NaiveTime>,
}

fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|error| format!("expected HH:MM: {error}"))
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Client(command) => {
            let store: Arc<dyn TaskStore> = match cli.offline {
                Some(path) => {
                    tracing::debug!(path = %path.display(), "using offline cache");
                    Arc::new(LocalCacheStore::open(path).await)
                }
                None => Arc::new(HttpTaskStore::new(cli.api_url)),
            };
            let mut client = TaskClient::new(store).with_timezone(Local);
            client.load().await?;
            let output = execute(&mut client, command).await?;
            print!("{output}");
            Ok(())
        }
    }
}

async fn serve(args: ServeArgs) -> Result<(), CliError> {
    let config = args.apply(ServerConfig::from_env()?);
    let address = config.address()?;
    tracing::info!(tasks_file = %config.tasks_file.display(), "opening task store");

    let store = JsonFileTaskStore::open(&config.tasks_file).await?;
    let listener = TcpListener::bind(address).await?;
    server::serve(
        listener,
        AppState::new(Arc::new(store)),
        server::shutdown_signal(),
    )
    .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Runs one client subcommand against a loaded client and returns the text
/// to print.
pub async fn execute<S, C, Tz>(
    client: &mut TaskClient<S, C, Tz>,
    command: ClientCommand,
) -> Result<String, CliError>
where
    S: TaskStore,
    C: Clock,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let now = client.now();
    let output = match command {
        ClientCommand::List { done } => {
            let tab = if done { ListTab::Done } else { ListTab::Open };
            render::list(&views::list_view(client.tasks(), tab, now, client.timezone()))
        }
        ClientCommand::Add(args) => {
            let time = args.time.unwrap_or(NaiveTime::MIN);
            let task = client.add(&args.text, args.date, time).await?;
            format!("Added {}\n", render::task_line(task, now))
        }
        ClientCommand::Edit(args) => {
            let edit = edit_from_args(client, &args)?;
            let task = client.edit(args.key, edit).await?;
            format!("Updated {}\n", render::task_line(task, now))
        }
        ClientCommand::Done { key } => {
            let task = client.mark_done(key).await?;
            format!("Completed {}\n", render::task_line(task, now))
        }
        ClientCommand::Rm { key } => {
            let id = client.resolve(key)?.id;
            client.delete(key).await?;
            format!("Deleted {id}\n")
        }
        ClientCommand::Overview => render::overview(&views::overview(client.tasks(), now), now),
        ClientCommand::Calendar => {
            render::calendar(&views::calendar(client.tasks(), now, client.timezone()))
        }
    };
    Ok(output)
}

/// A lone `--date` keeps the current local time and a lone `--time` keeps
/// the current local day.
fn edit_from_args<S: TaskStore, C: Clock, Tz: TimeZone>(
    client: &TaskClient<S, C, Tz>,
    args: &EditArgs,
) -> Result<TaskEdit, CliError> {
    let date = match (args.date, args.time) {
        (None, None) => None,
        (day, time) => {
            let current = client.resolve(args.key)?.date.with_timezone(client.timezone());
            let day = day.unwrap_or(current.date_naive());
            let time = time.unwrap_or(current.time());
            Some(compose_due(day, time, client.timezone())?)
        }
    };
    Ok(TaskEdit {
        text: args.text.clone(),
        date,
    })
}
