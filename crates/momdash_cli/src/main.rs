//! Command-line front end for the meeting-minutes dashboard.
//!
//! # Responsibility
//! - Drive the same dashboard controller the UI uses, one action per run.
//! - Keep output line-oriented so scripts can parse it.

use clap::{Args, Parser, Subcommand};
use log::{error, info};
use momdash_core::{
    flush_logging, init_logging_from_config, render_markdown, AppConfig, Dashboard, MeetingDraft,
    MeetingPatch, ScreenBody, SqliteMeetingStore,
};
use std::error::Error;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// Minutes-of-meeting dashboard
struct Cli {
    /// SQLite database file (defaults to MOMDASH_DB_PATH or the temp dir)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Store collection holding the meetings
    #[arg(long, global = true, value_name = "NAME")]
    collection: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List meetings in store order
    List,
    /// Create a meeting with empty minutes
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        date: String,
        #[arg(long)]
        time: String,
    },
    /// Print one meeting's heading and rendered minutes
    Show {
        id: String,
        /// Print the raw markdown instead of HTML
        #[arg(long)]
        raw: bool,
    },
    /// Replace a meeting's minutes
    Save {
        id: String,
        #[command(flatten)]
        input: MarkdownInput,
    },
    /// Change a meeting's title, date or time
    Rename {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        time: Option<String>,
    },
    /// Delete a meeting
    Delete { id: String },
    /// Render markdown to sanitized HTML without touching the store
    Render {
        #[command(flatten)]
        input: MarkdownInput,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Create { .. } => "create",
            Self::Show { .. } => "show",
            Self::Save { .. } => "save",
            Self::Rename { .. } => "rename",
            Self::Delete { .. } => "delete",
            Self::Render { .. } => "render",
        }
    }
}

#[derive(Args)]
struct MarkdownInput {
    /// Markdown text; read from stdin when neither this nor --file is given
    #[arg(long, conflicts_with = "file")]
    content: Option<String>,
    /// Read markdown from a file
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,
}

impl MarkdownInput {
    fn read(self) -> Result<String, Box<dyn Error>> {
        if let Some(content) = self.content {
            return Ok(content);
        }
        if let Some(path) = self.file {
            return std::fs::read_to_string(&path)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e).into());
        }
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    }
}

fn main() -> ExitCode {
    match try_main(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn try_main(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = AppConfig::from_env();
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(collection) = cli.collection {
        config.collection = collection;
    }
    init_logging_from_config(&config)?;

    let name = cli.command.name();
    info!("event=cli_command module=cli status=start command={name}");
    let result = dispatch(&config, cli.command);
    match &result {
        Ok(()) => info!("event=cli_command module=cli status=ok command={name}"),
        Err(err) => {
            error!("event=cli_command module=cli status=error command={name} error={err}")
        }
    }
    flush_logging();
    result
}

fn dispatch(config: &AppConfig, command: Command) -> Result<(), Box<dyn Error>> {
    // Rendering never needs the database.
    if let Command::Render { input } = command {
        return render(input);
    }

    let store = SqliteMeetingStore::open(&config.db_path)
        .map_err(|e| format!("Failed to open {}: {}", config.db_path.display(), e))?;
    let mut dashboard = Dashboard::new(store, config.dashboard());
    dashboard.activate()?;
    run(&mut dashboard, command)
}

fn run(
    dashboard: &mut Dashboard<SqliteMeetingStore>,
    command: Command,
) -> Result<(), Box<dyn Error>> {
    match command {
        Command::List => {
            for meeting in dashboard.meetings() {
                println!(
                    "{}\t{}\t{}",
                    meeting.id,
                    meeting.title,
                    meeting.schedule_label()
                );
            }
            Ok(())
        }
        Command::Create { title, date, time } => {
            dashboard.open_create_dialog();
            dashboard.set_draft(MeetingDraft::new(title, date, time));
            let id = dashboard.submit_create()?;
            println!("{id}");
            Ok(())
        }
        Command::Show { id, raw } => {
            dashboard.select(id.as_str())?;
            match dashboard.screen().body {
                ScreenBody::Viewer(viewer) => {
                    println!("{}", viewer.heading);
                    println!();
                    if raw {
                        let content = dashboard
                            .selected_meeting()
                            .map(|meeting| meeting.content.as_str())
                            .unwrap_or_default();
                        println!("{content}");
                    } else {
                        print!("{}", viewer.html);
                    }
                    Ok(())
                }
                ScreenBody::NotFound(view) => {
                    Err(format!("{}: {}", view.message, view.requested_id).into())
                }
                _ => Err(Box::from("unexpected screen after select")),
            }
        }
        Command::Save { id, input } => {
            dashboard.save_content(&id, input.read()?)?;
            println!("saved {id}");
            Ok(())
        }
        Command::Rename {
            id,
            title,
            date,
            time,
        } => {
            let patch = MeetingPatch {
                title,
                date,
                time,
                content: None,
            };
            dashboard.update_meeting(&id, &patch)?;
            println!("updated {id}: {}", patch.field_names().join(","));
            Ok(())
        }
        Command::Delete { id } => {
            dashboard.request_delete(id.as_str());
            let id = dashboard.confirm_delete()?;
            println!("deleted {id}");
            Ok(())
        }
        Command::Render { input } => render(input),
    }
}

fn render(input: MarkdownInput) -> Result<(), Box<dyn Error>> {
    print!("{}", render_markdown(&input.read()?));
    Ok(())
}
