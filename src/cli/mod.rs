//! Command-line interface for tb
//!
//! This module defines the CLI structure using clap derive macros.
//! Command implementations live in submodules; argument validation that the
//! stores deliberately skip (blank titles, date formats) happens here.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::app::App;
use crate::config::default_data_dir;
use crate::error::{Error, Result};
use crate::output::OutputOptions;

mod auth;
mod init;
mod report;
mod task;

/// tb - Task Buddy
///
/// A personal task tracker: register, log in, then add, edit, search and
/// summarize your tasks.
#[derive(Parser, Debug)]
#[command(name = "tb")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory (defaults to the platform data dir)
    #[arg(long, global = true, env = "TB_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory and seed the demo account
    Init,

    /// Register a new account
    Register {
        /// Email address (must not already be registered)
        email: String,

        /// Display name
        #[arg(long)]
        name: String,

        /// Password
        #[arg(long, env = "TB_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Log in and keep the session for later commands
    Login {
        /// Email address
        email: String,

        /// Password
        #[arg(long, env = "TB_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// End the current session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Profile management
    #[command(subcommand)]
    Profile(ProfileCommands),

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Search your tasks by text, tag, priority and status
    Search {
        /// Text matched against title, description and tags
        query: Option<String>,

        /// Only tasks carrying this exact tag
        #[arg(long)]
        tag: Option<String>,

        /// Priority filter: low, medium, high, all
        #[arg(short, long)]
        priority: Option<String>,

        /// Status filter: pending, in-progress, completed, all
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Summary counts for your tasks
    Stats,

    /// Write your profile, stats and tasks to a JSON file
    Export {
        /// Output file or directory (defaults to the current directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// Profile subcommands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Change your display name
    Rename {
        /// New display name
        name: String,
    },
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task
    New {
        /// Task title
        title: String,

        /// Longer description
        #[arg(short, long)]
        description: Option<String>,

        /// Priority: low, medium, high (defaults to tasks.default_priority)
        #[arg(short, long)]
        priority: Option<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,

        /// Tags, repeatable or comma-separated
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },

    /// List your tasks
    #[command(alias = "ls")]
    List {
        /// Status filter: pending, in-progress, completed, all
        #[arg(short, long)]
        status: Option<String>,

        /// Priority filter: low, medium, high, all
        #[arg(short, long)]
        priority: Option<String>,
    },

    /// Show one task
    Show {
        /// Task ID
        id: String,
    },

    /// Change fields of a task
    Edit {
        /// Task ID
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New priority: low, medium, high
        #[arg(short, long)]
        priority: Option<String>,

        /// New status: pending, in-progress, completed
        #[arg(short, long)]
        status: Option<String>,

        /// New due date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,

        /// Remove the due date
        #[arg(long)]
        clear_due: bool,

        /// Replace tags, repeatable or comma-separated
        #[arg(short, long = "tag", conflicts_with = "clear_tags")]
        tags: Vec<String>,

        /// Remove all tags
        #[arg(long)]
        clear_tags: bool,
    },

    /// Mark a task in progress
    Start {
        /// Task ID
        id: String,
    },

    /// Mark a task completed
    Done {
        /// Task ID
        id: String,
    },

    /// Delete a task
    #[command(alias = "rm")]
    Delete {
        /// Task ID
        id: String,
    },
}

/// Flags shared by every command
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

impl GlobalOptions {
    pub fn output(&self) -> OutputOptions {
        OutputOptions {
            json: self.json,
            quiet: self.quiet,
        }
    }

    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(path) => Ok(path.clone()),
            None => default_data_dir(),
        }
    }

    pub fn open_app(&self) -> Result<App> {
        App::open(&self.resolve_data_dir()?)
    }
}

impl Cli {
    /// Command name used in output envelopes, e.g. `task new`
    pub fn command_name(&self) -> &'static str {
        match &self.command {
            Commands::Init => "init",
            Commands::Register { .. } => "register",
            Commands::Login { .. } => "login",
            Commands::Logout => "logout",
            Commands::Whoami => "whoami",
            Commands::Profile(ProfileCommands::Rename { .. }) => "profile rename",
            Commands::Task(cmd) => match cmd {
                TaskCommands::New { .. } => "task new",
                TaskCommands::List { .. } => "task list",
                TaskCommands::Show { .. } => "task show",
                TaskCommands::Edit { .. } => "task edit",
                TaskCommands::Start { .. } => "task start",
                TaskCommands::Done { .. } => "task done",
                TaskCommands::Delete { .. } => "task delete",
            },
            Commands::Search { .. } => "search",
            Commands::Stats => "stats",
            Commands::Export { .. } => "export",
        }
    }

    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let command = self.command_name();
        let global = GlobalOptions {
            data_dir: self.data_dir,
            json: self.json,
            quiet: self.quiet,
        };
        tracing::debug!(command, "running");

        match self.command {
            Commands::Init => init::run(&global),
            Commands::Register {
                email,
                name,
                password,
            } => auth::run_register(
                auth::RegisterOptions {
                    email,
                    name,
                    password,
                },
                &global,
            ),
            Commands::Login { email, password } => {
                auth::run_login(auth::LoginOptions { email, password }, &global)
            }
            Commands::Logout => auth::run_logout(&global),
            Commands::Whoami => auth::run_whoami(&global),
            Commands::Profile(ProfileCommands::Rename { name }) => {
                auth::run_rename(auth::RenameOptions { name }, &global)
            }
            Commands::Task(cmd) => match cmd {
                TaskCommands::New {
                    title,
                    description,
                    priority,
                    due,
                    tags,
                } => task::run_new(
                    task::NewOptions {
                        title,
                        description,
                        priority,
                        due,
                        tags,
                    },
                    &global,
                ),
                TaskCommands::List { status, priority } => {
                    task::run_list(task::ListOptions { status, priority }, &global)
                }
                TaskCommands::Show { id } => task::run_show(task::ShowOptions { id }, &global),
                TaskCommands::Edit {
                    id,
                    title,
                    description,
                    priority,
                    status,
                    due,
                    clear_due,
                    tags,
                    clear_tags,
                } => task::run_edit(
                    task::EditOptions {
                        id,
                        title,
                        description,
                        priority,
                        status,
                        due,
                        clear_due,
                        tags,
                        clear_tags,
                    },
                    &global,
                ),
                TaskCommands::Start { id } => task::run_start(task::ShowOptions { id }, &global),
                TaskCommands::Done { id } => task::run_done(task::ShowOptions { id }, &global),
                TaskCommands::Delete { id } => {
                    task::run_delete(task::ShowOptions { id }, &global)
                }
            },
            Commands::Search {
                query,
                tag,
                priority,
                status,
            } => report::run_search(
                report::SearchOptions {
                    query,
                    tag,
                    priority,
                    status,
                },
                &global,
            ),
            Commands::Stats => report::run_stats(&global),
            Commands::Export { out } => report::run_export(report::ExportOptions { out }, &global),
        }
    }
}

// =========================================================================
// Argument validation
// =========================================================================

/// Trimmed value, rejecting blank input
pub(crate) fn required_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument(format!("{field} must not be blank")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn parse_due_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        Error::InvalidArgument(format!("invalid due date '{value}' (expected YYYY-MM-DD)"))
    })
}

/// Split comma-separated tag arguments, dropping blanks and repeats.
///
/// The first occurrence of each tag keeps its position.
pub(crate) fn parse_tags(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|tag| !tag.is_empty() && seen.insert(*tag))
        .map(str::to_string)
        .collect()
}
