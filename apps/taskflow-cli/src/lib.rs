//! TaskFlow CLI library
//!
//! Argument parsing, output formatting and command dispatch for the
//! `taskflow` binary. Every command goes through a [`TaskBoard`], so the CLI
//! only reports changes the record service has confirmed.

pub mod logging;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use taskflow_common::{format_datetime, parse_date, truncate_string};
use taskflow_core::{
    due_date_label, due_state, ActionOutcome, ConfigLoader, DueState, Notification,
    NotificationLevel, PartialConfig, ProjectFilter, ProjectSummary, Result, Task, TaskBoard,
    TaskPriority, TaskStats, TaskStatus,
};

#[derive(Parser, Debug)]
#[command(name = "taskflow")]
#[command(about = "TaskFlow command line client")]
#[command(version)]
pub struct Cli {
    /// Record service base URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Project identifier sent with every request
    #[arg(long, global = true)]
    pub project_id: Option<String>,

    /// Public key sent with every request
    #[arg(long, global = true)]
    pub public_key: Option<String>,

    /// Configuration file (YAML or JSON); must exist when given
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (debug logging)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// List tasks
    Tasks {
        /// Only tasks of this project (`all` for every task)
        #[arg(long)]
        project: Option<String>,
        /// Limit number of results
        #[arg(long, short)]
        limit: Option<usize>,
    },
    /// List projects with task counts
    Projects,
    /// Show task statistics
    Stats,
    /// Create a task
    Add {
        /// Task title
        title: String,
        /// Task description
        #[arg(long, short)]
        description: Option<String>,
        /// Priority (low, medium, high, urgent)
        #[arg(long, value_parser = parse_priority)]
        priority: Option<TaskPriority>,
        /// Due date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_due_date)]
        due: Option<NaiveDate>,
        /// Project identifier
        #[arg(long)]
        project: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },
    /// Edit a task; omitted fields keep their current value
    Edit {
        /// Task identifier
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long, short)]
        description: Option<String>,
        /// New priority (low, medium, high, urgent)
        #[arg(long, value_parser = parse_priority)]
        priority: Option<TaskPriority>,
        /// New due date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_due_date)]
        due: Option<NaiveDate>,
        /// New project identifier
        #[arg(long)]
        project: Option<String>,
        /// New comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },
    /// Toggle a task between todo and completed
    Toggle {
        /// Task identifier
        id: String,
    },
    /// Delete a task
    Delete {
        /// Task identifier
        id: String,
    },
    /// Delete several tasks
    DeleteMany {
        /// Task identifiers (space or comma separated)
        #[arg(required = true, num_args = 1.., value_delimiter = ',')]
        ids: Vec<String>,
    },
    /// Health check
    Health,
}

fn parse_priority(value: &str) -> std::result::Result<TaskPriority, String> {
    value.parse().map_err(|e: taskflow_core::TaskflowError| e.to_string())
}

fn parse_due_date(value: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(value).map_err(|e| format!("Invalid date '{value}': {e}"))
}

impl Cli {
    /// Configuration overrides taken from the command line flags
    #[must_use]
    pub fn overrides(&self) -> PartialConfig {
        PartialConfig {
            api_url: self.api_url.clone(),
            project_id: self.project_id.clone(),
            public_key: self.public_key.clone(),
            log_level: self.verbose.then(|| "debug".to_string()),
            ..PartialConfig::default()
        }
    }

    /// Loader layering defaults, config files, environment and the flags
    ///
    /// An explicit `--config` file is required to exist and parse.
    #[must_use]
    pub fn config_loader(&self) -> ConfigLoader {
        let loader = ConfigLoader::new().with_overrides(self.overrides());
        match &self.config {
            Some(path) => loader.require_config_file(path),
            None => loader,
        }
    }
}

fn status_marker(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Todo => "[ ]",
        TaskStatus::InProgress => "[~]",
        TaskStatus::Completed => "[x]",
    }
}

/// Print tasks to the given writer
///
/// # Errors
/// Returns an error if writing fails
pub fn print_tasks<W: Write>(tasks: &[Task], today: NaiveDate, writer: &mut W) -> Result<()> {
    if tasks.is_empty() {
        writeln!(writer, "No tasks found")?;
        return Ok(());
    }

    writeln!(writer, "Found {} tasks:", tasks.len())?;
    for task in tasks {
        writeln!(
            writer,
            "  {} {} #{} ({})",
            status_marker(task.status),
            task.title,
            task.id,
            task.priority
        )?;
        if !task.description.is_empty() {
            writeln!(writer, "    Description: {}", truncate_string(&task.description, 60))?;
        }
        if let Some(label) = due_date_label(task, today) {
            if due_state(task, today) == DueState::Overdue {
                writeln!(writer, "    Due: {label} (overdue)")?;
            } else {
                writeln!(writer, "    Due: {label}")?;
            }
        }
        if let Some(project_id) = &task.project_id {
            writeln!(writer, "    Project: {project_id}")?;
        }
        if !task.tags.is_empty() {
            writeln!(writer, "    Tags: {}", task.tags.join(", "))?;
        }
        if let Some(updated_at) = &task.updated_at {
            writeln!(writer, "    Updated: {}", format_datetime(updated_at))?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Print projects with their task counts to the given writer
///
/// # Errors
/// Returns an error if writing fails
pub fn print_projects<W: Write>(projects: &[ProjectSummary], writer: &mut W) -> Result<()> {
    if projects.is_empty() {
        writeln!(writer, "No projects found")?;
        return Ok(());
    }

    writeln!(writer, "Found {} projects:", projects.len())?;
    for summary in projects {
        writeln!(
            writer,
            "  • {} #{} ({}/{} completed)",
            summary.project.name, summary.project.id, summary.completed_count, summary.task_count
        )?;
        if let Some(color) = &summary.project.color {
            writeln!(writer, "    Color: {color}")?;
        }
        if !summary.project.tags.is_empty() {
            writeln!(writer, "    Tags: {}", summary.project.tags.join(", "))?;
        }
    }
    Ok(())
}

/// Print task statistics to the given writer
///
/// # Errors
/// Returns an error if writing fails
pub fn print_stats<W: Write>(stats: &TaskStats, writer: &mut W) -> Result<()> {
    writeln!(writer, "Tasks: {}", stats.total)?;
    writeln!(
        writer,
        "Completed: {} ({:.0}%)",
        stats.completed,
        stats.completion_rate() * 100.0
    )?;
    writeln!(writer, "In progress: {}", stats.in_progress)?;
    writeln!(writer, "Overdue: {}", stats.overdue)?;
    Ok(())
}

/// Print notifications to the given writer
///
/// # Errors
/// Returns an error if writing fails
pub fn print_notifications<W: Write>(notifications: &[Notification], writer: &mut W) -> Result<()> {
    for notification in notifications {
        let marker = match notification.level {
            NotificationLevel::Success => "✅",
            NotificationLevel::Error => "❌",
        };
        writeln!(writer, "{marker} {}", notification.message)?;
    }
    Ok(())
}

/// Print any serializable value as pretty JSON
///
/// # Errors
/// Returns an error if serialization or writing fails
pub fn print_json<W: Write, T: Serialize + ?Sized>(value: &T, writer: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    Ok(())
}

fn print_task_or_missing<W: Write>(
    board: &TaskBoard,
    id: &str,
    json: bool,
    writer: &mut W,
) -> Result<()> {
    match board.task(id) {
        Some(task) if json => print_json(&task, writer),
        Some(task) => print_tasks(&[task], board.today(), writer),
        None => Ok(()),
    }
}

/// Load the board, execute `command` and write the result to `writer`
///
/// Notifications raised by the command are written after its output. The
/// returned outcome is [`ActionOutcome::Applied`] only when the command
/// fully succeeded.
///
/// # Errors
/// Returns an error if writing the output fails
pub async fn run<W: Write>(
    board: &TaskBoard,
    command: &Commands,
    json: bool,
    writer: &mut W,
) -> Result<ActionOutcome> {
    if *command == Commands::Health {
        writeln!(writer, "🔍 Checking TaskFlow record service...")?;
    }

    let loaded = board.load().await;
    if loaded != ActionOutcome::Applied {
        print_notifications(&board.take_notifications(), writer)?;
        return Ok(loaded);
    }

    let outcome = match command {
        Commands::Tasks { project, limit } => {
            if let Some(project) = project {
                let filter: ProjectFilter = project.parse().unwrap_or_default();
                if !is_known_filter(board, &filter) {
                    writeln!(writer, "❌ Project {project} not found")?;
                    return Ok(ActionOutcome::Ignored);
                }
                board.select_project(filter);
            }
            let mut tasks = board.visible_tasks();
            if let Some(limit) = limit {
                tasks.truncate(*limit);
            }
            if json {
                print_json(&tasks, writer)?;
            } else {
                print_tasks(&tasks, board.today(), writer)?;
            }
            ActionOutcome::Applied
        }
        Commands::Projects => {
            let summaries = board.project_summaries();
            if json {
                print_json(&summaries, writer)?;
            } else {
                print_projects(&summaries, writer)?;
            }
            ActionOutcome::Applied
        }
        Commands::Stats => {
            let stats = board.stats();
            if json {
                print_json(&stats, writer)?;
            } else {
                print_stats(&stats, writer)?;
            }
            ActionOutcome::Applied
        }
        Commands::Add {
            title,
            description,
            priority,
            due,
            project,
            tags,
        } => {
            board.open_create_form();
            board.update_form(|form| {
                form.title.clone_from(title);
                if let Some(description) = description {
                    form.description.clone_from(description);
                }
                if let Some(priority) = priority {
                    form.priority = *priority;
                }
                form.due_date = *due;
                if let Some(project) = project {
                    form.project_id.clone_from(project);
                }
                if let Some(tags) = tags {
                    form.tags.clone_from(tags);
                }
            });
            let outcome = board.submit_form().await;
            if outcome == ActionOutcome::Applied {
                if let Some(created) = board.tasks().first() {
                    print_task_or_missing(board, &created.id, json, writer)?;
                }
            }
            outcome
        }
        Commands::Edit {
            id,
            title,
            description,
            priority,
            due,
            project,
            tags,
        } => {
            if board.open_edit_form(id) != ActionOutcome::Applied {
                writeln!(writer, "❌ Task {id} not found")?;
                return Ok(ActionOutcome::Ignored);
            }
            board.update_form(|form| {
                if let Some(title) = title {
                    form.title.clone_from(title);
                }
                if let Some(description) = description {
                    form.description.clone_from(description);
                }
                if let Some(priority) = priority {
                    form.priority = *priority;
                }
                if due.is_some() {
                    form.due_date = *due;
                }
                if let Some(project) = project {
                    form.project_id.clone_from(project);
                }
                if let Some(tags) = tags {
                    form.tags.clone_from(tags);
                }
            });
            let outcome = board.submit_form().await;
            if outcome == ActionOutcome::Applied {
                print_task_or_missing(board, id, json, writer)?;
            }
            outcome
        }
        Commands::Toggle { id } => {
            let outcome = board.toggle_status(id).await;
            match outcome {
                ActionOutcome::Applied => print_task_or_missing(board, id, json, writer)?,
                ActionOutcome::Ignored => writeln!(writer, "❌ Task {id} not found")?,
                _ => {}
            }
            outcome
        }
        Commands::Delete { id } => {
            let outcome = board.delete_task(id).await;
            if outcome == ActionOutcome::Ignored {
                writeln!(writer, "❌ Task {id} not found")?;
            }
            outcome
        }
        Commands::DeleteMany { ids } => {
            let outcome = board.delete_tasks(ids).await;
            let remaining: Vec<&str> = ids
                .iter()
                .filter(|id| board.task(id).is_some())
                .map(String::as_str)
                .collect();
            if outcome == ActionOutcome::Applied && !remaining.is_empty() {
                writeln!(writer, "Not deleted: {}", remaining.join(", "))?;
            }
            outcome
        }
        Commands::Health => {
            writeln!(writer, "✅ Record service reachable")?;
            writeln!(
                writer,
                "   Found {} tasks, {} projects",
                board.tasks().len(),
                board.projects().len()
            )?;
            ActionOutcome::Applied
        }
    };

    print_notifications(&board.take_notifications(), writer)?;
    Ok(outcome)
}

fn is_known_filter(board: &TaskBoard, filter: &ProjectFilter) -> bool {
    match filter {
        ProjectFilter::All => true,
        ProjectFilter::Project(id) => board.projects().iter().any(|p| &p.id == id),
    }
}
