//! Read-only views over the session user's tasks: search, stats and export.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use crate::cli::task::{push_task_lines, TaskListReport};
use crate::cli::GlobalOptions;
use crate::error::Result;
use crate::export::ExportDocument;
use crate::lock::write_atomic;
use crate::output::{emit_success, HumanOutput};
use crate::search::{search, SearchFilter};
use crate::stats::{priority_breakdown, PriorityBreakdown, TaskStats};

pub struct SearchOptions {
    pub query: Option<String>,
    pub tag: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
}

pub struct ExportOptions {
    pub out: Option<PathBuf>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsReport {
    #[serde(flatten)]
    stats: TaskStats,
    completion_rate: u32,
    by_priority: PriorityBreakdown,
}

#[derive(Serialize)]
struct ExportReport {
    path: PathBuf,
    tasks: usize,
    stats: TaskStats,
}

pub fn run_search(options: SearchOptions, global: &GlobalOptions) -> Result<()> {
    let filter = SearchFilter::from_inputs(
        options.query.as_deref(),
        options.tag.as_deref(),
        options.priority.as_deref(),
        options.status.as_deref(),
    )?;

    let app = global.open_app()?;
    let tasks = search(&app.my_tasks()?, &filter);

    let mut human = HumanOutput::new(format!("tb search: {} match(es)", tasks.len()));
    if let Some(query) = &filter.query {
        human.push_summary("query", query.clone());
    }
    if let Some(tag) = &filter.tag {
        human.push_summary("tag", tag.clone());
    }
    if let Some(priority) = filter.priority {
        human.push_summary("priority", priority.to_string());
    }
    if let Some(status) = filter.status {
        human.push_summary("status", status.to_string());
    }
    push_task_lines(&mut human, &tasks);

    let report = TaskListReport {
        total: tasks.len(),
        tasks,
    };
    emit_success(global.output(), "search", &report, Some(&human))
}

pub fn run_stats(global: &GlobalOptions) -> Result<()> {
    let app = global.open_app()?;
    let tasks = app.my_tasks()?;
    let stats = app.stats(Utc::now())?;
    let by_priority = priority_breakdown(&tasks);

    let mut human = HumanOutput::new("tb stats");
    human.push_summary("total", stats.total.to_string());
    human.push_summary("completed", stats.completed.to_string());
    human.push_summary("in progress", stats.in_progress.to_string());
    human.push_summary("pending", stats.pending.to_string());
    human.push_summary("high priority", stats.high_priority.to_string());
    human.push_summary("overdue", stats.overdue.to_string());
    human.push_summary("completion rate", format!("{}%", stats.completion_rate()));
    human.push_detail(format!(
        "by priority: {} high, {} medium, {} low",
        by_priority.high, by_priority.medium, by_priority.low
    ));

    let report = StatsReport {
        completion_rate: stats.completion_rate(),
        stats,
        by_priority,
    };
    emit_success(global.output(), "stats", &report, Some(&human))
}

pub fn run_export(options: ExportOptions, global: &GlobalOptions) -> Result<()> {
    let app = global.open_app()?;
    let document = app.export(Utc::now())?;
    let path = export_path(options.out.as_deref(), &document)?;

    write_atomic(&path, document.to_json()?.as_bytes())?;
    tracing::info!(path = %path.display(), tasks = document.tasks.len(), "exported");

    let mut human = HumanOutput::new(format!("tb export: wrote {}", path.display()));
    human.push_summary("user", document.user.email.clone());
    human.push_summary("tasks", document.tasks.len().to_string());

    let report = ExportReport {
        path,
        tasks: document.tasks.len(),
        stats: document.stats,
    };
    emit_success(global.output(), "export", &report, Some(&human))
}

/// An existing directory (or none, meaning the working directory) receives
/// the document's suggested file name; anything else is taken as the file.
fn export_path(out: Option<&Path>, document: &ExportDocument) -> Result<PathBuf> {
    let target = match out {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir()?,
    };
    if target.is_dir() {
        Ok(target.join(document.file_name()))
    } else {
        Ok(target)
    }
}
