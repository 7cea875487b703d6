//! tb task command implementations.

use chrono::Utc;
use serde::Serialize;

use crate::cli::{parse_due_date, parse_tags, required_text, GlobalOptions};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::search::{search, SearchFilter};
use crate::task::{NewTask, Priority, Status, Task, TaskPatch};

pub struct NewOptions {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub due: Option<String>,
    pub tags: Vec<String>,
}

pub struct ListOptions {
    pub status: Option<String>,
    pub priority: Option<String>,
}

pub struct ShowOptions {
    pub id: String,
}

pub struct EditOptions {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub due: Option<String>,
    pub clear_due: bool,
    pub tags: Vec<String>,
    pub clear_tags: bool,
}

#[derive(Serialize)]
pub(crate) struct TaskListReport {
    pub total: usize,
    pub tasks: Vec<Task>,
}

#[derive(Serialize)]
struct DeleteReport {
    id: String,
    title: String,
}

pub fn run_new(options: NewOptions, global: &GlobalOptions) -> Result<()> {
    let title = required_text("title", &options.title)?;
    let due_date = options.due.as_deref().map(parse_due_date).transpose()?;

    let app = global.open_app()?;
    let priority = match options.priority.as_deref() {
        Some(value) => value.parse::<Priority>()?,
        None => app.config().tasks.default_priority,
    };

    let task = app.create_task(NewTask {
        title,
        description: options.description.unwrap_or_default().trim().to_string(),
        priority,
        due_date,
        tags: parse_tags(&options.tags),
    })?;

    let mut human = HumanOutput::new(format!("tb task new: created {}", task.id));
    push_task_summary(&mut human, &task);
    human.push_next_step(format!("tb task start {}", task.id));

    emit_success(global.output(), "task new", &task, Some(&human))
}

pub fn run_list(options: ListOptions, global: &GlobalOptions) -> Result<()> {
    let filter = SearchFilter::from_inputs(
        None,
        None,
        options.priority.as_deref(),
        options.status.as_deref(),
    )?;

    let app = global.open_app()?;
    let tasks = search(&app.my_tasks()?, &filter);

    let mut human = HumanOutput::new(format!("tb task list: {} task(s)", tasks.len()));
    push_task_lines(&mut human, &tasks);
    if tasks.is_empty() {
        human.push_next_step("tb task new <title>");
    }

    let report = TaskListReport {
        total: tasks.len(),
        tasks,
    };
    emit_success(global.output(), "task list", &report, Some(&human))
}

pub fn run_show(options: ShowOptions, global: &GlobalOptions) -> Result<()> {
    let app = global.open_app()?;
    let task = app.my_task(&options.id)?;

    let mut human = HumanOutput::new(format!("tb task show: {}", task.title));
    push_task_summary(&mut human, &task);
    if !task.description.is_empty() {
        human.push_detail(task.description.clone());
    }

    emit_success(global.output(), "task show", &task, Some(&human))
}

pub fn run_edit(options: EditOptions, global: &GlobalOptions) -> Result<()> {
    let patch = TaskPatch {
        title: options
            .title
            .as_deref()
            .map(|title| required_text("title", title))
            .transpose()?,
        description: options.description.map(|text| text.trim().to_string()),
        priority: options
            .priority
            .as_deref()
            .map(str::parse::<Priority>)
            .transpose()?,
        status: options
            .status
            .as_deref()
            .map(str::parse::<Status>)
            .transpose()?,
        due_date: if options.clear_due {
            Some(None)
        } else {
            options
                .due
                .as_deref()
                .map(parse_due_date)
                .transpose()?
                .map(Some)
        },
        tags: if options.clear_tags {
            Some(Vec::new())
        } else if options.tags.is_empty() {
            None
        } else {
            Some(parse_tags(&options.tags))
        },
    };
    if patch.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to change; pass at least one field flag".to_string(),
        ));
    }

    let app = global.open_app()?;
    let task = app.update_task(&options.id, patch)?;

    let mut human = HumanOutput::new(format!("tb task edit: updated {}", task.id));
    push_task_summary(&mut human, &task);

    emit_success(global.output(), "task edit", &task, Some(&human))
}

pub fn run_start(options: ShowOptions, global: &GlobalOptions) -> Result<()> {
    set_status(options, global, Status::InProgress, "task start")
}

pub fn run_done(options: ShowOptions, global: &GlobalOptions) -> Result<()> {
    set_status(options, global, Status::Completed, "task done")
}

fn set_status(
    options: ShowOptions,
    global: &GlobalOptions,
    status: Status,
    command: &str,
) -> Result<()> {
    let app = global.open_app()?;
    let task = app.update_task(&options.id, TaskPatch::status(status))?;

    let mut human = HumanOutput::new(format!("tb {command}: {} is {}", task.id, task.status));
    push_task_summary(&mut human, &task);
    if status == Status::Completed {
        human.push_next_step("tb stats");
    }

    emit_success(global.output(), command, &task, Some(&human))
}

pub fn run_delete(options: ShowOptions, global: &GlobalOptions) -> Result<()> {
    let app = global.open_app()?;
    let task = app.my_task(&options.id)?;
    app.delete_task(&task.id)?;

    let human = HumanOutput::new(format!("tb task delete: deleted {}", task.id));
    let report = DeleteReport {
        id: task.id,
        title: task.title,
    };
    emit_success(global.output(), "task delete", &report, Some(&human))
}

fn push_task_summary(human: &mut HumanOutput, task: &Task) {
    human.push_summary("id", task.id.clone());
    human.push_summary("title", task.title.clone());
    human.push_summary("status", task.status.to_string());
    human.push_summary("priority", task.priority.to_string());
    human.push_summary(
        "due",
        task.due_date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "none".to_string()),
    );
    if !task.tags.is_empty() {
        human.push_summary("tags", task.tags.join(", "));
    }
}

/// One detail line per task, e.g. `task_01.. [high] [pending] Ship it (due 2024-06-10, overdue) #work`
pub(crate) fn push_task_lines(human: &mut HumanOutput, tasks: &[Task]) {
    let today = Utc::now().date_naive();
    for task in tasks {
        human.push_detail(task_line(task, today));
    }
}

fn task_line(task: &Task, today: chrono::NaiveDate) -> String {
    let mut line = format!(
        "{} [{}] [{}] {}",
        task.id, task.priority, task.status, task.title
    );
    if let Some(due) = task.due_date {
        if task.is_overdue(today) {
            line.push_str(&format!(" (due {due}, overdue)"));
        } else {
            line.push_str(&format!(" (due {due})"));
        }
    }
    for tag in &task.tags {
        line.push_str(&format!(" #{tag}"));
    }
    line
}
