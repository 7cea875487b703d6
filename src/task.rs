//! Task records and the task store.
//!
//! Tasks live in a single `tasks` collection in storage order. Listing never
//! re-sorts, and every mutation is one locked read-modify-write of the
//! collection.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::{Error, Result};
use crate::storage::{Storage, TASKS_KEY};
use crate::user::DEMO_USER_ID;

const TASK_ID_PREFIX: &str = "task_";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(Error::InvalidArgument(format!(
                "invalid priority '{other}' (expected low|medium|high)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Pending, Status::InProgress, Status::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InProgress => "in-progress",
            Status::Completed => "completed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Status::Pending),
            "in-progress" | "in_progress" => Ok(Status::InProgress),
            "completed" => Ok(Status::Completed),
            other => Err(Error::InvalidArgument(format!(
                "invalid status '{other}' (expected pending|in-progress|completed)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Task {
    /// Not completed and due strictly before `today`
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != Status::Completed && self.due_date.is_some_and(|due| due < today)
    }
}

/// Fields for a new task
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub tags: Vec<String>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial update. Identity fields (`id`, `user_id`, `created_at`) have no
/// slot here, so a patch cannot move a task or rewrite its history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    /// `Some(None)` clears the due date
    pub due_date: Option<Option<NaiveDate>>,
    pub tags: Option<Vec<String>>,
}

impl TaskPatch {
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(tags) = self.tags {
            task.tags = tags;
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskStore {
    storage: Storage,
}

impl TaskStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Every task owned by `user_id`, in storage order
    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<Task>> {
        let tasks: Vec<Task> = self.storage.load(TASKS_KEY)?;
        Ok(tasks
            .into_iter()
            .filter(|task| task.user_id == user_id)
            .collect())
    }

    pub fn get(&self, task_id: &str) -> Result<Option<Task>> {
        let tasks: Vec<Task> = self.storage.load(TASKS_KEY)?;
        Ok(tasks.into_iter().find(|task| task.id == task_id))
    }

    /// Store a new pending task. Titles are stored as given, empty included.
    pub fn create(&self, user_id: &str, new: NewTask) -> Result<Task> {
        let task = self.storage.update(TASKS_KEY, |tasks: &mut Vec<Task>| {
            let existing: HashSet<&str> = tasks.iter().map(|task| task.id.as_str()).collect();
            let id = generate_task_id(&existing);
            let now = Utc::now();
            let task = Task {
                id,
                user_id: user_id.to_string(),
                title: new.title,
                description: new.description,
                priority: new.priority,
                status: Status::Pending,
                due_date: new.due_date,
                created_at: now,
                updated_at: now,
                tags: new.tags,
            };
            tasks.push(task.clone());
            Ok(task)
        })?;
        tracing::debug!(task_id = %task.id, user_id, "task created");
        Ok(task)
    }

    /// Merge `patch` into the task. `Ok(None)` when no such task exists.
    pub fn update(&self, task_id: &str, patch: TaskPatch) -> Result<Option<Task>> {
        let updated = self.storage.update(TASKS_KEY, |tasks: &mut Vec<Task>| {
            let Some(task) = tasks.iter_mut().find(|task| task.id == task_id) else {
                return Ok(None);
            };
            patch.apply(task);
            task.updated_at = Utc::now().max(task.updated_at);
            Ok(Some(task.clone()))
        })?;
        match &updated {
            Some(task) => tracing::debug!(task_id, status = %task.status, "task updated"),
            None => tracing::debug!(task_id, "update of unknown task"),
        }
        Ok(updated)
    }

    /// Remove the task; `false` when it did not exist.
    pub fn delete(&self, task_id: &str) -> Result<bool> {
        let removed = self.storage.update(TASKS_KEY, |tasks: &mut Vec<Task>| {
            let before = tasks.len();
            tasks.retain(|task| task.id != task_id);
            Ok(tasks.len() != before)
        })?;
        tracing::debug!(task_id, removed, "task delete");
        Ok(removed)
    }

    /// Write the demo tasks when the task collection has never been written.
    ///
    /// Returns the number of tasks seeded (0 when the collection exists).
    pub fn seed_demo_tasks(&self, now: DateTime<Utc>) -> Result<usize> {
        let tasks = demo_tasks(now);
        if !self.storage.init(TASKS_KEY, &tasks)? {
            return Ok(0);
        }
        tracing::info!(count = tasks.len(), "seeded demo tasks");
        Ok(tasks.len())
    }
}

fn generate_task_id(existing: &HashSet<&str>) -> String {
    loop {
        let id = format!("{}{}", TASK_ID_PREFIX, Ulid::new().to_string().to_lowercase());
        if !existing.contains(id.as_str()) {
            return id;
        }
    }
}

fn demo_tasks(now: DateTime<Utc>) -> Vec<Task> {
    let due_in = |days: i64| Some((now + Duration::days(days)).date_naive());
    let demo = |id: &str,
                title: &str,
                description: &str,
                priority: Priority,
                status: Status,
                due_date: Option<NaiveDate>,
                tags: &[&str]| Task {
        id: id.to_string(),
        user_id: DEMO_USER_ID.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        priority,
        status,
        due_date,
        created_at: now,
        updated_at: now,
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
    };

    vec![
        demo(
            "task_1",
            "Complete project proposal",
            "Finish the Q1 project proposal and submit to manager",
            Priority::High,
            Status::InProgress,
            due_in(2),
            &["work", "important"],
        ),
        demo(
            "task_2",
            "Review team feedback",
            "Go through and respond to team feedback from last meeting",
            Priority::Medium,
            Status::Pending,
            due_in(5),
            &["work", "feedback"],
        ),
        demo(
            "task_3",
            "Update portfolio",
            "Add recent projects to personal portfolio website",
            Priority::Low,
            Status::Pending,
            due_in(10),
            &["personal", "projects"],
        ),
    ]
}
