//! Text search and field filters over a task list.

use std::str::FromStr;

use crate::error::Result;
use crate::task::{Priority, Status, Task};

/// Search criteria; unset fields impose no constraint and all set fields
/// must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    /// Case-insensitive substring of title, description or any tag
    pub query: Option<String>,
    /// Exact tag membership
    pub tag: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
}

impl SearchFilter {
    pub fn query(text: impl Into<String>) -> Self {
        Self {
            query: Some(text.into()),
            ..Self::default()
        }
    }

    /// Build a filter from free-form text inputs, where an empty value or
    /// `"all"` means "any".
    pub fn from_inputs(
        query: Option<&str>,
        tag: Option<&str>,
        priority: Option<&str>,
        status: Option<&str>,
    ) -> Result<Self> {
        Ok(Self {
            query: text_input(query).map(str::to_string),
            tag: text_input(tag).map(str::to_string),
            priority: choice_input::<Priority>(priority)?,
            status: choice_input::<Status>(status)?,
        })
    }

    pub fn matches(&self, task: &Task) -> bool {
        if let Some(query) = self.query.as_deref().filter(|q| !q.trim().is_empty()) {
            if !matches_text(task, &query.to_lowercase()) {
                return false;
            }
        }
        if let Some(tag) = self.tag.as_deref().filter(|t| !t.is_empty()) {
            if !task.tags.iter().any(|candidate| candidate == tag) {
                return false;
            }
        }
        if self.priority.is_some_and(|priority| task.priority != priority) {
            return false;
        }
        if self.status.is_some_and(|status| task.status != status) {
            return false;
        }
        true
    }
}

fn matches_text(task: &Task, needle: &str) -> bool {
    task.title.to_lowercase().contains(needle)
        || task.description.to_lowercase().contains(needle)
        || task.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
}

fn text_input(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn choice_input<T>(value: Option<&str>) -> Result<Option<T>>
where
    T: FromStr<Err = crate::error::Error>,
{
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("all") => Ok(None),
        Some(v) => v.parse().map(Some),
    }
}

/// Tasks matching `filter`, in input order
pub fn search(tasks: &[Task], filter: &SearchFilter) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| filter.matches(task))
        .cloned()
        .collect()
}
