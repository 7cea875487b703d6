//! Portable `{user, stats, tasks}` document for a single account.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::stats::{compute_stats, TaskStats};
use crate::task::Task;
use crate::user::User;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub exported_at: DateTime<Utc>,
    pub user: User,
    pub stats: TaskStats,
    pub tasks: Vec<Task>,
}

impl ExportDocument {
    pub fn build(user: User, tasks: Vec<Task>, as_of: DateTime<Utc>) -> Self {
        let stats = compute_stats(&tasks, as_of);
        Self {
            exported_at: as_of,
            user,
            stats,
            tasks,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Suggested download name, e.g. `task-buddy-export-1718020800000.json`
    pub fn file_name(&self) -> String {
        format!(
            "task-buddy-export-{}.json",
            self.exported_at.timestamp_millis()
        )
    }
}
