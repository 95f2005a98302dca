//! Task records and the field patches the store accepts for them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name reserved for records materialized from a finished focus session.
/// Such records count toward stats but are hidden from task lists.
pub const FOCUS_SESSION_TASK_NAME: &str = "Focus Session";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    /// Empty until the store assigns one on create.
    pub id: String,
    pub name: String,
    pub duration_minutes: u32,
    pub is_completed: bool,
    /// Creation time in epoch milliseconds. Never changes after create.
    pub date: i64,
    pub owner_id: String,
}

impl TaskRecord {
    pub fn new(
        owner_id: impl Into<String>,
        name: impl Into<String>,
        duration_minutes: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            duration_minutes,
            is_completed: false,
            date: created_at.timestamp_millis(),
            owner_id: owner_id.into(),
        }
    }

    pub fn focus_session(
        owner_id: impl Into<String>,
        duration_minutes: u32,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            is_completed: true,
            ..Self::new(owner_id, FOCUS_SESSION_TASK_NAME, duration_minutes, finished_at)
        }
    }

    pub fn is_focus_session(&self) -> bool {
        self.name == FOCUS_SESSION_TASK_NAME
    }
}

/// Partial update for a task. Completion is the only mutable field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub is_completed: Option<bool>,
}

impl TaskPatch {
    pub fn completed(value: bool) -> Self {
        Self {
            is_completed: Some(value),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.is_completed.is_none()
    }
}
