use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Identity of the signed-in user. Every remote row is scoped by `user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: String,
}

impl UserSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
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

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task priority: {0}")]
pub struct ParsePriorityError(String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(ParsePriorityError(s.to_string())),
        }
    }
}

/// A single trackable to-do item.
///
/// Serialized with the application's camelCase field names; the remote
/// column names are handled by [`crate::gateway::TaskRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Priority,
    /// Always a member of the tag registry.
    pub tag: String,
    pub time_slot: Option<String>,
    pub duration: Option<String>,
    pub links: Option<String>,
    /// Date the task should be finished by.
    pub deadline: Option<NaiveDate>,
    /// Date the task is planned to be worked on.
    pub scheduled_date: Option<NaiveDate>,
    pub notifications_enabled: bool,
    pub email_notification: Option<String>,
    pub notification_time: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Builds a fresh, not yet completed task from creation data.
    pub fn from_new(data: NewTaskData) -> Self {
        Self {
            id: Uuid::now_v7(),
            title: data.title,
            description: data.description,
            completed: false,
            priority: data.priority,
            tag: data.tag,
            time_slot: data.time_slot,
            duration: data.duration,
            links: data.links,
            deadline: data.deadline,
            scheduled_date: data.scheduled_date,
            notifications_enabled: data.notifications_enabled,
            email_notification: data.email_notification,
            notification_time: data.notification_time,
            created_at: Utc::now(),
        }
    }
}

/// Everything a caller supplies when creating a task. `id`, `created_at`
/// and `completed` are assigned by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTaskData {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub tag: String,
    pub time_slot: Option<String>,
    pub duration: Option<String>,
    pub links: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub scheduled_date: Option<NaiveDate>,
    pub notifications_enabled: bool,
    pub email_notification: Option<String>,
    pub notification_time: Option<NaiveTime>,
}

/// A partial update. `None` leaves a field untouched; for optional fields
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskData {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub tag: Option<String>,
    pub time_slot: Option<Option<String>>,
    pub duration: Option<Option<String>>,
    pub links: Option<Option<String>>,
    pub deadline: Option<Option<NaiveDate>>,
    pub scheduled_date: Option<Option<NaiveDate>>,
    pub notifications_enabled: Option<bool>,
    pub email_notification: Option<Option<String>>,
    pub notification_time: Option<Option<NaiveTime>>,
}

impl UpdateTaskData {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Default::default()
        }
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Writes the supplied fields onto `task`, leaving all others alone.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(tag) = &self.tag {
            task.tag = tag.clone();
        }
        if let Some(time_slot) = &self.time_slot {
            task.time_slot = time_slot.clone();
        }
        if let Some(duration) = &self.duration {
            task.duration = duration.clone();
        }
        if let Some(links) = &self.links {
            task.links = links.clone();
        }
        if let Some(deadline) = self.deadline {
            task.deadline = deadline;
        }
        if let Some(scheduled_date) = self.scheduled_date {
            task.scheduled_date = scheduled_date;
        }
        if let Some(enabled) = self.notifications_enabled {
            task.notifications_enabled = enabled;
        }
        if let Some(email) = &self.email_notification {
            task.email_notification = email.clone();
        }
        if let Some(time) = self.notification_time {
            task.notification_time = time;
        }
    }
}

/// Outcome of `add_tag`. Adding an existing tag is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagAddition {
    Added(String),
    AlreadyPresent(String),
}

impl TagAddition {
    pub fn name(&self) -> &str {
        match self {
            TagAddition::Added(name) | TagAddition::AlreadyPresent(name) => name,
        }
    }
}

/// Outcome of a tag removal and its cascade, applied as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRemovalResult {
    pub tag: String,
    pub tag_removed: bool,
    /// Tasks moved onto the sentinel tag.
    pub reassigned_task_ids: Vec<Uuid>,
}
