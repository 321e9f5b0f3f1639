//! Persistence boundary used by [`crate::store::TaskStore`].
//!
//! Remote rows use snake_case column names and carry the owning `user_id`;
//! [`TaskRecord`] translates between them and the local [`Task`].

use crate::models::{Priority, Task, UpdateTaskData, UserSession};
use crate::tags::{normalize_tag, OTHER_TAG};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryGateway;
pub use sqlite::SqliteGateway;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("remote store unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("malformed remote row: {0}")]
    Decode(String),
}

/// A task row as the remote store holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TaskRecord {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
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
    pub created_at: DateTime<Utc>,
}

impl TaskRecord {
    pub fn from_task(task: &Task, session: &UserSession) -> Self {
        Self {
            id: task.id,
            user_id: session.user_id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            completed: task.completed,
            priority: task.priority,
            tag: task.tag.clone(),
            time_slot: task.time_slot.clone(),
            duration: task.duration.clone(),
            links: task.links.clone(),
            deadline: task.deadline,
            scheduled_date: task.scheduled_date,
            notifications_enabled: task.notifications_enabled,
            email_notification: task.email_notification.clone(),
            notification_time: task.notification_time,
            created_at: task.created_at,
        }
    }

    /// Converts a remote row into a local task. Blank tags fall back to the
    /// sentinel; a blank title is a malformed row.
    pub fn into_task(self) -> Result<Task, GatewayError> {
        if self.title.trim().is_empty() {
            return Err(GatewayError::Decode(format!("task {} has an empty title", self.id)));
        }
        let tag = normalize_tag(&self.tag).unwrap_or_else(|_| OTHER_TAG.to_string());
        Ok(Task {
            id: self.id,
            title: self.title,
            description: self.description,
            completed: self.completed,
            priority: self.priority,
            tag,
            time_slot: self.time_slot,
            duration: self.duration,
            links: self.links,
            deadline: self.deadline,
            scheduled_date: self.scheduled_date,
            notifications_enabled: self.notifications_enabled,
            email_notification: self.email_notification,
            notification_time: self.notification_time,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TagRecord {
    pub user_id: String,
    pub tag: String,
}

/// Remote store for tasks and tags, scoped per user.
///
/// Calls for the same session arrive one at a time and in issue order.
#[async_trait]
pub trait SyncGateway: Send + Sync {
    async fn load_tags(&self, session: &UserSession) -> Result<Vec<TagRecord>, GatewayError>;
    async fn load_tasks(&self, session: &UserSession) -> Result<Vec<TaskRecord>, GatewayError>;
    async fn insert_task(&self, session: &UserSession, record: &TaskRecord) -> Result<(), GatewayError>;
    async fn update_task(
        &self,
        session: &UserSession,
        id: Uuid,
        changes: &UpdateTaskData,
    ) -> Result<(), GatewayError>;
    async fn delete_task(&self, session: &UserSession, id: Uuid) -> Result<(), GatewayError>;
    async fn insert_tag(&self, session: &UserSession, tag: &str) -> Result<(), GatewayError>;
    /// Deletes `tag` and moves every task holding it onto `reassign_to`, as
    /// a single transaction.
    async fn remove_tag(
        &self,
        session: &UserSession,
        tag: &str,
        reassign_to: &str,
    ) -> Result<(), GatewayError>;
}
