//! Boundary with the task assistant.
//!
//! The assistant turns free text into a best-effort [`TaskCandidate`]; this
//! module only converts and validates it. Language understanding happens on
//! the other side.

use crate::error::CoreError;
use crate::models::{NewTaskData, Priority};
use crate::tags::{normalize_tag, OTHER_TAG};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

/// Candidate task as produced by the assistant. Blank strings mean "not
/// provided", which is how the assistant reports missing fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskCandidate {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub tag: Option<String>,
    pub time_slot: Option<String>,
    pub duration: Option<String>,
    pub links: Option<String>,
    pub deadline: Option<String>,
    pub scheduled_date: Option<String>,
    pub notifications_enabled: bool,
    pub email_notification: Option<String>,
    pub notification_time: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_date(field: &str, value: Option<String>) -> Result<Option<NaiveDate>, CoreError> {
    present(value)
        .map(|v| {
            NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                .map_err(|_| CoreError::InvalidInput(format!("{} must be YYYY-MM-DD, got '{}'", field, v)))
        })
        .transpose()
}

fn parse_time(value: Option<String>) -> Result<Option<NaiveTime>, CoreError> {
    present(value)
        .map(|v| {
            NaiveTime::parse_from_str(&v, "%H:%M")
                .or_else(|_| NaiveTime::parse_from_str(&v, "%H:%M:%S"))
                .map_err(|_| CoreError::InvalidInput(format!("notificationTime must be HH:MM, got '{}'", v)))
        })
        .transpose()
}

impl TaskCandidate {
    /// Converts into creation data. A missing priority defaults to medium
    /// and a missing tag to the sentinel; a present but unparseable value is
    /// rejected. Tag membership is checked by the store.
    pub fn into_new_task(self) -> Result<NewTaskData, CoreError> {
        let priority = match present(self.priority) {
            Some(p) => p
                .parse::<Priority>()
                .map_err(|e| CoreError::InvalidInput(e.to_string()))?,
            None => Priority::default(),
        };
        let tag = match present(self.tag) {
            Some(tag) => normalize_tag(&tag)?,
            None => OTHER_TAG.to_string(),
        };

        Ok(NewTaskData {
            title: self.title.trim().to_string(),
            description: present(self.description),
            priority,
            tag,
            time_slot: present(self.time_slot),
            duration: present(self.duration),
            links: present(self.links),
            deadline: parse_date("deadline", self.deadline)?,
            scheduled_date: parse_date("scheduledDate", self.scheduled_date)?,
            notifications_enabled: self.notifications_enabled,
            email_notification: present(self.email_notification),
            notification_time: parse_time(self.notification_time)?,
        })
    }
}
