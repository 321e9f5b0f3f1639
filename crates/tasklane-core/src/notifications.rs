//! Notification scheduling intent.
//!
//! The store only records who wants a reminder and when. Delivery is done by
//! an external job that asks for the tasks due on a given date.

use crate::models::Task;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationIntent {
    pub task_id: Uuid,
    pub task_title: String,
    pub email: String,
    pub notification_time: Option<NaiveTime>,
}

/// Tasks with notifications enabled, a non-blank address and a scheduled
/// date equal to `date`, ordered by notification time (unset times last).
pub fn due_on(tasks: &[Task], date: NaiveDate) -> Vec<NotificationIntent> {
    let mut intents: Vec<NotificationIntent> = tasks
        .iter()
        .filter(|task| task.notifications_enabled && task.scheduled_date == Some(date))
        .filter_map(|task| {
            let email = task.email_notification.as_deref()?.trim();
            if email.is_empty() {
                return None;
            }
            Some(NotificationIntent {
                task_id: task.id,
                task_title: task.title.clone(),
                email: email.to_string(),
                notification_time: task.notification_time,
            })
        })
        .collect();

    intents.sort_by_key(|intent| (intent.notification_time.is_none(), intent.notification_time));
    intents
}
