use anyhow::{anyhow, Result};
use chrono::{NaiveDate, NaiveTime};
use tasklane_core::error::CoreError;
use tasklane_core::store::TaskStore;
use uuid::Uuid;

pub fn resolve_task_id(store: &TaskStore, short_id: &str) -> Result<Uuid> {
    if short_id.len() < 2 {
        return Err(anyhow!(CoreError::InvalidInput(
            "Short ID must be at least 2 characters long.".to_string()
        )));
    }
    let tasks = store.find_by_prefix(short_id);
    if tasks.len() == 1 {
        Ok(tasks[0].id)
    } else if tasks.is_empty() {
        Err(anyhow!(CoreError::NotFound(format!(
            "No task found with ID prefix '{}'",
            short_id
        ))))
    } else {
        let task_info: Vec<(String, String)> = tasks
            .into_iter()
            .map(|t| (t.id.simple().to_string(), t.title))
            .collect();
        Err(anyhow!(CoreError::AmbiguousId(task_info)))
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        anyhow!(CoreError::InvalidInput(format!(
            "'{}' is not a date, expected YYYY-MM-DD",
            value
        )))
    })
}

pub fn parse_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| {
        anyhow!(CoreError::InvalidInput(format!(
            "'{}' is not a time, expected HH:MM",
            value
        )))
    })
}

/// Short, copy-friendly form of a task ID.
pub fn short_id(id: &Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}
