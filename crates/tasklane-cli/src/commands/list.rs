use anyhow::Result;
use chrono::NaiveDate;
use tasklane_core::store::TaskStore;

use crate::cli::ListCommand;
use crate::config::Config;
use crate::views::table::display_tasks;

pub fn list_tasks(store: &TaskStore, command: ListCommand, config: &Config, today: NaiveDate) -> Result<()> {
    let mut criteria = config.default_list.criteria();
    if command.completed {
        criteria.completed = true;
    }
    if let Some(date) = command.date {
        criteria.date_filter = date;
    }
    if let Some(priority) = command.priority {
        criteria.priority_filter = priority;
    }
    if let Some(tag) = command.tag {
        criteria.tag_filter = tag;
    }

    let tasks = store.select(&criteria, today);
    display_tasks(&tasks, today);

    Ok(())
}
