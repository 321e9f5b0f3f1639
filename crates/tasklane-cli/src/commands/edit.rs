use anyhow::Result;
use tasklane_core::models::UpdateTaskData;
use tasklane_core::store::TaskStore;

use crate::cli::EditCommand;
use crate::util::{parse_date, parse_time, resolve_task_id};

/// `Some(None)` when `clear` is set, `Some(Some(v))` when a value is given.
fn clearable(value: Option<String>, clear: bool) -> Option<Option<String>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

pub async fn edit_task(store: &TaskStore, command: EditCommand) -> Result<()> {
    let task_id = resolve_task_id(store, &command.id)?;

    let deadline = if command.deadline_clear {
        Some(None)
    } else if let Some(deadline) = command.deadline {
        Some(Some(parse_date(&deadline)?))
    } else {
        None
    };

    let scheduled_date = if command.scheduled_clear {
        Some(None)
    } else if let Some(scheduled) = command.scheduled {
        Some(Some(parse_date(&scheduled)?))
    } else {
        None
    };

    let (notifications_enabled, email_notification) = if command.notify_off {
        (Some(false), None)
    } else if let Some(email) = command.notify_email {
        (Some(true), Some(Some(email)))
    } else {
        (None, None)
    };

    let notification_time = command
        .notify_at
        .as_deref()
        .map(parse_time)
        .transpose()?
        .map(Some);

    let update_data = UpdateTaskData {
        title: command.title,
        description: clearable(command.description, command.description_clear),
        completed: None,
        priority: command.priority,
        tag: command.tag,
        time_slot: clearable(command.time_slot, command.time_slot_clear),
        duration: clearable(command.duration, command.duration_clear),
        links: clearable(command.links, command.links_clear),
        deadline,
        scheduled_date,
        notifications_enabled,
        email_notification,
        notification_time,
    };

    if update_data.is_empty() {
        println!("Nothing to change.");
        return Ok(());
    }

    let updated_task = store.update_task(task_id, update_data).await?;
    println!("Updated task: '{}'", updated_task.title);

    Ok(())
}
