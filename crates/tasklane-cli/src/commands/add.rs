use anyhow::Result;
use owo_colors::{OwoColorize, Style};
use tasklane_core::models::NewTaskData;
use tasklane_core::store::TaskStore;

use crate::cli::AddCommand;
use crate::util::{parse_date, parse_time, short_id};

pub async fn add_task(store: &TaskStore, command: AddCommand) -> Result<()> {
    let new_task_data = NewTaskData {
        title: command.title,
        description: command.description,
        priority: command.priority.unwrap_or_default(),
        tag: command.tag,
        time_slot: command.time_slot,
        duration: command.duration,
        links: command.links,
        deadline: command.deadline.as_deref().map(parse_date).transpose()?,
        scheduled_date: command.scheduled.as_deref().map(parse_date).transpose()?,
        notifications_enabled: command.notify_email.is_some(),
        email_notification: command.notify_email,
        notification_time: command.notify_at.as_deref().map(parse_time).transpose()?,
    };

    let added_task = store.add_task(new_task_data).await?;

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();
    println!(
        "{} Created task: {}",
        "✓".style(success_style),
        added_task.title.bright_white().bold()
    );
    println!("  {} Task ID: {}", "→".style(info_style), short_id(&added_task.id));
    println!("  {} Tag: {}, priority: {}", "→".style(info_style), added_task.tag, added_task.priority);
    if added_task.notifications_enabled {
        println!(
            "  {} Reminder to {}",
            "→".style(info_style),
            added_task.email_notification.as_deref().unwrap_or_default()
        );
    }

    Ok(())
}
