use chrono::NaiveDate;
use chrono_humanize::Humanize;
use comfy_table::{Attribute, Cell, Color, Row, Table};
use tasklane_core::models::{Priority, Task};
use tasklane_core::notifications::NotificationIntent;
use tasklane_core::stats::TaskSummary;

use crate::util::short_id;

pub fn display_tasks(tasks: &[Task], today: NaiveDate) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Priority", "Tag", "Deadline", "Scheduled", "Created"]);

    for task in tasks {
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(&task.id)));

        let mut title_cell = Cell::new(&task.title);
        title_cell = if task.completed {
            title_cell
                .add_attribute(Attribute::CrossedOut)
                .fg(Color::DarkGrey)
        } else {
            match task.priority {
                Priority::High => title_cell.fg(Color::Red).add_attribute(Attribute::Bold),
                Priority::Medium => title_cell.fg(Color::Yellow),
                Priority::Low => title_cell.fg(Color::Green),
            }
        };
        row.add_cell(title_cell);
        row.add_cell(Cell::new(task.priority));
        row.add_cell(Cell::new(&task.tag));

        let deadline_cell = match task.deadline {
            Some(deadline) => {
                let text = deadline.format("%Y-%m-%d").to_string();
                if task.completed {
                    Cell::new(text)
                } else if deadline < today {
                    Cell::new(text).fg(Color::Red) // Overdue
                } else if deadline == today {
                    Cell::new(text).fg(Color::Yellow) // Due today
                } else {
                    Cell::new(text)
                }
            }
            None => Cell::new("None"),
        };
        row.add_cell(deadline_cell);

        row.add_cell(Cell::new(
            task.scheduled_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "None".to_string()),
        ));
        row.add_cell(Cell::new(task.created_at.humanize()));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_tags(tags: &[String], summary: &TaskSummary) {
    let mut table = Table::new();
    table.set_header(vec!["Tag", "Tasks"]);
    for tag in tags {
        let count = summary.by_tag.get(tag).copied().unwrap_or_default();
        table.add_row(vec![Cell::new(tag), Cell::new(count)]);
    }
    println!("{table}");
}

pub fn display_notifications(intents: &[NotificationIntent]) {
    if intents.is_empty() {
        println!("No reminders due.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Time", "Task", "Email"]);
    for intent in intents {
        let time = intent
            .notification_time
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_else(|| "Any time".to_string());
        table.add_row(vec![
            Cell::new(time),
            Cell::new(&intent.task_title),
            Cell::new(&intent.email),
        ]);
    }
    println!("{table}");
}

pub fn display_summary(summary: &TaskSummary) {
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec![Cell::new("Total"), Cell::new(summary.total)]);
    table.add_row(vec![
        Cell::new("Completed"),
        Cell::new(summary.completed).fg(Color::Green),
    ]);
    table.add_row(vec![Cell::new("Pending"), Cell::new(summary.pending)]);
    table.add_row(vec![
        Cell::new("Completion rate"),
        Cell::new(format!("{:.0}%", summary.completion_rate * 100.0)),
    ]);
    for (priority, count) in &summary.by_priority {
        table.add_row(vec![Cell::new(format!("Priority {}", priority)), Cell::new(count)]);
    }
    for (tag, count) in &summary.by_tag {
        table.add_row(vec![Cell::new(format!("Tag {}", tag)), Cell::new(count)]);
    }
    println!("{table}");
}
