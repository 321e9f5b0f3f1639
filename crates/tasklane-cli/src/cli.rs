use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tasklane_core::filter::{DateBucket, PriorityFilter, TagFilter};
use tasklane_core::models::Priority;

/// Tasklane: a personal task tracker with tags, deadlines and reminders
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Add a new task
    Add(AddCommand),
    /// List tasks
    List(ListCommand),
    /// Toggle a task between pending and completed
    Done(DoneCommand),
    /// Edit a task
    Edit(EditCommand),
    /// Delete a task
    Delete(DeleteCommand),
    /// Manage tags
    Tag(TagCommand),
    /// Show reminders due on a date
    Notify(NotifyCommand),
    /// Create a task from assistant JSON
    Import(ImportCommand),
    /// Show task statistics
    Stats,
}

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    /// The title of the task
    pub title: String,
    /// The description of the task
    #[clap(short, long)]
    pub description: Option<String>,
    /// The priority of the task (low, medium, high)
    #[clap(short, long)]
    pub priority: Option<Priority>,
    /// The tag of the task
    #[clap(short, long, default_value = "other")]
    pub tag: String,
    /// Deadline (YYYY-MM-DD)
    #[clap(long)]
    pub deadline: Option<String>,
    /// Day the task is planned for (YYYY-MM-DD)
    #[clap(long)]
    pub scheduled: Option<String>,
    /// Time slot, e.g. "16:25-17:30"
    #[clap(long)]
    pub time_slot: Option<String>,
    /// Expected duration, e.g. "1h"
    #[clap(long)]
    pub duration: Option<String>,
    /// Related links
    #[clap(long)]
    pub links: Option<String>,
    /// Email address for a reminder on the scheduled day
    #[clap(long, requires = "scheduled")]
    pub notify_email: Option<String>,
    /// Reminder time (HH:MM)
    #[clap(long, requires = "notify_email")]
    pub notify_at: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    /// Show completed tasks instead of pending ones
    #[arg(long)]
    pub completed: bool,
    /// Deadline window (all, next_day, next_week, next_month, next_six_months,
    /// past_week, past_month, all_past)
    #[arg(long)]
    pub date: Option<DateBucket>,
    /// Priority filter (all, low, medium, high)
    #[arg(long)]
    pub priority: Option<PriorityFilter>,
    /// Tag filter (all or a tag name)
    #[arg(long)]
    pub tag: Option<TagFilter>,
}

#[derive(Parser, Debug, Clone)]
pub struct DoneCommand {
    /// The ID (or ID prefix) of the task
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct EditCommand {
    /// The ID (or ID prefix) of the task to edit
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, conflicts_with = "description")]
    pub description_clear: bool,

    #[arg(long)]
    pub priority: Option<Priority>,

    #[arg(long)]
    pub tag: Option<String>,

    #[arg(long)]
    pub deadline: Option<String>,
    #[arg(long, conflicts_with = "deadline")]
    pub deadline_clear: bool,

    #[arg(long)]
    pub scheduled: Option<String>,
    #[arg(long, conflicts_with = "scheduled")]
    pub scheduled_clear: bool,

    #[arg(long)]
    pub time_slot: Option<String>,
    #[arg(long, conflicts_with = "time_slot")]
    pub time_slot_clear: bool,

    #[arg(long)]
    pub duration: Option<String>,
    #[arg(long, conflicts_with = "duration")]
    pub duration_clear: bool,

    #[arg(long)]
    pub links: Option<String>,
    #[arg(long, conflicts_with = "links")]
    pub links_clear: bool,

    /// Set the reminder address and turn reminders on
    #[arg(long)]
    pub notify_email: Option<String>,
    #[arg(long)]
    pub notify_at: Option<String>,
    /// Turn reminders off
    #[arg(long, conflicts_with_all = ["notify_email", "notify_at"])]
    pub notify_off: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteCommand {
    /// The ID (or ID prefix) of the task to delete
    pub id: String,
    /// Delete without confirmation
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct TagCommand {
    #[command(subcommand)]
    pub action: TagAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TagAction {
    /// List tags
    List,
    /// Add a tag
    Add {
        /// The name of the tag
        name: String,
    },
    /// Remove a tag; its tasks move to "other"
    Rm {
        /// The name of the tag
        name: String,
        /// Remove without confirmation
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Parser, Debug, Clone)]
pub struct NotifyCommand {
    /// Date to check (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ImportCommand {
    /// JSON file with a task candidate, or "-" for stdin
    pub source: PathBuf,
}
