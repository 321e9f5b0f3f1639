use anyhow::Result;
use chrono::NaiveDate;
use tasklane_core::store::TaskStore;

use crate::cli::NotifyCommand;
use crate::util::parse_date;
use crate::views::table::display_notifications;

pub fn due_notifications(store: &TaskStore, command: NotifyCommand, today: NaiveDate) -> Result<()> {
    let date = command.date.as_deref().map(parse_date).transpose()?.unwrap_or(today);
    display_notifications(&store.notifications_due(date));
    Ok(())
}
