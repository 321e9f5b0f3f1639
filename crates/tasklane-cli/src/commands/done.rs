use anyhow::Result;
use tasklane_core::store::TaskStore;

use crate::cli::DoneCommand;
use crate::util::resolve_task_id;

pub async fn toggle_task(store: &TaskStore, command: DoneCommand) -> Result<()> {
    let task_id = resolve_task_id(store, &command.id)?;
    let task = store.toggle_completion(task_id).await?;

    if task.completed {
        println!("Completed task: '{}'", task.title);
    } else {
        println!("Reopened task: '{}'", task.title);
    }

    Ok(())
}
