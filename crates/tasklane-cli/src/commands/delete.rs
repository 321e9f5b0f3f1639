use anyhow::Result;
use dialoguer::Confirm;
use tasklane_core::store::TaskStore;

use crate::cli::DeleteCommand;
use crate::util::resolve_task_id;

pub async fn delete_task(store: &TaskStore, command: DeleteCommand) -> Result<()> {
    let task_id = resolve_task_id(store, &command.id)?;
    let Some(task) = store.task(task_id) else {
        anyhow::bail!("Task with ID '{}' not found.", task_id);
    };

    if !command.force {
        let confirmation = Confirm::new()
            .with_prompt(format!(
                "Are you sure you want to delete task '{}'?",
                task.title
            ))
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirmation {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    store.delete_task(task_id).await?;
    println!("Deleted task: '{}'", task.title);

    Ok(())
}
