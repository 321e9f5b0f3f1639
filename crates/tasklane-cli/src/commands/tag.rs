use anyhow::Result;
use dialoguer::Confirm;
use owo_colors::OwoColorize;
use tasklane_core::models::TagAddition;
use tasklane_core::store::TaskStore;

use crate::cli::{TagAction, TagCommand};
use crate::views::table::display_tags;

pub async fn tag_command(store: &TaskStore, command: TagCommand) -> Result<()> {
    match command.action {
        TagAction::List => {
            display_tags(&store.list_tags(), &store.summary());
        }
        TagAction::Add { name } => match store.add_tag(&name).await? {
            TagAddition::Added(tag) => println!("Added tag '{}'", tag),
            TagAddition::AlreadyPresent(tag) => println!("Tag '{}' already exists", tag),
        },
        TagAction::Rm { name, force } => {
            if !force {
                let affected = store.summary().by_tag.get(&name.trim().to_lowercase()).copied().unwrap_or_default();
                let confirmation = Confirm::new()
                    .with_prompt(format!(
                        "Remove tag '{}'? {} task(s) will move to 'other'.",
                        name, affected
                    ))
                    .default(false)
                    .interact()
                    .unwrap_or(false);

                if !confirmation {
                    println!("Removal cancelled.");
                    return Ok(());
                }
            }

            let result = store.remove_tag(&name).await?;
            if result.tag_removed {
                println!(
                    "Removed tag '{}', reassigned {} task(s) to 'other'",
                    result.tag,
                    result.reassigned_task_ids.len()
                );
            } else {
                println!("{}", format!("Tag '{}' does not exist", result.tag).yellow());
            }
        }
    }

    Ok(())
}
