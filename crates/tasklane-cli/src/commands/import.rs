use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;
use tasklane_core::assistant::TaskCandidate;
use tasklane_core::store::TaskStore;

use crate::cli::ImportCommand;
use crate::util::short_id;

fn read_source(source: &Path) -> Result<String> {
    if source == Path::new("-") {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("Failed to read task candidate from stdin")?;
        return Ok(input);
    }
    std::fs::read_to_string(source)
        .with_context(|| format!("Failed to read {}", source.display()))
}

pub async fn import_task(store: &TaskStore, command: ImportCommand) -> Result<()> {
    let input = read_source(&command.source)?;
    let candidate: TaskCandidate =
        serde_json::from_str(&input).context("Task candidate is not valid JSON")?;

    let task = store.create_task(candidate).await?;
    println!("Imported task: '{}' ({})", task.title, short_id(&task.id));

    Ok(())
}
