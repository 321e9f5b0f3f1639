use anyhow::Result;
use tasklane_core::store::TaskStore;

use crate::views::table::display_summary;

pub fn show_stats(store: &TaskStore) -> Result<()> {
    display_summary(&store.summary());
    Ok(())
}
