use anyhow::Result;
use livegallery_core::maintenance;

use super::RootArgs;

pub fn execute(root: RootArgs) -> Result<()> {
    let store = root.layout().manifest_store("");

    let changed = store.update_existing(|manifest| {
        Ok::<_, anyhow::Error>(maintenance::sync_thumbnails(manifest))
    })?;

    println!("✓ Gallery config updated: {changed} thumbnails now use the main image");
    Ok(())
}
