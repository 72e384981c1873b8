use anyhow::Result;
use livegallery_core::maintenance;

use super::RootArgs;

pub fn execute(root: RootArgs) -> Result<()> {
    let layout = root.layout();
    let store = layout.manifest_store("");
    let images_dir = layout.images_dir();

    let report = store.update_existing(|manifest| {
        Ok::<_, anyhow::Error>(maintenance::retarget_to_heic(manifest, &images_dir))
    })?;

    for id in &report.updated {
        println!("✓ Updated {id} to use HEIC");
    }
    for id in &report.dropped {
        println!("✗ Removed {id}: no HEIC file found");
    }
    println!(
        "\n✓ Gallery config updated: {} items now use HEIC files",
        report.updated.len()
    );
    Ok(())
}
