use anyhow::Result;
use livegallery_core::register::{self, Registration};
use livegallery_core::{format_size, Tool, Upsert};

use super::{require_tools, RootArgs, ToolArgs};

pub struct AddOptions {
    pub name: String,
    pub title: String,
    pub category: String,
    pub premium: bool,
    pub auto: bool,
}

pub fn execute(options: AddOptions, root: RootArgs, base_url: String, tools: ToolArgs) -> Result<()> {
    let layout = root.layout();
    let toolchain = tools.toolchain();

    println!("Quick Import for Live Photos Gallery");
    require_tools(&toolchain, &[Tool::Ffprobe])?;

    let Registration {
        item,
        image_path,
        video_path,
        image_size,
        video_size,
    } = register::describe_existing(
        &layout,
        &toolchain,
        &options.name,
        &options.title,
        &options.category,
        options.premium,
    )?;

    println!("\n✓ Import complete!");
    println!("   Image: {} ({})", image_path.display(), image_size.formatted);
    println!("   Video: {} ({})", video_path.display(), video_size.formatted);
    println!("   Thumbnail: using the image");
    println!("   Duration: {:.1}s", item.duration);
    println!("   Total size: {}", format_size(item.size.bytes));

    println!("\nJSON entry for gallery-config.json:");
    println!("{}", serde_json::to_string_pretty(&item)?);

    if options.auto {
        let store = layout.manifest_store(&base_url);
        match register::add_to_manifest(&store, &options.category, item)? {
            Upsert::Inserted => println!("\n✓ Added to {} category", options.category),
            Upsert::Replaced { .. } => {
                println!("\n✓ Updated existing item in {} category", options.category)
            }
        }
    }

    Ok(())
}
