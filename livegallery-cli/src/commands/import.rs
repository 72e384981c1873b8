use std::path::PathBuf;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use livegallery_core::import::required_tools;
use livegallery_core::{Importer, InputOutcome, Upsert};

use super::{require_tools, RootArgs, ToolArgs};

pub fn execute(
    inputs: Vec<PathBuf>,
    tags: Vec<String>,
    root: RootArgs,
    base_url: String,
    tools: ToolArgs,
) -> Result<()> {
    let layout = root.layout();
    let toolchain = tools.toolchain();
    let importer = Importer::new(&layout, &toolchain, tags, base_url);

    println!("Live Photo Gallery Importer");
    println!("Gallery root: {}", absolute(&root.gallery_root).display());
    println!("Tags: {}", importer.tags().join(", "));
    println!("Inputs: {}\n", inputs.len());

    require_tools(&toolchain, &required_tools(&inputs))?;

    if !inputs.iter().any(|p| p.exists()) {
        anyhow::bail!("No input files or folders found");
    }

    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .expect("Invalid progress bar template")
            .progress_chars("█▓▒░ "),
    );
    pb.set_message("Importing...");

    let report = importer
        .run(&inputs, |outcome| {
            pb.inc(1);
            match outcome {
                InputOutcome::Imported(imported) => {
                    let verb = match imported.upsert {
                        Upsert::Inserted => "Added",
                        Upsert::Replaced { .. } => "Updated",
                    };
                    pb.set_message(format!("{verb}: {}", imported.item.id));
                    pb.suspend(|| println!("✓ {verb} {}", imported.item.id));
                }
                InputOutcome::Skipped(skipped) => {
                    pb.set_message(format!("Skipped: {}", skipped.input.display()));
                    pb.suspend(|| println!("✗ Skipped {}: {}", skipped.input.display(), skipped.reason));
                }
            }
        })
        .context("Import failed")?;

    pb.finish_with_message("Import complete");
    println!();

    if !report.is_success() {
        anyhow::bail!("No items were imported ({} inputs skipped)", report.skipped.len());
    }

    println!("✓ Imported {} items", report.imported.len());
    println!("Updated gallery config: {}", report.manifest_path.display());
    println!("\nSummary:");
    println!("   Category: {}", report.category);
    println!("   Tags: {}", importer.tags().join(", "));
    println!("   Items processed: {}", report.imported.len());
    if !report.skipped.is_empty() {
        println!("   Inputs skipped: {}", report.skipped.len());
    }

    println!("\nProcessed items:");
    for imported in &report.imported {
        let item = &imported.item;
        let kind = if item.video_url.is_empty() {
            "Static image"
        } else {
            "Live Photo"
        };
        let premium = if item.is_premium { " (Premium)" } else { "" };
        println!("   • {} - {}{}", item.title, kind, premium);
    }

    Ok(())
}

fn absolute(path: &std::path::Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
