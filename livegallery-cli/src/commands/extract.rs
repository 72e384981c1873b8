use std::path::PathBuf;

use anyhow::{Context, Result};
use livegallery_core::extract::{self, ExtractMethod};
use livegallery_core::{format_size, probe, Tool};

use super::{require_tools, ToolArgs};

pub fn execute(
    input: PathBuf,
    output_name: String,
    output_dir: PathBuf,
    still_dir: Option<PathBuf>,
    tools: ToolArgs,
) -> Result<()> {
    let toolchain = tools.toolchain();

    println!("HEIC Live Photo Video Extractor");
    require_tools(&toolchain, &[Tool::Exiftool, Tool::Ffprobe, Tool::Ffmpeg])?;

    if !input.exists() {
        anyhow::bail!("Input file {} does not exist", input.display());
    }
    if !extract::is_container(&input) {
        anyhow::bail!(
            "Input file must be a HEIC/HEIF file, got {}",
            input.display()
        );
    }

    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let output = output_dir.join(format!("{output_name}.mov"));

    println!("Input:  {}", input.display());
    println!("Output: {}\n", output.display());

    if let Some(still_dir) = still_dir {
        let still = still_dir.join(format!("{output_name}.jpg"));
        let bytes = extract::extract_still(&toolchain, &input, &still)
            .with_context(|| format!("Failed to extract still image from {}", input.display()))?;
        println!("✓ Extracted still image: {} ({})", still.display(), format_size(bytes));
    }

    let extracted = extract::extract_motion_video(&toolchain, &input, &output, &ExtractMethod::ALL)?;
    let Some(extracted) = extracted else {
        println!("✗ All extraction methods failed");
        println!("\nTroubleshooting tips:");
        println!("1. Ensure the input is a HEIC Live Photo, not a plain HEIC image");
        println!("2. Check that the Live Photo was captured properly on the device");
        println!("3. Ensure exiftool and ffmpeg are properly installed");
        anyhow::bail!("No motion video found in {}", input.display());
    };

    println!("✓ Extracted video using {}", extracted.method);
    report_properties(&toolchain, &extracted.path, extracted.bytes);

    println!("\n✓ Live Photo video extraction completed: {}", extracted.path.display());
    Ok(())
}

// Verification is informational only; an extracted clip is never rejected.
fn report_properties(toolchain: &livegallery_core::Toolchain, path: &std::path::Path, bytes: u64) {
    match probe::probe_video_properties(toolchain, path) {
        Ok(props) => {
            println!("Extracted video properties:");
            println!("   Resolution: {}x{}", props.width, props.height);
            println!("   Codec: {}", props.codec);
            println!("   Frame rate: {}", props.frame_rate);
            match props.duration {
                Some(seconds) => println!("   Duration: {seconds:.1}s"),
                None => println!("   Duration: unknown"),
            }
            println!("   File size: {}", format_size(bytes));
            if !props.has_plausible_dimensions() {
                tracing::warn!("Unusual video dimensions: {}x{}", props.width, props.height);
            }
        }
        Err(e) => tracing::warn!("Could not verify video properties: {}", e),
    }
}
