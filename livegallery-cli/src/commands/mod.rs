pub mod add;
pub mod extract;
pub mod import;
pub mod retarget;
pub mod sync_thumbnails;

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Args;
use livegallery_core::{GalleryLayout, Tool, ToolError, Toolchain};

/// Locations of the external tools.
#[derive(Args, Debug, Clone)]
pub struct ToolArgs {
    /// exiftool executable
    #[arg(long, env = "LIVEGALLERY_EXIFTOOL", default_value = "exiftool")]
    pub exiftool: OsString,

    /// ffprobe executable
    #[arg(long, env = "LIVEGALLERY_FFPROBE", default_value = "ffprobe")]
    pub ffprobe: OsString,

    /// ffmpeg executable
    #[arg(long, env = "LIVEGALLERY_FFMPEG", default_value = "ffmpeg")]
    pub ffmpeg: OsString,
}

impl ToolArgs {
    pub fn toolchain(&self) -> Toolchain {
        Toolchain {
            exiftool: self.exiftool.clone(),
            ffprobe: self.ffprobe.clone(),
            ffmpeg: self.ffmpeg.clone(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct RootArgs {
    /// Gallery root directory
    #[arg(long, visible_alias = "output-dir", env = "LIVEGALLERY_ROOT", default_value = ".")]
    pub gallery_root: PathBuf,
}

impl RootArgs {
    pub fn layout(&self) -> GalleryLayout {
        GalleryLayout::new(&self.gallery_root)
    }
}

/// Fail fast when a required tool cannot be run, with install hints.
pub fn require_tools(toolchain: &Toolchain, tools: &[Tool]) -> anyhow::Result<()> {
    if let Err(err) = toolchain.check_available(tools) {
        if let ToolError::Missing(names) = &err {
            println!("✗ Missing required tools: {}", names.join(", "));
            println!("\nTo install missing tools:");
            let mut packages: Vec<&str> = tools
                .iter()
                .filter(|t| names.iter().any(|n| n == t.name()))
                .map(|t| t.package())
                .collect();
            packages.dedup();
            for package in packages {
                println!("   brew install {package}");
            }
        }
        tracing::error!("{}", err);
        return Err(err.into());
    }
    Ok(())
}
