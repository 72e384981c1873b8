//! Describing a Live Photo whose files are already under `images/` and
//! `videos/`.

use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

use crate::error::ManifestError;
use crate::layout::GalleryLayout;
use crate::manifest::{GalleryItem, ManifestStore, Upsert};
use crate::naming::slugify;
use crate::probe;
use crate::size::ItemSize;
use crate::tools::Toolchain;

const IMAGE_EXTENSIONS: [&str; 2] = ["HEIC", "heic"];
const VIDEO_EXTENSIONS: [&str; 2] = ["MOV", "mov"];

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("No HEIC image file found for {name} in {dir}")]
    MissingImage { name: String, dir: PathBuf },

    #[error("No video file found for {name} in {dir}")]
    MissingVideo { name: String, dir: PathBuf },

    #[error("Cannot derive an id from {0:?}")]
    EmptyId(String),

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub item: GalleryItem,
    pub image_path: PathBuf,
    pub video_path: PathBuf,
    pub image_size: ItemSize,
    pub video_size: ItemSize,
}

fn find_with_extension(dir: &Path, name: &str, extensions: &[&str]) -> Option<PathBuf> {
    extensions
        .iter()
        .map(|ext| dir.join(format!("{name}.{ext}")))
        .find(|p| p.is_file())
}

/// Build the item for `images/<name>.HEIC` + `videos/<name>.MOV`. The item
/// size counts both files.
pub fn describe_existing(
    layout: &GalleryLayout,
    toolchain: &Toolchain,
    name: &str,
    title: &str,
    category: &str,
    is_premium: bool,
) -> Result<Registration, RegisterError> {
    let id = slugify(name);
    if id.is_empty() {
        return Err(RegisterError::EmptyId(name.to_string()));
    }

    let video_path = find_with_extension(&layout.videos_dir(), name, &VIDEO_EXTENSIONS)
        .ok_or_else(|| RegisterError::MissingVideo {
            name: name.to_string(),
            dir: layout.videos_dir(),
        })?;
    let image_path = find_with_extension(&layout.images_dir(), name, &IMAGE_EXTENSIONS)
        .ok_or_else(|| RegisterError::MissingImage {
            name: name.to_string(),
            dir: layout.images_dir(),
        })?;

    let image_size = ItemSize::of(&image_path);
    let video_size = ItemSize::of(&video_path);
    let duration = probe::duration_or_default(
        &video_path,
        probe::probe_duration(toolchain, &video_path),
    );

    let image_url = GalleryLayout::image_url(&file_name(&image_path));
    let item = GalleryItem {
        id,
        title: title.to_string(),
        description: format!("{title} Live Photo"),
        thumbnail_url: image_url.clone(),
        image_url,
        video_url: GalleryLayout::video_url(&file_name(&video_path)),
        is_premium,
        tags: vec![category.to_string(), "custom".to_string()],
        duration: probe::round_duration(duration),
        size: ItemSize::from_bytes(image_size.bytes + video_size.bytes),
        created_at: Utc::now(),
    };

    Ok(Registration {
        item,
        image_path,
        video_path,
        image_size,
        video_size,
    })
}

/// Upsert `item` into `category` (created when absent) and save.
pub fn add_to_manifest(
    store: &ManifestStore,
    category: &str,
    item: GalleryItem,
) -> Result<Upsert, ManifestError> {
    store.transaction(|manifest| {
        Ok(manifest.find_or_create_category(category).upsert_item(item))
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
