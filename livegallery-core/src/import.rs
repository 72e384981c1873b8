//! Importing Live Photos into a gallery: copy media into place, build items,
//! upsert them into the manifest and persist once per batch.

use std::path::{Path, PathBuf};

use chrono::Utc;
use walkdir::WalkDir;

use crate::error::{BatchError, ImportError};
use crate::extract::{self, ExtractMethod};
use crate::layout::{copy_if_absent, GalleryLayout};
use crate::manifest::{GalleryItem, Upsert};
use crate::naming::{slugify, titleize};
use crate::probe::{self, DEFAULT_DURATION};
use crate::size::ItemSize;
use crate::tools::{Tool, Toolchain};

pub const DEFAULT_TAG: &str = "custom";
pub const PREMIUM_TAG: &str = "premium";

pub const STILL_EXTENSIONS: [&str; 5] = ["heic", "heif", "jpg", "jpeg", "png"];
pub const MOTION_EXTENSIONS: [&str; 2] = ["mov", "mp4"];

const CONTAINER_DESCRIPTION: &str = "Custom Live Photo from HEIC";
const PAIRED_DESCRIPTION: &str = "Custom Live Photo";

/// Drop empty tags; an empty list becomes `["custom"]`.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let tags: Vec<String> = tags
        .into_iter()
        .map(Into::into)
        .filter(|t| !t.is_empty())
        .collect();
    if tags.is_empty() {
        vec![DEFAULT_TAG.to_string()]
    } else {
        tags
    }
}

/// External tools an import of `inputs` calls: exiftool only when a HEIC/HEIF
/// file is among them, ffprobe always.
pub fn required_tools(inputs: &[PathBuf]) -> Vec<Tool> {
    let mut tools = Vec::new();
    if inputs.iter().any(|p| p.is_file() && extract::is_container(p)) {
        tools.push(Tool::Exiftool);
    }
    tools.push(Tool::Ffprobe);
    tools
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    lowercase_extension(path)
        .map(|e| allowed.contains(&e.as_str()))
        .unwrap_or(false)
}

/// A validated import input.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportInput {
    /// A HEIC/HEIF file that may embed a motion clip.
    Container(PathBuf),
    /// A folder holding one still and at most one motion file.
    PairedFolder {
        dir: PathBuf,
        still: PathBuf,
        motion: Option<PathBuf>,
    },
}

impl ImportInput {
    pub fn classify(path: &Path) -> Result<Self, ImportError> {
        if !path.exists() {
            return Err(ImportError::NotFound(path.to_path_buf()));
        }

        if path.is_dir() {
            let (still, motion) = scan_pair(path)?;
            return Ok(ImportInput::PairedFolder {
                dir: path.to_path_buf(),
                still,
                motion,
            });
        }

        if extract::is_container(path) {
            Ok(ImportInput::Container(path.to_path_buf()))
        } else {
            Err(ImportError::UnsupportedInput {
                path: path.to_path_buf(),
            })
        }
    }
}

fn scan_pair(dir: &Path) -> Result<(PathBuf, Option<PathBuf>), ImportError> {
    let mut stills = Vec::new();
    let mut motions = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| ImportError::Scan {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        if has_extension(path, &STILL_EXTENSIONS) {
            stills.push(path.to_path_buf());
        } else if has_extension(path, &MOTION_EXTENSIONS) {
            motions.push(path.to_path_buf());
        }
    }

    if stills.len() > 1 {
        return Err(ImportError::AmbiguousPairing {
            dir: dir.to_path_buf(),
            kind: "still",
            count: stills.len(),
        });
    }
    if motions.len() > 1 {
        return Err(ImportError::AmbiguousPairing {
            dir: dir.to_path_buf(),
            kind: "motion",
            count: motions.len(),
        });
    }

    let still = stills
        .pop()
        .ok_or_else(|| ImportError::NoStill(dir.to_path_buf()))?;
    Ok((still, motions.pop()))
}

/// Motion clip already placed under `videos/`.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionClip {
    pub file_name: String,
    pub duration: f64,
}

/// Everything needed to describe one imported asset.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemAssets {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image_file_name: String,
    pub motion: Option<MotionClip>,
    pub size: ItemSize,
}

/// Build a manifest item. The thumbnail is the still image itself; without a
/// motion clip the item is a static image lasting [`DEFAULT_DURATION`].
pub fn build_item(assets: ItemAssets, tags: &[String]) -> GalleryItem {
    let image_url = GalleryLayout::image_url(&assets.image_file_name);
    let (video_url, duration) = match &assets.motion {
        Some(clip) => (GalleryLayout::video_url(&clip.file_name), clip.duration),
        None => (String::new(), DEFAULT_DURATION),
    };

    GalleryItem {
        id: assets.id,
        title: assets.title,
        description: assets.description,
        thumbnail_url: image_url.clone(),
        image_url,
        video_url,
        is_premium: tags.iter().any(|t| t == PREMIUM_TAG),
        tags: tags.to_vec(),
        duration: probe::round_duration(duration),
        size: assets.size,
        created_at: Utc::now(),
    }
}

#[derive(Debug)]
pub struct ImportedItem {
    pub input: PathBuf,
    pub item: GalleryItem,
    pub upsert: Upsert,
}

#[derive(Debug)]
pub struct SkippedInput {
    pub input: PathBuf,
    pub reason: ImportError,
}

/// Per-input progress, reported as soon as an input is done.
#[derive(Debug, Clone, Copy)]
pub enum InputOutcome<'a> {
    Imported(&'a ImportedItem),
    Skipped(&'a SkippedInput),
}

#[derive(Debug)]
pub struct BatchReport {
    pub category: String,
    pub manifest_path: PathBuf,
    pub imported: Vec<ImportedItem>,
    pub skipped: Vec<SkippedInput>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        !self.imported.is_empty()
    }
}

pub struct Importer<'a> {
    layout: &'a GalleryLayout,
    toolchain: &'a Toolchain,
    tags: Vec<String>,
    base_url: String,
}

impl<'a> Importer<'a> {
    pub fn new(
        layout: &'a GalleryLayout,
        toolchain: &'a Toolchain,
        tags: Vec<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            layout,
            toolchain,
            tags: normalize_tags(tags),
            base_url: base_url.into(),
        }
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// The first tag names the target category.
    pub fn category_id(&self) -> &str {
        &self.tags[0]
    }

    /// Import every input, continuing past per-input failures, and write the
    /// manifest once at the end if anything was imported.
    pub fn run(
        &self,
        inputs: &[PathBuf],
        mut on_outcome: impl FnMut(InputOutcome<'_>),
    ) -> Result<BatchReport, BatchError> {
        let store = self.layout.manifest_store(&self.base_url);
        let mut manifest = store.load()?;

        for dir in [self.layout.images_dir(), self.layout.videos_dir()] {
            std::fs::create_dir_all(&dir)
                .map_err(|source| BatchError::Layout { path: dir.clone(), source })?;
        }

        let mut report = BatchReport {
            category: self.category_id().to_string(),
            manifest_path: store.path().to_path_buf(),
            imported: Vec::new(),
            skipped: Vec::new(),
        };

        for input in inputs {
            tracing::info!("Processing {}", input.display());
            match self.import_one(input) {
                Ok(item) => {
                    let category = manifest.find_or_create_category(self.category_id());
                    let id = item.id.clone();
                    let upsert = category.upsert_item(item);
                    let index = match upsert {
                        Upsert::Replaced { index } => index,
                        Upsert::Inserted => category.items().len() - 1,
                    };
                    let stored = category.items()[index].clone();
                    match upsert {
                        Upsert::Inserted => tracing::info!("Added gallery item: {}", id),
                        Upsert::Replaced { .. } => {
                            tracing::info!("Updated existing gallery item: {}", id)
                        }
                    }
                    report.imported.push(ImportedItem {
                        input: input.clone(),
                        item: stored,
                        upsert,
                    });
                    if let Some(last) = report.imported.last() {
                        on_outcome(InputOutcome::Imported(last));
                    }
                }
                Err(reason) => {
                    tracing::warn!("Skipping {}: {}", input.display(), reason);
                    report.skipped.push(SkippedInput {
                        input: input.clone(),
                        reason,
                    });
                    if let Some(last) = report.skipped.last() {
                        on_outcome(InputOutcome::Skipped(last));
                    }
                }
            }
        }

        if report.is_success() {
            store.save(&mut manifest)?;
        } else {
            tracing::warn!("Nothing imported, manifest left unchanged");
        }

        Ok(report)
    }

    /// Place one input's media under the gallery root and describe it.
    pub fn import_one(&self, input: &Path) -> Result<GalleryItem, ImportError> {
        let assets = match ImportInput::classify(input)? {
            ImportInput::Container(path) => self.place_container(&path)?,
            ImportInput::PairedFolder { dir, still, motion } => {
                self.place_pair(&dir, &still, motion.as_deref())?
            }
        };
        Ok(build_item(assets, &self.tags))
    }

    fn place_container(&self, path: &Path) -> Result<ItemAssets, ImportError> {
        let file_name = file_name_of(path);
        let id = slugify(&file_name);
        if id.is_empty() {
            return Err(ImportError::EmptyId(path.to_path_buf()));
        }

        let image_dest = self.layout.images_dir().join(&file_name);
        copy_media(path, &image_dest)?;

        let video_name = format!("{id}.mov");
        let video_dest = self.layout.videos_dir().join(&video_name);
        let extracted = match extract::extract_motion_video(
            self.toolchain,
            path,
            &video_dest,
            &ExtractMethod::EMBEDDED,
        ) {
            Ok(extracted) => extracted,
            Err(e) => {
                tracing::warn!("Video extraction failed for {}: {}", path.display(), e);
                None
            }
        };

        let motion = match extracted {
            Some(clip) => Some(self.motion_clip(&clip.path, video_name)),
            None => {
                tracing::warn!("No video found in {} (static image)", path.display());
                None
            }
        };

        Ok(ItemAssets {
            title: titleize(&file_name),
            id,
            description: CONTAINER_DESCRIPTION.to_string(),
            size: ItemSize::of(&image_dest),
            image_file_name: file_name,
            motion,
        })
    }

    fn place_pair(
        &self,
        dir: &Path,
        still: &Path,
        motion: Option<&Path>,
    ) -> Result<ItemAssets, ImportError> {
        let folder_name = file_name_of(dir);
        let id = slugify(&folder_name);
        if id.is_empty() {
            return Err(ImportError::EmptyId(dir.to_path_buf()));
        }

        let image_name = renamed(&id, still);
        let image_dest = self.layout.images_dir().join(&image_name);
        copy_media(still, &image_dest)?;

        let motion = match motion {
            Some(source) => {
                let video_name = renamed(&id, source);
                let video_dest = self.layout.videos_dir().join(&video_name);
                match copy_media(source, &video_dest) {
                    Ok(()) => Some(self.motion_clip(&video_dest, video_name)),
                    Err(e) => {
                        tracing::warn!("{}; recording a static image", e);
                        None
                    }
                }
            }
            None => {
                tracing::warn!("No motion file in {} (static image)", dir.display());
                None
            }
        };

        Ok(ItemAssets {
            title: titleize(&folder_name),
            id,
            description: PAIRED_DESCRIPTION.to_string(),
            size: ItemSize::of(&image_dest),
            image_file_name: image_name,
            motion,
        })
    }

    fn motion_clip(&self, video: &Path, file_name: String) -> MotionClip {
        let duration =
            probe::duration_or_default(video, probe::probe_duration(self.toolchain, video));
        MotionClip {
            file_name,
            duration,
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .to_string()
}

/// `<id>.<original extension>`
fn renamed(id: &str, source: &Path) -> String {
    match source.extension() {
        Some(ext) => format!("{id}.{}", ext.to_string_lossy()),
        None => id.to_string(),
    }
}

fn copy_media(from: &Path, to: &Path) -> Result<(), ImportError> {
    let copied = copy_if_absent(from, to).map_err(|source| ImportError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })?;
    if copied {
        tracing::info!("Copied {}", to.display());
    } else {
        tracing::info!("Already exists, keeping: {}", to.display());
    }
    Ok(())
}
