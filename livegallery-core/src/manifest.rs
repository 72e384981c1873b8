use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ManifestError, Result};
use crate::naming::title_case;
use crate::size::ItemSize;

pub const MANIFEST_FILE_NAME: &str = "gallery-config.json";
pub const MANIFEST_VERSION: &str = "1.0.0";
pub const DEFAULT_BASE_URL: &str =
    "https://raw.githubusercontent.com/CodingMogul/livephotos-gallery/master";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GalleryManifest {
    pub version: String,
    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
    #[serde(rename = "baseURL")]
    pub base_url: String,
    categories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: String,
    items: Vec<GalleryItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GalleryItem {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    /// Empty for a static image.
    #[serde(rename = "videoURL")]
    pub video_url: String,
    #[serde(rename = "thumbnailURL")]
    pub thumbnail_url: String,
    #[serde(rename = "isPremium")]
    pub is_premium: bool,
    pub tags: Vec<String>,
    pub duration: f64,
    pub size: ItemSize,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// What [`Category::upsert_item`] did with an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced { index: usize },
}

impl GalleryManifest {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            last_updated: Utc::now(),
            base_url: base_url.into(),
            categories: Vec::new(),
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub(crate) fn categories_mut(&mut self) -> &mut [Category] {
        &mut self.categories
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// First category with `id`, or a new one appended to the manifest.
    pub fn find_or_create_category(&mut self, id: &str) -> &mut Category {
        match self.categories.iter().position(|c| c.id == id) {
            Some(index) => &mut self.categories[index],
            None => {
                tracing::info!("Creating category: {}", id);
                self.categories.push(Category::new(id));
                let last = self.categories.len() - 1;
                &mut self.categories[last]
            }
        }
    }

    pub fn item_count(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }

    /// Pretty JSON with 2-space indentation and a trailing newline.
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl Category {
    /// A fresh category whose display fields are derived from `id`.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: title_case(id),
            description: format!("Beautiful {id} scenes"),
            items: Vec::new(),
        }
    }

    pub fn items(&self) -> &[GalleryItem] {
        &self.items
    }

    pub fn item(&self, id: &str) -> Option<&GalleryItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Insert `item`, or replace the item with the same id at its current
    /// position. A replaced item keeps its original `createdAt`.
    pub fn upsert_item(&mut self, mut item: GalleryItem) -> Upsert {
        match self.items.iter().position(|i| i.id == item.id) {
            Some(index) => {
                item.created_at = self.items[index].created_at;
                self.items[index] = item;
                Upsert::Replaced { index }
            }
            None => {
                self.items.push(item);
                Upsert::Inserted
            }
        }
    }

    pub(crate) fn items_mut(&mut self) -> impl Iterator<Item = &mut GalleryItem> {
        self.items.iter_mut()
    }

    pub(crate) fn retain_items(&mut self, keep: impl FnMut(&GalleryItem) -> bool) {
        self.items.retain(keep);
    }
}

/// Single-writer access to one manifest file.
///
/// Concurrent writers against the same path are unsupported: the last save
/// wins.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
    base_url: String,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            base_url: base_url.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the manifest, or start a fresh one when the file does not exist.
    pub fn load(&self) -> Result<GalleryManifest> {
        match self.read()? {
            Some(manifest) => Ok(manifest),
            None => {
                tracing::info!(
                    "No manifest at {}, starting a new one",
                    self.path.display()
                );
                Ok(GalleryManifest::new(self.base_url.clone()))
            }
        }
    }

    /// Like [`ManifestStore::load`] but a missing file is an error.
    pub fn load_existing(&self) -> Result<GalleryManifest> {
        self.read()?
            .ok_or_else(|| ManifestError::NotFound(self.path.clone()))
    }

    fn read(&self) -> Result<Option<GalleryManifest>> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ManifestError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let manifest = GalleryManifest::from_json(&json).map_err(|source| {
            ManifestError::Malformed {
                path: self.path.clone(),
                source,
            }
        })?;
        tracing::debug!(
            "Loaded manifest {} ({} categories, {} items)",
            self.path.display(),
            manifest.categories.len(),
            manifest.item_count()
        );
        Ok(Some(manifest))
    }

    /// Stamp `lastUpdated` and replace the file. The document is serialized
    /// before anything touches the disk and lands via rename, so a failure
    /// leaves the previous file intact.
    pub fn save(&self, manifest: &mut GalleryManifest) -> Result<()> {
        manifest.last_updated = Utc::now();
        let json = manifest.to_json()?;

        let write_err = |source: std::io::Error| ManifestError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, json).map_err(write_err)?;
        if let Err(source) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(write_err(source));
        }

        tracing::debug!("Saved manifest {}", self.path.display());
        Ok(())
    }

    /// Load, mutate, persist in one call. Nothing is written when `f` fails.
    pub fn transaction<T, E>(
        &self,
        f: impl FnOnce(&mut GalleryManifest) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E>
    where
        E: From<ManifestError>,
    {
        let mut manifest = self.load()?;
        let value = f(&mut manifest)?;
        self.save(&mut manifest)?;
        Ok(value)
    }

    /// [`ManifestStore::transaction`] over a manifest that must already exist.
    pub fn update_existing<T, E>(
        &self,
        f: impl FnOnce(&mut GalleryManifest) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E>
    where
        E: From<ManifestError>,
    {
        let mut manifest = self.load_existing()?;
        let value = f(&mut manifest)?;
        self.save(&mut manifest)?;
        Ok(value)
    }
}
