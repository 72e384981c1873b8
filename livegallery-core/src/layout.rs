use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::manifest::{ManifestStore, MANIFEST_FILE_NAME};

pub const IMAGES_DIR: &str = "images";
pub const VIDEOS_DIR: &str = "videos";

/// Fixed directory layout under a gallery root.
#[derive(Debug, Clone)]
pub struct GalleryLayout {
    root: PathBuf,
}

impl GalleryLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join(IMAGES_DIR)
    }

    pub fn videos_dir(&self) -> PathBuf {
        self.root.join(VIDEOS_DIR)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE_NAME)
    }

    pub fn manifest_store(&self, base_url: &str) -> ManifestStore {
        ManifestStore::new(self.manifest_path(), base_url)
    }

    pub fn ensure_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(self.images_dir())?;
        fs::create_dir_all(self.videos_dir())
    }

    pub fn image_url(file_name: &str) -> String {
        format!("{IMAGES_DIR}/{file_name}")
    }

    pub fn video_url(file_name: &str) -> String {
        format!("{VIDEOS_DIR}/{file_name}")
    }
}

/// Copy `from` to `to` unless `to` already exists. Returns whether a copy
/// happened; existing files are never overwritten.
pub fn copy_if_absent(from: &Path, to: &Path) -> io::Result<bool> {
    if to.exists() {
        tracing::debug!("Keeping existing {}", to.display());
        return Ok(false);
    }
    fs::copy(from, to)?;
    tracing::debug!("Copied {} -> {}", from.display(), to.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_relative_to_root() {
        assert_eq!(GalleryLayout::image_url("a.HEIC"), "images/a.HEIC");
        assert_eq!(GalleryLayout::video_url("a.mov"), "videos/a.mov");
    }

    #[test]
    fn creates_media_dirs_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        let layout = GalleryLayout::new(dir.path().join("gallery"));
        layout.ensure_dirs().unwrap();
        assert!(layout.images_dir().is_dir());
        assert!(layout.videos_dir().is_dir());
        assert!(!layout.root().join("thumbnails").exists());
        assert_eq!(layout.manifest_path(), dir.path().join("gallery/gallery-config.json"));
    }

    #[test]
    fn copy_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.heic");
        let dst = dir.path().join("dst.heic");
        fs::write(&src, b"new").unwrap();

        assert!(copy_if_absent(&src, &dst).unwrap());
        fs::write(&dst, b"edited").unwrap();
        assert!(!copy_if_absent(&src, &dst).unwrap());
        assert_eq!(fs::read(&dst).unwrap(), b"edited");
    }
}
