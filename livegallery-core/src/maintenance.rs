//! Whole-manifest rewrites that migrate older entries to the current
//! conventions.

use std::path::Path;

use crate::layout::GalleryLayout;
use crate::manifest::{GalleryItem, GalleryManifest};

/// Point every `thumbnailURL` at the item's `imageURL`. Returns how many
/// items actually changed.
pub fn sync_thumbnails(manifest: &mut GalleryManifest) -> usize {
    let mut changed = 0;
    for category in manifest.categories_mut() {
        for item in category.items_mut() {
            if item.thumbnail_url != item.image_url {
                tracing::info!("{}: thumbnailURL -> {}", item.id, item.image_url);
                item.thumbnail_url = item.image_url.clone();
                changed += 1;
            }
        }
    }
    changed
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RetargetReport {
    pub updated: Vec<String>,
    pub dropped: Vec<String>,
}

/// Repoint items at `images/<id>.HEIC`, or at the `.HEIC` their `imageURL`
/// already names when that file exists. Items with neither are removed.
pub fn retarget_to_heic(manifest: &mut GalleryManifest, images_dir: &Path) -> RetargetReport {
    let mut report = RetargetReport::default();

    for category in manifest.categories_mut() {
        let mut dropped = Vec::new();
        for item in category.items_mut() {
            match heic_file_name(item, images_dir) {
                Some(file_name) => {
                    let url = GalleryLayout::image_url(&file_name);
                    item.thumbnail_url = url.clone();
                    item.image_url = url;
                    report.updated.push(item.id.clone());
                }
                None => {
                    tracing::warn!("Dropping {}: no HEIC file found", item.id);
                    dropped.push(item.id.clone());
                }
            }
        }
        category.retain_items(|item| !dropped.contains(&item.id));
        report.dropped.extend(dropped);
    }

    report
}

fn heic_file_name(item: &GalleryItem, images_dir: &Path) -> Option<String> {
    let by_id = format!("{}.HEIC", item.id);
    if images_dir.join(&by_id).is_file() {
        return Some(by_id);
    }

    let current = Path::new(&item.image_url).file_name()?.to_str()?;
    let is_heic = Path::new(current)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("heic"));
    (is_heic && images_dir.join(current).is_file()).then(|| current.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::size::ItemSize;
    use chrono::Utc;
    use std::fs;

    fn item(id: &str, image: &str, thumb: &str) -> GalleryItem {
        GalleryItem {
            id: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            image_url: image.to_string(),
            video_url: format!("videos/{id}.mov"),
            thumbnail_url: thumb.to_string(),
            is_premium: false,
            tags: vec!["nature".to_string()],
            duration: 2.0,
            size: ItemSize::from_bytes(10),
            created_at: Utc::now(),
        }
    }

    fn manifest() -> GalleryManifest {
        let mut manifest = GalleryManifest::new("");
        let nature = manifest.find_or_create_category("nature");
        nature.upsert_item(item("a", "images/a.jpg", "thumbnails/a_thumb.jpg"));
        nature.upsert_item(item("b", "images/b.HEIC", "images/b.HEIC"));
        manifest
            .find_or_create_category("abstract")
            .upsert_item(item("c", "images/c.jpg", "thumbnails/c_thumb.jpg"));
        manifest
    }

    #[test]
    fn thumbnails_follow_images() {
        let mut manifest = manifest();
        assert_eq!(sync_thumbnails(&mut manifest), 2);
        for category in manifest.categories() {
            for item in category.items() {
                assert_eq!(item.thumbnail_url, item.image_url);
            }
        }
        assert_eq!(sync_thumbnails(&mut manifest), 0);
    }

    #[test]
    fn retarget_keeps_only_items_with_heic() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.HEIC"), b"a").unwrap();
        fs::write(dir.path().join("b.HEIC"), b"b").unwrap();

        let mut manifest = manifest();
        let report = retarget_to_heic(&mut manifest, dir.path());
        assert_eq!(report.updated, ["a", "b"]);
        assert_eq!(report.dropped, ["c"]);

        let a = manifest.category("nature").unwrap().item("a").unwrap();
        assert_eq!(a.image_url, "images/a.HEIC");
        assert_eq!(a.thumbnail_url, "images/a.HEIC");
        assert!(manifest.category("abstract").unwrap().items().is_empty());
    }

    #[test]
    fn retarget_keeps_imported_heic_with_original_case() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("IMG_0001.HEIC"), b"still").unwrap();

        let mut manifest = GalleryManifest::new("");
        manifest.find_or_create_category("custom").upsert_item(item(
            "img_0001",
            "images/IMG_0001.HEIC",
            "images/IMG_0001.HEIC",
        ));
        let report = retarget_to_heic(&mut manifest, dir.path());
        assert_eq!(report.updated, ["img_0001"]);
        assert!(report.dropped.is_empty());

        let kept = manifest.category("custom").unwrap().item("img_0001").unwrap();
        assert_eq!(kept.image_url, "images/IMG_0001.HEIC");
        assert_eq!(kept.thumbnail_url, "images/IMG_0001.HEIC");
    }
}
