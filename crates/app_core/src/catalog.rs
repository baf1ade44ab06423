//! Date-keyed catalog of survey captures

use crate::asset::{CaptureDate, THUMBNAIL_TOKEN};
use crate::image_loader::is_supported_image;
use crate::AppError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Media tabs offered by the file explorer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Images,
    Videos,
    Pointclouds,
}

impl MediaKind {
    pub const ALL: [MediaKind; 3] = [MediaKind::Images, MediaKind::Videos, MediaKind::Pointclouds];

    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Images => "Images",
            MediaKind::Videos => "Videos",
            MediaKind::Pointclouds => "Pointcloud Data",
        }
    }

    /// Classify a file by extension
    pub fn from_path(path: &Path) -> Option<Self> {
        if is_supported_image(path) {
            return Some(MediaKind::Images);
        }
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "mp4" | "webm" | "mov" | "mkv" => Some(MediaKind::Videos),
            "obj" | "ply" | "pcd" | "las" | "laz" | "e57" => Some(MediaKind::Pointclouds),
            _ => None,
        }
    }
}

/// Assets captured on one date
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogEntry {
    pub images: Vec<String>,
    pub videos: Vec<String>,
    pub pointclouds: Vec<String>,
}

impl CatalogEntry {
    pub fn assets(&self, kind: MediaKind) -> &[String] {
        match kind {
            MediaKind::Images => &self.images,
            MediaKind::Videos => &self.videos,
            MediaKind::Pointclouds => &self.pointclouds,
        }
    }

    fn assets_mut(&mut self, kind: MediaKind) -> &mut Vec<String> {
        match kind {
            MediaKind::Images => &mut self.images,
            MediaKind::Videos => &mut self.videos,
            MediaKind::Pointclouds => &mut self.pointclouds,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.videos.is_empty() && self.pointclouds.is_empty()
    }
}

/// Lookup table from `YYYY-MM-DD` to captured assets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub dates: BTreeMap<String, CatalogEntry>,
}

static EMPTY_ENTRY: CatalogEntry = CatalogEntry {
    images: Vec::new(),
    videos: Vec::new(),
    pointclouds: Vec::new(),
};

impl Catalog {
    /// Entry for a date key; empty when nothing was captured that day
    pub fn for_date(&self, date: &str) -> &CatalogEntry {
        self.dates.get(date).unwrap_or(&EMPTY_ENTRY)
    }

    /// Dates with at least one asset, ascending
    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.dates
            .iter()
            .filter(|(_, entry)| !entry.is_empty())
            .map(|(date, _)| date.as_str())
    }

    pub fn insert(&mut self, date: &str, kind: MediaKind, path: impl Into<String>) {
        self.dates
            .entry(date.to_string())
            .or_default()
            .assets_mut(kind)
            .push(path.into());
    }

    /// Load a TOML manifest
    pub fn load_manifest(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path)?;
        let catalog: Self = toml::from_str(&content)?;
        tracing::info!("Catalog loaded from {:?} ({} dates)", path, catalog.dates.len());
        Ok(catalog)
    }

    /// Build a catalog from `<root>/<category>/thumbnails/<YYYYMMDD>/<file>`
    pub fn scan(asset_root: &Path) -> Result<Self, AppError> {
        let mut catalog = Self::default();

        for category in read_dirs(asset_root)? {
            let thumbnails = category.join(THUMBNAIL_TOKEN);
            if !thumbnails.is_dir() {
                continue;
            }

            for day_dir in read_dirs(&thumbnails)? {
                let files = match std::fs::read_dir(&day_dir) {
                    Ok(files) => files,
                    Err(e) => {
                        tracing::warn!("Skipping {:?}: {}", day_dir, e);
                        continue;
                    }
                };

                let mut paths: Vec<_> = files.filter_map(|e| e.ok()).map(|e| e.path()).collect();
                paths.sort();

                for file in paths {
                    let Some(kind) = MediaKind::from_path(&file) else {
                        continue;
                    };
                    let Ok(relative) = file.strip_prefix(asset_root) else {
                        continue;
                    };
                    let asset_path = format!("/{}", relative.to_string_lossy().replace('\\', "/"));

                    match CaptureDate::from_path(&asset_path) {
                        Ok(date) => catalog.insert(&date.to_string(), kind, asset_path),
                        Err(e) => tracing::debug!("Not cataloged: {}", e),
                    }
                }
            }
        }

        tracing::info!("Scanned {:?}: {} dates", asset_root, catalog.dates.len());
        Ok(catalog)
    }

    /// Captures shipped with the dashboard demo
    pub fn sample() -> Self {
        let mut catalog = Self::default();
        for room in ["room02", "room03"] {
            catalog.insert("2024-10-07", MediaKind::Images, format!("/Images/thumbnails/20241007/{}.jpg", room));
        }
        catalog.insert("2024-10-07", MediaKind::Pointclouds, "/PCD/LivingLamps.obj");
        for room in ["room02", "room03", "room04", "room05", "room06"] {
            catalog.insert("2024-10-09", MediaKind::Images, format!("/Images/thumbnails/20241009/{}.jpg", room));
        }
        catalog.insert("2024-10-09", MediaKind::Pointclouds, "/pointclouds/thumbnails/pointcloud02.obj");
        catalog
    }
}

fn read_dirs(path: &Path) -> Result<Vec<std::path::PathBuf>, AppError> {
    let mut dirs: Vec<_> = std::fs::read_dir(path)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_date_lookup() {
        let catalog = Catalog::sample();
        let day = catalog.for_date("2024-10-09");
        assert_eq!(day.assets(MediaKind::Images).len(), 5);
        assert_eq!(day.assets(MediaKind::Pointclouds).len(), 1);
        assert!(day.assets(MediaKind::Videos).is_empty());

        assert!(catalog.for_date("2023-01-01").is_empty());
        assert_eq!(catalog.dates().collect::<Vec<_>>(), vec!["2024-10-07", "2024-10-09"]);
    }

    #[test]
    fn test_manifest_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(
            &path,
            r#"
[dates."2024-10-07"]
images = ["/Images/thumbnails/20241007/room02.jpg"]
pointclouds = ["/PCD/LivingLamps.obj"]
"#,
        )
        .unwrap();

        let catalog = Catalog::load_manifest(&path).unwrap();
        let day = catalog.for_date("2024-10-07");
        assert_eq!(day.images, vec!["/Images/thumbnails/20241007/room02.jpg"]);
        assert!(day.videos.is_empty());
    }

    #[test]
    fn test_bad_manifest_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(&path, "dates = 3").unwrap();
        assert!(matches!(Catalog::load_manifest(&path), Err(AppError::Config(_))));
    }

    #[test]
    fn test_scan_asset_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let day = root.join("Images/thumbnails/20241007");
        std::fs::create_dir_all(&day).unwrap();
        std::fs::write(day.join("room03.jpg"), b"x").unwrap();
        std::fs::write(day.join("room02.jpg"), b"x").unwrap();
        std::fs::write(day.join("notes.txt"), b"x").unwrap();
        let odd = root.join("Images/thumbnails/misc");
        std::fs::create_dir_all(&odd).unwrap();
        std::fs::write(odd.join("stray.jpg"), b"x").unwrap();

        let catalog = Catalog::scan(root).unwrap();
        assert_eq!(
            catalog.for_date("2024-10-07").images,
            vec![
                "/Images/thumbnails/20241007/room02.jpg".to_string(),
                "/Images/thumbnails/20241007/room03.jpg".to_string(),
            ]
        );
        assert_eq!(catalog.dates.len(), 1);
    }

    #[test]
    fn test_media_kind_from_path() {
        assert_eq!(MediaKind::from_path(Path::new("a.JPG")), Some(MediaKind::Images));
        assert_eq!(MediaKind::from_path(Path::new("a.mp4")), Some(MediaKind::Videos));
        assert_eq!(MediaKind::from_path(Path::new("a.obj")), Some(MediaKind::Pointclouds));
        assert_eq!(MediaKind::from_path(Path::new("a.txt")), None);
    }
}
