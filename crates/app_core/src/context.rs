//! Shared application context

use crate::{AppConfig, AppError, AssetReference, Catalog, DateSelection, ImageLoader};
use parking_lot::RwLock;
use std::path::PathBuf;

/// Long-lived services handed to the UI by reference
pub struct AppContext {
    /// Application configuration
    pub config: RwLock<AppConfig>,

    /// Captures grouped by date
    pub catalog: Catalog,

    /// Calendar selection, read by the explorer
    pub selected_date: DateSelection,

    /// Background decoder shared by viewers and thumbnails
    pub loader: ImageLoader,
}

impl AppContext {
    /// Build the context and its catalog
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        let catalog = Self::load_catalog(&config)?;

        Ok(Self {
            config: RwLock::new(config),
            catalog,
            selected_date: DateSelection::new(),
            loader: ImageLoader::new(),
        })
    }

    fn load_catalog(config: &AppConfig) -> Result<Catalog, AppError> {
        let catalog = &config.catalog;

        if let Some(manifest) = &catalog.manifest {
            let path = if manifest.is_relative() {
                catalog.asset_root.join(manifest)
            } else {
                manifest.clone()
            };
            return Catalog::load_manifest(&path);
        }

        if catalog.asset_root.is_dir() {
            return Catalog::scan(&catalog.asset_root);
        }

        tracing::warn!(
            "Asset root {:?} not found, using the sample catalog",
            catalog.asset_root
        );
        Ok(Catalog::sample())
    }

    /// Location of an asset on disk
    pub fn local_path(&self, asset: &AssetReference) -> PathBuf {
        asset.local_path(&self.config.read().catalog.asset_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_root_falls_back_to_sample() {
        let mut config = AppConfig::default();
        config.catalog.asset_root = PathBuf::from("/definitely/not/a/survey/root");
        let ctx = AppContext::new(config).unwrap();
        assert_eq!(ctx.catalog, Catalog::sample());
    }

    #[test]
    fn test_relative_manifest_under_asset_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("catalog.toml"),
            "[dates.\"2024-10-09\"]\nimages = [\"/Images/thumbnails/20241009/room04.jpg\"]\n",
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.catalog.asset_root = dir.path().to_path_buf();
        config.catalog.manifest = Some(PathBuf::from("catalog.toml"));

        let ctx = AppContext::new(config).unwrap();
        assert_eq!(ctx.catalog.for_date("2024-10-09").images.len(), 1);

        let asset = AssetReference::new("/Images/panoramas/20241009/room04.jpg");
        assert_eq!(
            ctx.local_path(&asset),
            dir.path().join("Images/panoramas/20241009/room04.jpg")
        );
    }
}
