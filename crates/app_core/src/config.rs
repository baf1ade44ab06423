//! Application configuration

use crate::AppError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub viewer: ViewerConfig,
    pub catalog: CatalogConfig,
    pub keybindings: HashMap<String, Vec<String>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            viewer: ViewerConfig::default(),
            catalog: CatalogConfig::default(),
            keybindings: default_keybindings(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub theme: String,
    /// Hex override for the theme's accent colour, e.g. `#3C50E0`
    pub accent: Option<String>,
    /// Default `EnvFilter` directive; `RUST_LOG` wins when set
    pub log_level: String,
    pub log_retention_days: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            theme: "light".to_string(),
            accent: None,
            log_level: "info".to_string(),
            log_retention_days: 14,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Shown when a viewer is entered without an image
    pub default_image_url: String,
    pub sphere_radius: f32,
    pub sphere_width_segments: u32,
    pub sphere_height_segments: u32,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    /// Upper bound on uploaded texture size, further capped by the GPU limit
    pub max_texture_side: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            default_image_url: "/Images/panoramas/20241007/room02.jpg".to_string(),
            sphere_radius: 500.0,
            sphere_width_segments: 60,
            sphere_height_segments: 40,
            fov: 70.0,
            enable_damping: true,
            damping_factor: 0.3,
            rotate_speed: 1.0,
            enable_zoom: false,
            enable_pan: true,
            max_texture_side: 8192,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory that asset paths are resolved against
    pub asset_root: PathBuf,
    /// TOML manifest; when absent the asset root is scanned
    pub manifest: Option<PathBuf>,
    pub thumbnail_size: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("./public"),
            manifest: None,
            thumbnail_size: 160,
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, falling back to defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            tracing::info!("Configuration loaded from {:?}", path);
            Ok(config)
        } else {
            tracing::info!("Using default configuration");
            Ok(Self::default())
        }
    }

    /// Write this configuration to `path` unless a file is already there.
    /// Returns true if it was written.
    pub fn seed(&self, path: &Path) -> Result<bool, AppError> {
        if path.exists() {
            return Ok(false);
        }
        self.save_to(path)?;
        Ok(true)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;

        tracing::info!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("com", "SiteSurvey", "SiteSurveyViewer")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("./config.toml"))
    }
}

fn default_keybindings() -> HashMap<String, Vec<String>> {
    let mut kb = HashMap::new();

    // View
    kb.insert("view.toggle_fullscreen".into(), vec!["F11".into(), "f".into()]);
    kb.insert("view.exit_fullscreen".into(), vec!["Escape".into()]);
    kb.insert("view.switch_viewer".into(), vec!["Tab".into()]);

    // Navigation
    kb.insert("nav.back_to_explorer".into(), vec!["Backspace".into()]);
    kb.insert("nav.history_back".into(), vec!["Alt+Left".into()]);
    kb.insert("nav.history_forward".into(), vec!["Alt+Right".into()]);

    // App
    kb.insert("app.exit".into(), vec!["Ctrl+q".into()]);

    kb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.viewer.default_image_url, "/Images/panoramas/20241007/room02.jpg");
        assert_eq!(config.viewer.fov, 70.0);
        assert_eq!(config.viewer.damping_factor, 0.3);
        assert!(!config.viewer.enable_zoom);
        assert!(config.viewer.enable_pan);
        assert_eq!(config.keybindings["view.exit_fullscreen"], vec!["Escape".to_string()]);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[viewer]
fov = 60.0
enable_zoom = true

[catalog]
asset_root = "/srv/survey"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.viewer.fov, 60.0);
        assert!(config.viewer.enable_zoom);
        assert_eq!(config.viewer.sphere_radius, 500.0);
        assert_eq!(config.catalog.asset_root, PathBuf::from("/srv/survey"));
        assert_eq!(config.general, GeneralConfig::default());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.catalog.manifest = Some(PathBuf::from("catalog.toml"));
        config.general.log_level = "debug".into();
        config.save_to(&path).unwrap();

        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_seed_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        assert!(AppConfig::default().seed(&path).unwrap());
        assert_eq!(AppConfig::load_from(&path).unwrap(), AppConfig::default());

        let mut edited = AppConfig::default();
        edited.viewer.enable_zoom = true;
        edited.save_to(&path).unwrap();
        assert!(!AppConfig::default().seed(&path).unwrap());
        assert!(AppConfig::load_from(&path).unwrap().viewer.enable_zoom);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[viewer\nfov = ").unwrap();
        assert!(matches!(AppConfig::load_from(&path), Err(AppError::Config(_))));
    }
}
