//! Site Survey Viewer - panorama viewer for dated site captures
//!
//! Main entry point.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;

use anyhow::{Context, Result};
use app_core::{AppConfig, AppContext, NavigationPayload, ViewerKind};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "site_survey_viewer", version, about = "Browse and view 360° site survey captures")]
struct Args {
    /// Directory the asset paths resolve under
    #[arg(long, value_name = "DIR")]
    assets: Option<PathBuf>,

    /// Configuration file (defaults to the platform config dir)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Open straight into a viewer instead of the file explorer
    #[arg(long, value_enum)]
    viewer: Option<ViewerArg>,

    /// Asset path to show, e.g. /Images/panoramas/20241007/room02.jpg
    #[arg(long, value_name = "PATH", requires = "viewer")]
    image: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ViewerArg {
    Interactive,
    Static,
}

impl From<ViewerArg> for ViewerKind {
    fn from(arg: ViewerArg) -> Self {
        match arg {
            ViewerArg::Interactive => ViewerKind::Interactive,
            ViewerArg::Static => ViewerKind::Static,
        }
    }
}

/// Where the app starts
#[derive(Debug, Clone, Default)]
pub struct Entry {
    pub kind: Option<ViewerKind>,
    pub payload: Option<NavigationPayload>,
}

impl Args {
    fn entry(&self) -> Entry {
        Entry {
            kind: self.viewer.map(ViewerKind::from),
            payload: self.image.as_deref().map(NavigationPayload::with_image),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(AppConfig::config_path);
    let loaded = AppConfig::load_from(&config_path);
    let level = loaded
        .as_ref()
        .map(|c| c.general.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    // Initialize logging and panic hook first; the guard flushes file output on exit
    let _log_guard = app_log::init(&level)?;

    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Failed to load {:?}, using defaults: {}", config_path, e);
            AppConfig::default()
        }
    };

    // First launch leaves an editable file behind
    match config.seed(&config_path) {
        Ok(true) => tracing::info!("Wrote default configuration to {:?}", config_path),
        Ok(false) => {}
        Err(e) => tracing::warn!("Failed to write {:?}: {}", config_path, e),
    }

    if let Err(e) = app_log::cleanup_old_logs(config.general.log_retention_days) {
        tracing::warn!("Failed to cleanup old logs: {}", e);
    }

    if let Some(assets) = args.assets.clone() {
        config.catalog.asset_root = assets;
    }

    tracing::info!("Site Survey Viewer starting (assets at {:?})", config.catalog.asset_root);

    let ctx = AppContext::new(config).context("Failed to load the capture catalog")?;

    app::run(ctx, args.entry())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_link_arguments() {
        let args = Args::try_parse_from([
            "site_survey_viewer",
            "--viewer",
            "static",
            "--image",
            "/Images/panoramas/20241009/room05.jpg",
        ])
        .unwrap();
        let entry = args.entry();
        assert_eq!(entry.kind, Some(ViewerKind::Static));
        assert_eq!(
            entry.payload,
            Some(NavigationPayload::with_image("/Images/panoramas/20241009/room05.jpg"))
        );
    }

    #[test]
    fn test_viewer_without_image_uses_default() {
        let args = Args::try_parse_from(["site_survey_viewer", "--viewer", "interactive"]).unwrap();
        let entry = args.entry();
        assert_eq!(entry.kind, Some(ViewerKind::Interactive));
        assert!(entry.payload.is_none());
    }

    #[test]
    fn test_image_requires_viewer() {
        assert!(Args::try_parse_from(["site_survey_viewer", "--image", "/Images/panoramas/x/a.jpg"]).is_err());
        let args = Args::try_parse_from(["site_survey_viewer", "--assets", "/srv/survey"]).unwrap();
        assert_eq!(args.assets, Some(PathBuf::from("/srv/survey")));
        assert!(args.entry().kind.is_none());
    }
}
