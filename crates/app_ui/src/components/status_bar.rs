//! Status bar component

use app_core::ViewerMode;
use egui::Ui;

/// Status bar information
#[derive(Debug, Clone, Default)]
pub struct StatusInfo {
    /// What the main area shows
    pub mode: String,

    /// Asset being viewed
    pub asset: String,

    /// Decoded image dimensions
    pub dimensions: String,

    /// Set while a viewer holds fullscreen
    pub fullscreen: bool,

    /// Additional status message
    pub message: String,
}

impl StatusInfo {
    pub fn for_mode(mode: &ViewerMode) -> Self {
        let label = match mode {
            ViewerMode::Browsing => "File Explorer",
            ViewerMode::Interactive(_) => "Interactive Viewer",
            ViewerMode::Static(_) => "Static Viewer",
        };

        Self {
            mode: label.to_string(),
            asset: mode.asset().map(|a| a.path().to_string()).unwrap_or_default(),
            ..Self::default()
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = format!("{} × {}", width, height);
        self
    }
}

/// Status bar component
pub struct StatusBar;

impl StatusBar {
    /// Render the status bar
    pub fn ui(ui: &mut Ui, info: &StatusInfo) {
        ui.horizontal(|ui| {
            ui.label(&info.mode);
            ui.separator();

            if !info.asset.is_empty() {
                ui.label(&info.asset);
                ui.separator();
            }

            if !info.dimensions.is_empty() {
                ui.label(&info.dimensions);
                ui.separator();
            }

            if info.fullscreen {
                ui.label("Fullscreen");
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if !info.message.is_empty() {
                    ui.label(&info.message);
                }
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_core::AssetReference;

    #[test]
    fn test_info_for_modes() {
        let info = StatusInfo::for_mode(&ViewerMode::Browsing);
        assert_eq!(info.mode, "File Explorer");
        assert!(info.asset.is_empty());

        let asset = AssetReference::new("/Images/panoramas/20241009/room04.jpg");
        let info = StatusInfo::for_mode(&ViewerMode::Static(asset)).with_dimensions(8192, 4096);
        assert_eq!(info.mode, "Static Viewer");
        assert_eq!(info.asset, "/Images/panoramas/20241009/room04.jpg");
        assert_eq!(info.dimensions, "8192 × 4096");
    }
}
