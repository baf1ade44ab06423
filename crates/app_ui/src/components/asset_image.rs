//! Asynchronously loaded image backing a viewer

use app_core::{AppError, ImageLoader, LoadPoll, LoadTicket, LoadedImage};
use std::path::PathBuf;
use std::sync::Arc;

/// Load state of a viewer's image
pub enum AssetImage {
    Loading(LoadTicket),
    Ready(Arc<LoadedImage>),
    Failed(AppError),
}

impl AssetImage {
    /// Start loading `path`, downscaled to `max_side`
    pub fn request(loader: &ImageLoader, path: PathBuf, max_side: u32) -> Self {
        tracing::debug!("Requesting {}", path.display());
        AssetImage::Loading(loader.request(path, Some(max_side)))
    }

    /// Start loading `path` with its mip chain, for GPU upload
    pub fn request_mipmapped(loader: &ImageLoader, path: PathBuf, max_side: u32) -> Self {
        tracing::debug!("Requesting {} with mips", path.display());
        AssetImage::Loading(loader.request_mipmapped(path, Some(max_side)))
    }

    /// Check the pending load. Returns true when the state changed.
    pub fn poll(&mut self) -> bool {
        let AssetImage::Loading(ticket) = self else {
            return false;
        };

        match ticket.poll() {
            LoadPoll::Pending => false,
            LoadPoll::Ready(image) => {
                tracing::info!("Loaded {} ({}x{})", image.path.display(), image.width, image.height);
                *self = AssetImage::Ready(image);
                true
            }
            LoadPoll::Failed(e) => {
                tracing::warn!("Image load failed: {}", e);
                *self = AssetImage::Failed(e);
                true
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AssetImage::Loading(_))
    }

    pub fn image(&self) -> Option<&Arc<LoadedImage>> {
        match self {
            AssetImage::Ready(image) => Some(image),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&AppError> {
        match self {
            AssetImage::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Spinner shown while an image decodes
pub(crate) fn loading_indicator(ui: &mut egui::Ui, rect: egui::Rect) {
    ui.put(rect, egui::Spinner::new().size(32.0));
}

/// Placeholder shown instead of an image that could not be loaded
pub(crate) fn error_placeholder(ui: &mut egui::Ui, rect: egui::Rect, error: &AppError) {
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 8.0, egui::Color32::from_gray(55));
    painter.text(
        rect.center() - egui::vec2(0.0, 14.0),
        egui::Align2::CENTER_CENTER,
        "⚠",
        egui::FontId::proportional(32.0),
        egui::Color32::from_rgb(220, 80, 80),
    );
    painter.text(
        rect.center() + egui::vec2(0.0, 20.0),
        egui::Align2::CENTER_CENTER,
        error.user_message(),
        egui::FontId::proportional(15.0),
        egui::Color32::LIGHT_GRAY,
    );
}
