//! Static high-resolution image viewer

use super::asset_image::{error_placeholder, loading_indicator, AssetImage};
use super::viewer_chrome::{ViewerAction, ViewerChrome};
use crate::renderer::GpuCaps;
use app_core::{AppContext, AssetReference, ContainerId, FullscreenPlatform, ViewerKind, ViewportSession};
use egui::{Color32, Pos2, Rect, TextureHandle, TextureOptions, Ui, Vec2};
use std::sync::Arc;

/// Image scaled to fit its container, centred, aspect preserved
pub struct FlatView {
    asset: AssetReference,
    chrome: ViewerChrome,
    image: AssetImage,
    texture: Option<TextureHandle>,
    session: ViewportSession,
}

impl FlatView {
    pub fn mount(
        ctx: &AppContext,
        platform: Arc<dyn FullscreenPlatform>,
        asset: AssetReference,
        caps: GpuCaps,
    ) -> Self {
        let max_side = caps.texture_side(ctx.config.read().viewer.max_texture_side);

        tracing::info!("Mounting static viewer for {}", asset);
        let image = AssetImage::request(&ctx.loader, ctx.local_path(&asset), max_side);

        Self {
            chrome: ViewerChrome::new(ViewerKind::Static, &asset),
            asset,
            image,
            texture: None,
            session: ViewportSession::mount(platform, ContainerId::next()),
        }
    }

    pub fn asset(&self) -> &AssetReference {
        &self.asset
    }

    pub fn image(&self) -> &AssetImage {
        &self.image
    }

    pub fn session(&self) -> &ViewportSession {
        &self.session
    }

    pub fn chrome(&self) -> &ViewerChrome {
        &self.chrome
    }

    pub fn poll(&mut self) -> bool {
        let loaded = self.image.poll();
        let fullscreen = self.session.poll();
        loaded || fullscreen
    }

    pub fn toggle_fullscreen(&self) {
        self.session.toggle();
    }

    pub fn ui(&mut self, ui: &mut Ui) -> Option<ViewerAction> {
        self.ensure_texture(ui.ctx());

        let Self {
            chrome,
            image,
            texture,
            session,
            ..
        } = self;

        chrome.show(ui, session, |ui, rect| {
            ui.painter().rect_filled(rect, 8.0, Color32::from_gray(55));
            match (&*image, texture.as_ref()) {
                (AssetImage::Failed(e), _) => error_placeholder(ui, rect, e),
                (AssetImage::Ready(_), Some(texture)) => {
                    let target = fit_rect(rect, texture.size_vec2());
                    let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
                    ui.painter_at(rect).image(texture.id(), target, uv, Color32::WHITE);
                }
                _ => {
                    loading_indicator(ui, rect);
                    ui.ctx().request_repaint();
                }
            }
        })
    }

    fn ensure_texture(&mut self, ctx: &egui::Context) {
        if self.texture.is_some() {
            return;
        }
        let Some(image) = self.image.image() else {
            return;
        };

        let pixels = egui::ColorImage::from_rgba_unmultiplied(
            [image.width as usize, image.height as usize],
            &image.data,
        );
        self.texture = Some(ctx.load_texture(self.asset.path(), pixels, TextureOptions::LINEAR));
    }
}

/// Largest rect with the image's aspect ratio that fits in `container`, centred.
///
/// Small images are scaled up to fill.
pub fn fit_rect(container: Rect, image_size: Vec2) -> Rect {
    if image_size.x <= 0.0 || image_size.y <= 0.0 {
        return Rect::from_center_size(container.center(), Vec2::ZERO);
    }

    let scale = (container.width() / image_size.x).min(container.height() / image_size.y);
    Rect::from_center_size(container.center(), image_size * scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fullscreen::testing::platform;
    use app_core::AppConfig;
    use std::time::{Duration, Instant};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_fit_wide_image_in_tall_container() {
        let container = Rect::from_min_size(Pos2::new(10.0, 20.0), Vec2::new(400.0, 600.0));
        let fitted = fit_rect(container, Vec2::new(2000.0, 1000.0));

        assert!(approx(fitted.width(), 400.0));
        assert!(approx(fitted.height(), 200.0));
        assert!(approx(fitted.center().x, container.center().x));
        assert!(approx(fitted.center().y, container.center().y));
    }

    #[test]
    fn test_fit_upscales_small_image() {
        let container = Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 400.0));
        let fitted = fit_rect(container, Vec2::new(40.0, 40.0));

        assert!(approx(fitted.width(), 400.0));
        assert!(approx(fitted.height(), 400.0));
        assert!(container.contains_rect(fitted));
    }

    #[test]
    fn test_fit_preserves_aspect() {
        let container = Rect::from_min_size(Pos2::ZERO, Vec2::new(1280.0, 720.0));
        for size in [Vec2::new(8192.0, 4096.0), Vec2::new(300.0, 900.0), Vec2::new(1.0, 1.0)] {
            let fitted = fit_rect(container, size);
            assert!(approx(fitted.width() / fitted.height(), size.x / size.y));
            assert!(fitted.width() <= container.width() + 1e-3);
            assert!(fitted.height() <= container.height() + 1e-3);
        }
    }

    #[test]
    fn test_fit_degenerate_image() {
        let container = Rect::from_min_size(Pos2::ZERO, Vec2::new(100.0, 100.0));
        assert_eq!(fit_rect(container, Vec2::ZERO).size(), Vec2::ZERO);
    }

    #[test]
    fn test_mount_loads_downscaled_image() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.catalog.asset_root = dir.path().to_path_buf();
        let ctx = AppContext::new(config).unwrap();

        let path = dir.path().join("Images/panoramas/20241007/room03.jpg");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        image::RgbImage::from_pixel(30, 20, image::Rgb([10, 20, 30])).save(&path).unwrap();

        let (_window, platform) = platform();
        // Device limit below the configured side
        let caps = GpuCaps {
            max_texture_side: 15,
            max_anisotropy: 1,
        };
        let mut view = FlatView::mount(&ctx, platform, AssetReference::new("/Images/panoramas/20241007/room03.jpg"), caps);
        assert!(view.image().is_loading());
        assert_eq!(view.chrome().resolved().file_name, "room03.jpg");

        let deadline = Instant::now() + Duration::from_secs(10);
        while view.image().is_loading() && Instant::now() < deadline {
            view.poll();
            std::thread::sleep(Duration::from_millis(5));
        }
        let loaded = view.image().image().unwrap();
        assert_eq!((loaded.width, loaded.height), (15, 10));
        assert!(loaded.mips.is_empty());
    }
}
