//! Interactive 360° viewer

use super::asset_image::{error_placeholder, loading_indicator, AssetImage};
use super::viewer_chrome::{ViewerAction, ViewerChrome};
use crate::panorama::{OrbitCamera, OrbitSettings, PanoramaCallback};
use crate::renderer::GpuCaps;
use app_core::{AppContext, AssetReference, ContainerId, FullscreenPlatform, ViewerKind, ViewportSession};
use egui::{Color32, PointerButton, Rect, Sense, Ui};
use std::sync::Arc;

/// Panorama projected onto the inside of a sphere, orbit controlled.
///
/// One value per mount: the camera starts at its default pose here and is
/// only replaced by mounting again.
pub struct SphericalView {
    asset: AssetReference,
    chrome: ViewerChrome,
    image: AssetImage,
    camera: OrbitCamera,
    session: ViewportSession,
}

impl SphericalView {
    pub fn mount(
        ctx: &AppContext,
        platform: Arc<dyn FullscreenPlatform>,
        asset: AssetReference,
        caps: GpuCaps,
    ) -> Self {
        let (settings, max_side) = {
            let config = ctx.config.read();
            (
                OrbitSettings::from(&config.viewer),
                caps.texture_side(config.viewer.max_texture_side),
            )
        };

        tracing::info!("Mounting interactive viewer for {}", asset);
        let image = AssetImage::request_mipmapped(&ctx.loader, ctx.local_path(&asset), max_side);

        Self {
            chrome: ViewerChrome::new(ViewerKind::Interactive, &asset),
            asset,
            image,
            camera: OrbitCamera::new(settings),
            session: ViewportSession::mount(platform, ContainerId::next()),
        }
    }

    pub fn asset(&self) -> &AssetReference {
        &self.asset
    }

    pub fn image(&self) -> &AssetImage {
        &self.image
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn session(&self) -> &ViewportSession {
        &self.session
    }

    pub fn chrome(&self) -> &ViewerChrome {
        &self.chrome
    }

    /// Pick up finished loads and fullscreen changes. Returns true if anything changed.
    pub fn poll(&mut self) -> bool {
        let loaded = self.image.poll();
        let fullscreen = self.session.poll();
        loaded || fullscreen
    }

    pub fn ui(&mut self, ui: &mut Ui) -> Option<ViewerAction> {
        let Self {
            chrome,
            image,
            camera,
            session,
            ..
        } = self;
        let view_key = session.container().0;

        chrome.show(ui, session, |ui, rect| {
            draw_sphere(ui, rect, image, camera, view_key);
        })
    }

    /// Apply a toolbar or keyboard request that concerns this viewer only
    pub fn toggle_fullscreen(&self) {
        self.session.toggle();
    }
}

fn draw_sphere(ui: &mut Ui, rect: Rect, image: &AssetImage, camera: &mut OrbitCamera, view_key: u64) {
    let response = ui.interact(rect, ui.id().with("sphere"), Sense::click_and_drag());
    ui.painter().rect_filled(rect, 8.0, Color32::from_gray(55));

    match image {
        AssetImage::Loading(_) => {
            loading_indicator(ui, rect);
            ui.ctx().request_repaint();
        }
        AssetImage::Failed(e) => error_placeholder(ui, rect, e),
        AssetImage::Ready(image) => {
            let delta = response.drag_delta();
            if response.dragged_by(PointerButton::Primary) {
                camera.rotate(delta.x, delta.y, rect.height());
            } else if response.dragged_by(PointerButton::Secondary) {
                camera.pan(delta.x, delta.y, rect.height());
            }

            if response.hovered() {
                let scroll = ui.input(|i| i.raw_scroll_delta.y);
                if scroll != 0.0 {
                    camera.zoom(scroll.signum());
                }
            }

            if camera.update() {
                ui.ctx().request_repaint();
            }

            let aspect = rect.width() / rect.height().max(1.0);
            ui.painter().add(egui_wgpu::Callback::new_paint_callback(
                rect,
                PanoramaCallback {
                    view_key,
                    image: image.clone(),
                    view_proj: camera.view_projection(aspect).into(),
                },
            ));
        }
    }
}
