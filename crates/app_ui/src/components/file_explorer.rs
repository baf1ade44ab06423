//! File explorer for the captures of the selected date
//! Images / Videos / Pointcloud Data tabs over a two column thumbnail grid

use app_core::asset::{file_name, high_resolution_path};
use app_core::{AppContext, AppError, AssetReference, LoadedImage, MediaKind, NavigationPayload, ThumbnailGenerator, ViewerKind};
use crossbeam_channel::{Receiver, TryRecvError};
use egui::{Color32, Rect, TextureHandle, TextureOptions, Ui, Vec2};

const GRID_COLUMNS: usize = 2;

/// Action returned from explorer interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplorerAction {
    /// Open the high-resolution sibling of a thumbnail in the chosen viewer
    Open {
        payload: NavigationPayload,
        kind: ViewerKind,
    },
}

impl ExplorerAction {
    pub fn open(thumbnail: &str, kind: ViewerKind) -> Self {
        ExplorerAction::Open {
            payload: NavigationPayload::with_image(high_resolution_path(thumbnail)),
            kind,
        }
    }
}

enum TileImage {
    Pending,
    Ready(TextureHandle),
    Failed,
}

/// A thumbnail in the images grid
struct Tile {
    asset: String,
    image: TileImage,
}

type Batch = Receiver<Vec<Result<LoadedImage, AppError>>>;

/// File explorer component
pub struct FileExplorer {
    /// Active tab
    pub tab: MediaKind,
    /// Date key the tiles were built for
    shown: Option<String>,
    tiles: Vec<Tile>,
    batch: Option<Batch>,
}

impl Default for FileExplorer {
    fn default() -> Self {
        Self::new()
    }
}

impl FileExplorer {
    pub fn new() -> Self {
        Self {
            tab: MediaKind::Images,
            shown: None,
            tiles: Vec::new(),
            batch: None,
        }
    }

    /// Render the explorer
    pub fn ui(&mut self, ui: &mut Ui, ctx: &AppContext) -> Option<ExplorerAction> {
        let date = ctx.selected_date.key();
        if date != self.shown {
            self.refresh(ctx, date.clone());
        }
        if self.poll_thumbnails(ui.ctx()) {
            ui.ctx().request_repaint();
        } else if self.batch.is_some() {
            ui.ctx().request_repaint_after(std::time::Duration::from_millis(50));
        }

        ui.heading("File Explorer");
        ui.horizontal(|ui| {
            ui.spacing_mut().item_spacing.x = 0.0;
            ui.label("Selected Date: ");
            ui.strong(date.as_deref().unwrap_or("None"));
        });
        ui.separator();

        ui.columns(MediaKind::ALL.len(), |columns| {
            for (ui, kind) in columns.iter_mut().zip(MediaKind::ALL) {
                ui.vertical_centered_justified(|ui| {
                    if ui.selectable_label(self.tab == kind, kind.label()).clicked() {
                        self.tab = kind;
                    }
                });
            }
        });
        ui.separator();

        let entries: &[String] = match &date {
            Some(date) => ctx.catalog.for_date(date).assets(self.tab),
            None => &[],
        };

        if entries.is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(16.0);
                ui.weak("No files available");
            });
            return None;
        }

        let mut action = None;
        let tile_width = (ui.available_width() - ui.spacing().item_spacing.x * 2.0) / GRID_COLUMNS as f32;

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                egui::Grid::new("explorer_grid")
                    .num_columns(GRID_COLUMNS)
                    .spacing(Vec2::new(8.0, 8.0))
                    .show(ui, |ui| {
                        for (idx, asset) in entries.iter().enumerate() {
                            if let Some(a) = self.render_tile(ui, asset, tile_width) {
                                action = Some(a);
                            }
                            if (idx + 1) % GRID_COLUMNS == 0 {
                                ui.end_row();
                            }
                        }
                    });
            });

        action
    }

    /// Rebuild image tiles for `date` and start decoding their thumbnails
    fn refresh(&mut self, ctx: &AppContext, date: Option<String>) {
        self.tiles.clear();
        self.batch = None;

        if let Some(date) = &date {
            let images = ctx.catalog.for_date(date).assets(MediaKind::Images);
            self.tiles = images
                .iter()
                .map(|asset| Tile {
                    asset: asset.clone(),
                    image: TileImage::Pending,
                })
                .collect();

            if !self.tiles.is_empty() {
                let paths = images
                    .iter()
                    .map(|asset| ctx.local_path(&AssetReference::new(asset.as_str())))
                    .collect();
                let size = ctx.config.read().catalog.thumbnail_size;
                tracing::debug!("Decoding {} thumbnails for {}", self.tiles.len(), date);
                self.batch = Some(ThumbnailGenerator::new(size).spawn_batch(paths));
            }
        }

        self.shown = date;
    }

    /// Upload finished thumbnails. Returns true when tiles changed.
    fn poll_thumbnails(&mut self, egui_ctx: &egui::Context) -> bool {
        let Some(batch) = &self.batch else {
            return false;
        };

        let results = match batch.try_recv() {
            Ok(results) => results,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => {
                tracing::warn!("Thumbnail batch ended without results");
                Vec::new()
            }
        };
        self.batch = None;

        let mut results = results.into_iter();
        for tile in &mut self.tiles {
            tile.image = match results.next() {
                Some(Ok(image)) => {
                    let pixels = egui::ColorImage::from_rgba_unmultiplied(
                        [image.width as usize, image.height as usize],
                        &image.data,
                    );
                    TileImage::Ready(egui_ctx.load_texture(&tile.asset, pixels, TextureOptions::LINEAR))
                }
                Some(Err(e)) => {
                    tracing::debug!("Thumbnail for {} unavailable: {}", tile.asset, e);
                    TileImage::Failed
                }
                None => TileImage::Failed,
            };
        }
        true
    }

    fn render_tile(&self, ui: &mut Ui, asset: &str, width: f32) -> Option<ExplorerAction> {
        let mut action = None;

        ui.vertical(|ui| {
            ui.set_width(width);
            let thumb_height = width * 0.5;
            let (rect, _) = ui.allocate_exact_size(Vec2::new(width, thumb_height), egui::Sense::hover());

            let tile = match self.tab {
                MediaKind::Images => self.tiles.iter().find(|t| t.asset == asset),
                _ => None,
            };
            paint_thumbnail(ui, rect, tile.map(|t| &t.image), self.tab);

            ui.label(file_name(asset));

            if self.tab == MediaKind::Images {
                ui.horizontal(|ui| {
                    if ui.button("Open 360°").clicked() {
                        action = Some(ExplorerAction::open(asset, ViewerKind::Interactive));
                    }
                    if ui.button("Open image").clicked() {
                        action = Some(ExplorerAction::open(asset, ViewerKind::Static));
                    }
                });
            }
        });

        action
    }

    /// Number of tiles still waiting for a decoded thumbnail
    pub fn pending_thumbnails(&self) -> usize {
        self.tiles
            .iter()
            .filter(|t| matches!(t.image, TileImage::Pending))
            .count()
    }
}

fn paint_thumbnail(ui: &Ui, rect: Rect, image: Option<&TileImage>, kind: MediaKind) {
    let painter = ui.painter_at(rect);

    if let Some(TileImage::Ready(texture)) = image {
        let uv = Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
        let target = super::flat_viewer::fit_rect(rect, texture.size_vec2());
        painter.rect_filled(rect, 4.0, Color32::from_gray(40));
        painter.image(texture.id(), target, uv, Color32::WHITE);
        return;
    }

    painter.rect_filled(rect, 4.0, Color32::from_gray(40));
    let icon = match (kind, image) {
        (MediaKind::Images, Some(TileImage::Pending)) => "⏳",
        (MediaKind::Images, _) => "🖼",
        (MediaKind::Videos, _) => "🎞",
        (MediaKind::Pointclouds, _) => "☁",
    };
    painter.text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        icon,
        egui::FontId::proportional(32.0),
        Color32::GRAY,
    );
}
