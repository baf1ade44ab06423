//! Header, fullscreen button and annotation panel shared by both viewers

use app_core::{AssetReference, ResolvedAsset, ViewerKind, ViewportSession};
use egui::{Color32, Rect, RichText, Sense, Ui, Vec2};

/// Share of the page height given to the viewport outside fullscreen
const VIEWPORT_HEIGHT: f32 = 0.7;

const FULLSCREEN_BUTTON: f32 = 40.0;

/// Requests a viewer hands back to the app
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerAction {
    SwitchViewer,
    BackToExplorer,
    ToggleFullscreen,
}

/// Free-form notes under the viewport. Kept only while the viewer is mounted.
#[derive(Debug, Clone, Default)]
pub struct AnnotationNotes {
    pub labeling: String,
    pub comments: String,
    pub delayed: bool,
}

/// Page layout around a viewer's drawing area
pub struct ViewerChrome {
    kind: ViewerKind,
    resolved: ResolvedAsset,
    notes: AnnotationNotes,
}

impl ViewerChrome {
    pub fn new(kind: ViewerKind, asset: &AssetReference) -> Self {
        Self {
            kind,
            resolved: asset.resolve(),
            notes: AnnotationNotes::default(),
        }
    }

    pub fn resolved(&self) -> &ResolvedAsset {
        &self.resolved
    }

    pub fn notes(&self) -> &AnnotationNotes {
        &self.notes
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            ViewerKind::Interactive => "Interactive Viewer",
            ViewerKind::Static => "Static Viewer",
        }
    }

    /// Draw the page. `viewport` paints the image into the rect it is given.
    ///
    /// While the session's container holds fullscreen only the viewport is
    /// drawn, filling the whole of `ui`.
    pub fn show(
        &mut self,
        ui: &mut Ui,
        session: &ViewportSession,
        viewport: impl FnOnce(&mut Ui, Rect),
    ) -> Option<ViewerAction> {
        let mut action = None;

        if session.owns_fullscreen() {
            let rect = ui.available_rect_before_wrap();
            viewport(ui, rect);
            if fullscreen_button(ui, rect, true) {
                action = Some(ViewerAction::ToggleFullscreen);
            }
            return action;
        }

        if let Some(a) = self.header(ui) {
            action = Some(a);
        }
        ui.separator();

        let width = ui.available_width();
        let height = (ui.available_height() * VIEWPORT_HEIGHT).max(120.0);
        let (rect, _) = ui.allocate_exact_size(Vec2::new(width, height), Sense::hover());
        viewport(ui, rect);
        if fullscreen_button(ui, rect, session.is_fullscreen()) {
            action = Some(ViewerAction::ToggleFullscreen);
        }

        ui.add_space(12.0);
        self.annotation_panel(ui);

        action
    }

    fn header(&self, ui: &mut Ui) -> Option<ViewerAction> {
        let mut action = None;

        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                ui.heading(RichText::new(self.title()).strong());
                ui.horizontal(|ui| {
                    ui.spacing_mut().item_spacing.x = 0.0;
                    ui.label("Viewing: ");
                    ui.label(RichText::new(&self.resolved.file_name).strong());
                    ui.label(RichText::new(format!(" (Date: {})", self.resolved.date_label())).weak());
                });
            });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Back to File Explorer").clicked() {
                    action = Some(ViewerAction::BackToExplorer);
                }
                if ui.button(self.kind.other().open_label()).clicked() {
                    action = Some(ViewerAction::SwitchViewer);
                }
            });
        });

        action
    }

    fn annotation_panel(&mut self, ui: &mut Ui) {
        let kind = self.kind;
        let notes = &mut self.notes;

        ui.horizontal_top(|ui| {
            let columns = if kind == ViewerKind::Static { 2.0 } else { 1.0 };
            let reserved = if kind == ViewerKind::Interactive { 320.0 } else { 0.0 };
            let spacing = ui.spacing().item_spacing.x;
            let column_width = ((ui.available_width() - reserved - spacing * columns) / columns).max(120.0);

            ui.vertical(|ui| {
                ui.set_width(column_width);
                ui.label("Automatic Labeling");
                ui.add(
                    egui::TextEdit::multiline(&mut notes.labeling)
                        .hint_text("Enter comments")
                        .desired_rows(5)
                        .desired_width(f32::INFINITY),
                );
            });

            match kind {
                ViewerKind::Static => {
                    ui.vertical(|ui| {
                        ui.set_width(column_width);
                        ui.horizontal(|ui| {
                            ui.label("Additional Comments");
                            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                ui.checkbox(&mut notes.delayed, "Delayed");
                            });
                        });
                        ui.add(
                            egui::TextEdit::multiline(&mut notes.comments)
                                .hint_text("Enter comments")
                                .desired_rows(5)
                                .desired_width(f32::INFINITY),
                        );
                    });
                }
                ViewerKind::Interactive => {
                    ui.vertical(|ui| {
                        ui.add_space(20.0);
                        if ui.button("Freeze").clicked() {
                            tracing::debug!("freeze requested");
                        }
                    });
                    ui.vertical(|ui| {
                        ui.add_space(20.0);
                        for tool in ["Area", "Length", "Angle", "Marking"] {
                            if ui
                                .button(tool)
                                .on_hover_text(format!("{} measurement", tool))
                                .clicked()
                            {
                                tracing::debug!(tool, "measurement tool selected");
                            }
                        }
                    });
                }
            }
        });
    }
}

/// Round button in the viewport's bottom-right corner. Returns true when clicked.
fn fullscreen_button(ui: &mut Ui, viewport: Rect, is_fullscreen: bool) -> bool {
    let size = Vec2::splat(FULLSCREEN_BUTTON);
    let rect = Rect::from_min_size(viewport.max - size - Vec2::splat(16.0), size);
    let response = ui
        .interact(rect, ui.id().with("fullscreen_button"), Sense::click())
        .on_hover_text(if is_fullscreen { "Exit fullscreen" } else { "Fullscreen" });

    let fill = if response.hovered() {
        ui.visuals().selection.stroke.color.gamma_multiply(0.6)
    } else {
        ui.visuals().selection.stroke.color
    };
    let painter = ui.painter_at(viewport);
    painter.circle_filled(rect.center(), FULLSCREEN_BUTTON / 2.0, fill);
    paint_corners(&painter, rect.shrink(12.0), is_fullscreen);

    response.clicked()
}

/// Four corner brackets; pointing inward when already fullscreen
fn paint_corners(painter: &egui::Painter, rect: Rect, inward: bool) {
    let stroke = egui::Stroke::new(2.0, Color32::WHITE);
    let arm = rect.width() * 0.4;

    for (corner, sx, sy) in [
        (rect.left_top(), 1.0, 1.0),
        (rect.right_top(), -1.0, 1.0),
        (rect.left_bottom(), 1.0, -1.0),
        (rect.right_bottom(), -1.0, -1.0),
    ] {
        let (elbow, dx, dy) = if inward {
            (corner + Vec2::new(sx * arm, sy * arm), -sx * arm, -sy * arm)
        } else {
            (corner, sx * arm, sy * arm)
        };
        painter.line_segment([elbow, elbow + Vec2::new(dx, 0.0)], stroke);
        painter.line_segment([elbow, elbow + Vec2::new(0.0, dy)], stroke);
    }
}
