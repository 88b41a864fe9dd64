//! Probe grid canvas: replays the renderer's display list with the egui painter

use eframe::egui;

use super::LevelApp;
use crate::grid::DrawOp;
use crate::theme::{colors, rgb};

impl LevelApp {
    pub(crate) fn render_grid(&self, ui: &mut egui::Ui) {
        let Some(controller) = &self.controller else {
            return;
        };
        let controller = controller.borrow();
        let grid = controller.grid();
        let size = grid.geometry().size as f32;
        let style = *grid.style();

        let (response, painter) = ui.allocate_painter(egui::vec2(size, size), egui::Sense::hover());
        let origin = response.rect.min;
        painter.rect_filled(response.rect, 0.0, colors::GRID_BG);

        let to_screen = |x: f64, y: f64| origin + egui::vec2(x as f32, y as f32);
        for op in grid.surface().ops() {
            match op {
                DrawOp::StrokeRect { x, y, width, height } => {
                    let rect = egui::Rect::from_min_size(
                        to_screen(*x, *y),
                        egui::vec2(*width as f32, *height as f32),
                    );
                    painter.rect_stroke(
                        rect,
                        0.0,
                        egui::Stroke::new(style.line_width, rgb(style.stroke)),
                        egui::StrokeKind::Middle,
                    );
                }
                DrawOp::FillText { text, x, y } => {
                    painter.text(
                        to_screen(*x, *y),
                        egui::Align2::CENTER_CENTER,
                        text,
                        egui::FontId::proportional(style.font_px),
                        rgb(style.text),
                    );
                }
            }
        }

        if let Some(e) = grid.last_error() {
            response.on_hover_text(e.to_string());
        } else {
            response.on_hover_text(format!("{} samples", controller.samples().len()));
        }
    }
}
