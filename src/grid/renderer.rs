//! Grid renderer: redraws the whole probe grid on every buffer change
//!
//! Drawing goes through [`DrawSurface`]. [`DisplayList`] is the retained
//! surface: the dashboard replays it each frame, the CLI and tests read it.

use tracing::{trace, warn};

use super::mapper::{Bounds, CanvasGeometry, Transform};
use crate::core::buffer::{BufferObserver, ProbeSample};
use crate::core::error::LevelError;

/// Minimal 2D drawing surface
pub trait DrawSurface {
    fn clear(&mut self, width: f64, height: f64);
    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    /// Text centered on (x, y)
    fn fill_text(&mut self, text: &str, x: f64, y: f64);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    StrokeRect { x: f64, y: f64, width: f64, height: f64 },
    FillText { text: String, x: f64, y: f64 },
}

/// Retained list of draw operations since the last clear
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    ops: Vec<DrawOp>,
    clears: u64,
}

impl DisplayList {
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Number of clears seen, one per full redraw
    pub fn clears(&self) -> u64 {
        self.clears
    }

    /// Text labels with their pixel positions
    pub fn labels(&self) -> impl Iterator<Item = (&str, f64, f64)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::FillText { text, x, y } => Some((text.as_str(), *x, *y)),
            _ => None,
        })
    }
}

impl DrawSurface for DisplayList {
    fn clear(&mut self, _width: f64, _height: f64) {
        self.ops.clear();
        self.clears += 1;
    }

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ops.push(DrawOp::StrokeRect { x, y, width, height });
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.ops.push(DrawOp::FillText {
            text: text.to_string(),
            x,
            y,
        });
    }
}

/// Colors and stroke settings of the grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridStyle {
    pub stroke: [u8; 3],
    pub line_width: f32,
    pub text: [u8; 3],
    pub font_px: f32,
}

impl Default for GridStyle {
    fn default() -> Self {
        Self {
            stroke: [0xCC, 0xCC, 0xCC],
            line_width: 2.0,
            text: [0, 0, 0],
            font_px: 12.0,
        }
    }
}

/// Label text for a measured value
pub fn format_value(z: f64) -> String {
    format!("{}", z)
}

pub struct GridRenderer<S> {
    geometry: CanvasGeometry,
    bounds: Option<Bounds>,
    style: GridStyle,
    surface: S,
    redraws: u64,
    last_error: Option<LevelError>,
}

impl<S: DrawSurface> GridRenderer<S> {
    pub fn new(geometry: CanvasGeometry, surface: S) -> Self {
        Self {
            geometry,
            bounds: None,
            style: GridStyle::default(),
            surface,
            redraws: 0,
            last_error: None,
        }
    }

    /// Bounds used by the next redraw
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = Some(bounds);
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn geometry(&self) -> CanvasGeometry {
        self.geometry
    }

    pub fn style(&self) -> &GridStyle {
        &self.style
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn redraws(&self) -> u64 {
        self.redraws
    }

    /// Error from the latest redraw, if its bounds were degenerate
    pub fn last_error(&self) -> Option<&LevelError> {
        self.last_error.as_ref()
    }

    /// Full redraw: clear, border, one label per sample
    pub fn draw(&mut self, samples: &[ProbeSample]) {
        let size = self.geometry.size;
        self.redraws += 1;
        self.surface.clear(size, size);
        self.surface.stroke_rect(1.0, 1.0, size - 2.0, size - 2.0);

        let Some(bounds) = self.bounds else {
            self.last_error = None;
            return;
        };

        let transform = match Transform::new(bounds, self.geometry) {
            Ok(t) => t,
            Err(e) => {
                if !samples.is_empty() {
                    warn!(error = %e, samples = samples.len(), "Grid not drawn");
                }
                self.last_error = Some(e);
                return;
            }
        };
        self.last_error = None;

        for sample in samples {
            let (px, py) = transform.apply(sample.x, sample.y);
            self.surface.fill_text(&format_value(sample.z), px, py);
        }
        trace!(samples = samples.len(), redraws = self.redraws, "Grid redrawn");
    }
}

impl<S: DrawSurface> BufferObserver for GridRenderer<S> {
    fn buffer_changed(&mut self, samples: &[ProbeSample]) {
        self.draw(samples);
    }
}
