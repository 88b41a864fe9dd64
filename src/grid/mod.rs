//! Probe grid drawing: coordinate mapping and the full-redraw renderer

mod mapper;
mod renderer;

pub use mapper::{map_point, Bounds, CanvasGeometry, Transform, DEFAULT_CANVAS_SIZE, DEFAULT_PADDING};
pub use renderer::{format_value, DisplayList, DrawOp, DrawSurface, GridRenderer, GridStyle};
