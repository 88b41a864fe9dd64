//! Physical bed coordinates -> canvas pixel coordinates

use crate::core::error::{Axis, LevelError};

/// Default canvas edge length in pixels
pub const DEFAULT_CANVAS_SIZE: f64 = 300.0;
/// Inset between the canvas edge and the probed area
pub const DEFAULT_PADDING: f64 = 50.0;

/// Physical extent of a probing grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Grid anchored at the origin (single-grid plugin)
    pub fn from_extent(width: f64, height: f64) -> Self {
        Self::new(0.0, width, 0.0, height)
    }
}

/// Square canvas with a fixed padding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasGeometry {
    pub size: f64,
    pub padding: f64,
}

impl Default for CanvasGeometry {
    fn default() -> Self {
        Self {
            size: DEFAULT_CANVAS_SIZE,
            padding: DEFAULT_PADDING,
        }
    }
}

impl CanvasGeometry {
    /// Drawable extent between the paddings
    pub fn inner(&self) -> f64 {
        self.size - 2.0 * self.padding
    }
}

/// Validated linear transform for one bounds/geometry pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    min_x: f64,
    min_y: f64,
    scale_x: f64,
    scale_y: f64,
    padding: f64,
}

impl Transform {
    pub fn new(bounds: Bounds, geometry: CanvasGeometry) -> Result<Self, LevelError> {
        let scale_x = scale(Axis::X, bounds.min_x, bounds.max_x, geometry)?;
        let scale_y = scale(Axis::Y, bounds.min_y, bounds.max_y, geometry)?;
        Ok(Self {
            min_x: bounds.min_x,
            min_y: bounds.min_y,
            scale_x,
            scale_y,
            padding: geometry.padding,
        })
    }

    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.min_x) * self.scale_x + self.padding,
            (y - self.min_y) * self.scale_y + self.padding,
        )
    }
}

fn scale(axis: Axis, min: f64, max: f64, geometry: CanvasGeometry) -> Result<f64, LevelError> {
    let span = max - min;
    let scale = geometry.inner() / span;
    if span == 0.0 || !span.is_finite() || !min.is_finite() || !scale.is_finite() {
        return Err(LevelError::InvalidBounds { axis, min, max });
    }
    Ok(scale)
}

/// Map one physical point to pixel space
pub fn map_point(
    x: f64,
    y: f64,
    bounds: Bounds,
    geometry: CanvasGeometry,
) -> Result<(f64, f64), LevelError> {
    Ok(Transform::new(bounds, geometry)?.apply(x, y))
}
