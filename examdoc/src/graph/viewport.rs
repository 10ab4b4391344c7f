use crate::geometry::intersect::Bounds;
use crate::model::{GraphAxes, Vec2};

/// Maps the axes' data rectangle onto a `width x height` pixel canvas.
/// Data y grows upward, pixel y grows downward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub bounds: Bounds,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(axes: &GraphAxes, width: f64, height: f64) -> Self {
        let bounds = Bounds::new(
            axes.x_min,
            axes.x_min + axes.x_range(),
            axes.y_min,
            axes.y_min + axes.y_range(),
        );
        Self { bounds, width, height }
    }

    #[inline]
    pub fn x_range(&self) -> f64 {
        self.bounds.x_max - self.bounds.x_min
    }

    #[inline]
    pub fn y_range(&self) -> f64 {
        self.bounds.y_max - self.bounds.y_min
    }

    #[inline]
    pub fn to_pixel(&self, p: Vec2) -> Vec2 {
        Vec2 {
            x: (p.x - self.bounds.x_min) / self.x_range() * self.width,
            y: self.height - (p.y - self.bounds.y_min) / self.y_range() * self.height,
        }
    }

    pub fn to_pixels(&self, pts: &[Vec2]) -> Vec<Vec2> {
        pts.iter().map(|p| self.to_pixel(*p)).collect()
    }

    /// Pixel row of the horizontal axis (`y = 0`) when it is inside the range.
    pub fn x_axis_row(&self) -> Option<f64> {
        (self.bounds.y_min <= 0.0 && 0.0 <= self.bounds.y_max)
            .then(|| self.to_pixel(Vec2::new(self.bounds.x_min, 0.0)).y)
    }

    /// Pixel column of the vertical axis (`x = 0`) when it is inside the range.
    pub fn y_axis_col(&self) -> Option<f64> {
        (self.bounds.x_min <= 0.0 && 0.0 <= self.bounds.x_max)
            .then(|| self.to_pixel(Vec2::new(0.0, self.bounds.y_min)).x)
    }
}

/// Uniform shrink factor for constrained display contexts.
///
/// An explicit scale wins; otherwise `fit_width` derives
/// `min(1, fit_width / base_width)`. Never above 1, invalid input means 1.
pub fn resolve_scale(explicit: Option<f64>, fit_width: Option<f64>, base_width: f64) -> f64 {
    let s = match (explicit, fit_width) {
        (Some(s), _) => s,
        (None, Some(max_w)) if base_width > 0.0 => max_w / base_width,
        _ => 1.0,
    };
    if s.is_finite() && s > 0.0 {
        s.min(1.0)
    } else {
        1.0
    }
}
