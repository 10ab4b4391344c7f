//! Quadratic Bézier helpers for graph curves.
//!
//! A graph curve is authored as two endpoints plus a signed `curvature`:
//! the control point sits on the perpendicular through the chord midpoint.

use crate::geometry::tolerance::{clamp01, norm2};
use crate::model::Vec2;

/// Control triangle of a quadratic Bézier curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadBezier {
    pub p0: Vec2, // Start point
    pub p1: Vec2, // Control point
    pub p2: Vec2, // End point
}

impl QuadBezier {
    pub fn new(p0: Vec2, p1: Vec2, p2: Vec2) -> Self {
        Self { p0, p1, p2 }
    }

    /// Build the curve for a chord `start -> end` bent by `curvature`.
    ///
    /// The control point is the chord midpoint offset along the unit normal
    /// `(-dy, dx) / len`. A zero-length chord keeps the control point on the
    /// midpoint.
    pub fn from_curvature(start: Vec2, end: Vec2, curvature: f64) -> Self {
        let mid = lerp_vec2(start, end, 0.5);
        let ((nx, ny), len) = norm2(-(end.y - start.y), end.x - start.x);
        let k = if curvature.is_finite() { curvature } else { 0.0 };
        let control = if len > 0.0 {
            Vec2::new(mid.x + nx * k, mid.y + ny * k)
        } else {
            mid
        };
        Self::new(start, control, end)
    }

    /// Evaluate the curve at parameter t, clamped to [0, 1].
    pub fn eval(&self, t: f64) -> Vec2 {
        let t = clamp01(t);
        let mt = 1.0 - t;
        Vec2 {
            x: mt * mt * self.p0.x + 2.0 * mt * t * self.p1.x + t * t * self.p2.x,
            y: mt * mt * self.p0.y + 2.0 * mt * t * self.p1.y + t * t * self.p2.y,
        }
    }

    pub fn midpoint(&self) -> Vec2 {
        self.eval(0.5)
    }

    pub fn map(&self, f: impl Fn(Vec2) -> Vec2) -> Self {
        Self::new(f(self.p0), f(self.p1), f(self.p2))
    }
}

/// Linear interpolation between two Vec2s.
#[inline]
pub fn lerp_vec2(a: Vec2, b: Vec2, t: f64) -> Vec2 {
    Vec2 {
        x: a.x + t * (b.x - a.x),
        y: a.y + t * (b.y - a.y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec2(x: f64, y: f64) -> Vec2 {
        Vec2 { x, y }
    }

    #[test]
    fn test_eval_endpoints() {
        let curve = QuadBezier::new(vec2(0.0, 0.0), vec2(2.0, 4.0), vec2(4.0, 0.0));
        let start = curve.eval(0.0);
        let end = curve.eval(1.0);
        assert!((start.x - 0.0).abs() < 1e-12 && (start.y - 0.0).abs() < 1e-12);
        assert!((end.x - 4.0).abs() < 1e-12 && (end.y - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_eval_clamps_parameter() {
        let curve = QuadBezier::new(vec2(0.0, 0.0), vec2(2.0, 4.0), vec2(4.0, 0.0));
        assert_eq!(curve.eval(-3.0), curve.eval(0.0));
        assert_eq!(curve.eval(7.0), curve.eval(1.0));
    }

    #[test]
    fn test_control_point_on_normal() {
        // Chord along +x, normal is +y
        let curve = QuadBezier::from_curvature(vec2(0.0, 0.0), vec2(4.0, 0.0), 2.0);
        assert!((curve.p1.x - 2.0).abs() < 1e-12);
        assert!((curve.p1.y - 2.0).abs() < 1e-12);
        // Peak of the curve is half the control offset
        let mid = curve.midpoint();
        assert!((mid.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_length_chord() {
        let curve = QuadBezier::from_curvature(vec2(1.0, 1.0), vec2(1.0, 1.0), 5.0);
        assert_eq!(curve.p1, vec2(1.0, 1.0));
    }

    #[test]
    fn test_negative_curvature_bends_other_way() {
        let curve = QuadBezier::from_curvature(vec2(0.0, 0.0), vec2(4.0, 0.0), -2.0);
        assert!(curve.midpoint().y < 0.0);
    }
}
