// Line / axis-aligned box intersection in data space.
// Used to clip infinite lines and rays to the graph viewport.

use super::tolerance::{approx_eq, near_zero, EPS_BOX, EPS_DEDUP, EPS_DENOM};
use crate::model::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self { x_min, x_max, y_min, y_max }
    }

    #[inline]
    pub fn contains(&self, p: Vec2, eps: f64) -> bool {
        p.x >= self.x_min - eps && p.x <= self.x_max + eps && p.y >= self.y_min - eps && p.y <= self.y_max + eps
    }
}

/// A crossing of the infinite line through `p0 -> p1` with the box border.
/// `t` is the parameter along `p0 + t * (p1 - p0)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxHit {
    pub t: f64,
    pub point: Vec2,
}

/// Intersections of the infinite line through `p0` and `p1` with the border
/// of `bounds`, ordered by parameter. Corner hits found on two edges are
/// reported once. A degenerate direction yields no hits.
pub fn line_intersections(p0: Vec2, p1: Vec2, bounds: &Bounds) -> Vec<BoxHit> {
    let dx = p1.x - p0.x;
    let dy = p1.y - p0.y;
    let mut hits: Vec<BoxHit> = Vec::with_capacity(4);

    let mut push = |t: f64| {
        let point = Vec2::new(p0.x + t * dx, p0.y + t * dy);
        if !point.is_finite() || !bounds.contains(point, EPS_BOX) {
            return;
        }
        let dup = hits.iter().any(|h| {
            approx_eq(h.point.x, point.x, EPS_DEDUP) && approx_eq(h.point.y, point.y, EPS_DEDUP)
        });
        if !dup {
            hits.push(BoxHit { t, point });
        }
    };

    if !near_zero(dx, EPS_DENOM) {
        push((bounds.x_min - p0.x) / dx);
        push((bounds.x_max - p0.x) / dx);
    }
    if !near_zero(dy, EPS_DENOM) {
        push((bounds.y_min - p0.y) / dy);
        push((bounds.y_max - p0.y) / dy);
    }

    hits.sort_by(|a, b| a.t.total_cmp(&b.t));
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bx() -> Bounds {
        Bounds::new(-5.0, 5.0, -5.0, 5.0)
    }

    #[test]
    fn horizontal_cross() {
        let hits = line_intersections(Vec2::new(-10.0, 0.0), Vec2::new(10.0, 0.0), &bx());
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].point, Vec2::new(-5.0, 0.0));
        assert_eq!(hits[1].point, Vec2::new(5.0, 0.0));
        assert!((hits[0].t - 0.25).abs() < 1e-12);
        assert!((hits[1].t - 0.75).abs() < 1e-12);
    }

    #[test]
    fn diagonal_through_corners_dedups() {
        let hits = line_intersections(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), &bx());
        assert_eq!(hits.len(), 2, "corner hits on two edges count once: {:?}", hits);
        assert_eq!(hits[0].point, Vec2::new(-5.0, -5.0));
        assert_eq!(hits[1].point, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn line_missing_box() {
        let hits = line_intersections(Vec2::new(-10.0, 8.0), Vec2::new(10.0, 8.0), &bx());
        assert!(hits.is_empty());
    }

    #[test]
    fn degenerate_direction() {
        let hits = line_intersections(Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0), &bx());
        assert!(hits.is_empty());
    }
}
