use crate::geometry::intersect::{line_intersections, Bounds};
use crate::geometry::tolerance::{approx_eq, EPS_LEN};
use crate::model::{LineKind, Vec2};

/// Visible piece of a line primitive in data space.
///
/// `segment` keeps its endpoints. `line` spans the two border crossings.
/// `ray` runs from `start` to the furthest crossing ahead of it along
/// `start -> end`; with no crossing ahead it is drawn from `start` through
/// `end` as authored.
pub fn clip_line(kind: LineKind, start: Vec2, end: Vec2, bounds: &Bounds) -> Option<(Vec2, Vec2)> {
    if approx_eq(start.x, end.x, EPS_LEN) && approx_eq(start.y, end.y, EPS_LEN) {
        return None;
    }
    match kind {
        LineKind::Segment => Some((start, end)),
        LineKind::Line => {
            let hits = line_intersections(start, end, bounds);
            match (hits.first(), hits.last()) {
                (Some(a), Some(b)) if hits.len() >= 2 => Some((a.point, b.point)),
                _ => None,
            }
        }
        LineKind::Ray => {
            let ahead = line_intersections(start, end, bounds)
                .into_iter()
                .filter(|h| h.t >= 0.0)
                .last();
            match ahead {
                Some(hit) => Some((start, hit.point)),
                None => Some((start, end)),
            }
        }
    }
}
