//! Anchor resolution for graph primitives.
//!
//! A point may sit on a line, a curve or a function graph, and line/curve
//! endpoints may in turn reference points. Resolution follows those
//! references recursively. The visited chain is an immutable linked list on
//! the stack: each recursive call extends it, sibling calls never see each
//! other's entries, and every top-level call starts empty.
//!
//! Results that were computed without meeting a cycle do not depend on the
//! chain they were reached through, so they are memoized for the lifetime
//! of the resolver (one layout pass). Shared endpoints resolve once.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::hash::Hash;

use crate::expr::ExprCache;
use crate::geometry::quad::{lerp_vec2, QuadBezier};
use crate::model::{GraphAnchor, GraphCurve, GraphLine, GraphPoint, GraphSegment, LineKind, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Key<'g> {
    Point(&'g str),
    Line(&'g str),
    Curve(&'g str),
}

struct Chain<'c, 'g> {
    key: Key<'g>,
    parent: Option<&'c Chain<'c, 'g>>,
}

impl<'c, 'g> Chain<'c, 'g> {
    fn contains(chain: Option<&Chain<'_, 'g>>, key: Key<'g>) -> bool {
        let mut cur = chain;
        while let Some(link) = cur {
            if link.key == key {
                return true;
            }
            cur = link.parent;
        }
        false
    }
}

pub struct Resolver<'g> {
    graph: &'g GraphSegment,
    exprs: &'g ExprCache,
    points: RefCell<HashMap<*const GraphPoint, Vec2>>,
    lines: RefCell<HashMap<*const GraphLine, Option<(Vec2, Vec2)>>>,
    curves: RefCell<HashMap<*const GraphCurve, Option<QuadBezier>>>,
    // bumped on every detected cycle
    cycles: Cell<usize>,
}

impl<'g> Resolver<'g> {
    pub fn new(graph: &'g GraphSegment, exprs: &'g ExprCache) -> Self {
        Self {
            graph,
            exprs,
            points: RefCell::default(),
            lines: RefCell::default(),
            curves: RefCell::default(),
            cycles: Cell::new(0),
        }
    }

    pub fn graph(&self) -> &'g GraphSegment {
        self.graph
    }

    pub fn exprs(&self) -> &'g ExprCache {
        self.exprs
    }

    /// Effective position of a point. Falls back to the literal `(x, y)`
    /// for missing references, cycles and unevaluable functions.
    pub fn resolve_point_position(&self, point: &'g GraphPoint) -> Vec2 {
        self.point_on(point, None)
    }

    pub fn resolve_point_by_id(&self, id: &str) -> Option<Vec2> {
        self.graph.point(id).map(|p| self.resolve_point_position(p))
    }

    /// Position of a free-standing anchor (area vertices, endpoints).
    pub fn resolve_anchor(&self, anchor: &'g GraphAnchor) -> Option<Vec2> {
        self.anchor_on(anchor, None, None)
    }

    /// Resolved `(start, end)` of a line, before viewport clipping.
    pub fn line_endpoints(&self, line: &'g GraphLine) -> Option<(Vec2, Vec2)> {
        self.line_ends_on(line, None)
    }

    /// Quadratic control triangle of a curve with resolved endpoints.
    pub fn build_curve_path(&self, curve: &'g GraphCurve) -> Option<QuadBezier> {
        self.curve_on(curve, None)
    }

    fn memoized<K: Eq + Hash, V: Clone>(
        &self,
        memo: &RefCell<HashMap<K, V>>,
        key: K,
        compute: impl FnOnce() -> V,
    ) -> V {
        if let Some(hit) = memo.borrow().get(&key).cloned() {
            return hit;
        }
        let before = self.cycles.get();
        let value = compute();
        if self.cycles.get() == before {
            memo.borrow_mut().insert(key, value.clone());
        }
        value
    }

    fn cycle(&self) {
        self.cycles.set(self.cycles.get() + 1);
    }

    fn point_on(&self, point: &'g GraphPoint, chain: Option<&Chain<'_, 'g>>) -> Vec2 {
        let key = Key::Point(&point.id);
        if Chain::contains(chain, key) {
            tracing::debug!(point = point.id.as_str(), "anchor cycle, using literal position");
            self.cycle();
            return point.literal();
        }
        self.memoized(&self.points, point as *const GraphPoint, || {
            let here = Chain { key, parent: chain };
            match &point.anchor {
                None | Some(GraphAnchor::Coord { .. }) => point.literal(),
                Some(anchor) => self
                    .anchor_on(anchor, Some(point.x), Some(&here))
                    .unwrap_or_else(|| point.literal()),
            }
        })
    }

    fn anchor_on(
        &self,
        anchor: &'g GraphAnchor,
        own_x: Option<f64>,
        chain: Option<&Chain<'_, 'g>>,
    ) -> Option<Vec2> {
        let resolved = match anchor {
            GraphAnchor::Coord { x, y } => Some(Vec2::new(*x, *y)),
            GraphAnchor::Point { point_id } => {
                let p = self.graph.point(point_id);
                p.map(|p| self.point_on(p, chain))
            }
            GraphAnchor::Line { line_id, t } => {
                let line = self.graph.line(line_id)?;
                let (start, end) = self.line_ends_on(line, chain)?;
                let t = match line.kind {
                    LineKind::Segment => t.max(0.0).min(1.0),
                    LineKind::Ray => t.max(0.0),
                    LineKind::Line => *t,
                };
                t.is_finite().then(|| lerp_vec2(start, end, t))
            }
            GraphAnchor::Curve { curve_id, t } => {
                let curve = self.graph.curve(curve_id)?;
                let path = self.curve_on(curve, chain)?;
                // eval clamps t to [0, 1]
                t.is_finite().then(|| path.eval(*t))
            }
            GraphAnchor::Function { function_id, x } => {
                let func = self.graph.function(function_id)?;
                let compiled = self.exprs.get(&func.expression)?;
                let x = x.or(own_x)?;
                compiled.eval_finite(x).map(|y| Vec2::new(x, y))
            }
        };
        if resolved.is_none() {
            tracing::debug!(?anchor, "anchor did not resolve");
        }
        resolved.filter(Vec2::is_finite)
    }

    fn line_ends_on(&self, line: &'g GraphLine, chain: Option<&Chain<'_, 'g>>) -> Option<(Vec2, Vec2)> {
        let key = Key::Line(&line.id);
        if Chain::contains(chain, key) {
            tracing::debug!(line = line.id.as_str(), "anchor cycle through line");
            self.cycle();
            return None;
        }
        self.memoized(&self.lines, line as *const GraphLine, || {
            let here = Chain { key, parent: chain };
            let start = self.anchor_on(&line.start, None, Some(&here))?;
            let end = self.anchor_on(&line.end, None, Some(&here))?;
            Some((start, end))
        })
    }

    fn curve_on(&self, curve: &'g GraphCurve, chain: Option<&Chain<'_, 'g>>) -> Option<QuadBezier> {
        let key = Key::Curve(&curve.id);
        if Chain::contains(chain, key) {
            tracing::debug!(curve = curve.id.as_str(), "anchor cycle through curve");
            self.cycle();
            return None;
        }
        self.memoized(&self.curves, curve as *const GraphCurve, || {
            let here = Chain { key, parent: chain };
            let start = self.anchor_on(&curve.start, None, Some(&here))?;
            let end = self.anchor_on(&curve.end, None, Some(&here))?;
            Some(QuadBezier::from_curvature(start, end, curve.curvature))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn graph(v: serde_json::Value) -> GraphSegment {
        serde_json::from_value(v).expect("graph fixture")
    }

    #[test]
    fn literal_and_coord_points() {
        let g = graph(json!({
            "points": [
                {"id": "a", "x": 1.0, "y": 2.0},
                {"id": "b", "x": 3.0, "y": 4.0, "anchor": {"type": "coord", "x": 9.0, "y": 9.0}}
            ]
        }));
        let cache = ExprCache::new();
        let r = Resolver::new(&g, &cache);
        assert_eq!(r.resolve_point_position(&g.points[0]), Vec2::new(1.0, 2.0));
        assert_eq!(r.resolve_point_position(&g.points[1]), Vec2::new(3.0, 4.0));
    }

    #[test]
    fn point_on_segment_clamps_t() {
        let g = graph(json!({
            "lines": [{"id": "l", "kind": "segment",
                       "start": {"type": "coord", "x": 0.0, "y": 0.0},
                       "end": {"type": "coord", "x": 4.0, "y": 2.0}}],
            "points": [
                {"id": "mid", "x": 0, "y": 0, "anchor": {"type": "line", "lineId": "l", "t": 0.5}},
                {"id": "past", "x": 0, "y": 0, "anchor": {"type": "line", "lineId": "l", "t": 3.0}}
            ]
        }));
        let cache = ExprCache::new();
        let r = Resolver::new(&g, &cache);
        assert_eq!(r.resolve_point_by_id("mid"), Some(Vec2::new(2.0, 1.0)));
        assert_eq!(r.resolve_point_by_id("past"), Some(Vec2::new(4.0, 2.0)));
    }

    #[test]
    fn ray_and_line_parameters() {
        let g = graph(json!({
            "lines": [
                {"id": "r", "kind": "ray", "start": {"type": "coord", "x": 0, "y": 0}, "end": {"type": "coord", "x": 1, "y": 0}},
                {"id": "l", "kind": "line", "start": {"type": "coord", "x": 0, "y": 0}, "end": {"type": "coord", "x": 1, "y": 0}}
            ],
            "points": [
                {"id": "r_back", "x": 0, "y": 0, "anchor": {"type": "line", "lineId": "r", "t": -2.0}},
                {"id": "r_far", "x": 0, "y": 0, "anchor": {"type": "line", "lineId": "r", "t": 3.0}},
                {"id": "l_back", "x": 0, "y": 0, "anchor": {"type": "line", "lineId": "l", "t": -2.0}}
            ]
        }));
        let cache = ExprCache::new();
        let r = Resolver::new(&g, &cache);
        assert_eq!(r.resolve_point_by_id("r_back"), Some(Vec2::new(0.0, 0.0)));
        assert_eq!(r.resolve_point_by_id("r_far"), Some(Vec2::new(3.0, 0.0)));
        assert_eq!(r.resolve_point_by_id("l_back"), Some(Vec2::new(-2.0, 0.0)));
    }

    #[test]
    fn point_on_curve() {
        let g = graph(json!({
            "curves": [{"id": "c", "curvature": 2.0,
                        "start": {"type": "coord", "x": 0, "y": 0},
                        "end": {"type": "coord", "x": 4, "y": 0}}],
            "points": [{"id": "p", "x": 0, "y": 0, "anchor": {"type": "curve", "curveId": "c", "t": 0.5}}]
        }));
        let cache = ExprCache::new();
        let r = Resolver::new(&g, &cache);
        let p = r.resolve_point_by_id("p").unwrap();
        assert!((p.x - 2.0).abs() < 1e-12 && (p.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn point_on_function_uses_own_x_when_anchor_has_none() {
        let g = graph(json!({
            "functions": [{"id": "f", "expression": "x^{2}"}],
            "points": [
                {"id": "p", "x": 3.0, "y": 0.0, "anchor": {"type": "function", "functionId": "f"}},
                {"id": "q", "x": 3.0, "y": 0.0, "anchor": {"type": "function", "functionId": "f", "x": -2.0}}
            ]
        }));
        let cache = ExprCache::new();
        let r = Resolver::new(&g, &cache);
        assert_eq!(r.resolve_point_by_id("p"), Some(Vec2::new(3.0, 9.0)));
        assert_eq!(r.resolve_point_by_id("q"), Some(Vec2::new(-2.0, 4.0)));
    }

    #[test]
    fn non_finite_function_value_falls_back() {
        let g = graph(json!({
            "functions": [{"id": "f", "expression": "\\frac{1}{x}"}],
            "points": [{"id": "p", "x": 0.0, "y": 7.0, "anchor": {"type": "function", "functionId": "f"}}]
        }));
        let cache = ExprCache::new();
        let r = Resolver::new(&g, &cache);
        assert_eq!(r.resolve_point_by_id("p"), Some(Vec2::new(0.0, 7.0)));
    }

    #[test]
    fn dangling_reference_falls_back() {
        let g = graph(json!({
            "points": [{"id": "p", "x": 5.0, "y": 6.0, "anchor": {"type": "line", "lineId": "missing", "t": 0.5}}]
        }));
        let cache = ExprCache::new();
        let r = Resolver::new(&g, &cache);
        assert_eq!(r.resolve_point_by_id("p"), Some(Vec2::new(5.0, 6.0)));
    }

    #[test]
    fn three_point_cycle_terminates() {
        let g = graph(json!({
            "points": [
                {"id": "a", "x": 1.0, "y": 1.0, "anchor": {"type": "point", "pointId": "b"}},
                {"id": "b", "x": 2.0, "y": 2.0, "anchor": {"type": "point", "pointId": "c"}},
                {"id": "c", "x": 3.0, "y": 3.0, "anchor": {"type": "point", "pointId": "a"}}
            ]
        }));
        let cache = ExprCache::new();
        let r = Resolver::new(&g, &cache);
        // a -> b -> c -> a: the re-entered point answers with its literal
        assert_eq!(r.resolve_point_by_id("a"), Some(Vec2::new(1.0, 1.0)));
        assert_eq!(r.resolve_point_by_id("b"), Some(Vec2::new(2.0, 2.0)));
        assert_eq!(r.resolve_point_by_id("c"), Some(Vec2::new(3.0, 3.0)));
    }

    #[test]
    fn line_cycle_through_own_endpoint_terminates() {
        // p sits on l, and l starts at p
        let g = graph(json!({
            "lines": [{"id": "l", "start": {"type": "point", "pointId": "p"}, "end": {"type": "coord", "x": 4, "y": 0}}],
            "points": [{"id": "p", "x": 2.0, "y": 2.0, "anchor": {"type": "line", "lineId": "l", "t": 0.5}}]
        }));
        let cache = ExprCache::new();
        let r = Resolver::new(&g, &cache);
        // start resolves to p's literal (2,2); midpoint with (4,0) is (3,1)
        assert_eq!(r.resolve_point_by_id("p"), Some(Vec2::new(3.0, 1.0)));
        let (start, _) = r.line_endpoints(&g.lines[0]).unwrap();
        // top-level line resolution: p -> l re-enters l
        assert_eq!(start, Vec2::new(2.0, 2.0));
    }

    #[test]
    fn line_anchored_to_itself_does_not_resolve() {
        let g = graph(json!({
            "lines": [{"id": "l", "start": {"type": "line", "lineId": "l", "t": 0.5}, "end": {"type": "coord", "x": 4, "y": 0}}]
        }));
        let cache = ExprCache::new();
        let r = Resolver::new(&g, &cache);
        assert!(r.line_endpoints(&g.lines[0]).is_none());
    }

    #[test]
    fn shared_endpoint_chains_resolve_once() {
        // every line starts and ends on the previous point; without reuse
        // each level doubles the work
        let depth = 64;
        let mut points = vec![json!({"id": "p0", "x": 1.0, "y": 1.0})];
        let mut lines = Vec::new();
        for i in 1..=depth {
            let prev = json!({"type": "point", "pointId": format!("p{}", i - 1)});
            lines.push(json!({"id": format!("l{i}"), "start": prev.clone(), "end": prev}));
            points.push(json!({"id": format!("p{i}"), "x": 0, "y": 0,
                               "anchor": {"type": "line", "lineId": format!("l{i}"), "t": 0.5}}));
        }
        let g = graph(json!({"points": points, "lines": lines}));
        let cache = ExprCache::new();
        let r = Resolver::new(&g, &cache);
        assert_eq!(r.resolve_point_by_id(&format!("p{depth}")), Some(Vec2::new(1.0, 1.0)));
        assert_eq!(r.points.borrow().len(), depth + 1);
    }

    #[test]
    fn cycle_results_are_not_reused_across_chains() {
        let g = graph(json!({
            "lines": [{"id": "l", "start": {"type": "point", "pointId": "p"}, "end": {"type": "coord", "x": 4, "y": 0}}],
            "points": [{"id": "p", "x": 2.0, "y": 2.0, "anchor": {"type": "line", "lineId": "l", "t": 0.5}}]
        }));
        let cache = ExprCache::new();
        let r = Resolver::new(&g, &cache);
        let (start, _) = r.line_endpoints(&g.lines[0]).unwrap();
        assert_eq!(start, Vec2::new(2.0, 2.0));
        assert_eq!(r.resolve_point_by_id("p"), Some(Vec2::new(3.0, 1.0)));
        assert!(r.points.borrow().is_empty());
    }

    #[test]
    fn uncompilable_function_anchor_falls_back() {
        let g = graph(json!({
            "functions": [{"id": "f", "expression": "\\alpha + x"}],
            "points": [{"id": "p", "x": 1.5, "y": -2.5, "anchor": {"type": "function", "functionId": "f", "x": 1.0}}]
        }));
        let cache = ExprCache::new();
        let r = Resolver::new(&g, &cache);
        assert_eq!(r.resolve_point_by_id("p"), Some(Vec2::new(1.5, -2.5)));
    }
}
