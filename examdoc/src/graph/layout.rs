//! Graph segment -> [`Scene`] layout.
//!
//! Resolves anchors, samples functions, clips lines and maps everything into
//! pixel space. Draw order: grid, axes, tick labels, axis labels, areas,
//! functions, curves, lines, points, then every label on top.

use super::area::{area_label_anchor, area_outline};
use super::clip::clip_line;
use super::resolve::Resolver;
use super::sample::{effective_domain, sample_function};
use super::scene::{Fill, Item, Label, LabelBody, Scene, Stroke, TextAnchor};
use super::viewport::Viewport;
use crate::expr::ExprCache;
use crate::geometry::limits::{in_coord_bounds, in_size_bounds, MAX_GRID_LINES};
use crate::geometry::quad::lerp_vec2;
use crate::model::{
    ContentSegment, GraphAxes, GraphSegment, LabelSpec, LineDash, Vec2,
};

const GRID_COLOR: &str = "#e5e7eb";
const AXIS_COLOR: &str = "#374151";
const TICK_COLOR: &str = "#6b7280";
const INK: &str = "#111827";
const CURVE_COLOR: &str = "#2563eb";
const AREA_COLOR: &str = "#3b82f6";
const AREA_OPACITY: f64 = 0.25;

const LABEL_SIZE: f64 = 14.0;
const TICK_SIZE: f64 = 10.0;
const POINT_RADIUS: f64 = 4.0;
const MIN_POINT_RADIUS: f64 = 2.0;
const MAX_POINT_RADIUS: f64 = 24.0;
const STROKE_WIDTH: f64 = 2.0;
const MAX_STROKE_WIDTH: f64 = 12.0;
const MAX_TICKS: usize = 40;

/// Lay out a graph at `scale` (already resolved, in `(0, 1]`).
pub fn layout_graph(graph: &GraphSegment, scale: f64) -> Scene {
    let exprs = ExprCache::new();
    let resolver = Resolver::new(graph, &exprs);
    let width = if in_size_bounds(graph.width) { graph.width } else { 360.0 };
    let height = if in_size_bounds(graph.height) { graph.height } else { 280.0 };
    let mut ctx = Layout {
        vp: Viewport::new(&graph.axes, width * scale, height * scale),
        scale,
        items: Vec::new(),
        labels: Vec::new(),
    };

    ctx.grid(&graph.axes);
    ctx.axes(&graph.axes);
    ctx.areas(&resolver);
    ctx.functions(&resolver);
    ctx.curves(&resolver);
    ctx.lines(&resolver);
    ctx.points(&resolver);
    ctx.texts(graph);

    let Layout { vp, mut items, labels, .. } = ctx;
    items.extend(labels.into_iter().map(Item::Label));
    Scene {
        id: graph.id.clone(),
        width: vp.width,
        height: vp.height,
        scale,
        background: if graph.background.trim().is_empty() {
            "#ffffff".to_string()
        } else {
            graph.background.clone()
        },
        items,
    }
}

struct Layout {
    vp: Viewport,
    scale: f64,
    items: Vec<Item>,
    labels: Vec<Label>,
}

/// Authored stroke width, clamped; non-positive or non-finite means default.
fn stroke_width(width: Option<f64>) -> f64 {
    width
        .filter(|w| w.is_finite() && *w > 0.0)
        .map_or(STROKE_WIDTH, |w| w.min(MAX_STROKE_WIDTH))
}

fn point_radius(size: Option<f64>) -> f64 {
    size.filter(|s| s.is_finite())
        .unwrap_or(POINT_RADIUS)
        .clamp(MIN_POINT_RADIUS, MAX_POINT_RADIUS)
}

fn dash(style: Option<LineDash>) -> LineDash {
    style.unwrap_or_default()
}

fn color_or(color: &Option<String>, fallback: &str) -> String {
    match color {
        Some(c) if !c.trim().is_empty() => c.clone(),
        _ => fallback.to_string(),
    }
}

/// Body of a primitive label. Non-empty segments beat the plain string.
fn label_body(spec: &LabelSpec) -> Option<LabelBody> {
    if !spec.is_visible() {
        return None;
    }
    if spec.has_segments() {
        return spec.label_segments.clone().map(LabelBody::Rich);
    }
    let text = spec.label.clone()?;
    Some(if spec.label_is_math.unwrap_or(false) {
        LabelBody::Math(text)
    } else {
        LabelBody::Plain(text)
    })
}

fn text_body(
    text: Option<&str>,
    segments: Option<&Vec<ContentSegment>>,
    is_math: Option<bool>,
) -> Option<LabelBody> {
    if let Some(segs) = segments.filter(|s| !s.is_empty()) {
        return Some(LabelBody::Rich(segs.clone()));
    }
    let text = text.filter(|t| !t.trim().is_empty())?.to_string();
    Some(if is_math.unwrap_or(false) {
        LabelBody::Math(text)
    } else {
        LabelBody::Plain(text)
    })
}

/// Tick text: integers without a fraction, others with up to 3 decimals.
pub fn format_tick(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{}", v.round() as i64)
    } else {
        let s = format!("{:.3}", v);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Multiples of `step` inside `[min, max]`, `None` when too dense.
fn step_multiples(min: f64, max: f64, step: f64) -> Option<Vec<f64>> {
    let first = (min / step).ceil();
    let last = (max / step).floor();
    if !(first.is_finite() && last.is_finite()) || last < first {
        return Some(Vec::new());
    }
    if last - first >= MAX_GRID_LINES as f64 {
        return None;
    }
    Some((first as i64..=last as i64).map(|k| k as f64 * step).collect())
}

impl Layout {
    fn px(&self, p: Vec2) -> Vec2 {
        self.vp.to_pixel(p)
    }

    fn stroke(&self, color: String, width: f64, dash: LineDash) -> Stroke {
        Stroke { color, width: width * self.scale, dash }
    }

    fn push_label(&mut self, at: Vec2, body: LabelBody, size: f64, color: String, anchor: TextAnchor) {
        self.labels.push(Label { at, body, size: size * self.scale, color, anchor });
    }

    /// Primitive label at its explicit position, else at `default` (data
    /// space) nudged by `offset` pixels.
    fn primitive_label(&mut self, spec: &LabelSpec, default: Option<Vec2>, offset: Vec2, anchor: TextAnchor) {
        let Some(body) = label_body(spec) else { return };
        let at = match (spec.label_pos, default) {
            (Some(pos), _) if pos.is_finite() => self.px(pos),
            (_, Some(d)) if d.is_finite() => {
                let p = self.px(d);
                Vec2::new(p.x + offset.x * self.scale, p.y + offset.y * self.scale)
            }
            _ => return,
        };
        let size = spec.label_size.filter(|s| in_size_bounds(*s)).unwrap_or(LABEL_SIZE);
        self.push_label(at, body, size, INK.to_string(), anchor);
    }

    fn grid(&mut self, axes: &GraphAxes) {
        if !axes.show_grid {
            return;
        }
        let b = self.vp.bounds;
        let stroke = self.stroke(GRID_COLOR.to_string(), 1.0, LineDash::Solid);
        match step_multiples(b.x_min, b.x_max, axes.x_step()) {
            Some(xs) => {
                for x in xs {
                    let from = self.px(Vec2::new(x, b.y_min));
                    let to = self.px(Vec2::new(x, b.y_max));
                    self.items.push(Item::Line { from, to, stroke: stroke.clone() });
                }
            }
            None => tracing::debug!(step = axes.x_step(), "vertical grid too dense, skipped"),
        }
        match step_multiples(b.y_min, b.y_max, axes.y_step()) {
            Some(ys) => {
                for y in ys {
                    let from = self.px(Vec2::new(b.x_min, y));
                    let to = self.px(Vec2::new(b.x_max, y));
                    self.items.push(Item::Line { from, to, stroke: stroke.clone() });
                }
            }
            None => tracing::debug!(step = axes.y_step(), "horizontal grid too dense, skipped"),
        }
    }

    fn axes(&mut self, axes: &GraphAxes) {
        let b = self.vp.bounds;
        let (w, h, s) = (self.vp.width, self.vp.height, self.scale);
        let stroke = self.stroke(AXIS_COLOR.to_string(), 1.5, LineDash::Solid);
        let axis_row = self.vp.x_axis_row();
        let axis_col = self.vp.y_axis_col();

        if let Some(row) = axis_row {
            self.items.push(Item::Line {
                from: Vec2::new(0.0, row),
                to: Vec2::new(w, row),
                stroke: stroke.clone(),
            });
            if let Some(xs) = step_multiples(b.x_min, b.x_max, axes.x_step()).filter(|v| v.len() <= MAX_TICKS) {
                for x in xs.into_iter().filter(|x| x.abs() > 1e-12) {
                    let at = Vec2::new(self.px(Vec2::new(x, 0.0)).x, (row + 12.0 * s).min(h - 2.0 * s));
                    self.push_label(at, LabelBody::Plain(format_tick(x)), TICK_SIZE, TICK_COLOR.to_string(), TextAnchor::Middle);
                }
            }
        }
        if let Some(col) = axis_col {
            self.items.push(Item::Line {
                from: Vec2::new(col, 0.0),
                to: Vec2::new(col, h),
                stroke,
            });
            if let Some(ys) = step_multiples(b.y_min, b.y_max, axes.y_step()).filter(|v| v.len() <= MAX_TICKS) {
                for y in ys.into_iter().filter(|y| y.abs() > 1e-12) {
                    let at = Vec2::new((col - 4.0 * s).max(8.0 * s), self.px(Vec2::new(0.0, y)).y + 3.0 * s);
                    self.push_label(at, LabelBody::Plain(format_tick(y)), TICK_SIZE, TICK_COLOR.to_string(), TextAnchor::End);
                }
            }
        }

        // Axis captions stay inside the canvas even when the axis is off-screen.
        let row = axis_row.unwrap_or(h);
        let col = axis_col.unwrap_or(0.0);
        if let Some(body) = text_body(axes.x_label.as_deref(), axes.x_label_segments.as_ref(), axes.x_label_is_math) {
            let at = Vec2::new(w - 6.0 * s, (row - 8.0 * s).max(12.0 * s).min(h - 6.0 * s));
            self.push_label(at, body, LABEL_SIZE, AXIS_COLOR.to_string(), TextAnchor::End);
        }
        if let Some(body) = text_body(axes.y_label.as_deref(), axes.y_label_segments.as_ref(), axes.y_label_is_math) {
            let at = Vec2::new((col + 8.0 * s).max(6.0 * s).min(w - 6.0 * s), 14.0 * s);
            self.push_label(at, body, LABEL_SIZE, AXIS_COLOR.to_string(), TextAnchor::Start);
        }
    }

    fn areas(&mut self, resolver: &Resolver<'_>) {
        let graph = resolver.graph();
        for area in &graph.areas {
            let outline = area_outline(area, resolver);
            if outline.len() < 3 {
                tracing::debug!(area = area.id.as_str(), points = outline.len(), "area skipped");
                continue;
            }
            let fill = Fill {
                color: color_or(&area.fill, AREA_COLOR),
                opacity: area.opacity.filter(|o| o.is_finite()).map_or(AREA_OPACITY, |o| o.max(0.0).min(1.0)),
            };
            self.items.push(Item::Polygon { points: self.vp.to_pixels(&outline), fill });
            let anchor = area_label_anchor(area, &outline, resolver);
            self.primitive_label(&area.label, anchor, Vec2::default(), TextAnchor::Middle);
        }
    }

    fn functions(&mut self, resolver: &Resolver<'_>) {
        let graph = resolver.graph();
        for func in &graph.functions {
            let Some(compiled) = resolver.exprs().get(&func.expression) else {
                tracing::debug!(function = func.id.as_str(), "function skipped, expression did not compile");
                continue;
            };
            let domain = effective_domain(func, &graph.axes);
            let samples = sample_function(|x| compiled.eval(x), domain.min, domain.max);
            if samples.len() < 2 {
                continue;
            }
            let stroke = self.stroke(color_or(&func.color, CURVE_COLOR), stroke_width(func.width), dash(func.style));
            self.items.push(Item::Polyline { points: self.vp.to_pixels(&samples), stroke });
            let mid = domain.mid();
            let anchor = compiled.eval_finite(mid).map(|y| Vec2::new(mid, y));
            self.primitive_label(&func.label, anchor, Vec2::new(6.0, -8.0), TextAnchor::Start);
        }
    }

    fn curves(&mut self, resolver: &Resolver<'_>) {
        let graph = resolver.graph();
        for curve in &graph.curves {
            let Some(path) = resolver.build_curve_path(curve) else {
                tracing::debug!(curve = curve.id.as_str(), "curve skipped, endpoints unresolved");
                continue;
            };
            let stroke = self.stroke(color_or(&curve.color, INK), stroke_width(curve.width), dash(curve.style));
            self.items.push(Item::Quad { curve: path.map(|p| self.vp.to_pixel(p)), stroke });
            self.primitive_label(&curve.label, Some(path.midpoint()), Vec2::new(0.0, -8.0), TextAnchor::Middle);
        }
    }

    fn lines(&mut self, resolver: &Resolver<'_>) {
        let graph = resolver.graph();
        for line in &graph.lines {
            let Some((start, end)) = resolver.line_endpoints(line) else {
                tracing::debug!(line = line.id.as_str(), "line skipped, endpoints unresolved");
                continue;
            };
            let Some((a, b)) = clip_line(line.kind, start, end, &self.vp.bounds) else {
                continue;
            };
            let stroke = self.stroke(color_or(&line.color, INK), stroke_width(line.width), dash(line.style));
            self.items.push(Item::Line { from: self.px(a), to: self.px(b), stroke });
            self.primitive_label(&line.label, Some(lerp_vec2(start, end, 0.5)), Vec2::new(0.0, -8.0), TextAnchor::Middle);
        }
    }

    fn points(&mut self, resolver: &Resolver<'_>) {
        let graph = resolver.graph();
        for point in &graph.points {
            let pos = resolver.resolve_point_position(point);
            if !(in_coord_bounds(pos.x) && in_coord_bounds(pos.y)) {
                tracing::debug!(point = point.id.as_str(), "point skipped, position out of range");
                continue;
            }
            let color = color_or(&point.color, INK);
            let radius = point_radius(point.size) * self.scale;
            let fill = if point.filled == Some(false) { "#ffffff".to_string() } else { color.clone() };
            let stroke = self.stroke(color, 1.5, LineDash::Solid);
            self.items.push(Item::Circle { center: self.px(pos), radius, fill, stroke });
            self.primitive_label(&point.label, Some(pos), Vec2::new(6.0, -6.0), TextAnchor::Start);
        }
    }

    fn texts(&mut self, graph: &GraphSegment) {
        for text in &graph.texts {
            let Some(body) = text_body(Some(text.text.as_str()), text.text_segments.as_ref(), text.is_math) else {
                continue;
            };
            let pos = Vec2::new(text.x, text.y);
            if !pos.is_finite() {
                continue;
            }
            let size = text.size.filter(|s| in_size_bounds(*s)).unwrap_or(LABEL_SIZE);
            self.push_label(self.px(pos), body, size, color_or(&text.color, INK), TextAnchor::Start);
        }
    }
}
