use crate::content::html::{escape_html, to_html, MathRenderer};
use crate::content::math::{prepare_math, PreparedMath};
use crate::content::render::render_segments_at;
use crate::geometry::quad::QuadBezier;
use crate::graph::{Fill, Label, LabelBody, Scene, Stroke, Surface, TextAnchor};
use crate::model::{LineDash, Vec2};
use crate::options::RenderOptions;
use std::fmt::Write;

/// Number formatting for markup: at most 3 decimals, no trailing zeros.
pub fn fmt_num(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let s = format!("{:.3}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn points_attr(pts: &[Vec2]) -> String {
    let mut s = String::with_capacity(pts.len() * 12);
    for (i, p) in pts.iter().enumerate() {
        if i > 0 {
            s.push(' ');
        }
        let _ = write!(s, "{},{}", fmt_num(p.x), fmt_num(p.y));
    }
    s
}

fn stroke_attrs(stroke: &Stroke) -> String {
    let mut s = format!(
        r#"stroke="{}" stroke-width="{}""#,
        escape_html(&stroke.color),
        fmt_num(stroke.width)
    );
    match stroke.dash {
        LineDash::Solid => {}
        LineDash::Dashed => {
            let _ = write!(s, r#" stroke-dasharray="{} {}""#, fmt_num(stroke.width * 3.0), fmt_num(stroke.width * 2.0));
        }
        LineDash::Dotted => {
            let _ = write!(s, r#" stroke-dasharray="0 {}" stroke-linecap="round""#, fmt_num(stroke.width * 2.0));
        }
    }
    s
}

/// Writes a scene as a standalone `<svg>` element. Math and rich labels
/// become `<foreignObject>` HTML rendered through `math`.
pub struct SvgSurface<'m> {
    out: String,
    math: &'m dyn MathRenderer,
    depth: usize,
}

impl<'m> SvgSurface<'m> {
    pub fn new(math: &'m dyn MathRenderer, depth: usize) -> Self {
        Self { out: String::new(), math, depth }
    }

    fn label_html(&self, body: &LabelBody) -> String {
        match body {
            LabelBody::Plain(text) => escape_html(text),
            LabelBody::Math(tex) => {
                let prepared = PreparedMath { tex: prepare_math(tex).tex, display: false };
                self.math.render(&prepared, 1.0)
            }
            LabelBody::Rich(segments) => {
                let nodes = render_segments_at(segments, &RenderOptions::default(), self.depth);
                to_html(&nodes, self.math)
            }
        }
    }
}

impl Surface for SvgSurface<'_> {
    type Output = String;

    fn begin(&mut self, scene: &Scene) {
        let (w, h) = (fmt_num(scene.width), fmt_num(scene.height));
        let _ = write!(
            self.out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><rect width="{w}" height="{h}" fill="{}"/>"#,
            escape_html(&scene.background)
        );
    }

    fn line(&mut self, from: Vec2, to: Vec2, stroke: &Stroke) {
        let _ = write!(
            self.out,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" {}/>"#,
            fmt_num(from.x),
            fmt_num(from.y),
            fmt_num(to.x),
            fmt_num(to.y),
            stroke_attrs(stroke)
        );
    }

    fn polyline(&mut self, points: &[Vec2], stroke: &Stroke) {
        let _ = write!(
            self.out,
            r#"<polyline points="{}" fill="none" stroke-linejoin="round" {}/>"#,
            points_attr(points),
            stroke_attrs(stroke)
        );
    }

    fn quad(&mut self, curve: &QuadBezier, stroke: &Stroke) {
        let _ = write!(
            self.out,
            r#"<path d="M {} {} Q {} {} {} {}" fill="none" {}/>"#,
            fmt_num(curve.p0.x),
            fmt_num(curve.p0.y),
            fmt_num(curve.p1.x),
            fmt_num(curve.p1.y),
            fmt_num(curve.p2.x),
            fmt_num(curve.p2.y),
            stroke_attrs(stroke)
        );
    }

    fn polygon(&mut self, points: &[Vec2], fill: &Fill) {
        let _ = write!(
            self.out,
            r#"<polygon points="{}" fill="{}" fill-opacity="{}" stroke="none"/>"#,
            points_attr(points),
            escape_html(&fill.color),
            fmt_num(fill.opacity)
        );
    }

    fn circle(&mut self, center: Vec2, radius: f64, fill: &str, stroke: &Stroke) {
        let _ = write!(
            self.out,
            r#"<circle cx="{}" cy="{}" r="{}" fill="{}" {}/>"#,
            fmt_num(center.x),
            fmt_num(center.y),
            fmt_num(radius),
            escape_html(fill),
            stroke_attrs(stroke)
        );
    }

    fn label(&mut self, label: &Label) {
        if let LabelBody::Plain(text) = &label.body {
            let anchor = match label.anchor {
                TextAnchor::Start => "start",
                TextAnchor::Middle => "middle",
                TextAnchor::End => "end",
            };
            let _ = write!(
                self.out,
                r#"<text x="{}" y="{}" font-size="{}" fill="{}" text-anchor="{}">{}</text>"#,
                fmt_num(label.at.x),
                fmt_num(label.at.y),
                fmt_num(label.size),
                escape_html(&label.color),
                anchor,
                escape_html(text)
            );
            return;
        }
        // html labels get a box wide enough for a short formula, aligned like text
        let (w, h) = (label.size * 16.0, label.size * 2.4);
        let (x, align) = match label.anchor {
            TextAnchor::Start => (label.at.x, "left"),
            TextAnchor::Middle => (label.at.x - w / 2.0, "center"),
            TextAnchor::End => (label.at.x - w, "right"),
        };
        let y = label.at.y - h / 2.0;
        let html = self.label_html(&label.body);
        let _ = write!(
            self.out,
            r#"<foreignObject x="{}" y="{}" width="{}" height="{}"><div xmlns="http://www.w3.org/1999/xhtml" style="font-size:{}px;color:{};line-height:1.2;white-space:nowrap;text-align:{}">{}</div></foreignObject>"#,
            fmt_num(x),
            fmt_num(y),
            fmt_num(w),
            fmt_num(h),
            fmt_num(label.size),
            escape_html(&label.color),
            align,
            html
        );
    }

    fn finish(mut self) -> String {
        self.out.push_str("</svg>");
        self.out
    }
}

/// `depth` is the content nesting level that rich labels render at.
pub fn scene_to_svg(scene: &Scene, math: &dyn MathRenderer, depth: usize) -> String {
    scene.draw(SvgSurface::new(math, depth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::html::DelimitedMath;
    use crate::graph::layout_graph;
    use crate::model::GraphSegment;
    use serde_json::json;

    fn svg(v: serde_json::Value) -> String {
        let g: GraphSegment = serde_json::from_value(v).unwrap();
        scene_to_svg(&layout_graph(&g, 1.0), &DelimitedMath, 1)
    }

    #[test]
    fn numbers_are_compact() {
        assert_eq!(fmt_num(410.0), "410");
        assert_eq!(fmt_num(1.25), "1.25");
        assert_eq!(fmt_num(-0.0001), "0");
        assert_eq!(fmt_num(2.0 / 3.0), "0.667");
        assert_eq!(fmt_num(f64::NAN), "0");
    }

    #[test]
    fn frame_and_background() {
        let out = svg(json!({"width": 100, "height": 50, "background": "#eee", "axes": {"xMin": 1, "xMax": 2, "yMin": 1, "yMax": 2, "showGrid": false}}));
        assert_eq!(
            out,
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50" viewBox="0 0 100 50"><rect width="100" height="50" fill="#eee"/></svg>"##
        );
    }

    #[test]
    fn dashed_segment() {
        let out = svg(json!({"width": 100, "height": 100,
            "axes": {"xMin": 0, "xMax": 10, "yMin": 0, "yMax": 10, "showGrid": false},
            "lines": [{"id": "l", "style": "dashed", "width": 1,
                "start": {"type": "coord", "x": 1, "y": 1}, "end": {"type": "coord", "x": 9, "y": 1}}]}));
        assert!(out.contains(r##"<line x1="10" y1="90" x2="90" y2="90" stroke="#111827" stroke-width="1" stroke-dasharray="3 2"/>"##));
    }

    #[test]
    fn math_label_is_foreign_object() {
        let out = svg(json!({"points": [{"id": "p", "x": 0, "y": 0, "label": "\\alpha", "labelIsMath": true}]}));
        assert!(out.contains("<foreignObject"));
        assert!(out.contains(r#"<span class="math math-inline">$\alpha$</span>"#));
    }

    #[test]
    fn plain_label_is_text() {
        let out = svg(json!({"points": [{"id": "p", "x": 0, "y": 0, "label": "A<B"}]}));
        assert!(out.contains(r#"text-anchor="start">A&lt;B</text>"#));
    }

    #[test]
    fn area_polygon() {
        let out = svg(json!({"areas": [{"id": "a", "mode": "polygon", "opacity": 0.5, "fill": "red", "points": [
            {"type": "coord", "x": 0, "y": 0}, {"type": "coord", "x": 1, "y": 0}, {"type": "coord", "x": 0, "y": 1}]}]}));
        assert!(out.contains(r#"fill="red" fill-opacity="0.5" stroke="none"/>"#));
    }
}
