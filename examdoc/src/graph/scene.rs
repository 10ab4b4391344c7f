//! Pixel-space drawing instructions produced by graph layout.
//!
//! A [`Scene`] is plain data; a [`Surface`] materializes it (SVG string,
//! DOM, test recorder). Layout never touches a surface directly.

use crate::geometry::quad::QuadBezier;
use crate::model::{ContentSegment, LineDash, Vec2};

#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    pub color: String,
    pub width: f64,
    pub dash: LineDash,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Fill {
    pub color: String,
    pub opacity: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LabelBody {
    Plain(String),
    /// LaTeX source, typeset as inline math
    Math(String),
    /// Rich content rendered through the content renderer
    Rich(Vec<ContentSegment>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub at: Vec2,
    pub body: LabelBody,
    pub size: f64,
    pub color: String,
    pub anchor: TextAnchor,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Item {
    Line { from: Vec2, to: Vec2, stroke: Stroke },
    Polyline { points: Vec<Vec2>, stroke: Stroke },
    Quad { curve: QuadBezier, stroke: Stroke },
    Polygon { points: Vec<Vec2>, fill: Fill },
    Circle { center: Vec2, radius: f64, fill: String, stroke: Stroke },
    Label(Label),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub id: String,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
    pub background: String,
    /// Back to front.
    pub items: Vec<Item>,
}

/// A drawing target for scenes.
pub trait Surface {
    type Output;

    fn begin(&mut self, scene: &Scene);
    fn line(&mut self, from: Vec2, to: Vec2, stroke: &Stroke);
    fn polyline(&mut self, points: &[Vec2], stroke: &Stroke);
    fn quad(&mut self, curve: &QuadBezier, stroke: &Stroke);
    fn polygon(&mut self, points: &[Vec2], fill: &Fill);
    fn circle(&mut self, center: Vec2, radius: f64, fill: &str, stroke: &Stroke);
    fn label(&mut self, label: &Label);
    fn finish(self) -> Self::Output;
}

impl Scene {
    pub fn draw<S: Surface>(&self, mut surface: S) -> S::Output {
        surface.begin(self);
        for item in &self.items {
            match item {
                Item::Line { from, to, stroke } => surface.line(*from, *to, stroke),
                Item::Polyline { points, stroke } => surface.polyline(points, stroke),
                Item::Quad { curve, stroke } => surface.quad(curve, stroke),
                Item::Polygon { points, fill } => surface.polygon(points, fill),
                Item::Circle { center, radius, fill, stroke } => {
                    surface.circle(*center, *radius, fill, stroke)
                }
                Item::Label(label) => surface.label(label),
            }
        }
        surface.finish()
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.items.iter().filter_map(|i| match i {
            Item::Label(l) => Some(l),
            _ => None,
        })
    }
}
