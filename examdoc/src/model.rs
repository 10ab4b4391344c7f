use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn into_array(v: Value) -> Vec<Value> {
    match v {
        Value::Array(items) => items,
        _ => Vec::new(),
    }
}

fn keep_valid<T: DeserializeOwned>(items: Vec<Value>, what: &'static str) -> Vec<T> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(v) => Some(v),
            Err(err) => {
                tracing::debug!(what, index, error = %err, "malformed element dropped");
                None
            }
        })
        .collect()
}

/// A list read one element at a time: a malformed element is dropped, the
/// rest of the parent survives. Anything but an array reads as empty.
fn lenient_vec<'de, D, T>(de: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(keep_valid(into_array(Value::deserialize(de)?), "graph element"))
}

/// Table rows with the same per-segment leniency inside every cell.
fn lenient_rows<'de, D>(de: D) -> Result<Vec<Vec<Vec<ContentSegment>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows = into_array(Value::deserialize(de)?);
    Ok(rows
        .into_iter()
        .map(|row| {
            into_array(row)
                .into_iter()
                .map(|cell| keep_valid(into_array(cell), "table cell segment"))
                .collect()
        })
        .collect())
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One atomic unit of rich content. A sequence of segments renders in order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentSegment {
    Text {
        #[serde(default)]
        id: String,
        #[serde(default)]
        text: String,
    },
    Math {
        #[serde(default)]
        id: String,
        #[serde(default)]
        latex: String,
    },
    Table(TableSegment),
    Graph(GraphSegment),
}

impl ContentSegment {
    pub fn id(&self) -> &str {
        match self {
            ContentSegment::Text { id, .. } | ContentSegment::Math { id, .. } => id,
            ContentSegment::Table(t) => &t.id,
            ContentSegment::Graph(g) => &g.id,
        }
    }

    pub fn text(id: impl Into<String>, text: impl Into<String>) -> Self {
        ContentSegment::Text { id: id.into(), text: text.into() }
    }

    pub fn math(id: impl Into<String>, latex: impl Into<String>) -> Self {
        ContentSegment::Math { id: id.into(), latex: latex.into() }
    }

    /// Tables and graphs break the text flow.
    pub fn is_block(&self) -> bool {
        matches!(self, ContentSegment::Table(_) | ContentSegment::Graph(_))
    }

    pub fn is_blank_text(&self) -> bool {
        matches!(self, ContentSegment::Text { text, .. } if text.trim().is_empty())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSegment {
    #[serde(default)]
    pub id: String,
    /// rows -> cells -> segments of the cell
    #[serde(default, deserialize_with = "lenient_rows")]
    pub rows: Vec<Vec<Vec<ContentSegment>>>,
    #[serde(default)]
    pub col_widths: Option<Vec<f64>>,
    #[serde(default)]
    pub row_heights: Option<Vec<f64>>,
}

fn default_graph_width() -> f64 {
    360.0
}
fn default_graph_height() -> f64 {
    280.0
}
fn default_background() -> String {
    "#ffffff".to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSegment {
    #[serde(default)]
    pub id: String,
    #[serde(default = "default_graph_width")]
    pub width: f64,
    #[serde(default = "default_graph_height")]
    pub height: f64,
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default)]
    pub axes: GraphAxes,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub points: Vec<GraphPoint>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub lines: Vec<GraphLine>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub curves: Vec<GraphCurve>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub functions: Vec<GraphFunction>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub areas: Vec<GraphArea>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub texts: Vec<GraphText>,
}

impl Default for GraphSegment {
    fn default() -> Self {
        Self {
            id: String::new(),
            width: default_graph_width(),
            height: default_graph_height(),
            background: default_background(),
            axes: GraphAxes::default(),
            points: Vec::new(),
            lines: Vec::new(),
            curves: Vec::new(),
            functions: Vec::new(),
            areas: Vec::new(),
            texts: Vec::new(),
        }
    }
}

impl GraphSegment {
    pub fn point(&self, id: &str) -> Option<&GraphPoint> {
        self.points.iter().find(|p| p.id == id)
    }
    pub fn line(&self, id: &str) -> Option<&GraphLine> {
        self.lines.iter().find(|l| l.id == id)
    }
    pub fn curve(&self, id: &str) -> Option<&GraphCurve> {
        self.curves.iter().find(|c| c.id == id)
    }
    pub fn function(&self, id: &str) -> Option<&GraphFunction> {
        self.functions.iter().find(|f| f.id == id)
    }
}

fn default_true() -> bool {
    true
}

/// Missing bounds fall back to the default `[-5, 5]` square.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphAxes {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    #[serde(default = "default_true")]
    pub show_grid: bool,
    #[serde(default)]
    pub x_step: Option<f64>,
    #[serde(default)]
    pub y_step: Option<f64>,
    #[serde(default)]
    pub grid_step: Option<f64>,
    #[serde(default)]
    pub x_label: Option<String>,
    #[serde(default)]
    pub y_label: Option<String>,
    #[serde(default)]
    pub x_label_segments: Option<Vec<ContentSegment>>,
    #[serde(default)]
    pub y_label_segments: Option<Vec<ContentSegment>>,
    #[serde(default)]
    pub x_label_is_math: Option<bool>,
    #[serde(default)]
    pub y_label_is_math: Option<bool>,
}

impl Default for GraphAxes {
    fn default() -> Self {
        Self {
            x_min: -5.0,
            x_max: 5.0,
            y_min: -5.0,
            y_max: 5.0,
            show_grid: true,
            x_step: None,
            y_step: None,
            grid_step: None,
            x_label: None,
            y_label: None,
            x_label_segments: None,
            y_label_segments: None,
            x_label_is_math: None,
            y_label_is_math: None,
        }
    }
}

impl GraphAxes {
    /// Width of the x range; degenerate ranges count as 1.
    pub fn x_range(&self) -> f64 {
        non_degenerate(self.x_max - self.x_min)
    }
    pub fn y_range(&self) -> f64 {
        non_degenerate(self.y_max - self.y_min)
    }
    pub fn x_step(&self) -> f64 {
        positive_step(self.x_step.or(self.grid_step))
    }
    pub fn y_step(&self) -> f64 {
        positive_step(self.y_step.or(self.grid_step))
    }
}

fn non_degenerate(range: f64) -> f64 {
    if range.is_finite() && range > 0.0 {
        range
    } else {
        1.0
    }
}

fn positive_step(step: Option<f64>) -> f64 {
    match step {
        Some(s) if s.is_finite() && s > 0.0 => s,
        _ => 1.0,
    }
}

fn default_t() -> f64 {
    0.5
}

/// Positional dependency of a graph primitive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GraphAnchor {
    Coord {
        x: f64,
        y: f64,
    },
    #[serde(rename_all = "camelCase")]
    Point {
        #[serde(alias = "id")]
        point_id: String,
    },
    #[serde(rename_all = "camelCase")]
    Line {
        #[serde(alias = "id")]
        line_id: String,
        #[serde(default = "default_t")]
        t: f64,
    },
    #[serde(rename_all = "camelCase")]
    Curve {
        #[serde(alias = "id")]
        curve_id: String,
        #[serde(default = "default_t")]
        t: f64,
    },
    #[serde(rename_all = "camelCase")]
    Function {
        #[serde(alias = "id")]
        function_id: String,
        #[serde(default)]
        x: Option<f64>,
    },
}

/// Label fields shared by every labelled primitive.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSpec {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub label_segments: Option<Vec<ContentSegment>>,
    #[serde(default)]
    pub label_is_math: Option<bool>,
    #[serde(default)]
    pub label_pos: Option<Vec2>,
    #[serde(default)]
    pub label_size: Option<f64>,
    #[serde(default)]
    pub show_label: Option<bool>,
}

impl LabelSpec {
    pub fn has_segments(&self) -> bool {
        self.label_segments.as_ref().map_or(false, |s| !s.is_empty())
    }
    pub fn has_text(&self) -> bool {
        self.label.as_ref().map_or(false, |s| !s.trim().is_empty())
    }
    /// A label is shown when it has content and was not switched off.
    pub fn is_visible(&self) -> bool {
        self.show_label.unwrap_or(true) && (self.has_segments() || self.has_text())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineDash {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphPoint {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub anchor: Option<GraphAnchor>,
    #[serde(flatten)]
    pub label: LabelSpec,
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub filled: Option<bool>,
}

impl GraphPoint {
    pub fn literal(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    #[default]
    Segment,
    Ray,
    Line,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphLine {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub kind: LineKind,
    pub start: GraphAnchor,
    pub end: GraphAnchor,
    #[serde(default)]
    pub style: Option<LineDash>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(flatten)]
    pub label: LabelSpec,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphCurve {
    #[serde(default)]
    pub id: String,
    pub start: GraphAnchor,
    pub end: GraphAnchor,
    #[serde(default)]
    pub curvature: f64,
    #[serde(default)]
    pub style: Option<LineDash>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(flatten)]
    pub label: LabelSpec,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub min: f64,
    pub max: f64,
}

impl Domain {
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.max > self.min
    }
    pub fn mid(&self) -> f64 {
        (self.min + self.max) * 0.5
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphFunction {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub expression: String,
    #[serde(default)]
    pub domain: Option<Domain>,
    #[serde(default)]
    pub style: Option<LineDash>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(flatten)]
    pub label: LabelSpec,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AreaMode {
    #[default]
    Polygon,
    UnderFunction,
    BetweenFunctions,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphArea {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub mode: AreaMode,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub points: Vec<GraphAnchor>,
    #[serde(default)]
    pub function_id: Option<String>,
    #[serde(default)]
    pub function_id2: Option<String>,
    #[serde(default)]
    pub domain: Option<Domain>,
    #[serde(default)]
    pub fill: Option<String>,
    #[serde(default)]
    pub opacity: Option<f64>,
    #[serde(flatten)]
    pub label: LabelSpec,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphText {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub text_segments: Option<Vec<ContentSegment>>,
    #[serde(default)]
    pub is_math: Option<bool>,
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub color: Option<String>,
}
