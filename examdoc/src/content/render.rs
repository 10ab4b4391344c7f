//! Segment sequence -> renderable tree.
//!
//! The tree is plain data (`PartialEq`), so rendering the same content twice
//! yields equal trees. Materialization is `html::to_html` or the browser
//! binding.

use super::math::{prepare_math, PreparedMath};
use super::table::TableLayout;
use crate::geometry::limits::MAX_CONTENT_DEPTH;
use crate::graph::{layout_graph, resolve_scale, Scene};
use crate::model::{ContentSegment, GraphSegment, TableSegment};
use crate::options::RenderOptions;

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// Literal run, whitespace significant.
    Text(String),
    Math(MathNode),
    Table(TableNode),
    Graph(GraphNode),
}

#[derive(Clone, Debug, PartialEq)]
pub struct MathNode {
    pub math: PreparedMath,
    /// Inline size relative to body text; display math ignores it.
    pub scale: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableNode {
    pub id: String,
    pub layout: TableLayout,
    /// rows -> cells -> rendered cell content
    pub rows: Vec<Vec<Vec<Node>>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub scene: Scene,
    /// Nesting level of the graph itself; rich labels render one deeper.
    pub depth: usize,
}

/// Drop whitespace-only text runs at either edge of the sequence when they
/// sit against a table or graph.
pub fn trim_block_edges(segments: &[ContentSegment]) -> &[ContentSegment] {
    let lead = segments.iter().take_while(|s| s.is_blank_text()).count();
    let start = match segments.get(lead) {
        Some(s) if lead > 0 && s.is_block() => lead,
        _ => 0,
    };
    let rest = &segments[start..];
    let trail = rest.iter().rev().take_while(|s| s.is_blank_text()).count();
    let end = match rest.len().checked_sub(trail + 1).and_then(|i| rest.get(i)) {
        Some(s) if trail > 0 && s.is_block() => rest.len() - trail,
        _ => rest.len(),
    };
    &rest[..end]
}

pub fn render_segments(segments: &[ContentSegment], options: &RenderOptions) -> Vec<Node> {
    render_segments_at(segments, options, 0)
}

/// Render at nesting `depth`; at [`MAX_CONTENT_DEPTH`] nothing further renders.
pub fn render_segments_at(segments: &[ContentSegment], options: &RenderOptions, depth: usize) -> Vec<Node> {
    if depth >= MAX_CONTENT_DEPTH {
        tracing::debug!(depth, "content nesting limit reached");
        return Vec::new();
    }
    trim_block_edges(segments)
        .iter()
        .map(|seg| match seg {
            ContentSegment::Text { text, .. } => Node::Text(text.clone()),
            ContentSegment::Math { latex, .. } => Node::Math(MathNode {
                math: prepare_math(latex),
                scale: options.math_scale(),
            }),
            ContentSegment::Table(table) => Node::Table(render_table(table, options, depth)),
            ContentSegment::Graph(graph) => Node::Graph(render_graph(graph, options, depth)),
        })
        .collect()
}

fn render_table(table: &TableSegment, options: &RenderOptions, depth: usize) -> TableNode {
    TableNode {
        id: table.id.clone(),
        layout: TableLayout::compute(table, options.max_sheet_width),
        rows: table
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| render_segments_at(cell, options, depth + 1))
                    .collect()
            })
            .collect(),
    }
}

pub fn render_graph(graph: &GraphSegment, options: &RenderOptions, depth: usize) -> GraphNode {
    let scale = resolve_scale(options.scale, options.fit_width, graph.width);
    GraphNode {
        id: graph.id.clone(),
        scene: layout_graph(graph, scale),
        depth,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn segs(v: serde_json::Value) -> Vec<ContentSegment> {
        serde_json::from_value(v).expect("segment fixture")
    }

    #[test]
    fn blank_runs_trimmed_next_to_blocks_only() {
        let s = segs(json!([
            {"type": "text", "text": "\n"},
            {"type": "graph"},
            {"type": "text", "text": "  "},
            {"type": "text", "text": " \n"}
        ]));
        let t = trim_block_edges(&s);
        assert_eq!(t.len(), 1);
        assert!(matches!(t[0], ContentSegment::Graph(_)));

        let s = segs(json!([
            {"type": "text", "text": "  "},
            {"type": "math", "latex": "x"},
            {"type": "text", "text": "\n"}
        ]));
        assert_eq!(trim_block_edges(&s).len(), 3);
    }

    #[test]
    fn interior_whitespace_kept() {
        let s = segs(json!([
            {"type": "table", "rows": []},
            {"type": "text", "text": "\n\n"},
            {"type": "table", "rows": []}
        ]));
        assert_eq!(trim_block_edges(&s).len(), 3);
    }

    #[test]
    fn text_kept_verbatim_and_math_prepared() {
        let s = segs(json!([
            {"type": "text", "text": "a  b\n c"},
            {"type": "math", "latex": "\\sum_{i=0}^n i"}
        ]));
        let nodes = render_segments(&s, &RenderOptions::default());
        assert_eq!(nodes[0], Node::Text("a  b\n c".into()));
        match &nodes[1] {
            Node::Math(m) => assert!(m.math.display),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn cells_recurse() {
        let s = segs(json!([{"type": "table", "colWidths": [1000, 1000], "rows": [[
            [{"type": "text", "text": "a"}],
            [{"type": "math", "latex": "b"}]
        ]]}]));
        let nodes = render_segments(&s, &RenderOptions::default());
        let Node::Table(t) = &nodes[0] else { panic!("table expected") };
        assert_eq!(t.layout.col_widths, vec![Some(410.0), Some(410.0)]);
        assert_eq!(t.rows[0][0], vec![Node::Text("a".into())]);
        assert!(matches!(t.rows[0][1][0], Node::Math(_)));
    }

    #[test]
    fn nesting_is_bounded() {
        let mut v = json!([{"type": "text", "text": "deep"}]);
        for _ in 0..(MAX_CONTENT_DEPTH + 2) {
            v = json!([{"type": "table", "rows": [[v]]}]);
        }
        let nodes = render_segments(&segs(v), &RenderOptions::default());
        let mut depth = 0;
        let mut cur = nodes;
        while let Some(Node::Table(t)) = cur.first() {
            depth += 1;
            cur = t.rows[0][0].clone();
        }
        assert_eq!(depth, MAX_CONTENT_DEPTH);
        assert!(cur.is_empty());
    }

    #[test]
    fn graph_fits_width() {
        let s = segs(json!([{"type": "graph", "width": 400, "height": 300}]));
        let opts = RenderOptions { fit_width: Some(200.0), ..RenderOptions::default() };
        let nodes = render_segments(&s, &opts);
        let Node::Graph(g) = &nodes[0] else { panic!("graph expected") };
        assert_eq!(g.scene.scale, 0.5);
        assert_eq!(g.scene.width, 200.0);
        assert_eq!(g.scene.height, 150.0);
    }

    #[test]
    fn rendering_is_idempotent() {
        let s = segs(json!([
            {"type": "text", "text": "Plot "},
            {"type": "graph", "functions": [{"id": "f", "expression": "x^2"}]},
            {"type": "math", "latex": "\\placeholder"}
        ]));
        let opts = RenderOptions::default();
        assert_eq!(render_segments(&s, &opts), render_segments(&s, &opts));
    }
}
