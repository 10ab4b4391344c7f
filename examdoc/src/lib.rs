pub mod model;
pub mod options;
pub mod expr;
pub mod content;
pub mod typeset;
pub mod geometry {
    pub mod intersect;
    pub mod limits;
    pub mod quad;
    pub mod tolerance;
}
pub mod graph {
    pub mod area;
    pub mod clip;
    pub mod layout;
    pub mod resolve;
    pub mod sample;
    pub mod scene;
    pub mod viewport;

    pub use layout::layout_graph;
    pub use resolve::Resolver;
    pub use sample::{effective_domain, sample_function};
    pub use scene::{Fill, Item, Label, LabelBody, Scene, Stroke, Surface, TextAnchor};
    pub use viewport::{resolve_scale, Viewport};
}
pub mod svg;

use content::{parse_content, render_segments, to_html, ContentInput, DelimitedMath};
use model::GraphSegment;
use options::RenderOptions;

pub use content::{has_content, segments_to_plain_text};
pub use model::ContentSegment;

/// Content in any accepted shape -> HTML string, math left delimited for a
/// page-level typesetting pass.
pub fn render_content_html(input: impl Into<ContentInput>, options: &RenderOptions) -> String {
    let segments = parse_content(input);
    let nodes = render_segments(&segments, options);
    tracing::debug!(segments = segments.len(), nodes = nodes.len(), "content rendered");
    to_html(&nodes, &DelimitedMath)
}

/// One graph -> standalone SVG string.
pub fn render_graph_svg(graph: &GraphSegment, options: &RenderOptions) -> String {
    let node = content::render::render_graph(graph, options, 0);
    svg::scene_to_svg(&node.scene, &DelimitedMath, node.depth + 1)
}
