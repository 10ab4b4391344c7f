use examdoc::content::{
    layout_table_widths, parse_content, prepare_math, render_segments, to_html, DelimitedMath, Node,
};
use examdoc::options::RenderOptions;
use examdoc::{has_content, render_content_html, segments_to_plain_text, ContentSegment};
use serde_json::json;

#[test]
fn wide_table_shrinks_to_sheet() {
    let widths = layout_table_widths(&[Some(1000.0), Some(1000.0)], 820.0);
    assert_eq!(widths, vec![Some(410.0), Some(410.0)]);
}

#[test]
fn sum_switches_to_display_math() {
    let m = prepare_math(r"\sum_{i=0}^n i");
    assert!(m.display);
    assert_eq!(m.delimited(), r"$$\displaystyle \sum\limits_{i=0}^n i$$");
    let inline = prepare_math(r"\frac{a}{b}");
    assert!(!inline.display);
    assert_eq!(inline.delimited(), r"$\frac{a}{b}$");
}

#[test]
fn question_json_renders_mixed_content() {
    let html = render_content_html(
        json!({"segments": [
            {"type": "text", "id": "t1", "text": "Evaluate "},
            {"type": "math", "id": "m1", "latex": "\\lim_{x \\to 0} f(x)"},
            {"type": "text", "id": "t2", "text": " and compare."}
        ]}),
        &RenderOptions::default(),
    );
    assert!(html.starts_with(r#"<span class="content-text mathjax_ignore" style="white-space:pre-wrap">Evaluate </span>"#));
    assert!(html.contains(r#"<div class="math math-display">$$\displaystyle \lim\limits_{x \to 0} f(x)$$</div>"#));
    assert!(html.ends_with(r#" and compare.</span>"#));
}

#[test]
fn serialized_segments_and_legacy_html_both_parse() {
    let from_json = parse_content(r#"[{"type":"text","id":"a","text":"Hi"},{"type":"math","id":"b","latex":"x"}]"#);
    assert_eq!(from_json.len(), 2);
    assert_eq!(from_json[1], ContentSegment::math("b", "x"));

    let legacy = parse_content("<p>Area is $r^2$</p><p>second</p>");
    assert_eq!(segments_to_plain_text(&legacy), "Area is \nsecond");
    assert!(legacy.iter().any(|s| matches!(s, ContentSegment::Math { latex, .. } if latex == "r^2")));
}

#[test]
fn malformed_json_falls_back_to_text() {
    let segs = parse_content("[not json");
    assert_eq!(segments_to_plain_text(&segs), "[not json");
    assert!(has_content(&segs));
    assert!(parse_content("").is_empty());
    assert!(!has_content(&parse_content(json!(null))));
}

#[test]
fn table_cells_render_nested_content() {
    let segs = parse_content(json!([{
        "type": "table", "id": "t",
        "rows": [
            [[{"type": "text", "text": "x"}], [{"type": "math", "latex": "x^2"}]],
            [[{"type": "text", "text": "2"}]]
        ]
    }]));
    let nodes = render_segments(&segs, &RenderOptions::default());
    let Some(Node::Table(table)) = nodes.first() else {
        panic!("expected a table, got {nodes:?}");
    };
    assert_eq!(table.layout.col_widths.len(), 2);
    assert!(matches!(table.rows[0][1].first(), Some(Node::Math(_))));
    let html = to_html(&nodes, &DelimitedMath);
    assert_eq!(html.matches("<tr").count(), 2);
    assert!(html.contains("$x^2$"));
}

#[test]
fn partial_graph_in_table_cell_still_renders() {
    let html = render_content_html(
        json!([
            {"type": "text", "text": "See the table."},
            {"type": "table", "rows": [[[{"type": "graph", "axes": {"showGrid": false}}]]]}
        ]),
        &RenderOptions::default(),
    );
    assert_eq!(html.matches("<td").count(), 1, "{html}");
    assert_eq!(html.matches("<svg").count(), 1, "{html}");
}

#[test]
fn rendering_twice_is_identical() {
    let segs = parse_content(json!([
        {"type": "text", "text": "Plot "},
        {"type": "graph", "id": "g", "functions": [{"id": "f", "expression": "x^{2}"}]},
        {"type": "text", "text": "\n"}
    ]));
    let opts = RenderOptions { fit_width: Some(180.0), ..RenderOptions::default() };
    let a = render_segments(&segs, &opts);
    let b = render_segments(&segs, &opts);
    assert_eq!(a, b);
    assert_eq!(to_html(&a, &DelimitedMath), to_html(&b, &DelimitedMath));
    // trailing blank run after a graph is dropped
    assert_eq!(a.len(), 2);
}

#[test]
fn math_scale_sizes_inline_formulas() {
    let opts = RenderOptions::from_json(r#"{"mathScale": 0.8}"#);
    let html = render_content_html(vec![ContentSegment::math("m", "y")], &opts);
    assert_eq!(html, r#"<span class="math math-inline" style="font-size:0.8em">$y$</span>"#);
}
