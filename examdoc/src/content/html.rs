//! Synchronous HTML string path, for print and PDF export where no live
//! typesetting engine runs.

use super::math::PreparedMath;
use super::render::{GraphNode, MathNode, Node, TableNode};
use crate::svg::{fmt_num, scene_to_svg};
use std::fmt::Write;

/// Renders one prepared formula to HTML.
pub trait MathRenderer {
    fn render(&self, math: &PreparedMath, scale: f64) -> String;
}

/// Emits the delimited LaTeX source in marked spans, left for a page-level
/// typesetting pass (or shown as source when none runs).
#[derive(Clone, Copy, Debug, Default)]
pub struct DelimitedMath;

impl MathRenderer for DelimitedMath {
    fn render(&self, math: &PreparedMath, scale: f64) -> String {
        let src = escape_html(&math.delimited());
        if math.display {
            format!(r#"<div class="math math-display">{}</div>"#, src)
        } else if (scale - 1.0).abs() > 1e-9 {
            format!(r#"<span class="math math-inline" style="font-size:{}em">{}</span>"#, fmt_num(scale), src)
        } else {
            format!(r#"<span class="math math-inline">{}</span>"#, src)
        }
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const CELL_STYLE: &str = "border:1px solid #d1d5db;padding:4px 6px;vertical-align:top";

pub fn to_html(nodes: &[Node], math: &dyn MathRenderer) -> String {
    let mut out = String::new();
    write_nodes(&mut out, nodes, math);
    out
}

fn write_nodes(out: &mut String, nodes: &[Node], math: &dyn MathRenderer) {
    for node in nodes {
        match node {
            Node::Text(text) => {
                // ignored by the typesetter so literal dollars stay text
                let _ = write!(
                    out,
                    r#"<span class="content-text mathjax_ignore" style="white-space:pre-wrap">{}</span>"#,
                    escape_html(text)
                );
            }
            Node::Math(MathNode { math: m, scale }) => out.push_str(&math.render(m, *scale)),
            Node::Table(table) => write_table(out, table, math),
            Node::Graph(graph) => write_graph(out, graph, math),
        }
    }
}

fn write_table(out: &mut String, table: &TableNode, math: &dyn MathRenderer) {
    let _ = write!(
        out,
        r#"<table class="content-table" data-id="{}" style="border-collapse:collapse;max-width:100%">"#,
        escape_html(&table.id)
    );
    if table.layout.col_widths.iter().any(Option::is_some) {
        out.push_str("<colgroup>");
        for w in &table.layout.col_widths {
            match w {
                Some(w) => {
                    let _ = write!(out, r#"<col style="width:{}px">"#, fmt_num(*w));
                }
                None => out.push_str("<col>"),
            }
        }
        out.push_str("</colgroup>");
    }
    out.push_str("<tbody>");
    for (r, row) in table.rows.iter().enumerate() {
        match table.layout.row_heights.get(r).copied().flatten() {
            Some(h) => {
                let _ = write!(out, r#"<tr style="height:{}px">"#, fmt_num(h));
            }
            None => out.push_str("<tr>"),
        }
        for cell in row {
            let _ = write!(out, r#"<td style="{}">"#, CELL_STYLE);
            write_nodes(out, cell, math);
            out.push_str("</td>");
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
}

fn write_graph(out: &mut String, graph: &GraphNode, math: &dyn MathRenderer) {
    let scene = &graph.scene;
    let _ = write!(
        out,
        r#"<div class="content-graph" data-id="{}" style="width:{}px;height:{}px;border:1px solid #d1d5db;border-radius:8px;background:{};overflow:hidden;margin:8px 0">"#,
        escape_html(&graph.id),
        fmt_num(scene.width),
        fmt_num(scene.height),
        escape_html(&scene.background),
    );
    out.push_str(&scene_to_svg(scene, math, graph.depth + 1));
    out.push_str("</div>");
}
