//! Rich content: parsing, math preprocessing, table layout and rendering.

pub mod html;
pub mod legacy;
pub mod math;
pub mod parse;
pub mod render;
pub mod table;

pub use html::{to_html, DelimitedMath, MathRenderer};
pub use legacy::{HtmlLegacyConverter, LegacyConverter};
pub use math::{prepare_math, PreparedMath};
pub use parse::{parse_content, parse_content_with, ContentInput};
pub use render::{render_segments, trim_block_edges, Node};
pub use table::{layout_table_widths, TableLayout, MAX_SHEET_WIDTH};

use crate::model::ContentSegment;

/// Literal text of the top-level `text` segments, concatenated. Math,
/// tables and graphs contribute nothing.
pub fn segments_to_plain_text(segments: &[ContentSegment]) -> String {
    segments
        .iter()
        .filter_map(|s| match s {
            ContentSegment::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

/// Whether a question or section has any written text.
pub fn has_content(segments: &[ContentSegment]) -> bool {
    !segments_to_plain_text(segments).trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_ignores_non_text() {
        let segs = vec![
            ContentSegment::text("a", "Solve "),
            ContentSegment::math("b", "x^2"),
            ContentSegment::text("c", " now"),
        ];
        assert_eq!(segments_to_plain_text(&segs), "Solve  now");
        assert!(has_content(&segs));
    }

    #[test]
    fn math_only_has_no_content() {
        let segs = vec![ContentSegment::math("b", "x^2"), ContentSegment::text("c", "  \n")];
        assert!(!has_content(&segs));
        assert!(!has_content(&[]));
    }
}
