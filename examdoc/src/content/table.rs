use crate::model::TableSegment;

/// Widest a table may get on an exam sheet.
pub const MAX_SHEET_WIDTH: f64 = 820.0;
/// Smallest column width / row height after scaling.
pub const MIN_CELL_PX: f64 = 24.0;

/// Column widths and row heights of one table, in pixels. `None` means the
/// size is left to the browser.
#[derive(Clone, Debug, PartialEq)]
pub struct TableLayout {
    pub col_widths: Vec<Option<f64>>,
    pub row_heights: Vec<Option<f64>>,
}

fn authored(size: Option<f64>) -> Option<f64> {
    size.filter(|s| s.is_finite() && *s > 0.0)
}

/// Rescale authored widths so their sum fits in `max_width`, then floor every
/// width at [`MIN_CELL_PX`]. Widths already fitting are only floored.
pub fn layout_table_widths(widths: &[Option<f64>], max_width: f64) -> Vec<Option<f64>> {
    let total: f64 = widths.iter().filter_map(|w| authored(*w)).sum();
    let shrink = max_width.is_finite() && max_width > 0.0 && total > max_width;
    widths
        .iter()
        .map(|w| {
            authored(*w).map(|w| {
                let w = if shrink { w * max_width / total } else { w };
                w.max(MIN_CELL_PX)
            })
        })
        .collect()
}

impl TableLayout {
    pub fn compute(table: &TableSegment, max_width: f64) -> Self {
        let cols = table.rows.iter().map(Vec::len).max().unwrap_or(0);
        let authored_cols: Vec<Option<f64>> = (0..cols)
            .map(|i| table.col_widths.as_ref().and_then(|w| w.get(i).copied()))
            .collect();
        let row_heights = (0..table.rows.len())
            .map(|i| {
                let h = table.row_heights.as_ref().and_then(|h| h.get(i).copied());
                authored(h).map(|h| h.max(MIN_CELL_PX))
            })
            .collect();
        Self {
            col_widths: layout_table_widths(&authored_cols, max_width),
            row_heights,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversize_table_is_rescaled() {
        let w = layout_table_widths(&[Some(1000.0), Some(1000.0)], MAX_SHEET_WIDTH);
        assert_eq!(w, vec![Some(410.0), Some(410.0)]);
    }

    #[test]
    fn narrow_columns_keep_floor() {
        let w = layout_table_widths(&[Some(2000.0), Some(10.0)], MAX_SHEET_WIDTH);
        assert!(w[1].unwrap() >= MIN_CELL_PX);
        assert!((w[0].unwrap() - 2000.0 * 820.0 / 2010.0).abs() < 1e-9);
    }

    #[test]
    fn fitting_table_untouched_and_missing_stay_auto() {
        let w = layout_table_widths(&[Some(100.0), None, Some(f64::NAN), Some(5.0)], MAX_SHEET_WIDTH);
        assert_eq!(w, vec![Some(100.0), None, None, Some(MIN_CELL_PX)]);
    }

    #[test]
    fn compute_uses_widest_row() {
        let table: TableSegment = serde_json::from_value(serde_json::json!({
            "rows": [[[], []], [[], [], []]],
            "colWidths": [1000, 1000],
            "rowHeights": [10]
        }))
        .unwrap();
        let layout = TableLayout::compute(&table, MAX_SHEET_WIDTH);
        assert_eq!(layout.col_widths, vec![Some(410.0), Some(410.0), None]);
        assert_eq!(layout.row_heights, vec![Some(MIN_CELL_PX), None]);
    }
}
