//! Layout – assigns each cell its column span and wraps its text to the
//! fixed column width, producing measured rows ready for pagination.
//!
//! Column policy: every column of a table gets the same width, the content
//! width divided by the column count of the widest row. Short rows are
//! padded with empty cells so the grid lines stay complete.

use crate::fonts::{wrap_runs, FontManager, WrappedLine};
use crate::grid::{Grid, InlineStyle, TextRun};
use crate::pipeline::PipelineConfig;

/// A cell after wrapping, positioned horizontally within the table.
#[derive(Debug, Clone)]
pub struct MeasuredCell {
    /// Offset of the cell's left edge from the table's left edge.
    pub x: f32,
    pub width: f32,
    pub lines: Vec<WrappedLine>,
    pub header: bool,
}

/// A row after wrapping; `height` includes the cell padding.
#[derive(Debug, Clone)]
pub struct MeasuredRow {
    pub cells: Vec<MeasuredCell>,
    /// Line count of the tallest cell (at least 1).
    pub line_count: usize,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub struct MeasuredTable {
    pub rows: Vec<MeasuredRow>,
    /// Leading rows made up solely of header cells.
    pub header_rows: usize,
    pub column_width: f32,
}

/// Measure every grid against the configured page geometry.
pub fn measure_grids(
    grids: &[Grid],
    config: &PipelineConfig,
    fonts: &FontManager,
) -> Vec<MeasuredTable> {
    grids
        .iter()
        .map(|grid| measure_grid(grid, config, fonts))
        .collect()
}

pub fn measure_grid(grid: &Grid, config: &PipelineConfig, fonts: &FontManager) -> MeasuredTable {
    let columns = grid.column_count().max(1);
    let column_width = config.content_width() / columns as f32;
    let padding = config.cell_padding;
    let line_height = config.line_height_pt();

    let rows = grid
        .rows
        .iter()
        .map(|row| {
            let mut cells = Vec::with_capacity(columns);
            let mut column = 0usize;

            for cell in row {
                if column >= columns {
                    break;
                }
                let span = cell.colspan.clamp(1, columns - column);
                let width = column_width * span as f32;
                let lines = if cell.header {
                    wrap_runs(&emboldened(&cell.runs), config.font_size, width - 2.0 * padding, fonts)
                } else {
                    wrap_runs(&cell.runs, config.font_size, width - 2.0 * padding, fonts)
                };
                cells.push(MeasuredCell {
                    x: column_width * column as f32,
                    width,
                    lines,
                    header: cell.header,
                });
                column += span;
            }

            // Pad short rows so every column has a bordered box.
            while column < columns {
                cells.push(MeasuredCell {
                    x: column_width * column as f32,
                    width: column_width,
                    lines: Vec::new(),
                    header: false,
                });
                column += 1;
            }

            let line_count = cells.iter().map(|c| c.lines.len()).max().unwrap_or(0).max(1);
            MeasuredRow {
                cells,
                line_count,
                height: line_count as f32 * line_height + 2.0 * padding,
            }
        })
        .collect();

    MeasuredTable {
        rows,
        header_rows: grid.header_row_count(),
        column_width,
    }
}

/// Header cells render bold regardless of their inline markup.
fn emboldened(runs: &[TextRun]) -> Vec<TextRun> {
    runs.iter()
        .map(|r| TextRun {
            text: r.text.clone(),
            style: InlineStyle {
                bold: true,
                ..r.style
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;
    use crate::grid::extract_grids;

    fn measure(html: &str) -> MeasuredTable {
        let grids = extract_grids(&parse_html(html)).unwrap();
        measure_grid(&grids[0], &PipelineConfig::default(), &FontManager::default())
    }

    #[test]
    fn equal_column_widths() {
        let config = PipelineConfig::default();
        let table = measure("<table><tr><td>a</td><td>b</td><td>c</td></tr></table>");
        let expected = config.content_width() / 3.0;
        assert!((table.column_width - expected).abs() < 0.01);
        for (i, cell) in table.rows[0].cells.iter().enumerate() {
            assert!((cell.x - expected * i as f32).abs() < 0.01);
            assert!((cell.width - expected).abs() < 0.01);
        }
    }

    #[test]
    fn short_rows_are_padded() {
        let table = measure("<table><tr><td>a</td><td>b</td></tr><tr><td>c</td></tr></table>");
        assert_eq!(table.rows[1].cells.len(), 2);
        assert!(table.rows[1].cells[1].lines.is_empty());
    }

    #[test]
    fn colspan_widens_cell() {
        let table = measure(
            "<table><tr><td colspan=\"2\">wide</td></tr><tr><td>a</td><td>b</td></tr></table>",
        );
        assert_eq!(table.rows[0].cells.len(), 1);
        assert!((table.rows[0].cells[0].width - 2.0 * table.column_width).abs() < 0.01);
    }

    #[test]
    fn row_height_follows_tallest_cell() {
        let config = PipelineConfig::default();
        let long = "word ".repeat(120);
        let table = measure(&format!(
            "<table><tr><td>short</td><td>{long}</td></tr></table>"
        ));
        let row = &table.rows[0];
        assert!(row.line_count > 1);
        let expected =
            row.line_count as f32 * config.line_height_pt() + 2.0 * config.cell_padding;
        assert!((row.height - expected).abs() < 0.01);
    }

    #[test]
    fn empty_cells_still_get_one_line() {
        let config = PipelineConfig::default();
        let table = measure("<table><tr><td></td></tr></table>");
        let expected = config.line_height_pt() + 2.0 * config.cell_padding;
        assert!((table.rows[0].height - expected).abs() < 0.01);
    }

    #[test]
    fn header_cells_are_bold() {
        let table = measure("<table><tr><th>Name</th></tr><tr><td>Alice</td></tr></table>");
        assert_eq!(table.header_rows, 1);
        assert!(table.rows[0].cells[0].lines[0].segments[0].style.bold);
        assert!(!table.rows[1].cells[0].lines[0].segments[0].style.bold);
    }
}
