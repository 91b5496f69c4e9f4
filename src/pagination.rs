//! Pagination – places measured rows onto pages and freezes the result into
//! a [`LayoutConfig`].
//!
//! Handles:
//! - starting a new page when the next row would not fit the remaining space
//! - optional repetition of a table's header rows on continuation pages
//! - splitting a row taller than a whole page between its text lines
//! - the configured upper bound on the page count

use std::ops::Range;

use crate::error::{Error, Result};
use crate::fonts::FontManager;
use crate::grid::InlineStyle;
use crate::layout::{MeasuredRow, MeasuredTable};
use crate::layout_config::*;
use crate::pipeline::PipelineConfig;

/// Default page margins in points.
pub const PAGE_MARGIN_PT: f32 = 40.0;

/// Vertical space between consecutive tables.
pub const TABLE_GAP_PT: f32 = 12.0;

const TEXT_COLOR: [f32; 4] = [0.2, 0.2, 0.2, 1.0]; // #333
const BORDER_COLOR: [f32; 4] = [0.867, 0.867, 0.867, 1.0]; // #ddd
const HEADER_BACKGROUND: [f32; 4] = [0.973, 0.976, 0.98, 1.0]; // #f8f9fa
const BORDER_WIDTH_PT: f32 = 0.75;

/// Convert measured tables into a paginated LayoutConfig.
pub fn paginate(
    tables: &[MeasuredTable],
    config: &PipelineConfig,
    fonts: &FontManager,
) -> Result<LayoutConfig> {
    let mut pager = Pager::new(config, fonts);

    for (table_index, table) in tables.iter().enumerate() {
        if table_index > 0 && !pager.page_is_empty() {
            pager.y += TABLE_GAP_PT;
        }
        for row_index in 0..table.rows.len() {
            pager.place_row(table_index, table, row_index)?;
        }
    }

    Ok(pager.finish())
}

struct Pager<'a> {
    config: &'a PipelineConfig,
    fonts: &'a FontManager,
    pages: Vec<PageLayout>,
    current: PageLayout,
    /// Top of the next row, measured from the page's top edge.
    y: f32,
}

impl<'a> Pager<'a> {
    fn new(config: &'a PipelineConfig, fonts: &'a FontManager) -> Self {
        Self {
            config,
            fonts,
            pages: Vec::new(),
            current: PageLayout {
                page_index: 0,
                rows: Vec::new(),
            },
            y: config.page_margin,
        }
    }

    fn bottom(&self) -> f32 {
        self.config.page_margin + self.config.content_height()
    }

    fn remaining(&self) -> f32 {
        self.bottom() - self.y
    }

    fn page_is_empty(&self) -> bool {
        self.current.rows.is_empty()
    }

    /// Height of a fragment holding `lines` lines of text.
    fn fragment_height(&self, lines: usize) -> f32 {
        lines as f32 * self.config.line_height_pt() + 2.0 * self.config.cell_padding
    }

    fn place_row(&mut self, table_index: usize, table: &MeasuredTable, row_index: usize) -> Result<()> {
        let row = &table.rows[row_index];
        if row.height <= self.remaining() {
            self.emit(table_index, row_index, row, 0..row.line_count, false, false);
            return Ok(());
        }

        if !self.page_is_empty() {
            self.start_continuation_page(table_index, table, row_index)?;
            if row.height <= self.remaining() {
                self.emit(table_index, row_index, row, 0..row.line_count, false, false);
                return Ok(());
            }
        }

        log::warn!(
            "Row {row_index} of table {table_index} is taller than a page \
             ({:.1}pt); splitting it across pages",
            row.height
        );
        let line_height = self.config.line_height_pt();
        let mut start = 0usize;
        loop {
            let usable = self.remaining() - 2.0 * self.config.cell_padding;
            let fit = ((usable / line_height).floor().max(1.0)) as usize;
            let end = (start + fit).min(row.line_count);
            self.emit(table_index, row_index, row, start..end, false, start > 0);
            start = end;
            if start >= row.line_count {
                return Ok(());
            }
            self.start_continuation_page(table_index, table, row_index)?;
        }
    }

    fn new_page(&mut self) -> Result<()> {
        if self.pages.len() + 2 > self.config.max_pages {
            return Err(Error::Render(format!(
                "Document exceeds the limit of {} pages",
                self.config.max_pages
            )));
        }
        let next = PageLayout {
            page_index: self.pages.len() + 1,
            rows: Vec::new(),
        };
        self.pages.push(std::mem::replace(&mut self.current, next));
        self.y = self.config.page_margin;
        Ok(())
    }

    fn start_continuation_page(
        &mut self,
        table_index: usize,
        table: &MeasuredTable,
        row_index: usize,
    ) -> Result<()> {
        self.new_page()?;

        let header_rows = table.header_rows;
        if !self.config.repeat_header || header_rows == 0 || row_index < header_rows {
            return Ok(());
        }
        let header_height: f32 = table.rows[..header_rows].iter().map(|r| r.height).sum();
        if header_height + self.fragment_height(1) > self.config.content_height() {
            log::warn!("Header of table {table_index} is too tall to repeat");
            return Ok(());
        }
        for (index, header) in table.rows[..header_rows].iter().enumerate() {
            self.emit(table_index, index, header, 0..header.line_count, true, false);
        }
        Ok(())
    }

    /// Freeze `lines` of `row` at the cursor and move the cursor down.
    fn emit(
        &mut self,
        table_index: usize,
        row_index: usize,
        row: &MeasuredRow,
        lines: Range<usize>,
        repeated_header: bool,
        continued: bool,
    ) {
        let config = self.config;
        let height = self.fragment_height(lines.len());
        let line_height = config.line_height_pt();
        let baseline_in_line = (line_height - config.font_size) / 2.0
            + self.fonts.ascender_pt(config.font_size, InlineStyle::PLAIN);

        let cells = row
            .cells
            .iter()
            .map(|cell| {
                let from = lines.start.min(cell.lines.len());
                let to = lines.end.min(cell.lines.len());
                let visible = &cell.lines[from..to];
                let block_top = (height - visible.len() as f32 * line_height) / 2.0;

                let text_lines = visible
                    .iter()
                    .enumerate()
                    .map(|(i, line)| {
                        let mut x = config.cell_padding;
                        let segments = line
                            .segments
                            .iter()
                            .map(|seg| {
                                let segment = TextSegment {
                                    text: seg.text.clone(),
                                    x_offset: x,
                                    bold: seg.style.bold,
                                    italic: seg.style.italic,
                                };
                                x += seg.width;
                                segment
                            })
                            .collect();
                        TextLine {
                            baseline: block_top + i as f32 * line_height + baseline_in_line,
                            segments,
                        }
                    })
                    .collect();

                CellBox {
                    x: config.page_margin + cell.x,
                    y: self.y,
                    width: cell.width,
                    height,
                    background_color: cell.header.then_some(HEADER_BACKGROUND),
                    border: BorderStyle {
                        width: BORDER_WIDTH_PT,
                        color: BORDER_COLOR,
                    },
                    text: TextContent {
                        font_size: config.font_size,
                        line_height,
                        color: TEXT_COLOR,
                        lines: text_lines,
                    },
                }
            })
            .collect();

        self.current.rows.push(RowLayout {
            table_index,
            row_index,
            repeated_header,
            continued,
            y: self.y,
            height,
            cells,
        });
        self.y += height;
    }

    fn finish(mut self) -> LayoutConfig {
        if !self.current.rows.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        LayoutConfig {
            title: self.config.title.clone(),
            page_width_pt: self.config.effective_width(),
            page_height_pt: self.config.effective_height(),
            pages: self.pages,
        }
    }
}
