//! Grid extraction – flattens the `<table>` elements of a DOM tree into rows
//! of styled cells.
//!
//! The grid is the hand-off point between parsing and layout: it knows
//! nothing about fonts or pages, only what text goes in which cell and which
//! stretches of it are bold or italic.

use crate::dom::{DomNode, ElementNode, Tag};
use crate::error::{Error, Result};

/// Widest table accepted, in columns.
pub const MAX_COLUMNS: usize = 1000;

/// Upper bound on rows × columns summed over all tables of one document.
/// Every row is padded to its table's full width, so this bounds the number
/// of laid-out cell boxes.
pub const MAX_GRID_CELLS: usize = 1_000_000;

/// Inline style flags carried by a run of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct InlineStyle {
    pub bold: bool,
    pub italic: bool,
}

impl InlineStyle {
    pub const PLAIN: InlineStyle = InlineStyle {
        bold: false,
        italic: false,
    };
}

/// A stretch of cell text sharing one style. `'\n'` marks a forced break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub style: InlineStyle,
}

/// One table cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub runs: Vec<TextRun>,
    /// Produced by `<th>`.
    pub header: bool,
    pub colspan: usize,
}

impl Cell {
    /// The cell's text with styling removed.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

pub type Row = Vec<Cell>;

/// The rows of one `<table>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    pub rows: Vec<Row>,
}

impl Grid {
    /// Column count of the widest row, counting `colspan`.
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .fold(0usize, |n, c| n.saturating_add(c.colspan.max(1)))
            })
            .max()
            .unwrap_or(0)
    }

    /// Number of leading rows made up solely of `<th>` cells.
    pub fn header_row_count(&self) -> usize {
        self.rows
            .iter()
            .take_while(|row| !row.is_empty() && row.iter().all(|c| c.header))
            .count()
    }

    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Build one grid per top-level `<table>` found in `nodes`.
///
/// Tables without any cell are skipped. Fails with [`Error::Parse`] when no
/// table is present, or none of them holds a cell.
pub fn extract_grids(nodes: &[DomNode]) -> Result<Vec<Grid>> {
    let mut tables = Vec::new();
    collect_tables(nodes, &mut tables);
    if tables.is_empty() {
        return Err(Error::Parse(
            "No <table> element found in htmlTable".to_string(),
        ));
    }

    let found = tables.len();
    let grids: Vec<Grid> = tables
        .into_iter()
        .map(grid_from_table)
        .filter(|g| g.cell_count() > 0)
        .collect();

    if grids.is_empty() {
        return Err(Error::Parse(
            "The <table> element contains no rows or cells".to_string(),
        ));
    }
    if grids.len() < found {
        log::warn!("Skipped {} table(s) without cells", found - grids.len());
    }
    check_size(&grids)?;
    Ok(grids)
}

fn check_size(grids: &[Grid]) -> Result<()> {
    let mut total = 0usize;
    for grid in grids {
        let columns = grid.column_count();
        if columns > MAX_COLUMNS {
            return Err(Error::Parse(format!(
                "Table has {columns} columns; at most {MAX_COLUMNS} are supported"
            )));
        }
        total = total.saturating_add(grid.rows.len().saturating_mul(columns));
    }
    if total > MAX_GRID_CELLS {
        return Err(Error::Render(format!(
            "Tables need {total} cells; at most {MAX_GRID_CELLS} are supported"
        )));
    }
    Ok(())
}

/// Tables nested inside another table's cell are not collected; they are
/// flattened into that cell's text instead.
fn collect_tables<'a>(nodes: &'a [DomNode], out: &mut Vec<&'a ElementNode>) {
    for node in nodes {
        if let DomNode::Element(e) = node {
            if e.tag == Tag::Table {
                out.push(e);
            } else {
                collect_tables(&e.children, out);
            }
        }
    }
}

fn grid_from_table(table: &ElementNode) -> Grid {
    let mut rows = Vec::new();
    collect_rows(table, &mut rows);
    rows.retain(|row| !row.is_empty());
    Grid { rows }
}

fn collect_rows(parent: &ElementNode, rows: &mut Vec<Row>) {
    // Cells written straight under <table> (no <tr>) form an implicit row.
    let mut loose_row: Option<Row> = None;
    for child in parent.child_elements() {
        if child.tag.is_cell() {
            loose_row
                .get_or_insert_with(Vec::new)
                .push(cell_from_element(child));
            continue;
        }
        if let Some(row) = loose_row.take() {
            rows.push(row);
        }
        match &child.tag {
            Tag::Tr => rows.push(row_from_tr(child)),
            Tag::Table => {}
            _ => collect_rows(child, rows),
        }
    }
    if let Some(row) = loose_row {
        rows.push(row);
    }
}

fn row_from_tr(tr: &ElementNode) -> Row {
    let mut cells = Vec::new();
    for child in tr.child_elements() {
        if child.tag.is_cell() {
            cells.push(cell_from_element(child));
        }
    }
    cells
}

fn cell_from_element(elem: &ElementNode) -> Cell {
    let mut collector = RunCollector::default();
    collector.collect(&elem.children, InlineStyle::PLAIN);
    Cell {
        runs: collector.finish(),
        header: elem.tag == Tag::Th,
        colspan: elem.colspan(),
    }
}

// ---------------------------------------------------------------------------
// Whitespace-normalising text collection
// ---------------------------------------------------------------------------

/// Accumulates styled runs while collapsing whitespace: any run of spaces,
/// tabs and newlines becomes one space, leading and trailing whitespace is
/// dropped, and spaces next to a `<br>` break vanish.
#[derive(Default)]
struct RunCollector {
    runs: Vec<TextRun>,
    pending_space: Option<InlineStyle>,
}

impl RunCollector {
    fn collect(&mut self, nodes: &[DomNode], style: InlineStyle) {
        for node in nodes {
            match node {
                DomNode::Text(text) => self.push_text(text, style),
                DomNode::Element(e) => match &e.tag {
                    Tag::Br => self.push_break(style),
                    Tag::B | Tag::Strong => self.collect(
                        &e.children,
                        InlineStyle {
                            bold: true,
                            ..style
                        },
                    ),
                    Tag::I | Tag::Em => self.collect(
                        &e.children,
                        InlineStyle {
                            italic: true,
                            ..style
                        },
                    ),
                    tag if tag.is_skipped() => {}
                    tag if tag.is_inline() => self.collect(&e.children, style),
                    // Block content (including nested tables) flattens to
                    // text separated by whitespace.
                    _ => {
                        self.push_separator(style);
                        self.collect(&e.children, style);
                        self.push_separator(style);
                    }
                },
            }
        }
    }

    fn push_text(&mut self, text: &str, style: InlineStyle) {
        for c in text.chars() {
            if c.is_whitespace() && c != '\u{00A0}' {
                self.push_separator(style);
            } else {
                self.push_char(c, style);
            }
        }
    }

    fn push_separator(&mut self, style: InlineStyle) {
        let at_line_start = self
            .runs
            .last()
            .map_or(true, |r| r.text.is_empty() || r.text.ends_with('\n'));
        if !at_line_start && self.pending_space.is_none() {
            self.pending_space = Some(style);
        }
    }

    fn push_break(&mut self, style: InlineStyle) {
        self.pending_space = None;
        self.emit('\n', style);
    }

    fn push_char(&mut self, c: char, style: InlineStyle) {
        if let Some(space_style) = self.pending_space.take() {
            self.emit(' ', space_style);
        }
        self.emit(c, style);
    }

    fn emit(&mut self, c: char, style: InlineStyle) {
        match self.runs.last_mut() {
            Some(run) if run.style == style => run.text.push(c),
            _ => self.runs.push(TextRun {
                text: c.to_string(),
                style,
            }),
        }
    }

    fn finish(mut self) -> Vec<TextRun> {
        // Trailing breaks carry no content.
        while let Some(run) = self.runs.last_mut() {
            let trimmed = run.text.trim_end_matches('\n').len();
            run.text.truncate(trimmed);
            if run.text.is_empty() {
                self.runs.pop();
            } else {
                break;
            }
        }
        self.runs
    }
}
