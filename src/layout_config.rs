//! Layout config – the intermediate representation between pagination and
//! PDF rendering. This is the "frozen" structure that encodes exactly what
//! goes on each page: every cell rectangle and every positioned text segment.
//!
//! All coordinates are in PDF points relative to the page's top-left corner.

use serde::{Deserialize, Serialize};

/// A complete document layout ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Document title embedded in the PDF metadata.
    #[serde(default = "LayoutConfig::default_title")]
    pub title: String,
    /// Width of each page in PDF points (1 pt = 1/72 inch).
    pub page_width_pt: f32,
    /// Height of each page in PDF points.
    pub page_height_pt: f32,
    /// Ordered list of pages.
    pub pages: Vec<PageLayout>,
}

/// One page of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_index: usize,
    pub rows: Vec<RowLayout>,
}

/// One table row, or one fragment of a row split across pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowLayout {
    /// Index of the source `<table>` in document order.
    pub table_index: usize,
    /// Index of the row within its table.
    pub row_index: usize,
    /// A copy of a header row placed at the top of a continuation page.
    #[serde(default)]
    pub repeated_header: bool,
    /// A later fragment of a row that did not fit on one page.
    #[serde(default)]
    pub continued: bool,
    pub y: f32,
    pub height: f32,
    pub cells: Vec<CellBox>,
}

/// A bordered cell rectangle with its text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub background_color: Option<[f32; 4]>,
    pub border: BorderStyle,
    pub text: TextContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorderStyle {
    pub width: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub font_size: f32,
    pub line_height: f32,
    pub color: [f32; 4],
    /// Pre-wrapped lines of text.
    pub lines: Vec<TextLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    /// Distance from the top of the cell to this line's baseline.
    pub baseline: f32,
    pub segments: Vec<TextSegment>,
}

/// A same-style stretch of text on one line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSegment {
    pub text: String,
    /// X offset from the left edge of the cell.
    pub x_offset: f32,
    pub bold: bool,
    pub italic: bool,
}

impl LayoutConfig {
    /// Create an empty A4 portrait layout.
    pub fn a4() -> Self {
        Self {
            title: Self::default_title(),
            // A4: 210mm × 297mm = 595.28 × 841.89 points
            page_width_pt: 595.28,
            page_height_pt: 841.89,
            pages: Vec::new(),
        }
    }

    fn default_title() -> String {
        "Asset Report".to_string()
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Every row placed in the document, in page order.
    pub fn rows(&self) -> impl Iterator<Item = &RowLayout> {
        self.pages.iter().flat_map(|p| p.rows.iter())
    }
}

impl CellBox {
    /// The cell's text with line breaks between wrapped lines.
    pub fn text(&self) -> String {
        self.text
            .lines
            .iter()
            .map(|l| l.segments.iter().map(|s| s.text.as_str()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
