//! Pipeline – ties together parsing, grid extraction, measurement,
//! pagination, and rendering into a single function call.

use crate::dom::parse_html;
use crate::error::{Error, Result};
use crate::fonts::FontManager;
use crate::grid::extract_grids;
use crate::layout::measure_grids;
use crate::layout_config::LayoutConfig;
use crate::pagination::{paginate, PAGE_MARGIN_PT};
use crate::render::render_pdf;

/// Page orientation for the generated PDF.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PageOrientation {
    /// Portrait mode: height > width (default).
    #[default]
    Portrait,
    /// Landscape mode: width > height.
    Landscape,
}

/// Configuration for the PDF generation pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Document title embedded in the PDF metadata (default: "Asset Report").
    pub title: String,
    /// Page width in points (default: A4 = 595.28).
    pub page_width: f32,
    /// Page height in points (default: A4 = 841.89).
    pub page_height: f32,
    /// Page margin in points (default: 40).
    pub page_margin: f32,
    /// Page orientation; swaps effective width/height when `Landscape`.
    pub orientation: PageOrientation,
    /// Fixed font size for all cell text, in points (default: 10).
    pub font_size: f32,
    /// Line height as a multiple of the font size (default: 1.2).
    pub line_height: f32,
    /// Inner padding of every cell, in points (default: 4).
    pub cell_padding: f32,
    /// Repeat a table's leading `<th>` rows on each continuation page.
    pub repeat_header: bool,
    /// Upper bound on the page count of one document (default: 500).
    pub max_pages: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            title: "Asset Report".to_string(),
            page_width: 595.28,
            page_height: 841.89,
            page_margin: PAGE_MARGIN_PT,
            orientation: PageOrientation::Portrait,
            font_size: 10.0,
            line_height: 1.2,
            cell_padding: 4.0,
            repeat_header: false,
            max_pages: 500,
        }
    }
}

impl PipelineConfig {
    /// Effective page width after applying orientation.
    pub fn effective_width(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.page_width,
            PageOrientation::Landscape => self.page_height,
        }
    }

    /// Effective page height after applying orientation.
    pub fn effective_height(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.page_height,
            PageOrientation::Landscape => self.page_width,
        }
    }

    /// Create an A4 landscape config.
    pub fn a4_landscape() -> Self {
        Self {
            orientation: PageOrientation::Landscape,
            ..Self::default()
        }
    }

    /// Width available to the table between the side margins.
    pub fn content_width(&self) -> f32 {
        self.effective_width() - 2.0 * self.page_margin
    }

    /// Height available to rows between the top and bottom margins.
    pub fn content_height(&self) -> f32 {
        self.effective_height() - 2.0 * self.page_margin
    }

    /// Height of one line of cell text.
    pub fn line_height_pt(&self) -> f32 {
        self.font_size * self.line_height
    }

    /// Reject settings that cannot produce a page.
    pub fn validate(&self) -> Result<()> {
        if self.font_size.is_nan() || self.font_size <= 0.0 {
            return Err(Error::Config("font size must be positive".into()));
        }
        if self.line_height.is_nan() || self.line_height < 1.0 {
            return Err(Error::Config("line height must be at least 1.0".into()));
        }
        if self.page_margin.is_nan()
            || self.cell_padding.is_nan()
            || self.page_margin < 0.0
            || self.cell_padding < 0.0
        {
            return Err(Error::Config(
                "margin and cell padding must not be negative".into(),
            ));
        }
        if self.max_pages == 0 {
            return Err(Error::Config("max pages must be at least 1".into()));
        }
        let min_row = self.line_height_pt() + 2.0 * self.cell_padding;
        if self.content_width() < 2.0 * self.cell_padding + self.font_size
            || self.content_height() < min_row
        {
            return Err(Error::Config(format!(
                "page area {:.1}x{:.1}pt leaves no room for a single row",
                self.content_width(),
                self.content_height()
            )));
        }
        Ok(())
    }
}

/// Full pipeline: HTML table fragment → PDF bytes.
///
/// Returns `(pdf_bytes, layout_config)`.
pub fn generate_pdf(html: &str, config: &PipelineConfig) -> Result<(Vec<u8>, LayoutConfig)> {
    let layout = compute_layout_config(html, config)?;
    let pdf_bytes = render_pdf(&layout)?;
    log::debug!(
        "Rendered {} page(s) into {} bytes",
        layout.pages.len(),
        pdf_bytes.len()
    );
    Ok((pdf_bytes, layout))
}

/// Convenience: generate PDF with default A4 config.
pub fn generate_pdf_from_html(html: &str) -> Result<Vec<u8>> {
    let (bytes, _) = generate_pdf(html, &PipelineConfig::default())?;
    Ok(bytes)
}

/// Generate only the layout config (no PDF rendering).
pub fn compute_layout_config(html: &str, config: &PipelineConfig) -> Result<LayoutConfig> {
    config.validate()?;
    if html.trim().is_empty() {
        return Err(Error::Validation("htmlTable cannot be empty".to_string()));
    }

    // 1. Parse HTML
    let dom = parse_html(html);

    // 2. Extract table grids
    let grids = extract_grids(&dom)?;
    log::debug!(
        "Extracted {} table(s) with {} row(s)",
        grids.len(),
        grids.iter().map(|g| g.rows.len()).sum::<usize>()
    );

    // 3. Measure rows
    let fonts = FontManager::default();
    let tables = measure_grids(&grids, config, &fonts);

    // 4. Paginate
    paginate(&tables, config, &fonts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_basic() {
        let html = "<table><tr><td>X</td></tr></table>";
        let (bytes, layout) = generate_pdf(html, &PipelineConfig::default()).unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(layout.pages.len(), 1);
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn blank_input_is_validation_error() {
        let err = generate_pdf("  \n ", &PipelineConfig::default()).unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
    }

    #[test]
    fn landscape_swaps_dimensions() {
        let config = PipelineConfig::a4_landscape();
        assert!(config.effective_width() > config.effective_height());
        let layout =
            compute_layout_config("<table><tr><td>X</td></tr></table>", &config).unwrap();
        assert!(layout.page_width_pt > layout.page_height_pt);
    }

    #[test]
    fn title_is_carried_into_layout() {
        let config = PipelineConfig {
            title: "Quarterly Assets".into(),
            ..PipelineConfig::default()
        };
        let layout =
            compute_layout_config("<table><tr><td>X</td></tr></table>", &config).unwrap();
        assert_eq!(layout.title, "Quarterly Assets");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = PipelineConfig {
            font_size: 0.0,
            ..PipelineConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().kind(), "ConfigError");

        let config = PipelineConfig {
            page_margin: 400.0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
