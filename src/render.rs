//! PDF renderer – takes a [`LayoutConfig`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API).

use printpdf::{
    BuiltinFont, Color, Line, LinePoint, Mm, Op, PaintMode, PdfDocument, PdfPage,
    PdfSaveOptions, Point, Polygon, PolygonRing, Pt, Rgb, TextItem, WindingOrder,
};

use crate::error::{Error, Result};
use crate::layout_config::{CellBox, LayoutConfig};

const PT_TO_MM: f32 = 0.352778;

/// Render a LayoutConfig into PDF bytes.
///
/// Fails with [`Error::Render`] when the serialized document is not a PDF.
pub fn render_pdf(config: &LayoutConfig) -> Result<Vec<u8>> {
    let page_w = Mm(config.page_width_pt * PT_TO_MM);
    let page_h = Mm(config.page_height_pt * PT_TO_MM);

    let mut doc = PdfDocument::new(&config.title);

    let mut pages = Vec::with_capacity(config.pages.len().max(1));
    for page_layout in &config.pages {
        let mut ops = Vec::new();
        for row in &page_layout.rows {
            for cell in &row.cells {
                render_cell(&mut ops, cell, config.page_height_pt);
            }
        }
        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    // Ensure at least one page.
    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    doc.with_pages(pages);
    let mut warnings = Vec::new();
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        log::debug!("printpdf reported {} warning(s)", warnings.len());
    }

    if !bytes.starts_with(b"%PDF-") {
        return Err(Error::Render(
            "PDF serializer produced a document without a PDF header".to_string(),
        ));
    }
    Ok(bytes)
}

/// Convert a UTF-8 string to raw Windows-1252 bytes then wrap in a String so
/// printpdf writes the bytes unchanged into the PDF stream (builtin fonts use
/// WinAnsiEncoding, so each glyph is one byte 0x00–0xFF).
fn to_winlatin(s: &str) -> String {
    let bytes: Vec<u8> = s
        .chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80, // euro
            '\u{201A}' => 0x82, // single low-9 quote
            '\u{201E}' => 0x84, // double low-9 quote
            '\u{2026}' => 0x85, // ellipsis
            '\u{2018}' => 0x91, // left single quote
            '\u{2019}' => 0x92, // right single quote
            '\u{201C}' => 0x93, // left double quote
            '\u{201D}' => 0x94, // right double quote
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96, // en-dash
            '\u{2014}' => 0x97, // em-dash
            '\u{2122}' => 0x99, // trademark
            '\u{00A0}' => 0x20, // non-breaking space -> space
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect();
    // SAFETY: the String is not valid UTF-8 for bytes 0x80-0xFF; it is only
    // handed to printpdf 0.8, whose builtin-font path encodes text through
    // lopdf's `SimpleEncoding("WinAnsiEncoding")`, which copies `as_bytes()`
    // into the content stream without inspecting it. Revisit on upgrade.
    #[allow(unsafe_code)]
    unsafe {
        String::from_utf8_unchecked(bytes)
    }
}

fn rgb(color: [f32; 4]) -> Color {
    Color::Rgb(Rgb {
        r: color[0],
        g: color[1],
        b: color[2],
        icc_profile: None,
    })
}

fn corner(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

fn builtin_font(bold: bool, italic: bool) -> BuiltinFont {
    match (bold, italic) {
        (true, true) => BuiltinFont::HelveticaBoldOblique,
        (true, false) => BuiltinFont::HelveticaBold,
        (false, true) => BuiltinFont::HelveticaOblique,
        (false, false) => BuiltinFont::Helvetica,
    }
}

/// Render one cell: optional background, grid-line rectangle, then text.
fn render_cell(ops: &mut Vec<Op>, cell: &CellBox, page_height: f32) {
    // PDF coordinate system: origin at bottom-left.
    // Our layout uses origin at top-left. Convert:
    let top = page_height - cell.y;
    let bottom = top - cell.height;
    let left = cell.x;
    let right = cell.x + cell.width;

    // Background
    if let Some(bg) = cell.background_color {
        ops.push(Op::SetFillColor { col: rgb(bg) });
        ops.push(Op::DrawPolygon {
            polygon: Polygon {
                rings: vec![PolygonRing {
                    points: vec![
                        corner(left, bottom),
                        corner(right, bottom),
                        corner(right, top),
                        corner(left, top),
                    ],
                }],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            },
        });
    }

    // Border
    ops.push(Op::SetOutlineColor {
        col: rgb(cell.border.color),
    });
    ops.push(Op::SetOutlineThickness {
        pt: Pt(cell.border.width),
    });
    ops.push(Op::DrawLine {
        line: Line {
            points: vec![
                corner(left, top),
                corner(right, top),
                corner(right, bottom),
                corner(left, bottom),
            ],
            is_closed: true,
        },
    });

    // Text
    let text = &cell.text;
    for line in &text.lines {
        let baseline = top - line.baseline;
        for segment in &line.segments {
            if segment.text.is_empty() {
                continue;
            }
            let font = builtin_font(segment.bold, segment.italic);

            ops.push(Op::StartTextSection);
            ops.push(Op::SetTextCursor {
                pos: Point {
                    x: Pt(left + segment.x_offset),
                    y: Pt(baseline),
                },
            });
            ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(text.font_size),
                font,
            });
            ops.push(Op::SetLineHeight {
                lh: Pt(text.line_height),
            });
            ops.push(Op::SetFillColor {
                col: rgb(text.color),
            });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(to_winlatin(&segment.text))],
                font,
            });
            ops.push(Op::EndTextSection);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_empty_page() {
        let config = LayoutConfig::a4();
        let bytes = render_pdf(&config).unwrap();
        assert!(bytes.len() > 100, "PDF should have content");
        // PDF magic number
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn builtin_font_follows_style_flags() {
        assert!(matches!(builtin_font(true, false), BuiltinFont::HelveticaBold));
        assert!(matches!(builtin_font(false, true), BuiltinFont::HelveticaOblique));
        assert!(matches!(builtin_font(false, false), BuiltinFont::Helvetica));
    }

    #[test]
    fn winlatin_replaces_unmappable_chars() {
        assert_eq!(to_winlatin("plain").as_bytes(), b"plain");
        assert_eq!(to_winlatin("a\u{00A0}b").as_bytes(), b"a b");
        assert_eq!(to_winlatin("\u{4E2D}").as_bytes(), b"?");
    }
}
