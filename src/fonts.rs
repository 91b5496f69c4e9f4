//! Text measurement and word wrapping for the builtin Helvetica family.
//!
//! The renderer only draws the PDF base-14 Helvetica faces, so measurement
//! uses their published AFM advance widths (units per 1000 em). Oblique
//! faces share the advances of their upright counterparts.

use crate::grid::{InlineStyle, TextRun};

/// Advance widths for U+0020..=U+007E, Helvetica.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

/// Advance widths for U+0020..=U+007E, Helvetica-Bold.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    333, 333, 584, 584, 584, 611, 975, // :..@
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    333, 278, 333, 584, 556, 333, // [..`
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // a..m
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // n..z
    389, 280, 389, 584, // {..~
];

/// Advance used for characters outside the printable ASCII range.
const FALLBACK_WIDTH: u16 = 556;

/// Metrics of one builtin face.
#[derive(Debug, Clone)]
pub struct FontMetrics {
    widths: &'static [u16; 95],
    /// Ascender in 1/1000 em.
    pub ascender: f32,
}

impl FontMetrics {
    fn advance(&self, c: char) -> u16 {
        match c {
            ' '..='~' => self.widths[c as usize - 0x20],
            '\u{00A0}' => self.widths[0],
            _ => FALLBACK_WIDTH,
        }
    }
}

/// Measures text in the Helvetica family.
#[derive(Debug, Clone)]
pub struct FontManager {
    regular: FontMetrics,
    bold: FontMetrics,
}

impl FontManager {
    pub fn helvetica() -> Self {
        Self {
            regular: FontMetrics {
                widths: &HELVETICA_WIDTHS,
                ascender: 718.0,
            },
            bold: FontMetrics {
                widths: &HELVETICA_BOLD_WIDTHS,
                ascender: 718.0,
            },
        }
    }

    pub fn metrics(&self, style: InlineStyle) -> &FontMetrics {
        if style.bold {
            &self.bold
        } else {
            &self.regular
        }
    }

    /// Width of `text` in points at `font_size`.
    pub fn measure_text_width(&self, text: &str, font_size: f32, style: InlineStyle) -> f32 {
        let metrics = self.metrics(style);
        let units: u32 = text.chars().map(|c| metrics.advance(c) as u32).sum();
        units as f32 * font_size / 1000.0
    }

    /// Baseline distance from the top of a line box.
    pub fn ascender_pt(&self, font_size: f32, style: InlineStyle) -> f32 {
        self.metrics(style).ascender * font_size / 1000.0
    }
}

impl Default for FontManager {
    fn default() -> Self {
        Self::helvetica()
    }
}

// ---------------------------------------------------------------------------
// Word wrapping
// ---------------------------------------------------------------------------

/// A same-style stretch of one wrapped line.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedSegment {
    pub text: String,
    pub style: InlineStyle,
    pub width: f32,
}

/// One output line of a wrapped cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WrappedLine {
    pub segments: Vec<WrappedSegment>,
    pub width: f32,
}

impl WrappedLine {
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Word-wrap styled runs to fit within `max_width` points.
///
/// Lines break at spaces; a single word wider than `max_width` is broken
/// between characters. `'\n'` in a run forces a break. Empty input yields
/// no lines.
///
/// Every line holds at least one character, so when `max_width` is narrower
/// than a glyph each character gets its own line and that glyph overhangs
/// the column.
pub fn wrap_runs(
    runs: &[TextRun],
    font_size: f32,
    max_width: f32,
    fonts: &FontManager,
) -> Vec<WrappedLine> {
    let mut builder = LineBuilder {
        fonts,
        font_size,
        max_width: max_width.max(0.0),
        lines: Vec::new(),
        current: WrappedLine::default(),
        pending_space: None,
    };

    let mut word: Vec<(String, InlineStyle)> = Vec::new();
    for run in runs {
        for c in run.text.chars() {
            match c {
                '\n' => {
                    builder.push_word(std::mem::take(&mut word));
                    builder.break_line();
                }
                ' ' => {
                    builder.push_word(std::mem::take(&mut word));
                    builder.pending_space = Some(run.style);
                }
                _ => match word.last_mut() {
                    Some((text, style)) if *style == run.style => text.push(c),
                    _ => word.push((c.to_string(), run.style)),
                },
            }
        }
    }
    builder.push_word(word);
    builder.finish()
}

struct LineBuilder<'a> {
    fonts: &'a FontManager,
    font_size: f32,
    max_width: f32,
    lines: Vec<WrappedLine>,
    current: WrappedLine,
    pending_space: Option<InlineStyle>,
}

impl LineBuilder<'_> {
    fn measure(&self, text: &str, style: InlineStyle) -> f32 {
        self.fonts.measure_text_width(text, self.font_size, style)
    }

    fn push_word(&mut self, word: Vec<(String, InlineStyle)>) {
        if word.is_empty() {
            return;
        }
        let word_width: f32 = word.iter().map(|(t, s)| self.measure(t, *s)).sum();
        let space = self.pending_space.take().filter(|_| !self.current.is_empty());
        let space_width = space.map_or(0.0, |s| self.measure(" ", s));

        if !self.current.is_empty()
            && self.current.width + space_width + word_width > self.max_width
        {
            self.break_line();
        } else if let Some(style) = space {
            self.append(" ", style);
        }

        if self.current.is_empty() && word_width > self.max_width {
            for (text, style) in &word {
                for c in text.chars() {
                    let mut buf = [0u8; 4];
                    let ch = c.encode_utf8(&mut buf);
                    let w = self.measure(ch, *style);
                    if !self.current.is_empty() && self.current.width + w > self.max_width {
                        self.break_line();
                    }
                    self.append(ch, *style);
                }
            }
        } else {
            for (text, style) in &word {
                self.append(text, *style);
            }
        }
    }

    fn append(&mut self, text: &str, style: InlineStyle) {
        let width = self.measure(text, style);
        self.current.width += width;
        match self.current.segments.last_mut() {
            Some(seg) if seg.style == style => {
                seg.text.push_str(text);
                seg.width += width;
            }
            _ => self.current.segments.push(WrappedSegment {
                text: text.to_string(),
                style,
                width,
            }),
        }
    }

    fn break_line(&mut self) {
        self.pending_space = None;
        self.lines.push(std::mem::take(&mut self.current));
    }

    fn finish(mut self) -> Vec<WrappedLine> {
        if !self.current.is_empty() {
            self.lines.push(self.current);
        }
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> Vec<TextRun> {
        vec![TextRun {
            text: text.to_string(),
            style: InlineStyle::PLAIN,
        }]
    }

    #[test]
    fn helvetica_widths() {
        let mgr = FontManager::default();
        // H(722) e(556) l(222) l(222) o(556) = 2278 units
        let w = mgr.measure_text_width("Hello", 10.0, InlineStyle::PLAIN);
        assert!((w - 22.78).abs() < 0.01, "got {w}");
    }

    #[test]
    fn bold_is_wider() {
        let mgr = FontManager::default();
        let bold = InlineStyle {
            bold: true,
            italic: false,
        };
        let plain = mgr.measure_text_width("Success", 10.0, InlineStyle::PLAIN);
        let heavy = mgr.measure_text_width("Success", 10.0, bold);
        assert!(heavy > plain);
    }

    #[test]
    fn word_wrap_basic() {
        let mgr = FontManager::default();
        let lines = wrap_runs(&plain("Hello world foo bar"), 10.0, 50.0, &mgr);
        assert!(lines.len() >= 2, "Expected wrapping, got {:?}", lines);
        for line in &lines {
            assert!(line.width <= 50.0 + 0.01);
        }
        let joined: Vec<String> = lines.iter().map(WrappedLine::text).collect();
        assert_eq!(joined.join(" "), "Hello world foo bar");
    }

    #[test]
    fn short_text_stays_on_one_line() {
        let mgr = FontManager::default();
        let lines = wrap_runs(&plain("Success"), 10.0, 200.0, &mgr);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text(), "Success");
    }

    #[test]
    fn long_word_breaks_between_characters() {
        let mgr = FontManager::default();
        let word = "x".repeat(40);
        let lines = wrap_runs(&plain(&word), 10.0, 40.0, &mgr);
        assert!(lines.len() > 1);
        assert_eq!(lines.iter().map(WrappedLine::text).collect::<String>(), word);
    }

    #[test]
    fn forced_breaks_and_styles() {
        let mgr = FontManager::default();
        let runs = vec![
            TextRun {
                text: "Name:".into(),
                style: InlineStyle {
                    bold: true,
                    italic: false,
                },
            },
            TextRun {
                text: " Alice\nSmith".into(),
                style: InlineStyle::PLAIN,
            },
        ];
        let lines = wrap_runs(&runs, 10.0, 500.0, &mgr);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].segments.len(), 2);
        assert!(lines[0].segments[0].style.bold);
        assert_eq!(lines[0].text(), "Name: Alice");
        assert_eq!(lines[1].text(), "Smith");
    }

    #[test]
    fn narrow_column_puts_one_char_per_line() {
        let mgr = FontManager::default();
        let lines = wrap_runs(&plain("abc de"), 10.0, -7.5, &mgr);
        let texts: Vec<String> = lines.iter().map(WrappedLine::text).collect();
        assert_eq!(texts, ["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn empty_runs_give_no_lines() {
        let mgr = FontManager::default();
        assert!(wrap_runs(&[], 10.0, 100.0, &mgr).is_empty());
    }
}
