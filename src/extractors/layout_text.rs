//! Layout-aware text reconstruction.
//!
//! Rebuilds line breaks, column gaps, word spaces and bold/italic markup from
//! a page's positioned glyph runs. No layout metadata is available; every
//! decision comes from the geometry of consecutive runs compared with the
//! font-height proxy `h = |transform[3]|`:
//!
//! | condition (strict)       | separator |
//! |--------------------------|-----------|
//! | `dy > 0.6·h`             | `\n`      |
//! | `dx > 2·h`               | `\t`      |
//! | `dx > 0.2·h`             | ` `       |
//! | otherwise                | nothing   |
//!
//! Runs are never reordered; only whitespace and emphasis markers are added.

use crate::config::{ExtractionConfig, LayoutThresholds};
use crate::document::PdfDocument;
use crate::error::{DecodeResult, Result};
use crate::input::validate_pdf_bytes;
use std::collections::HashMap;

/// Vertical jump, relative to font height, that starts a new line.
pub const LINE_BREAK_RATIO: f32 = 0.6;

/// Horizontal gap, relative to font height, rendered as a tab.
pub const COLUMN_BREAK_RATIO: f32 = 2.0;

/// Horizontal gap, relative to font height, rendered as a space.
pub const WORD_SPACE_RATIO: f32 = 0.2;

/// Affine transform `[scaleX, skewY, skewX, scaleY, translateX, translateY]`.
pub type Transform = [f32; 6];

/// One positioned piece of text as produced by a decoder.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GlyphRun {
    /// Decoded text; may be empty or whitespace only
    pub text: String,
    /// Text rendering matrix, if the decoder knows where the run sits
    pub transform: Option<Transform>,
    /// Horizontal advance in user space
    pub width: Option<f32>,
    /// Font resource name, key into [`PageContent::fonts`]
    pub font_id: Option<String>,
}

impl GlyphRun {
    /// A run with text and position only.
    pub fn new(text: impl Into<String>, transform: Transform) -> Self {
        Self {
            text: text.into(),
            transform: Some(transform),
            ..Self::default()
        }
    }

    /// Set the advance width.
    pub fn with_width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }

    /// Set the font resource name.
    pub fn with_font(mut self, font_id: impl Into<String>) -> Self {
        self.font_id = Some(font_id.into());
        self
    }

    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Where the next run would start if it continued this one.
    fn end_position(&self) -> Option<(f32, f32)> {
        self.transform
            .map(|t| (t[4] + self.width.unwrap_or(0.0), t[5]))
    }
}

/// Font information the extractor needs: the family name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FontDescriptor {
    /// Family name, which often carries style hints ("Arial-BoldMT")
    pub family: String,
}

impl FontDescriptor {
    /// Descriptor for a family name.
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
        }
    }
}

/// Everything the extractor reads for one page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageContent {
    /// Runs in content-stream order
    pub runs: Vec<GlyphRun>,
    /// Font resource name to descriptor
    pub fonts: HashMap<String, FontDescriptor>,
}

/// A decoded document, read page by page.
///
/// Implemented by [`PdfDocument`]; tests and callers with their own decoder
/// can supply any other source.
pub trait PageSource {
    /// Number of pages.
    fn page_count(&mut self) -> DecodeResult<usize>;

    /// Glyph runs and fonts of a 1-based page.
    fn page_content(&mut self, page_number: usize) -> DecodeResult<PageContent>;
}

/// End position of the previous positioned run on the current page.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CursorState(Option<(f32, f32)>);

impl CursorState {
    /// Cursor at the start of a page.
    pub fn unset() -> Self {
        Self(None)
    }

    /// The last end position, if any run has set one.
    pub fn position(&self) -> Option<(f32, f32)> {
        self.0
    }

    fn advance_to(&mut self, position: (f32, f32)) {
        self.0 = Some(position);
    }

    /// Separator to put before a run starting at `(x, y)` with height `h`.
    pub fn separator(&self, x: f32, y: f32, h: f32, thresholds: &LayoutThresholds) -> &'static str {
        let Some((last_x, last_y)) = self.0 else {
            return "";
        };
        if (y - last_y).abs() > thresholds.line_break * h {
            "\n"
        } else if x - last_x > thresholds.column_break * h {
            "\t"
        } else if x - last_x > thresholds.word_space * h {
            " "
        } else {
            ""
        }
    }
}

/// Emphasis guessed from a font name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    /// No markup
    Regular,
    /// `**text**`
    Bold,
    /// `*text*`
    Italic,
    /// `***text***`
    BoldItalic,
}

const BOLD_HINTS: [&str; 4] = ["bold", "black", "heavy", "bd"];
const ITALIC_HINTS: [&str; 3] = ["italic", "oblique", "it"];

impl Emphasis {
    /// Classify a font string (family name followed by resource name).
    ///
    /// A plain substring test on English style words, so it also fires on
    /// names like "Digital" and misses styles spelled in other languages.
    pub fn detect(font_string: &str) -> Emphasis {
        let lowered = font_string.to_lowercase();
        let bold = BOLD_HINTS.iter().any(|hint| lowered.contains(hint));
        let italic = ITALIC_HINTS.iter().any(|hint| lowered.contains(hint));
        match (bold, italic) {
            (true, true) => Emphasis::BoldItalic,
            (true, false) => Emphasis::Bold,
            (false, true) => Emphasis::Italic,
            (false, false) => Emphasis::Regular,
        }
    }

    /// Wrap text in markdown emphasis.
    pub fn wrap(self, text: &str) -> String {
        let marker = match self {
            Emphasis::Regular => return text.to_string(),
            Emphasis::Bold => "**",
            Emphasis::Italic => "*",
            Emphasis::BoldItalic => "***",
        };
        format!("{marker}{text}{marker}")
    }
}

fn emphasis_for(run: &GlyphRun, fonts: &HashMap<String, FontDescriptor>) -> Emphasis {
    match &run.font_id {
        Some(font_id) => {
            let family = fonts.get(font_id).map(|f| f.family.as_str()).unwrap_or_default();
            Emphasis::detect(&format!("{family}{font_id}"))
        },
        None => Emphasis::Regular,
    }
}

/// Rebuild the text of one page.
pub fn reconstruct_page(content: &PageContent, thresholds: &LayoutThresholds) -> String {
    let mut cursor = CursorState::unset();
    let mut out = String::new();

    for run in &content.runs {
        if run.is_blank() {
            // Blank runs only move the cursor.
            if let Some(end) = run.end_position() {
                cursor.advance_to(end);
            }
            continue;
        }

        let text = emphasis_for(run, &content.fonts).wrap(&run.text);
        let separator = match run.transform {
            Some(t) => cursor.separator(t[4], t[5], t[3].abs(), thresholds),
            None => " ",
        };

        #[cfg(feature = "logging")]
        log::trace!("run {:?} at {:?} -> separator {:?}", run.text, run.transform, separator);

        out.push_str(separator);
        out.push_str(&text);
        if let Some(end) = run.end_position() {
            cursor.advance_to(end);
        }
    }
    out
}

/// Header line put before each page.
pub fn page_marker(page_number: usize) -> String {
    format!("--- Page {page_number} ---")
}

/// Extract all pages of `source`.
///
/// `progress` receives `floor(i * 100 / n)` after page `i` of `n`. A failing
/// page aborts the whole extraction; no partial text is returned.
pub fn extract_text<S, F>(source: &mut S, config: &ExtractionConfig, mut progress: F) -> Result<String>
where
    S: PageSource + ?Sized,
    F: FnMut(u8),
{
    let page_count = source.page_count()?;
    log::debug!("extracting {} pages", page_count);

    let mut text = String::new();
    for page_number in 1..=page_count {
        let content = source.page_content(page_number)?;
        log::debug!("page {}: {} runs, {} fonts", page_number, content.runs.len(), content.fonts.len());

        let page_text = reconstruct_page(&content, &config.thresholds);
        text.push_str(&page_marker(page_number));
        text.push('\n');
        text.push_str(&page_text);
        text.push_str("\n\n");

        let percent = (page_number * 100 / page_count) as u8;
        log::trace!("progress {}%", percent);
        progress(percent);
    }
    Ok(text)
}

/// Text of a whole document together with its page count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractResult {
    /// Concatenated page texts with page markers
    pub text: String,
    /// Number of pages in the document
    pub page_count: usize,
}

/// Validate, decode and extract a PDF held in memory with default settings.
pub fn extract_text_from_bytes<F>(bytes: &[u8], progress: F) -> Result<ExtractResult>
where
    F: FnMut(u8),
{
    extract_text_from_bytes_with_config(bytes, &ExtractionConfig::default(), progress)
}

/// Validate, decode and extract a PDF held in memory.
pub fn extract_text_from_bytes_with_config<F>(
    bytes: &[u8],
    config: &ExtractionConfig,
    progress: F,
) -> Result<ExtractResult>
where
    F: FnMut(u8),
{
    validate_pdf_bytes(bytes)?;
    let mut doc = PdfDocument::from_bytes_with_limits(bytes.to_vec(), config.limits)?;
    let page_count = doc.page_count();
    let text = extract_text(&mut doc, config, progress)?;
    Ok(ExtractResult { text, page_count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, Error};

    const H: f32 = 10.0;

    fn at(text: &str, x: f32, y: f32) -> GlyphRun {
        GlyphRun::new(text, [H, 0.0, 0.0, H, x, y])
    }

    fn page(runs: Vec<GlyphRun>) -> PageContent {
        PageContent {
            runs,
            fonts: HashMap::new(),
        }
    }

    fn rebuild(runs: Vec<GlyphRun>) -> String {
        reconstruct_page(&page(runs), &LayoutThresholds::default())
    }

    #[test]
    fn test_first_run_has_no_prefix() {
        assert_eq!(rebuild(vec![at("Hello", 0.0, 100.0)]), "Hello");
    }

    #[test]
    fn test_line_break_is_strict() {
        // 0.6 * 10 = 6: exactly 6 stays on the line, 6.5 breaks.
        let same = rebuild(vec![at("a", 0.0, 100.0).with_width(5.0), at("b", 5.0, 94.0)]);
        assert_eq!(same, "ab");
        let next = rebuild(vec![at("a", 0.0, 100.0).with_width(5.0), at("b", 5.0, 93.5)]);
        assert_eq!(next, "a\nb");
    }

    #[test]
    fn test_horizontal_gaps() {
        let runs = |gap: f32| vec![at("a", 0.0, 0.0).with_width(10.0), at("b", 10.0 + gap, 0.0)];
        assert_eq!(rebuild(runs(2.0)), "ab");
        assert_eq!(rebuild(runs(2.5)), "a b");
        assert_eq!(rebuild(runs(20.0)), "a b");
        assert_eq!(rebuild(runs(20.5)), "a\tb");
        // Overlapping runs never get a separator.
        assert_eq!(rebuild(runs(-4.0)), "ab");
    }

    #[test]
    fn test_blank_run_moves_cursor() {
        let runs = vec![
            at("a", 0.0, 0.0).with_width(10.0),
            at("   ", 40.0, 0.0).with_width(10.0),
            at("b", 51.0, 0.0),
        ];
        // Relative to the blank run the gap is 1 (< 2), so no separator.
        assert_eq!(rebuild(runs), "ab");
    }

    #[test]
    fn test_blank_run_without_transform_changes_nothing() {
        let blank = GlyphRun {
            text: " ".into(),
            ..GlyphRun::default()
        };
        let runs = vec![at("a", 0.0, 0.0).with_width(10.0), blank, at("b", 15.0, 0.0)];
        assert_eq!(rebuild(runs), "a b");
    }

    #[test]
    fn test_missing_transform_gets_one_space() {
        let loose = GlyphRun {
            text: "x".into(),
            ..GlyphRun::default()
        };
        assert_eq!(rebuild(vec![loose.clone()]), " x");
        // The cursor is left where it was.
        let runs = vec![at("a", 0.0, 0.0).with_width(10.0), loose, at("b", 10.0, 0.0)];
        assert_eq!(rebuild(runs), "a xb");
    }

    #[test]
    fn test_negative_height_uses_absolute_value() {
        let flipped = |text: &str, x: f32| GlyphRun::new(text, [H, 0.0, 0.0, -H, x, 0.0]);
        let runs = vec![flipped("a", 0.0).with_width(10.0), flipped("b", 13.0)];
        assert_eq!(rebuild(runs), "a b");
    }

    #[test]
    fn test_emphasis_detection() {
        assert_eq!(Emphasis::detect("Arial-BoldMTF1"), Emphasis::Bold);
        assert_eq!(Emphasis::detect("Helvetica-ObliqueF2"), Emphasis::Italic);
        assert_eq!(Emphasis::detect("Times-BoldItalicF3"), Emphasis::BoldItalic);
        assert_eq!(Emphasis::detect("ArialBdF4"), Emphasis::Bold);
        assert_eq!(Emphasis::detect("Roboto-BlackF5"), Emphasis::Bold);
        assert_eq!(Emphasis::detect("HelveticaF1"), Emphasis::Regular);
        // Keyword matching is script-blind.
        assert_eq!(Emphasis::detect("Amiri-RegularF1"), Emphasis::Regular);
    }

    #[test]
    fn test_emphasis_wrap() {
        assert_eq!(Emphasis::Regular.wrap("x"), "x");
        assert_eq!(Emphasis::Bold.wrap("x"), "**x**");
        assert_eq!(Emphasis::Italic.wrap("x"), "*x*");
        assert_eq!(Emphasis::BoldItalic.wrap("x"), "***x***");
    }

    #[test]
    fn test_emphasis_needs_font_id() {
        let mut content = page(vec![
            at("bold", 0.0, 0.0).with_width(20.0).with_font("F1"),
            at("plain", 25.0, 0.0).with_width(20.0),
        ]);
        content.fonts.insert("F1".into(), FontDescriptor::new("Arial-BoldMT"));
        assert_eq!(reconstruct_page(&content, &LayoutThresholds::default()), "**bold** plain");
    }

    #[test]
    fn test_unknown_font_id_still_checked() {
        let content = page(vec![at("x", 0.0, 0.0).with_font("Italic1")]);
        assert_eq!(reconstruct_page(&content, &LayoutThresholds::default()), "*x*");
    }

    #[test]
    fn test_custom_thresholds() {
        let wide = LayoutThresholds {
            word_space: 1.0,
            ..LayoutThresholds::default()
        };
        let content = page(vec![at("a", 0.0, 0.0).with_width(10.0), at("b", 15.0, 0.0)]);
        assert_eq!(reconstruct_page(&content, &wide), "ab");
    }

    struct Pages(Vec<PageContent>);

    impl PageSource for Pages {
        fn page_count(&mut self) -> DecodeResult<usize> {
            Ok(self.0.len())
        }

        fn page_content(&mut self, page_number: usize) -> DecodeResult<PageContent> {
            self.0
                .get(page_number - 1)
                .cloned()
                .ok_or(DecodeError::PageOutOfRange {
                    page: page_number,
                    count: self.0.len(),
                })
        }
    }

    #[test]
    fn test_two_page_document() {
        let mut source = Pages(vec![
            page(vec![at("r1", 0.0, 700.0).with_width(20.0), at("r2", 35.0, 700.0)]),
            page(vec![at("r1", 0.0, 690.0)]),
        ]);
        let mut reported = Vec::new();
        let text = extract_text(&mut source, &ExtractionConfig::default(), |p| reported.push(p)).unwrap();
        assert_eq!(text, "--- Page 1 ---\nr1 r2\n\n--- Page 2 ---\nr1\n\n");
        assert_eq!(reported, vec![50, 100]);
    }

    #[test]
    fn test_progress_floors() {
        let mut source = Pages(vec![PageContent::default(); 3]);
        let mut reported = Vec::new();
        extract_text(&mut source, &ExtractionConfig::default(), |p| reported.push(p)).unwrap();
        assert_eq!(reported, vec![33, 66, 100]);
    }

    struct Broken;

    impl PageSource for Broken {
        fn page_count(&mut self) -> DecodeResult<usize> {
            Err(DecodeError::InvalidHeader("junk".into()))
        }

        fn page_content(&mut self, _: usize) -> DecodeResult<PageContent> {
            unreachable!()
        }
    }

    #[test]
    fn test_decode_failure_reports_no_progress() {
        let mut calls = 0;
        let result = extract_text(&mut Broken, &ExtractionConfig::default(), |_| calls += 1);
        assert!(matches!(result, Err(Error::Decode(DecodeError::InvalidHeader(_)))));
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_failing_page_aborts() {
        struct FailsOnTwo;
        impl PageSource for FailsOnTwo {
            fn page_count(&mut self) -> DecodeResult<usize> {
                Ok(3)
            }
            fn page_content(&mut self, page_number: usize) -> DecodeResult<PageContent> {
                match page_number {
                    2 => Err(DecodeError::StreamDecode("bad".into())),
                    _ => Ok(PageContent::default()),
                }
            }
        }
        let mut reported = Vec::new();
        let result = extract_text(&mut FailsOnTwo, &ExtractionConfig::default(), |p| reported.push(p));
        assert!(result.is_err());
        assert_eq!(reported, vec![33]);
    }

    #[test]
    fn test_empty_bytes_are_rejected_before_decoding() {
        assert!(matches!(extract_text_from_bytes(&[], |_| {}), Err(Error::EmptyInput)));
    }

    #[test]
    fn test_page_marker() {
        assert_eq!(page_marker(12), "--- Page 12 ---");
    }
}
