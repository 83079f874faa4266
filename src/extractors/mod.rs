//! Text extraction from PDF documents.
//!
//! [`glyph_runs`] interprets content streams into positioned runs;
//! [`layout_text`] turns those runs back into lines, columns and words.

pub mod glyph_runs;
pub mod layout_text;

pub use glyph_runs::GlyphRunCollector;
pub use layout_text::{
    extract_text, extract_text_from_bytes, extract_text_from_bytes_with_config, page_marker,
    reconstruct_page, CursorState, Emphasis, ExtractResult, FontDescriptor, GlyphRun, PageContent,
    PageSource, Transform, COLUMN_BREAK_RATIO, LINE_BREAK_RATIO, WORD_SPACE_RATIO,
};
