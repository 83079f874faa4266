// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::enum_variant_names)]
#![allow(clippy::upper_case_acronyms)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # pdf_layout_text
//!
//! Layout-aware text extraction from PDF files.
//!
//! A PDF stores text as positioned glyph runs, not as lines and paragraphs.
//! This crate decodes each page into runs and rebuilds readable text from
//! their geometry: vertical jumps become line breaks, wide horizontal gaps
//! become tabs, narrow gaps become spaces, and bold or italic fonts are
//! marked up with Markdown emphasis.
//!
//! ## Pipeline
//!
//! 1. [`input`] rejects empty or non-PDF input before decoding
//! 2. [`document::PdfDocument`] parses the file (xref, object streams, page tree)
//! 3. [`extractors::glyph_runs`] interprets content streams into glyph runs
//! 4. [`extractors::layout_text`] turns runs into text, one block per page
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdf_layout_text::extract_text_from_bytes;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("book.pdf")?;
//! let result = extract_text_from_bytes(&bytes, |percent| eprintln!("{percent}%"))?;
//! println!("{} pages", result.page_count);
//! print!("{}", result.text);
//! # Ok(())
//! # }
//! ```
//!
//! Output for each page is `--- Page N ---`, a newline, the page text and a
//! blank line.
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 (<http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license (<http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Core PDF parsing
pub mod document;
pub mod lexer;
pub mod object;
pub mod objstm;
pub mod parser;
pub mod xref;
pub mod xref_reconstruction;

// Stream decoders
pub mod decoders;

// Text extraction
pub mod content;
pub mod extractors;
pub mod fonts;

// Input validation
pub mod input;

// Configuration
pub mod config;

// Analysis data contract
pub mod analysis;

// Re-exports
pub use analysis::Language;
pub use config::{DecoderLimits, ExtractionConfig, LayoutThresholds};
pub use document::PdfDocument;
pub use error::{DecodeError, Error, Result};
pub use extractors::{
    extract_text, extract_text_from_bytes, extract_text_from_bytes_with_config, ExtractResult,
    GlyphRun, PageContent, PageSource,
};
pub use input::{validate_pdf_bytes, validate_upload};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        // VERSION is populated from CARGO_PKG_VERSION at compile time
        assert!(VERSION.starts_with("0."));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "pdf_layout_text");
    }
}
