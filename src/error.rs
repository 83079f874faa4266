//! Error types for PDF text extraction.
//!
//! Two layers: [`Error`] is what callers of the extraction API see, and
//! [`DecodeError`] covers everything that can go wrong while the decoder turns
//! a byte buffer into per-page glyph runs. Any decode failure is fatal for the
//! whole extraction call; there is no partial output.

use crate::analysis::Language;
use crate::object::ObjectRef;

/// Result type alias for the public extraction API.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias used inside the PDF decoder.
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Errors surfaced by the extraction API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Zero-byte input, rejected before decoding is attempted.
    #[error("Input is empty (0 bytes)")]
    EmptyInput,

    /// Input is not a PDF container, rejected before decoding is attempted.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The decoder could not produce a page stream.
    #[error("Failed to decode PDF: {0}")]
    Decode(#[from] DecodeError),
}

impl Error {
    /// Generic, localized message suitable for showing to an end user.
    ///
    /// Every decode failure collapses to the same "failed to read file" text;
    /// the detailed cause stays available through `Display` for logs.
    pub fn user_message(&self, language: Language) -> &'static str {
        match (self, language) {
            (Error::EmptyInput, Language::Arabic) => {
                "عذراً، الملف الذي اخترته فارغ (0 bytes). يرجى التأكد من صلاحية الملف."
            },
            (Error::EmptyInput, Language::English) => {
                "Sorry, the selected file is empty (0 bytes). Please check the file."
            },
            (Error::UnsupportedFormat(_), Language::Arabic) => "يرجى رفع ملف PDF فقط",
            (Error::UnsupportedFormat(_), Language::English) => "Please upload a PDF file only",
            (Error::Decode(_), Language::Arabic) => "فشل في قراءة ملف PDF.",
            (Error::Decode(_), Language::English) => "Failed to read PDF file.",
        }
    }

    /// True if the error was raised by input validation rather than the decoder.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::EmptyInput | Error::UnsupportedFormat(_))
    }
}

/// Failures of the PDF decoder.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum DecodeError {
    /// Invalid PDF header (expected '%PDF-')
    #[error("Invalid PDF header: expected '%PDF-', found '{0}'")]
    InvalidHeader(String),

    /// Unsupported PDF version
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Invalid cross-reference table
    #[error("Invalid cross-reference table")]
    InvalidXref,

    /// Object has wrong type
    #[error("Invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Expected object type
        expected: String,
        /// Actual object type found
        found: String,
    },

    /// IO error while reading a file from disk
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Structurally invalid document
    #[error("Invalid PDF structure: {0}")]
    InvalidPdf(String),

    /// Stream filter failed
    #[error("Stream decode error: {0}")]
    StreamDecode(String),

    /// Stream uses a filter the decoder does not implement
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// Font dictionary could not be interpreted
    #[error("Font error: {0}")]
    Font(String),

    /// Document is encrypted; decryption is not supported
    #[error("Document is encrypted")]
    Encrypted,

    /// Object graph contains a reference cycle
    #[error("Circular reference detected: {0}")]
    CircularReference(ObjectRef),

    /// Object resolution nested too deeply
    #[error("Recursion depth limit exceeded: {0}")]
    RecursionLimitExceeded(u32),

    /// Page number outside `1..=count`
    #[error("Page {page} out of range (document has {count} pages)")]
    PageOutOfRange {
        /// Requested 1-based page number
        page: usize,
        /// Number of pages in the document
        count: usize,
    },
}
