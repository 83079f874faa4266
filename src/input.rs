//! Input checks that run before any decoding.
//!
//! These mirror what an upload form checks: the file is not empty, it is
//! declared as a PDF, and its bytes start like one.

use crate::error::{Error, Result};
use crate::lexer::is_whitespace;

/// MIME type accepted by [`validate_upload`].
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// How far past leading whitespace the `%PDF-` signature may appear.
const HEADER_WINDOW: usize = 1024;

/// Check that `bytes` looks like a PDF.
///
/// # Errors
///
/// - [`Error::EmptyInput`] for zero bytes
/// - [`Error::UnsupportedFormat`] when no `%PDF-` signature appears within the
///   first 1024 bytes after leading whitespace
///
/// ```
/// use pdf_layout_text::input::validate_pdf_bytes;
///
/// assert!(validate_pdf_bytes(b"%PDF-1.7\n").is_ok());
/// assert!(validate_pdf_bytes(b"PK\x03\x04").is_err());
/// ```
pub fn validate_pdf_bytes(bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        return Err(Error::EmptyInput);
    }

    let start = bytes.iter().position(|&c| !is_whitespace(c)).unwrap_or(bytes.len());
    let window = &bytes[start..bytes.len().min(start + HEADER_WINDOW)];
    if window.windows(5).any(|w| w == b"%PDF-") {
        Ok(())
    } else {
        log::debug!("rejecting input: no PDF signature in the first {} bytes", HEADER_WINDOW);
        Err(Error::UnsupportedFormat(describe_prefix(window)))
    }
}

/// Check an uploaded file: emptiness first, then the declared type, then the bytes.
pub fn validate_upload(bytes: &[u8], mime: Option<&str>) -> Result<()> {
    if bytes.is_empty() {
        return Err(Error::EmptyInput);
    }
    if let Some(mime) = mime {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        if !essence.eq_ignore_ascii_case(PDF_MIME_TYPE) {
            return Err(Error::UnsupportedFormat(format!("declared type {}", essence)));
        }
    }
    validate_pdf_bytes(bytes)
}

fn describe_prefix(window: &[u8]) -> String {
    let prefix: String = window
        .iter()
        .take(8)
        .map(|&b| if b.is_ascii_graphic() { b as char } else { '.' })
        .collect();
    format!("content starting with '{}'", prefix)
}
