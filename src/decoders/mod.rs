//! Stream filters needed to read page content.
//!
//! Content streams, object streams and xref streams are almost always
//! FlateDecode, sometimes wrapped in an ASCII encoding. Image-only filters
//! (DCT, JPX, CCITT, JBIG2) never carry text and are reported as unsupported.
//!
//! PDF Spec: ISO 32000-1:2008, Section 7.4 - Filters

use crate::config::DecoderLimits;
use crate::error::{DecodeError, DecodeResult};

mod ascii85;
mod ascii_hex;
mod flate;
mod predictor;
mod runlength;

pub use ascii85::Ascii85Decoder;
pub use ascii_hex::AsciiHexDecoder;
pub use flate::FlateDecoder;
pub use predictor::{apply_predictor, DecodeParams};
pub use runlength::RunLengthDecoder;

/// A single stream filter.
pub trait StreamDecoder {
    /// Decode `input` into a fresh buffer.
    fn decode(&self, input: &[u8]) -> DecodeResult<Vec<u8>>;

    /// Filter name as it appears in `/Filter` (e.g. "FlateDecode").
    fn name(&self) -> &'static str;
}

/// Look up the decoder for a `/Filter` name, accepting the abbreviated
/// names allowed in inline images.
fn decoder_for(filter: &str) -> Option<Box<dyn StreamDecoder>> {
    let decoder: Box<dyn StreamDecoder> = match filter {
        "FlateDecode" | "Fl" => Box::new(FlateDecoder),
        "ASCIIHexDecode" | "AHx" => Box::new(AsciiHexDecoder),
        "ASCII85Decode" | "A85" => Box::new(Ascii85Decoder),
        "RunLengthDecode" | "RL" => Box::new(RunLengthDecoder),
        _ => return None,
    };
    Some(decoder)
}

/// Run `data` through `filters` in order, then undo any predictor.
///
/// Output size is checked against `limits` after every filter so that a
/// small compressed stream cannot expand without bound.
pub fn decode_stream(
    data: &[u8],
    filters: &[String],
    params: Option<&DecodeParams>,
    limits: &DecoderLimits,
) -> DecodeResult<Vec<u8>> {
    let compressed_size = data.len().max(1);
    let mut current = data.to_vec();

    for filter in filters {
        let decoder =
            decoder_for(filter).ok_or_else(|| DecodeError::UnsupportedFilter(filter.clone()))?;
        current = decoder.decode(&current)?;
        log::trace!("{} produced {} bytes", decoder.name(), current.len());

        if limits.max_decompressed_size > 0 && current.len() > limits.max_decompressed_size {
            return Err(DecodeError::StreamDecode(format!(
                "decompressed size {} bytes exceeds limit {} bytes",
                current.len(),
                limits.max_decompressed_size
            )));
        }

        // Small streams legitimately expand by large factors; only police the
        // ratio once the output is past one megabyte.
        let ratio = current.len() / compressed_size;
        if limits.max_decompression_ratio > 0
            && current.len() > 1024 * 1024
            && ratio > limits.max_decompression_ratio as usize
        {
            return Err(DecodeError::StreamDecode(format!(
                "decompression ratio {}:1 exceeds limit {}:1",
                ratio, limits.max_decompression_ratio
            )));
        }
    }

    match params {
        Some(params) if params.predictor > 1 => apply_predictor(&current, params),
        _ => Ok(current),
    }
}
