//! FlateDecode via `flate2`.
//!
//! Real-world generators emit broken zlib wrappers often enough that a strict
//! decoder loses text. Recovery order: zlib, raw deflate, then whatever bytes
//! were produced before the corruption.
//!
//! PDF Spec: ISO 32000-1:2008, Section 7.4.4

use crate::decoders::StreamDecoder;
use crate::error::{DecodeError, DecodeResult};
use flate2::read::{DeflateDecoder, ZlibDecoder};
use std::io::Read;

/// FlateDecode filter.
pub struct FlateDecoder;

impl StreamDecoder for FlateDecoder {
    fn decode(&self, input: &[u8]) -> DecodeResult<Vec<u8>> {
        let mut output = Vec::new();
        let zlib_err = match ZlibDecoder::new(input).read_to_end(&mut output) {
            Ok(_) => return Ok(output),
            Err(e) => e,
        };

        if !output.is_empty() {
            log::warn!(
                "FlateDecode: keeping {} bytes decoded before corruption ({})",
                output.len(),
                zlib_err
            );
            return Ok(output);
        }

        log::debug!("FlateDecode: zlib failed ({}), trying raw deflate", zlib_err);
        let mut raw = Vec::new();
        let raw_result = DeflateDecoder::new(input).read_to_end(&mut raw);
        if raw_result.is_ok() || !raw.is_empty() {
            return Ok(raw);
        }

        // A damaged two-byte zlib header in front of valid deflate data.
        if input.len() > 2 {
            raw.clear();
            let skipped = DeflateDecoder::new(&input[2..]).read_to_end(&mut raw);
            if skipped.is_ok() && !raw.is_empty() {
                log::debug!("FlateDecode: recovered {} bytes past a bad header", raw.len());
                return Ok(raw);
            }
        }

        Err(DecodeError::StreamDecode(format!("FlateDecode: {}", zlib_err)))
    }

    fn name(&self) -> &'static str {
        "FlateDecode"
    }
}
