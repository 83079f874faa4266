//! ASCIIHexDecode: pairs of hex digits, whitespace ignored, `>` ends the data.
//!
//! PDF Spec: ISO 32000-1:2008, Section 7.4.2

use crate::decoders::StreamDecoder;
use crate::error::{DecodeError, DecodeResult};

/// ASCIIHexDecode filter.
pub struct AsciiHexDecoder;

impl StreamDecoder for AsciiHexDecoder {
    fn decode(&self, input: &[u8]) -> DecodeResult<Vec<u8>> {
        let mut output = Vec::with_capacity(input.len() / 2);
        let mut pending: Option<u8> = None;

        for &byte in input {
            if byte == b'>' {
                break;
            }
            if byte.is_ascii_whitespace() {
                continue;
            }
            let nibble = hex_value(byte).ok_or_else(|| {
                DecodeError::StreamDecode(format!(
                    "ASCIIHexDecode: invalid hex digit '{}'",
                    byte as char
                ))
            })?;
            match pending.take() {
                Some(high) => output.push((high << 4) | nibble),
                None => pending = Some(nibble),
            }
        }

        // An odd final digit behaves as if followed by 0.
        if let Some(high) = pending {
            output.push(high << 4);
        }

        Ok(output)
    }

    fn name(&self) -> &'static str {
        "ASCIIHexDecode"
    }
}

fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_with_whitespace_and_end_marker() {
        let out = AsciiHexDecoder.decode(b"48 65\n6c 6C 6f> trailing").unwrap();
        assert_eq!(out, b"Hello");
    }

    #[test]
    fn test_odd_length_pads_with_zero() {
        assert_eq!(AsciiHexDecoder.decode(b"414").unwrap(), vec![0x41, 0x40]);
    }

    #[test]
    fn test_invalid_digit() {
        assert!(AsciiHexDecoder.decode(b"4G").is_err());
    }

    #[test]
    fn test_empty_input() {
        assert!(AsciiHexDecoder.decode(b">").unwrap().is_empty());
    }
}
