//! ASCII85Decode: five characters in `!`..`u` encode four bytes, `z` encodes
//! four zero bytes, `~>` ends the data.
//!
//! PDF Spec: ISO 32000-1:2008, Section 7.4.3

use crate::decoders::StreamDecoder;
use crate::error::{DecodeError, DecodeResult};

/// ASCII85Decode filter.
pub struct Ascii85Decoder;

impl StreamDecoder for Ascii85Decoder {
    fn decode(&self, input: &[u8]) -> DecodeResult<Vec<u8>> {
        let mut output = Vec::with_capacity(input.len() * 4 / 5);
        let mut group = [0u8; 5];
        let mut count = 0usize;

        let body = input.strip_prefix(b"<~").unwrap_or(input);

        for &byte in body {
            match byte {
                b'~' => break,
                b'z' if count == 0 => output.extend_from_slice(&[0, 0, 0, 0]),
                b'z' => {
                    return Err(DecodeError::StreamDecode(
                        "ASCII85Decode: 'z' inside a group".to_string(),
                    ))
                },
                b'!'..=b'u' => {
                    group[count] = byte - b'!';
                    count += 1;
                    if count == 5 {
                        output.extend_from_slice(&group_value(&group)?.to_be_bytes());
                        count = 0;
                    }
                },
                _ if byte.is_ascii_whitespace() => {},
                _ => {
                    return Err(DecodeError::StreamDecode(format!(
                        "ASCII85Decode: invalid character '{}'",
                        byte as char
                    )))
                },
            }
        }

        match count {
            0 => {},
            1 => {
                return Err(DecodeError::StreamDecode(
                    "ASCII85Decode: final group has a single character".to_string(),
                ))
            },
            _ => {
                // Pad a partial group with 'u' and keep count-1 bytes.
                for slot in group.iter_mut().skip(count) {
                    *slot = b'u' - b'!';
                }
                let bytes = group_value(&group)?.to_be_bytes();
                output.extend_from_slice(&bytes[..count - 1]);
            },
        }

        Ok(output)
    }

    fn name(&self) -> &'static str {
        "ASCII85Decode"
    }
}

fn group_value(group: &[u8; 5]) -> DecodeResult<u32> {
    group
        .iter()
        .try_fold(0u32, |acc, &digit| acc.checked_mul(85)?.checked_add(digit as u32))
        .ok_or_else(|| DecodeError::StreamDecode("ASCII85Decode: group overflow".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_and_partial_groups() {
        let out = Ascii85Decoder.decode(b"87cURD]j7BEbo7~>").unwrap();
        assert_eq!(out, b"Hello world");
    }

    #[test]
    fn test_z_shorthand() {
        assert_eq!(Ascii85Decoder.decode(b"z~>").unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_z_inside_group_is_error() {
        assert!(Ascii85Decoder.decode(b"87z~>").is_err());
    }

    #[test]
    fn test_leading_delimiter_and_whitespace() {
        assert_eq!(Ascii85Decoder.decode(b"<~88\n/~>").unwrap(), b"Hi");
    }

    #[test]
    fn test_overflowing_group() {
        assert!(Ascii85Decoder.decode(b"uuuuu~>").is_err());
    }
}
