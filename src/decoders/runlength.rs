//! RunLengthDecode.
//!
//! A length byte `n` in 0..=127 copies the next `n + 1` bytes, 129..=255
//! repeats the next byte `257 - n` times, and 128 ends the data.
//!
//! PDF Spec: ISO 32000-1:2008, Section 7.4.5

use crate::decoders::StreamDecoder;
use crate::error::{DecodeError, DecodeResult};

/// RunLengthDecode filter.
pub struct RunLengthDecoder;

impl StreamDecoder for RunLengthDecoder {
    fn decode(&self, input: &[u8]) -> DecodeResult<Vec<u8>> {
        let mut output = Vec::new();
        let mut rest = input;

        while let Some((&length, tail)) = rest.split_first() {
            match length {
                0..=127 => {
                    let count = length as usize + 1;
                    if tail.len() < count {
                        return Err(DecodeError::StreamDecode(format!(
                            "RunLengthDecode: literal run needs {} bytes, {} left",
                            count,
                            tail.len()
                        )));
                    }
                    output.extend_from_slice(&tail[..count]);
                    rest = &tail[count..];
                },
                128 => break,
                _ => {
                    let (&byte, tail) = tail.split_first().ok_or_else(|| {
                        DecodeError::StreamDecode("RunLengthDecode: missing repeat byte".to_string())
                    })?;
                    output.resize(output.len() + 257 - length as usize, byte);
                    rest = tail;
                },
            }
        }

        Ok(output)
    }

    fn name(&self) -> &'static str {
        "RunLengthDecode"
    }
}
