//! PNG and TIFF predictors applied after FlateDecode.
//!
//! Cross-reference streams are nearly always written with PNG Up (12), so this
//! matters for opening PDF 1.5+ files at all.
//!
//! PDF Spec: ISO 32000-1:2008, Section 7.4.4.4

use crate::error::{DecodeError, DecodeResult};

/// Predictor parameters from `/DecodeParms`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeParams {
    /// 1 = none, 2 = TIFF, 10..=15 = PNG
    pub predictor: i64,
    /// Samples per row
    pub columns: usize,
    /// Components per sample
    pub colors: usize,
    /// Bits per component
    pub bits_per_component: usize,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            columns: 1,
            colors: 1,
            bits_per_component: 8,
        }
    }
}

impl DecodeParams {
    /// Bytes of sample data per row, excluding any PNG tag byte.
    pub fn row_bytes(&self) -> usize {
        (self.columns * self.colors * self.bits_per_component).div_ceil(8)
    }

    /// Bytes per complete sample, at least one.
    fn sample_bytes(&self) -> usize {
        (self.colors * self.bits_per_component).div_ceil(8).max(1)
    }
}

/// Undo the predictor described by `params`.
pub fn apply_predictor(data: &[u8], params: &DecodeParams) -> DecodeResult<Vec<u8>> {
    match params.predictor {
        1 => Ok(data.to_vec()),
        2 => Ok(undo_tiff(data, params)),
        10..=15 => undo_png(data, params),
        other => Err(DecodeError::StreamDecode(format!("unsupported predictor {}", other))),
    }
}

fn undo_tiff(data: &[u8], params: &DecodeParams) -> Vec<u8> {
    let row_len = params.row_bytes().max(1);
    let bpp = params.sample_bytes();
    let mut output = data.to_vec();
    for row in output.chunks_mut(row_len) {
        for i in bpp..row.len() {
            row[i] = row[i].wrapping_add(row[i - bpp]);
        }
    }
    output
}

fn undo_png(data: &[u8], params: &DecodeParams) -> DecodeResult<Vec<u8>> {
    let row_len = params.row_bytes();
    let bpp = params.sample_bytes();
    let stride = row_len + 1;

    let mut output = Vec::with_capacity(data.len() / stride * row_len);
    let mut previous = vec![0u8; row_len];

    for encoded in data.chunks(stride) {
        let (&tag, samples) = match encoded.split_first() {
            Some(split) => split,
            None => break,
        };
        let mut row = samples.to_vec();

        for i in 0..row.len() {
            let left = if i >= bpp { row[i - bpp] } else { 0 };
            let up = previous[i];
            let up_left = if i >= bpp { previous[i - bpp] } else { 0 };
            let predicted = match tag {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((left as u16 + up as u16) / 2) as u8,
                4 => paeth(left, up, up_left),
                _ => {
                    return Err(DecodeError::StreamDecode(format!(
                        "invalid PNG predictor tag {}",
                        tag
                    )))
                },
            };
            row[i] = row[i].wrapping_add(predicted);
        }

        previous[..row.len()].copy_from_slice(&row);
        output.extend_from_slice(&row);
    }

    Ok(output)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}
