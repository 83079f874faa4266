//! Cross-reference tables and streams.
//!
//! The xref maps object numbers to byte offsets (or to a slot inside an
//! object stream). Loading starts at `startxref` and follows `/Prev` links
//! back through incremental updates; the newest definition of an object wins.
//!
//! PDF Spec: ISO 32000-1:2008, Section 7.5.4 (tables), 7.5.8 (streams)

use crate::config::DecoderLimits;
use crate::error::{DecodeError, DecodeResult};
use crate::lexer::{token, Token};
use crate::object::{Dict, Object};
use crate::parser::{parse_indirect_object, parse_object};
use std::collections::{HashMap, HashSet};

/// Where an object lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XRefEntry {
    /// Free slot
    Free,
    /// Object at a byte offset in the file
    Uncompressed {
        /// Byte offset of `N G obj`
        offset: usize,
        /// Generation number
        generation: u16,
    },
    /// Object stored inside an object stream
    Compressed {
        /// Object number of the containing `/ObjStm`
        stream_id: u32,
        /// Index within that stream
        index: u32,
    },
}

/// Merged cross-reference data for a document.
#[derive(Debug, Clone, Default)]
pub struct CrossRefTable {
    entries: HashMap<u32, XRefEntry>,
    /// Trailer of the newest section
    pub trailer: Dict,
}

impl CrossRefTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry unless a newer section already defined the object.
    pub fn add_if_absent(&mut self, id: u32, entry: XRefEntry) {
        self.entries.entry(id).or_insert(entry);
    }

    /// Insert or replace an entry.
    pub fn insert(&mut self, id: u32, entry: XRefEntry) {
        self.entries.insert(id, entry);
    }

    /// Entry for an object number.
    pub fn get(&self, id: u32) -> Option<&XRefEntry> {
        self.entries.get(&id)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(id, entry)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &XRefEntry)> {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }

    fn merge_trailer(&mut self, trailer: Dict) {
        for (key, value) in trailer {
            self.trailer.entry(key).or_insert(value);
        }
    }
}

/// Offset given by the last `startxref` in the final 2 KiB of the file.
pub fn find_startxref(data: &[u8]) -> DecodeResult<usize> {
    let tail_start = data.len().saturating_sub(2048);
    let tail = &data[tail_start..];
    let pos = tail
        .windows(b"startxref".len())
        .rposition(|w| w == b"startxref")
        .ok_or(DecodeError::InvalidXref)?;

    match token(&tail[pos + b"startxref".len()..]) {
        Ok((_, Token::Integer(offset))) if offset >= 0 && (offset as usize) < data.len() => {
            Ok(offset as usize)
        },
        _ => Err(DecodeError::InvalidXref),
    }
}

/// Load every xref section reachable from `start`, newest first.
pub fn load_xref(data: &[u8], start: usize, limits: &DecoderLimits) -> DecodeResult<CrossRefTable> {
    let mut table = CrossRefTable::new();
    let mut visited = HashSet::new();
    let mut pending = vec![start];

    while let Some(offset) = pending.pop() {
        if !visited.insert(offset) {
            log::warn!("xref /Prev loop at offset {}", offset);
            continue;
        }
        if visited.len() as u32 > limits.max_recursion_depth {
            return Err(DecodeError::RecursionLimitExceeded(limits.max_recursion_depth));
        }
        if offset >= data.len() {
            return Err(DecodeError::InvalidXref);
        }

        let section = &data[offset..];
        let trailer = if crate::lexer::skip_ws(section).starts_with(b"xref") {
            parse_xref_table(section, &mut table)?
        } else {
            parse_xref_stream(section, &mut table, limits)?
        };

        // /Prev is older than /XRefStm; push it first so the hybrid stream is read next.
        if let Some(prev) = trailer.get("Prev").and_then(Object::as_integer) {
            pending.push(prev.max(0) as usize);
        }
        if let Some(stm) = trailer.get("XRefStm").and_then(Object::as_integer) {
            pending.push(stm.max(0) as usize);
        }
        table.merge_trailer(trailer);
    }

    log::debug!("loaded {} xref entries", table.len());
    Ok(table)
}

/// Classic `xref` table followed by `trailer << ... >>`.
fn parse_xref_table(section: &[u8], table: &mut CrossRefTable) -> DecodeResult<Dict> {
    let (mut input, _) = token(section).map_err(|_| DecodeError::InvalidXref)?;

    loop {
        let (rest, tok) = token(input).map_err(|_| DecodeError::InvalidXref)?;
        match tok {
            Token::Keyword(b"trailer") => {
                let (_, trailer) = parse_object(rest).map_err(|_| DecodeError::InvalidXref)?;
                return match trailer {
                    Object::Dictionary(dict) => Ok(dict),
                    _ => Err(DecodeError::InvalidXref),
                };
            },
            Token::Integer(first) => {
                let (rest, count) = match token(rest) {
                    Ok((rest, Token::Integer(count))) => (rest, count),
                    _ => return Err(DecodeError::InvalidXref),
                };
                input = parse_subsection(rest, first.max(0) as u32, count.max(0) as u32, table)?;
                continue;
            },
            _ => return Err(DecodeError::InvalidXref),
        }
    }
}

fn parse_subsection<'a>(
    mut input: &'a [u8],
    first: u32,
    count: u32,
    table: &mut CrossRefTable,
) -> DecodeResult<&'a [u8]> {
    for i in 0..count {
        let (rest, offset) = match token(input) {
            Ok((rest, Token::Integer(v))) => (rest, v),
            _ => return Err(DecodeError::InvalidXref),
        };
        let (rest, generation) = match token(rest) {
            Ok((rest, Token::Integer(v))) => (rest, v),
            _ => return Err(DecodeError::InvalidXref),
        };
        let (rest, kind) = match token(rest) {
            Ok((rest, Token::Keyword(kind))) => (rest, kind),
            _ => return Err(DecodeError::InvalidXref),
        };
        let entry = match kind {
            b"n" => XRefEntry::Uncompressed {
                offset: offset.max(0) as usize,
                generation: generation.clamp(0, u16::MAX as i64) as u16,
            },
            _ => XRefEntry::Free,
        };
        table.add_if_absent(first.saturating_add(i), entry);
        input = rest;
    }
    Ok(input)
}

/// Cross-reference stream (`/Type /XRef`), PDF 1.5+.
fn parse_xref_stream(
    section: &[u8],
    table: &mut CrossRefTable,
    limits: &DecoderLimits,
) -> DecodeResult<Dict> {
    let (_, (_, stream)) = parse_indirect_object(section).map_err(|_| DecodeError::InvalidXref)?;
    let dict = match &stream {
        Object::Stream { dict, .. } => dict.clone(),
        _ => return Err(DecodeError::InvalidXref),
    };

    let widths: Vec<usize> = dict
        .get("W")
        .and_then(Object::as_array)
        .ok_or(DecodeError::InvalidXref)?
        .iter()
        .map(|w| w.as_integer().unwrap_or(0).max(0) as usize)
        .collect();
    if widths.len() != 3 || widths.iter().any(|&w| w > 8) {
        return Err(DecodeError::InvalidXref);
    }

    let size = dict.get("Size").and_then(Object::as_integer).unwrap_or(0).max(0);
    let index: Vec<i64> = match dict.get("Index").and_then(Object::as_array) {
        Some(arr) => arr.iter().filter_map(Object::as_integer).collect(),
        None => vec![0, size],
    };

    let data = stream.decode_stream_data(limits)?;
    let row_len: usize = widths.iter().sum();
    if row_len == 0 {
        return Err(DecodeError::InvalidXref);
    }
    let mut rows = data.chunks_exact(row_len);

    for range in index.chunks(2) {
        let (first, count) = match range {
            [first, count] => ((*first).max(0) as u32, (*count).max(0) as u32),
            _ => break,
        };
        for i in 0..count {
            let Some(row) = rows.next() else { break };
            let (f1, rest) = row.split_at(widths[0]);
            let (f2, f3) = rest.split_at(widths[1]);
            // A zero-width type field defaults to type 1.
            let kind = if widths[0] == 0 { 1 } else { read_be(f1) };
            let entry = match kind {
                0 => XRefEntry::Free,
                1 => XRefEntry::Uncompressed {
                    offset: read_be(f2) as usize,
                    generation: read_be(f3).min(u16::MAX as u64) as u16,
                },
                2 => XRefEntry::Compressed {
                    stream_id: read_be(f2) as u32,
                    index: read_be(f3) as u32,
                },
                // Unknown types are treated as null references.
                _ => XRefEntry::Free,
            };
            table.add_if_absent(first.saturating_add(i), entry);
        }
    }

    Ok(dict)
}

fn read_be(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_startxref() {
        let data = b"%PDF-1.4\n...\nstartxref\n1234\n%%EOF\n";
        // 1234 is past the end of this tiny buffer.
        assert!(find_startxref(data).is_err());

        let mut data = b"%PDF-1.4\n".to_vec();
        data.extend_from_slice(b"xref\n0 1\n0000000000 65535 f \ntrailer\n<< /Size 1 >>\n");
        data.extend_from_slice(b"startxref\n9\n%%EOF\n");
        assert_eq!(find_startxref(&data).unwrap(), 9);
    }

    #[test]
    fn test_missing_startxref() {
        assert!(matches!(find_startxref(b"%PDF-1.4\n%%EOF"), Err(DecodeError::InvalidXref)));
    }

    #[test]
    fn test_traditional_table() {
        let data = b"xref\n0 3\n0000000000 65535 f \n0000000015 00000 n \n0000000079 00000 n \ntrailer\n<< /Size 3 /Root 1 0 R >>\n";
        let table = load_xref(data, 0, &DecoderLimits::default()).unwrap();
        assert_eq!(table.get(0), Some(&XRefEntry::Free));
        assert_eq!(
            table.get(2),
            Some(&XRefEntry::Uncompressed {
                offset: 79,
                generation: 0
            })
        );
        assert!(table.trailer.contains_key("Root"));
    }

    #[test]
    fn test_multiple_subsections() {
        let data = b"xref\n0 1\n0000000000 65535 f \n5 1\n0000000100 00002 n \ntrailer\n<< /Size 6 >>";
        let table = load_xref(data, 0, &DecoderLimits::default()).unwrap();
        assert_eq!(
            table.get(5),
            Some(&XRefEntry::Uncompressed {
                offset: 100,
                generation: 2
            })
        );
        assert!(table.get(1).is_none());
    }

    #[test]
    fn test_xref_stream() {
        // Three entries, W [1 2 1]: free, offset 0x0010, compressed in stream 7 index 1.
        let rows: [u8; 12] = [0, 0, 0, 0, 1, 0, 0x10, 0, 2, 0, 7, 1];
        let mut data = format!(
            "9 0 obj\n<< /Type /XRef /Size 3 /W [1 2 1] /Root 1 0 R /Length {} >>\nstream\n",
            rows.len()
        )
        .into_bytes();
        data.extend_from_slice(&rows);
        data.extend_from_slice(b"\nendstream\nendobj\n");

        let table = load_xref(&data, 0, &DecoderLimits::default()).unwrap();
        assert_eq!(table.get(0), Some(&XRefEntry::Free));
        assert_eq!(
            table.get(1),
            Some(&XRefEntry::Uncompressed {
                offset: 16,
                generation: 0
            })
        );
        assert_eq!(
            table.get(2),
            Some(&XRefEntry::Compressed {
                stream_id: 7,
                index: 1
            })
        );
    }

    #[test]
    fn test_newest_section_wins() {
        let old = b"xref\n0 2\n0000000000 65535 f \n0000000010 00000 n \ntrailer\n<< /Size 2 /Info 9 0 R >>\n";
        let mut data = old.to_vec();
        let new_offset = data.len();
        data.extend_from_slice(
            b"xref\n1 1\n0000000500 00000 n \ntrailer\n<< /Size 2 /Prev 0 /Root 1 0 R >>\n",
        );
        let table = load_xref(&data, new_offset, &DecoderLimits::default()).unwrap();
        assert_eq!(
            table.get(1),
            Some(&XRefEntry::Uncompressed {
                offset: 500,
                generation: 0
            })
        );
        // Keys missing from the newest trailer are filled from older ones.
        assert!(table.trailer.contains_key("Info"));
        assert!(table.trailer.contains_key("Root"));
    }

    #[test]
    fn test_prev_loop_terminates() {
        let data = b"xref\n0 1\n0000000000 65535 f \ntrailer\n<< /Size 1 /Prev 0 >>\n";
        let table = load_xref(data, 0, &DecoderLimits::default()).unwrap();
        assert_eq!(table.len(), 1);
    }
}
