//! ToUnicode CMap parser.
//!
//! Only the `bfchar` and `bfrange` sections matter for text extraction;
//! everything else in the CMap program is ignored.
//!
//! ```text
//! beginbfchar
//! <0003> <0020>
//! endbfchar
//! beginbfrange
//! <0010> <0019> <0030>
//! <0020> <0021> [<0066006C> <0066>]
//! endbfrange
//! ```
//!
//! PDF Spec: ISO 32000-1:2008, Section 9.10.3 - ToUnicode CMaps

use crate::lexer::decode_hex;
use regex::bytes::Regex;
use std::collections::HashMap;

/// Character code to Unicode string.
pub type CMap = HashMap<u32, String>;

/// Ranges wider than this are clipped.
const MAX_RANGE: u32 = 0xFFFF;

lazy_static::lazy_static! {
    static ref RE_BFCHAR: Regex =
        Regex::new(r"<([0-9A-Fa-f\s]+)>\s*<([0-9A-Fa-f\s]*)>").expect("valid bfchar regex");
    static ref RE_BFRANGE: Regex = Regex::new(
        r"<([0-9A-Fa-f\s]+)>\s*<([0-9A-Fa-f\s]+)>\s*(?:<([0-9A-Fa-f\s]*)>|\[([^\]]*)\])"
    )
    .expect("valid bfrange regex");
    static ref RE_HEX: Regex = Regex::new(r"<([0-9A-Fa-f\s]*)>").expect("valid hex regex");
}

/// Destination bytes are UTF-16BE; unpaired surrogates become U+FFFD.
fn utf16be(bytes: &[u8]) -> String {
    let units = bytes.chunks(2).map(|pair| match pair {
        [hi, lo] => u16::from_be_bytes([*hi, *lo]),
        [single] => *single as u16,
        _ => 0,
    });
    char::decode_utf16(units)
        .map(|unit| unit.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

fn code_value(bytes: &[u8]) -> u32 {
    bytes.iter().take(4).fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

/// Bytes between each `begin`/`end` marker pair.
fn sections<'a>(data: &'a [u8], begin: &[u8], end: &[u8]) -> Vec<&'a [u8]> {
    let mut found = Vec::new();
    let mut rest = data;
    while let Some(start) = find(rest, begin) {
        let body = &rest[start + begin.len()..];
        match find(body, end) {
            Some(stop) => {
                found.push(&body[..stop]);
                rest = &body[stop + end.len()..];
            },
            None => {
                found.push(body);
                break;
            },
        }
    }
    found
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Parse a decoded ToUnicode stream.
pub fn parse_tounicode_cmap(data: &[u8]) -> CMap {
    let mut cmap = CMap::new();

    for section in sections(data, b"beginbfchar", b"endbfchar") {
        for caps in RE_BFCHAR.captures_iter(section) {
            let src = code_value(&decode_hex(&caps[1]));
            let dst = utf16be(&decode_hex(&caps[2]));
            cmap.insert(src, dst);
        }
    }

    for section in sections(data, b"beginbfrange", b"endbfrange") {
        for caps in RE_BFRANGE.captures_iter(section) {
            let lo = code_value(&decode_hex(&caps[1]));
            let hi = code_value(&decode_hex(&caps[2]));
            if hi < lo {
                continue;
            }
            let hi = hi.min(lo.saturating_add(MAX_RANGE));

            if let Some(dst) = caps.get(3) {
                insert_incrementing(&mut cmap, lo, hi, &decode_hex(dst.as_bytes()));
            } else if let Some(array) = caps.get(4) {
                let targets = RE_HEX.captures_iter(array.as_bytes());
                for (code, target) in (lo..=hi).zip(targets) {
                    cmap.insert(code, utf16be(&decode_hex(&target[1])));
                }
            }
        }
    }

    log::trace!("ToUnicode CMap with {} entries", cmap.len());
    cmap
}

/// `<lo> <hi> <dst>`: each code maps to `dst` with its last byte advanced.
fn insert_incrementing(cmap: &mut CMap, lo: u32, hi: u32, dst: &[u8]) {
    let mut current = dst.to_vec();
    for code in lo..=hi {
        cmap.insert(code, utf16be(&current));
        match current.last_mut() {
            Some(last) if *last < 0xFF => *last += 1,
            Some(last) => {
                // Carry into the previous byte, as most producers expect.
                *last = 0;
                let len = current.len();
                if len >= 2 {
                    current[len - 2] = current[len - 2].wrapping_add(1);
                }
            },
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bfchar() {
        let cmap = parse_tounicode_cmap(b"2 beginbfchar\n<0003> <0020>\n<0024> <0041> endbfchar");
        assert_eq!(cmap.get(&0x03).map(String::as_str), Some(" "));
        assert_eq!(cmap.get(&0x24).map(String::as_str), Some("A"));
    }

    #[test]
    fn test_bfchar_ligature_and_surrogates() {
        let cmap = parse_tounicode_cmap(b"beginbfchar <01> <00660069> <02> <D835DF0C> endbfchar");
        assert_eq!(cmap[&1], "fi");
        assert_eq!(cmap[&2], "\u{1D70C}");
    }

    #[test]
    fn test_bfrange_incrementing() {
        let cmap = parse_tounicode_cmap(b"beginbfrange\n<0010> <0012> <0627>\nendbfrange");
        assert_eq!(cmap[&0x10], "\u{0627}");
        assert_eq!(cmap[&0x11], "\u{0628}");
        assert_eq!(cmap[&0x12], "\u{0629}");
        assert_eq!(cmap.len(), 3);
    }

    #[test]
    fn test_bfrange_array() {
        let cmap = parse_tounicode_cmap(b"beginbfrange <20> <21> [<0066006C> <0041>] endbfrange");
        assert_eq!(cmap[&0x20], "fl");
        assert_eq!(cmap[&0x21], "A");
    }

    #[test]
    fn test_multiple_sections_and_inverted_range() {
        let data = b"beginbfchar <01> <0042> endbfchar\nbeginbfrange <05> <03> <0041> endbfrange\nbeginbfchar <02> <0043> endbfchar";
        let cmap = parse_tounicode_cmap(data);
        assert_eq!(cmap.len(), 2);
        assert_eq!(cmap[&2], "C");
    }

    #[test]
    fn test_empty_cmap() {
        assert!(parse_tounicode_cmap(b"/CIDInit /ProcSet findresource begin end").is_empty());
    }
}
