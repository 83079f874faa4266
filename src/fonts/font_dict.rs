//! Font dictionaries.
//!
//! A [`FontInfo`] knows how to split a shown string into character codes,
//! what Unicode text each code stands for, and how far each glyph advances.
//!
//! Unicode lookup order: the font's ToUnicode CMap, then (simple fonts only)
//! the base encoding patched by `/Differences`.
//!
//! PDF Spec: ISO 32000-1:2008, Sections 9.6 (simple fonts), 9.7 (composite fonts)

use crate::document::PdfDocument;
use crate::error::{DecodeError, DecodeResult};
use crate::fonts::cmap::{parse_tounicode_cmap, CMap};
use crate::fonts::encoding::{glyph_name_to_unicode, BaseEncoding};
use crate::object::{Dict, Object};
use std::collections::HashMap;

/// Helvetica advance widths for codes 32..=126, used when a standard font
/// comes without a `/Widths` array.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 222, 333, 333, 389, 584, 278, 333, 278, 278, // 32-47
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 48-63
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 64-79
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 80-95
    222, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 96-111
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 112-126
];

/// One glyph of a decoded string.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// Character code
    pub code: u32,
    /// Unicode text (empty when unknown)
    pub text: String,
    /// Horizontal advance in text space for a font size of 1
    pub width: f32,
    /// Single-byte code 32, the only code word spacing applies to
    pub is_word_space: bool,
}

/// Parsed font dictionary.
#[derive(Debug, Clone)]
pub struct FontInfo {
    /// `/BaseFont` as written, including any subset tag
    pub base_font: String,
    /// `/BaseFont` without the `ABCDEF+` subset tag
    pub family: String,
    /// `/Subtype`
    pub subtype: String,
    /// Type0 font with two-byte codes
    pub is_composite: bool,
    encoding: Vec<Option<String>>,
    to_unicode: Option<CMap>,
    widths: HashMap<u32, f32>,
    default_width: f32,
    /// Glyph space to text space scale (1/1000 except for Type3 fonts)
    glyph_scale: f32,
    standard_metrics: Option<StandardMetrics>,
}

/// Built-in metrics for simple fonts that omit `/Widths`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StandardMetrics {
    Proportional,
    FixedPitch,
}

/// Strip a six-letter subset tag (`ABCDEF+Helvetica` → `Helvetica`).
pub fn strip_subset_tag(base_font: &str) -> &str {
    match base_font.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase()) => rest,
        _ => base_font,
    }
}

/// `first + index`, or `None` past the end of the code space.
fn offset_code(first: u32, index: usize) -> Option<u32> {
    u32::try_from(index).ok().and_then(|i| first.checked_add(i))
}

fn number_array(obj: Option<Object>) -> Vec<f32> {
    obj.as_ref()
        .and_then(Object::as_array)
        .map(|items| items.iter().map(|o| o.as_number().unwrap_or(0.0) as f32).collect())
        .unwrap_or_default()
}

impl FontInfo {
    /// Load a font from its dictionary, resolving references through `doc`.
    pub fn load(dict: &Dict, doc: &PdfDocument) -> DecodeResult<Self> {
        let base_font = dict
            .get("BaseFont")
            .and_then(Object::as_name)
            .unwrap_or_default()
            .to_string();
        let family = strip_subset_tag(&base_font).to_string();
        let subtype = dict
            .get("Subtype")
            .and_then(Object::as_name)
            .unwrap_or("Type1")
            .to_string();
        let is_composite = subtype == "Type0";

        let to_unicode = match dict.get("ToUnicode") {
            Some(obj) => match doc.resolve(obj)? {
                stream @ Object::Stream { .. } => match stream.decode_stream_data(doc.limits()) {
                    Ok(data) => Some(parse_tounicode_cmap(&data)),
                    Err(e) => {
                        log::warn!("font '{}': unreadable ToUnicode ({})", base_font, e);
                        None
                    },
                },
                _ => None,
            },
            None => None,
        };

        let mut font = FontInfo {
            base_font,
            family,
            subtype,
            is_composite,
            encoding: Vec::new(),
            to_unicode,
            widths: HashMap::new(),
            default_width: 0.0,
            glyph_scale: 0.001,
            standard_metrics: None,
        };

        if is_composite {
            font.load_composite(dict, doc)?;
        } else {
            font.load_simple(dict, doc)?;
        }

        log::debug!(
            "loaded font '{}' ({}, {} widths, ToUnicode: {})",
            font.base_font,
            font.subtype,
            font.widths.len(),
            font.to_unicode.is_some()
        );
        Ok(font)
    }

    /// Stand-in for a font resource that is missing or unreadable: WinAnsi
    /// codes with Helvetica metrics.
    pub fn fallback(name: &str) -> Self {
        FontInfo {
            base_font: name.to_string(),
            family: name.to_string(),
            subtype: "Type1".to_string(),
            is_composite: false,
            encoding: BaseEncoding::WinAnsi.table().iter().map(|c| c.map(String::from)).collect(),
            to_unicode: None,
            widths: HashMap::new(),
            default_width: 0.0,
            glyph_scale: 0.001,
            standard_metrics: Some(StandardMetrics::Proportional),
        }
    }

    fn load_simple(&mut self, dict: &Dict, doc: &PdfDocument) -> DecodeResult<()> {
        if self.subtype == "Type3" {
            let matrix = number_array(dict.get("FontMatrix").map(|m| doc.resolve(m)).transpose()?);
            if let Some(&scale) = matrix.first() {
                self.glyph_scale = scale;
            }
        }

        // Base encoding: TrueType fonts are almost always WinAnsi in practice.
        let default_base = if self.subtype == "TrueType" {
            BaseEncoding::WinAnsi
        } else {
            BaseEncoding::Standard
        };
        let mut base = default_base;
        let mut differences = None;
        match dict.get("Encoding").map(|e| doc.resolve(e)).transpose()? {
            Some(Object::Name(name)) => {
                base = BaseEncoding::from_name(&name).unwrap_or(default_base);
            },
            Some(Object::Dictionary(enc)) => {
                if let Some(name) = enc.get("BaseEncoding").and_then(Object::as_name) {
                    base = BaseEncoding::from_name(name).unwrap_or(default_base);
                }
                differences = enc.get("Differences").map(|d| doc.resolve(d)).transpose()?;
            },
            _ => {},
        }

        self.encoding = base.table().iter().map(|c| c.map(String::from)).collect();
        if let Some(Object::Array(items)) = differences {
            self.apply_differences(&items);
        }

        // Widths: /FirstChar + /Widths, falling back to /MissingWidth.
        // A /FirstChar outside the code space drops the table.
        let first_char = u32::try_from(dict.get("FirstChar").and_then(Object::as_integer).unwrap_or(0).max(0)).ok();
        let widths = dict.get("Widths").map(|w| doc.resolve(w)).transpose()?;
        let has_widths = matches!(widths, Some(Object::Array(_)));
        for (i, width) in number_array(widths).into_iter().enumerate() {
            if let Some(code) = first_char.and_then(|first| offset_code(first, i)) {
                self.widths.insert(code, width * self.glyph_scale);
            }
        }

        let descriptor = match dict.get("FontDescriptor") {
            Some(d) => doc.resolve_dict(d)?,
            None => None,
        };
        if let Some(missing) = descriptor
            .as_ref()
            .and_then(|d| d.get("MissingWidth"))
            .and_then(Object::as_number)
        {
            self.default_width = missing as f32 * self.glyph_scale;
        }

        if !has_widths {
            self.standard_metrics = Some(if self.family.contains("Courier") {
                StandardMetrics::FixedPitch
            } else {
                StandardMetrics::Proportional
            });
        }
        Ok(())
    }

    /// `[code /name /name code /name ...]`
    fn apply_differences(&mut self, items: &[Object]) {
        let mut code: Option<usize> = None;
        for item in items {
            match item {
                Object::Integer(start) => code = usize::try_from(*start).ok(),
                Object::Name(name) => {
                    if let Some(c) = code.filter(|&c| c < 256) {
                        self.encoding[c] = glyph_name_to_unicode(name);
                        code = Some(c + 1);
                    }
                },
                _ => {},
            }
        }
    }

    fn load_composite(&mut self, dict: &Dict, doc: &PdfDocument) -> DecodeResult<()> {
        match dict.get("Encoding").and_then(Object::as_name) {
            Some("Identity-H") | Some("Identity-V") | None => {},
            Some(other) => log::warn!(
                "font '{}': CMap {} read as two-byte identity",
                self.base_font,
                other
            ),
        }

        let descendants = match dict.get("DescendantFonts") {
            Some(d) => doc.resolve(d)?,
            None => Object::Null,
        };
        let descendant = match descendants.as_array().and_then(|a| a.first()) {
            Some(first) => doc.resolve_dict(first)?,
            None => None,
        }
        .ok_or_else(|| DecodeError::Font(format!("Type0 font '{}' has no descendant", self.base_font)))?;

        self.default_width = descendant
            .get("DW")
            .and_then(Object::as_number)
            .unwrap_or(1000.0) as f32
            * self.glyph_scale;

        let w = descendant.get("W").map(|w| doc.resolve(w)).transpose()?;
        if let Some(Object::Array(items)) = w {
            self.load_cid_widths(&items, doc)?;
        }
        Ok(())
    }

    /// `/W`: `c [w1 w2 ...]` or `c_first c_last w`.
    ///
    /// PDF Spec: ISO 32000-1:2008, Section 9.7.4.3
    fn load_cid_widths(&mut self, items: &[Object], doc: &PdfDocument) -> DecodeResult<()> {
        let mut i = 0;
        while i < items.len() {
            let Some(first) = items[i].as_integer().and_then(|c| u32::try_from(c).ok()) else {
                i += 1;
                continue;
            };
            match items.get(i + 1).map(|o| doc.resolve(o)).transpose()? {
                Some(Object::Array(ws)) => {
                    for (offset, w) in ws.iter().enumerate() {
                        if let (Some(w), Some(cid)) = (w.as_number(), offset_code(first, offset)) {
                            self.widths.insert(cid, w as f32 * self.glyph_scale);
                        }
                    }
                    i += 2;
                },
                Some(last) => {
                    let last = last.as_integer().unwrap_or(-1);
                    let width = items.get(i + 2).and_then(Object::as_number);
                    if let Some(width) = width.filter(|_| last >= first as i64) {
                        let last = u32::try_from(last).unwrap_or(u32::MAX).min(first.saturating_add(0xFFFF));
                        for cid in first..=last {
                            self.widths.insert(cid, width as f32 * self.glyph_scale);
                        }
                    }
                    i += 3;
                },
                None => break,
            }
        }
        Ok(())
    }

    /// Unicode text for one character code.
    pub fn unicode(&self, code: u32) -> Option<String> {
        if let Some(text) = self.to_unicode.as_ref().and_then(|cmap| cmap.get(&code)) {
            return Some(text.clone());
        }
        if self.is_composite {
            return None;
        }
        self.encoding.get(code as usize).cloned().flatten()
    }

    /// Advance of one code in text space for a font size of 1.
    pub fn width(&self, code: u32) -> f32 {
        if let Some(&w) = self.widths.get(&code) {
            return w;
        }
        match self.standard_metrics {
            Some(StandardMetrics::FixedPitch) => 0.6,
            Some(StandardMetrics::Proportional) => {
                let ascii = self
                    .unicode(code)
                    .and_then(|t| t.chars().next())
                    .filter(|c| (' '..='~').contains(c));
                match ascii {
                    Some(c) => HELVETICA_WIDTHS[(c as u32 - 32) as usize] as f32 / 1000.0,
                    None => 0.556,
                }
            },
            None => self.default_width,
        }
    }

    /// Split a shown string into glyphs.
    pub fn decode(&self, bytes: &[u8]) -> Vec<Glyph> {
        if self.is_composite {
            bytes
                .chunks(2)
                .map(|pair| {
                    let code = pair.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
                    self.glyph(code, false)
                })
                .collect()
        } else {
            bytes.iter().map(|&b| self.glyph(b as u32, b == b' ')).collect()
        }
    }

    fn glyph(&self, code: u32, is_word_space: bool) -> Glyph {
        Glyph {
            code,
            text: self.unicode(code).unwrap_or_default(),
            width: self.width(code),
            is_word_space,
        }
    }
}
