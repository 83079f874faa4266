//! Simple-font encodings and glyph names.
//!
//! A simple font maps each single-byte code to a glyph name through a base
//! encoding, optionally patched by a `/Differences` array. Glyph names are
//! turned into Unicode through the Adobe Glyph List conventions.
//!
//! PDF Spec: ISO 32000-1:2008, Section 9.6.6 and Annex D

use phf::phf_map;

/// Base encodings a simple font can name in `/Encoding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseEncoding {
    /// StandardEncoding (Type 1 default)
    Standard,
    /// WinAnsiEncoding (Windows code page 1252)
    WinAnsi,
    /// MacRomanEncoding
    MacRoman,
}

impl BaseEncoding {
    /// Encoding for a `/BaseEncoding` or `/Encoding` name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "StandardEncoding" => Some(BaseEncoding::Standard),
            "WinAnsiEncoding" => Some(BaseEncoding::WinAnsi),
            "MacRomanEncoding" => Some(BaseEncoding::MacRoman),
            // Expert sets only cover small caps and old-style figures.
            "MacExpertEncoding" => Some(BaseEncoding::Standard),
            _ => None,
        }
    }

    /// Unicode for a single-byte code.
    pub fn decode(self, code: u8) -> Option<char> {
        match self {
            BaseEncoding::Standard => standard(code),
            BaseEncoding::WinAnsi => win_ansi(code),
            BaseEncoding::MacRoman => mac_roman(code),
        }
    }

    /// Full 256-entry table.
    pub fn table(self) -> [Option<char>; 256] {
        let mut table = [None; 256];
        for (code, slot) in table.iter_mut().enumerate() {
            *slot = self.decode(code as u8);
        }
        table
    }
}

fn printable_ascii(code: u8) -> Option<char> {
    (0x20..0x7F).contains(&code).then_some(code as char)
}

fn standard(code: u8) -> Option<char> {
    let c = match code {
        0x27 => '\u{2019}',
        0x60 => '\u{2018}',
        0x20..=0x7E => code as char,
        0xA1 => '\u{00A1}',
        0xA2 => '\u{00A2}',
        0xA3 => '\u{00A3}',
        0xA4 => '\u{2044}',
        0xA5 => '\u{00A5}',
        0xA6 => '\u{0192}',
        0xA7 => '\u{00A7}',
        0xA8 => '\u{00A4}',
        0xA9 => '\'',
        0xAA => '\u{201C}',
        0xAB => '\u{00AB}',
        0xAC => '\u{2039}',
        0xAD => '\u{203A}',
        0xAE => '\u{FB01}',
        0xAF => '\u{FB02}',
        0xB1 => '\u{2013}',
        0xB2 => '\u{2020}',
        0xB3 => '\u{2021}',
        0xB4 => '\u{00B7}',
        0xB6 => '\u{00B6}',
        0xB7 => '\u{2022}',
        0xB8 => '\u{201A}',
        0xB9 => '\u{201E}',
        0xBA => '\u{201D}',
        0xBB => '\u{00BB}',
        0xBC => '\u{2026}',
        0xBD => '\u{2030}',
        0xBF => '\u{00BF}',
        0xC1 => '`',
        0xC2 => '\u{00B4}',
        0xC3 => '\u{02C6}',
        0xC4 => '\u{02DC}',
        0xC5 => '\u{00AF}',
        0xC6 => '\u{02D8}',
        0xC7 => '\u{02D9}',
        0xC8 => '\u{00A8}',
        0xCA => '\u{02DA}',
        0xCB => '\u{00B8}',
        0xCD => '\u{02DD}',
        0xCE => '\u{02DB}',
        0xCF => '\u{02C7}',
        0xD0 => '\u{2014}',
        0xE1 => '\u{00C6}',
        0xE3 => '\u{00AA}',
        0xE8 => '\u{0141}',
        0xE9 => '\u{00D8}',
        0xEA => '\u{0152}',
        0xEB => '\u{00BA}',
        0xF1 => '\u{00E6}',
        0xF5 => '\u{0131}',
        0xF8 => '\u{0142}',
        0xF9 => '\u{00F8}',
        0xFA => '\u{0153}',
        0xFB => '\u{00DF}',
        _ => return None,
    };
    Some(c)
}

/// Code page 1252 rows 0x80-0x9F; the rest is Latin-1.
const WIN_ANSI_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'), None, Some('\u{201A}'), Some('\u{0192}'),
    Some('\u{201E}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02C6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None, Some('\u{017D}'), None,
    None, Some('\u{2018}'), Some('\u{2019}'), Some('\u{201C}'),
    Some('\u{201D}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02DC}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203A}'),
    Some('\u{0153}'), None, Some('\u{017E}'), Some('\u{0178}'),
];

fn win_ansi(code: u8) -> Option<char> {
    match code {
        0x80..=0x9F => WIN_ANSI_HIGH[(code - 0x80) as usize],
        0xA0..=0xFF => Some(code as char),
        _ => printable_ascii(code),
    }
}

/// Mac OS Roman rows 0x80-0xFF as listed in Annex D (0xF0 is unassigned).
const MAC_ROMAN_HIGH: &str = concat!(
    "ÄÅÇÉÑÖÜáàâäãåçéè",
    "êëíìîïñóòôöõúùûü",
    "†°¢£§•¶ß®©™´¨≠ÆØ",
    "∞±≤≥¥µ∂∑∏π∫ªºΩæø",
    "¿¡¬√ƒ≈∆«»…\u{00A0}ÀÃÕŒœ",
    "–—“”‘’÷◊ÿŸ⁄¤‹›ﬁﬂ",
    "‡·‚„‰ÂÊÁËÈÍÎÏÌÓÔ",
    "\u{FFFD}ÒÚÛÙıˆ˜¯˘˙˚¸˝˛ˇ",
);

fn mac_roman(code: u8) -> Option<char> {
    if code < 0x80 {
        return printable_ascii(code);
    }
    MAC_ROMAN_HIGH
        .chars()
        .nth((code - 0x80) as usize)
        .filter(|&c| c != '\u{FFFD}')
}

/// Glyph names outside the single-letter and `uniXXXX` conventions.
static GLYPH_NAMES: phf::Map<&'static str, char> = phf_map! {
    "AE" => '\u{00C6}',
    "Aacute" => '\u{00C1}',
    "Acaron" => '\u{01CD}',
    "Acircumflex" => '\u{00C2}',
    "Adieresis" => '\u{00C4}',
    "Agrave" => '\u{00C0}',
    "Aring" => '\u{00C5}',
    "Atilde" => '\u{00C3}',
    "Cacute" => '\u{0106}',
    "Ccaron" => '\u{010C}',
    "Ccedilla" => '\u{00C7}',
    "Ccircumflex" => '\u{0108}',
    "Delta" => '\u{2206}',
    "Eacute" => '\u{00C9}',
    "Ecaron" => '\u{011A}',
    "Ecedilla" => '\u{0228}',
    "Ecircumflex" => '\u{00CA}',
    "Edieresis" => '\u{00CB}',
    "Egrave" => '\u{00C8}',
    "Eth" => '\u{00D0}',
    "Etilde" => '\u{1EBC}',
    "Euro" => '\u{20AC}',
    "Iacute" => '\u{00CD}',
    "Icaron" => '\u{01CF}',
    "Icircumflex" => '\u{00CE}',
    "Idieresis" => '\u{00CF}',
    "Igrave" => '\u{00CC}',
    "Itilde" => '\u{0128}',
    "Lslash" => '\u{0141}',
    "Nacute" => '\u{0143}',
    "Ncaron" => '\u{0147}',
    "Ncedilla" => '\u{0145}',
    "Ngrave" => '\u{01F8}',
    "Ntilde" => '\u{00D1}',
    "OE" => '\u{0152}',
    "Oacute" => '\u{00D3}',
    "Ocaron" => '\u{01D1}',
    "Ocircumflex" => '\u{00D4}',
    "Odieresis" => '\u{00D6}',
    "Ograve" => '\u{00D2}',
    "Omega" => '\u{03A9}',
    "Oslash" => '\u{00D8}',
    "Otilde" => '\u{00D5}',
    "Sacute" => '\u{015A}',
    "Scaron" => '\u{0160}',
    "Scedilla" => '\u{015E}',
    "Scircumflex" => '\u{015C}',
    "Thorn" => '\u{00DE}',
    "Uacute" => '\u{00DA}',
    "Ucaron" => '\u{01D3}',
    "Ucircumflex" => '\u{00DB}',
    "Udieresis" => '\u{00DC}',
    "Ugrave" => '\u{00D9}',
    "Uring" => '\u{016E}',
    "Utilde" => '\u{0168}',
    "Yacute" => '\u{00DD}',
    "Ycircumflex" => '\u{0176}',
    "Ydieresis" => '\u{0178}',
    "Ygrave" => '\u{1EF2}',
    "Ytilde" => '\u{1EF8}',
    "Zacute" => '\u{0179}',
    "Zcaron" => '\u{017D}',
    "Zcircumflex" => '\u{1E90}',
    "aacute" => '\u{00E1}',
    "acaron" => '\u{01CE}',
    "acircumflex" => '\u{00E2}',
    "acute" => '\u{00B4}',
    "adieresis" => '\u{00E4}',
    "ae" => '\u{00E6}',
    "agrave" => '\u{00E0}',
    "ampersand" => '&',
    "approxequal" => '\u{2248}',
    "aring" => '\u{00E5}',
    "asciicircum" => '^',
    "asciitilde" => '~',
    "asterisk" => '*',
    "at" => '@',
    "atilde" => '\u{00E3}',
    "backslash" => '\\',
    "bar" => '|',
    "braceleft" => '{',
    "braceright" => '}',
    "bracketleft" => '[',
    "bracketright" => ']',
    "breve" => '\u{02D8}',
    "brokenbar" => '\u{00A6}',
    "bullet" => '\u{2022}',
    "cacute" => '\u{0107}',
    "caron" => '\u{02C7}',
    "ccaron" => '\u{010D}',
    "ccedilla" => '\u{00E7}',
    "ccircumflex" => '\u{0109}',
    "cedilla" => '\u{00B8}',
    "cent" => '\u{00A2}',
    "circumflex" => '\u{02C6}',
    "colon" => ':',
    "comma" => ',',
    "copyright" => '\u{00A9}',
    "currency" => '\u{00A4}',
    "dagger" => '\u{2020}',
    "daggerdbl" => '\u{2021}',
    "degree" => '\u{00B0}',
    "dieresis" => '\u{00A8}',
    "divide" => '\u{00F7}',
    "dollar" => '$',
    "dotaccent" => '\u{02D9}',
    "dotlessi" => '\u{0131}',
    "eacute" => '\u{00E9}',
    "ecaron" => '\u{011B}',
    "ecedilla" => '\u{0229}',
    "ecircumflex" => '\u{00EA}',
    "edieresis" => '\u{00EB}',
    "egrave" => '\u{00E8}',
    "eight" => '8',
    "ellipsis" => '\u{2026}',
    "emdash" => '\u{2014}',
    "endash" => '\u{2013}',
    "equal" => '=',
    "eth" => '\u{00F0}',
    "etilde" => '\u{1EBD}',
    "exclam" => '!',
    "exclamdown" => '\u{00A1}',
    "ff" => '\u{FB00}',
    "ffi" => '\u{FB03}',
    "ffl" => '\u{FB04}',
    "fi" => '\u{FB01}',
    "five" => '5',
    "fl" => '\u{FB02}',
    "florin" => '\u{0192}',
    "four" => '4',
    "fraction" => '\u{2044}',
    "germandbls" => '\u{00DF}',
    "grave" => '`',
    "greater" => '>',
    "greaterequal" => '\u{2265}',
    "guillemotleft" => '\u{00AB}',
    "guillemotright" => '\u{00BB}',
    "guilsinglleft" => '\u{2039}',
    "guilsinglright" => '\u{203A}',
    "hungarumlaut" => '\u{02DD}',
    "hyphen" => '-',
    "iacute" => '\u{00ED}',
    "icaron" => '\u{01D0}',
    "icircumflex" => '\u{00EE}',
    "idieresis" => '\u{00EF}',
    "igrave" => '\u{00EC}',
    "infinity" => '\u{221E}',
    "integral" => '\u{222B}',
    "itilde" => '\u{0129}',
    "less" => '<',
    "lessequal" => '\u{2264}',
    "logicalnot" => '\u{00AC}',
    "lozenge" => '\u{25CA}',
    "lslash" => '\u{0142}',
    "macron" => '\u{00AF}',
    "middot" => '\u{00B7}',
    "minus" => '\u{2212}',
    "mu" => '\u{00B5}',
    "multiply" => '\u{00D7}',
    "nacute" => '\u{0144}',
    "nbspace" => '\u{00A0}',
    "ncaron" => '\u{0148}',
    "ncedilla" => '\u{0146}',
    "ngrave" => '\u{01F9}',
    "nine" => '9',
    "notequal" => '\u{2260}',
    "ntilde" => '\u{00F1}',
    "numbersign" => '#',
    "oacute" => '\u{00F3}',
    "ocaron" => '\u{01D2}',
    "ocircumflex" => '\u{00F4}',
    "odieresis" => '\u{00F6}',
    "oe" => '\u{0153}',
    "ogonek" => '\u{02DB}',
    "ograve" => '\u{00F2}',
    "one" => '1',
    "onehalf" => '\u{00BD}',
    "onequarter" => '\u{00BC}',
    "onesuperior" => '\u{00B9}',
    "ordfeminine" => '\u{00AA}',
    "ordmasculine" => '\u{00BA}',
    "oslash" => '\u{00F8}',
    "otilde" => '\u{00F5}',
    "paragraph" => '\u{00B6}',
    "parenleft" => '(',
    "parenright" => ')',
    "partialdiff" => '\u{2202}',
    "percent" => '%',
    "period" => '.',
    "periodcentered" => '\u{00B7}',
    "perthousand" => '\u{2030}',
    "pi" => '\u{03C0}',
    "plus" => '+',
    "plusminus" => '\u{00B1}',
    "product" => '\u{220F}',
    "question" => '?',
    "questiondown" => '\u{00BF}',
    "quotedbl" => '"',
    "quotedblbase" => '\u{201E}',
    "quotedblleft" => '\u{201C}',
    "quotedblright" => '\u{201D}',
    "quoteleft" => '\u{2018}',
    "quoteright" => '\u{2019}',
    "quotesinglbase" => '\u{201A}',
    "quotesingle" => '\'',
    "radical" => '\u{221A}',
    "registered" => '\u{00AE}',
    "ring" => '\u{02DA}',
    "sacute" => '\u{015B}',
    "scaron" => '\u{0161}',
    "scedilla" => '\u{015F}',
    "scircumflex" => '\u{015D}',
    "section" => '\u{00A7}',
    "semicolon" => ';',
    "seven" => '7',
    "sfthyphen" => '\u{00AD}',
    "six" => '6',
    "slash" => '/',
    "space" => ' ',
    "sterling" => '\u{00A3}',
    "summation" => '\u{2211}',
    "thorn" => '\u{00FE}',
    "three" => '3',
    "threequarters" => '\u{00BE}',
    "threesuperior" => '\u{00B3}',
    "tilde" => '\u{02DC}',
    "trademark" => '\u{2122}',
    "two" => '2',
    "twosuperior" => '\u{00B2}',
    "uacute" => '\u{00FA}',
    "ucaron" => '\u{01D4}',
    "ucircumflex" => '\u{00FB}',
    "udieresis" => '\u{00FC}',
    "ugrave" => '\u{00F9}',
    "underscore" => '_',
    "uring" => '\u{016F}',
    "utilde" => '\u{0169}',
    "yacute" => '\u{00FD}',
    "ycircumflex" => '\u{0177}',
    "ydieresis" => '\u{00FF}',
    "yen" => '\u{00A5}',
    "ygrave" => '\u{1EF3}',
    "yring" => '\u{1E99}',
    "ytilde" => '\u{1EF9}',
    "zacute" => '\u{017A}',
    "zcaron" => '\u{017E}',
    "zcircumflex" => '\u{1E91}',
    "zero" => '0',

};

/// Unicode for a glyph name.
///
/// Handles the named glyphs of the Latin encodings, single letters,
/// `uniXXXX`, `uXXXX[XX]` and suffixed variants such as `a.sc` or `f_i`.
pub fn glyph_name_to_unicode(name: &str) -> Option<String> {
    // Suffixes after '.' select glyph variants of the same character.
    let base = name.split('.').next().unwrap_or(name);
    if base.is_empty() {
        return None;
    }

    if base.contains('_') {
        let parts: Option<String> = base.split('_').map(glyph_name_to_unicode).collect();
        return parts;
    }

    if let Some(&c) = GLYPH_NAMES.get(base) {
        return Some(c.to_string());
    }

    if base.len() == 1 && base.as_bytes()[0].is_ascii_alphabetic() {
        return Some(base.to_string());
    }

    if let Some(hex) = base.strip_prefix("uni") {
        if hex.len() >= 4 && hex.len() % 4 == 0 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            let units: Vec<u16> = hex
                .as_bytes()
                .chunks(4)
                .filter_map(|chunk| std::str::from_utf8(chunk).ok())
                .filter_map(|chunk| u16::from_str_radix(chunk, 16).ok())
                .collect();
            return String::from_utf16(&units).ok();
        }
    }

    if let Some(hex) = base.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return u32::from_str_radix(hex, 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from);
        }
    }

    log::debug!("unknown glyph name '{}'", name);
    None
}
