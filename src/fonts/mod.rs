//! Fonts: encodings, ToUnicode CMaps and glyph widths.

pub mod cmap;
pub mod encoding;
pub mod font_dict;

pub use cmap::{parse_tounicode_cmap, CMap};
pub use encoding::{glyph_name_to_unicode, BaseEncoding};
pub use font_dict::{strip_subset_tag, FontInfo, Glyph};
