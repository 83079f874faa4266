//! Content stream interpreter that emits glyph runs.
//!
//! Every show operation (`Tj`, `'`, `"`, each string of a `TJ` array) becomes
//! one [`GlyphRun`]:
//!
//! - `transform` is the text rendering matrix `[Tfs·Th 0 0 Tfs 0 Trise] × Tm × CTM`
//!   at the start of the string;
//! - `width` is the distance the string advances the pen, in user space;
//! - `font_id` is the resource name selected by `Tf`.
//!
//! TJ adjustments only move the text matrix. Form XObjects are interpreted
//! in place, so their runs appear where `Do` occurs in the stream.
//!
//! PDF Spec: ISO 32000-1:2008, Section 9.4 (text objects), 8.10 (form XObjects)

use crate::content::{parse_content_stream, GraphicsStateStack, Matrix, Operator, TextElement};
use crate::document::PdfDocument;
use crate::error::DecodeResult;
use crate::extractors::layout_text::{FontDescriptor, GlyphRun, PageContent, PageSource};
use crate::fonts::FontInfo;
use crate::object::{Dict, Object, ObjectRef};
use std::collections::HashMap;
use std::rc::Rc;

/// Text matrix pair, reset by every `BT`.
#[derive(Debug, Clone, Copy, Default)]
struct TextPosition {
    matrix: Matrix,
    line_matrix: Matrix,
}

impl TextPosition {
    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).multiply(&self.line_matrix);
        self.matrix = self.line_matrix;
    }

    fn advance(&mut self, tx: f32) {
        self.matrix = Matrix::translation(tx, 0.0).multiply(&self.matrix);
    }
}

/// Collects the runs and fonts of one page.
pub struct GlyphRunCollector<'a> {
    doc: &'a PdfDocument,
    runs: Vec<GlyphRun>,
    fonts: HashMap<String, FontDescriptor>,
    font_cache: HashMap<ObjectRef, Rc<FontInfo>>,
    /// Form XObjects currently being interpreted, innermost last
    form_stack: Vec<ObjectRef>,
}

impl<'a> GlyphRunCollector<'a> {
    /// Collector reading resources from `doc`.
    pub fn new(doc: &'a PdfDocument) -> Self {
        Self {
            doc,
            runs: Vec::new(),
            fonts: HashMap::new(),
            font_cache: HashMap::new(),
            form_stack: Vec::new(),
        }
    }

    /// Interpret a page and return its runs and fonts.
    pub fn collect_page(mut self, page_number: usize) -> DecodeResult<PageContent> {
        let data = self.doc.page_content_data(page_number)?;
        let resources = match self.doc.page(page_number)?.resources() {
            Some(res) => self.doc.resolve_dict(res)?.unwrap_or_default(),
            None => Dict::new(),
        };

        let operators = parse_content_stream(&data);
        self.run(&operators, &resources, GraphicsStateStack::new());

        Ok(PageContent {
            runs: self.runs,
            fonts: self.fonts,
        })
    }

    fn run(&mut self, operators: &[Operator], resources: &Dict, mut gs: GraphicsStateStack) {
        let mut fonts_in_scope: HashMap<String, Rc<FontInfo>> = HashMap::new();
        let mut text = TextPosition::default();

        for op in operators {
            match op {
                Operator::BeginText => text = TextPosition::default(),
                Operator::EndText => {},
                Operator::Tf { font, size } => {
                    let state = gs.current_mut();
                    state.font_name = Some(font.clone());
                    state.font_size = *size;
                },
                Operator::Td { tx, ty } => text.move_line(*tx, *ty),
                Operator::TD { tx, ty } => {
                    gs.current_mut().leading = -ty;
                    text.move_line(*tx, *ty);
                },
                Operator::Tm { matrix } => {
                    text.matrix = *matrix;
                    text.line_matrix = *matrix;
                },
                Operator::TStar => text.move_line(0.0, -gs.current().leading),
                Operator::Tj { text: bytes } => {
                    self.show(bytes, resources, &gs, &mut text, &mut fonts_in_scope);
                },
                Operator::Quote { text: bytes } => {
                    text.move_line(0.0, -gs.current().leading);
                    self.show(bytes, resources, &gs, &mut text, &mut fonts_in_scope);
                },
                Operator::DoubleQuote {
                    word_space,
                    char_space,
                    text: bytes,
                } => {
                    let state = gs.current_mut();
                    state.word_space = *word_space;
                    state.char_space = *char_space;
                    text.move_line(0.0, -gs.current().leading);
                    self.show(bytes, resources, &gs, &mut text, &mut fonts_in_scope);
                },
                Operator::TJ { array } => {
                    for element in array {
                        match element {
                            TextElement::String(bytes) => {
                                self.show(bytes, resources, &gs, &mut text, &mut fonts_in_scope);
                            },
                            TextElement::Offset(adjust) => {
                                let state = gs.current();
                                let scale = state.horizontal_scaling / 100.0;
                                text.advance(-adjust / 1000.0 * state.font_size * scale);
                            },
                        }
                    }
                },
                Operator::Tc { char_space } => gs.current_mut().char_space = *char_space,
                Operator::Tw { word_space } => gs.current_mut().word_space = *word_space,
                Operator::Tz { scale } => gs.current_mut().horizontal_scaling = *scale,
                Operator::TL { leading } => gs.current_mut().leading = *leading,
                Operator::Ts { rise } => gs.current_mut().text_rise = *rise,
                Operator::SaveState => gs.save(),
                Operator::RestoreState => gs.restore(),
                Operator::Cm { matrix } => {
                    let state = gs.current_mut();
                    state.ctm = matrix.multiply(&state.ctm);
                },
                Operator::Do { name } => {
                    if let Err(e) = self.run_form(name, resources, &gs) {
                        log::warn!("skipping XObject '{}': {}", name, e);
                    }
                },
                Operator::InlineImage | Operator::Other { .. } => {},
            }
        }
    }

    /// Emit one run for a shown string and advance the text matrix past it.
    fn show(
        &mut self,
        bytes: &[u8],
        resources: &Dict,
        gs: &GraphicsStateStack,
        text: &mut TextPosition,
        fonts_in_scope: &mut HashMap<String, Rc<FontInfo>>,
    ) {
        let state = gs.current();
        let font = match &state.font_name {
            Some(name) => match fonts_in_scope.get(name) {
                Some(font) => Rc::clone(font),
                None => {
                    let font = self.font(resources, name);
                    self.fonts
                        .entry(name.clone())
                        .or_insert_with(|| FontDescriptor::new(font.family.clone()));
                    fonts_in_scope.insert(name.clone(), Rc::clone(&font));
                    font
                },
            },
            None => Rc::new(FontInfo::fallback("")),
        };

        let scale = state.horizontal_scaling / 100.0;
        let mut decoded = String::new();
        let mut advance = 0.0f32;
        for glyph in font.decode(bytes) {
            decoded.push_str(&glyph.text);
            let mut tx = glyph.width * state.font_size + state.char_space;
            if glyph.is_word_space {
                tx += state.word_space;
            }
            advance += tx * scale;
        }

        let to_user = text.matrix.multiply(&state.ctm);
        let rendering = state.text_space_matrix().multiply(&to_user);
        let (x0, y0) = to_user.transform_point(0.0, 0.0);
        let (x1, y1) = to_user.transform_point(advance, 0.0);

        self.runs.push(GlyphRun {
            text: decoded,
            transform: Some(rendering.to_array()),
            width: Some((x1 - x0).hypot(y1 - y0)),
            font_id: state.font_name.clone(),
        });
        text.advance(advance);
    }

    /// Font for a resource name; unreadable fonts degrade to the fallback.
    fn font(&mut self, resources: &Dict, name: &str) -> Rc<FontInfo> {
        match self.load_font(resources, name) {
            Ok(Some(font)) => font,
            Ok(None) => {
                log::debug!("font resource '{}' not found, using fallback", name);
                Rc::new(FontInfo::fallback(name))
            },
            Err(e) => {
                log::warn!("font resource '{}' unreadable ({}), using fallback", name, e);
                Rc::new(FontInfo::fallback(name))
            },
        }
    }

    fn load_font(&mut self, resources: &Dict, name: &str) -> DecodeResult<Option<Rc<FontInfo>>> {
        let Some(font_dict) = resources.get("Font") else {
            return Ok(None);
        };
        let Some(font_dict) = self.doc.resolve_dict(font_dict)? else {
            return Ok(None);
        };
        let Some(entry) = font_dict.get(name) else {
            return Ok(None);
        };

        let reference = entry.as_reference();
        if let Some(cached) = reference.and_then(|r| self.font_cache.get(&r)) {
            return Ok(Some(Rc::clone(cached)));
        }
        let Some(dict) = self.doc.resolve_dict(entry)? else {
            return Ok(None);
        };
        let font = Rc::new(FontInfo::load(&dict, self.doc)?);
        if let Some(r) = reference {
            self.font_cache.insert(r, Rc::clone(&font));
        }
        Ok(Some(font))
    }

    /// Interpret a form XObject invoked by `Do`. Image XObjects are ignored.
    fn run_form(&mut self, name: &str, resources: &Dict, gs: &GraphicsStateStack) -> DecodeResult<()> {
        let Some(xobjects) = resources.get("XObject") else {
            return Ok(());
        };
        let Some(xobjects) = self.doc.resolve_dict(xobjects)? else {
            return Ok(());
        };
        let Some(entry) = xobjects.get(name) else {
            log::debug!("XObject '{}' not in resources", name);
            return Ok(());
        };

        let reference = entry.as_reference();
        if let Some(r) = reference {
            if self.form_stack.contains(&r) {
                log::warn!("XObject {} invokes itself, skipping", r);
                return Ok(());
            }
        }
        if self.form_stack.len() as u32 >= self.doc.limits().max_form_depth {
            log::warn!(
                "form XObjects nested deeper than {}, skipping '{}'",
                self.doc.limits().max_form_depth,
                name
            );
            return Ok(());
        }

        let stream = self.doc.resolve(entry)?;
        let Object::Stream { dict, .. } = &stream else {
            return Ok(());
        };
        if dict.get("Subtype").and_then(Object::as_name) != Some("Form") {
            return Ok(());
        }

        let data = stream.decode_stream_data(self.doc.limits())?;
        let form_resources = match dict.get("Resources") {
            Some(res) => self.doc.resolve_dict(res)?.unwrap_or_else(|| resources.clone()),
            None => resources.clone(),
        };
        let form_matrix = match dict.get("Matrix").map(|m| self.doc.resolve(m)).transpose()? {
            Some(Object::Array(m)) if m.len() == 6 => {
                let n: Vec<f32> = m.iter().map(|v| v.as_number().unwrap_or(0.0) as f32).collect();
                Matrix::new(n[0], n[1], n[2], n[3], n[4], n[5])
            },
            _ => Matrix::identity(),
        };

        let mut state = gs.current().clone();
        state.ctm = form_matrix.multiply(&state.ctm);

        let operators = parse_content_stream(&data);
        // Direct streams cannot recurse; object 0 only counts toward the depth.
        self.form_stack.push(reference.unwrap_or(ObjectRef::new(0, 0)));
        self.run(&operators, &form_resources, GraphicsStateStack::from_state(state));
        self.form_stack.pop();
        Ok(())
    }
}

impl PageSource for PdfDocument {
    fn page_count(&mut self) -> DecodeResult<usize> {
        Ok(PdfDocument::page_count(self))
    }

    fn page_content(&mut self, page_number: usize) -> DecodeResult<PageContent> {
        GlyphRunCollector::new(self).collect_page(page_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_line_accumulates_from_line_start() {
        let mut pos = TextPosition::default();
        pos.move_line(72.0, 720.0);
        pos.advance(30.0);
        pos.move_line(0.0, -14.0);
        assert_eq!(pos.matrix.transform_point(0.0, 0.0), (72.0, 706.0));
        assert_eq!(pos.line_matrix, pos.matrix);
    }

    #[test]
    fn test_advance_is_in_text_space() {
        let mut pos = TextPosition::default();
        let scaled = Matrix::new(2.0, 0.0, 0.0, 2.0, 10.0, 20.0);
        pos.matrix = scaled;
        pos.line_matrix = scaled;
        pos.advance(5.0);
        assert_eq!(pos.matrix.transform_point(0.0, 0.0), (20.0, 20.0));
        // The line matrix stays at the start of the line.
        assert_eq!(pos.line_matrix.transform_point(0.0, 0.0), (10.0, 20.0));
    }
}
