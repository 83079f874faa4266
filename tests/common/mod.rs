//! In-memory PDF builder shared by the integration tests.
//!
//! Objects are numbered in insertion order starting at 1. `build` writes a
//! classic xref table with correct offsets; the other `build_*` variants
//! produce an xref stream, an object stream, or no usable xref at all.

#![allow(dead_code)]

use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;

pub struct PdfBuilder {
    version: &'static str,
    objects: Vec<Vec<u8>>,
    trailer_extra: String,
}

impl Default for PdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self {
            version: "1.4",
            objects: Vec::new(),
            trailer_extra: String::new(),
        }
    }

    pub fn with_version(mut self, version: &'static str) -> Self {
        self.version = version;
        self
    }

    /// Extra trailer entries, e.g. `/Encrypt 9 0 R`.
    pub fn with_trailer(mut self, extra: &str) -> Self {
        self.trailer_extra = extra.to_string();
        self
    }

    /// Number the next added object will get.
    pub fn next_id(&self) -> u32 {
        self.objects.len() as u32 + 1
    }

    pub fn object(&mut self, body: &str) -> u32 {
        self.objects.push(body.as_bytes().to_vec());
        self.objects.len() as u32
    }

    /// Replace the body of an already reserved object.
    pub fn set_object(&mut self, id: u32, body: &str) {
        self.objects[id as usize - 1] = body.as_bytes().to_vec();
    }

    pub fn stream(&mut self, dict_extra: &str, data: &[u8]) -> u32 {
        let mut body = format!("<< {} /Length {} >>\nstream\n", dict_extra, data.len()).into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        self.objects.push(body);
        self.objects.len() as u32
    }

    pub fn flate_stream(&mut self, dict_extra: &str, data: &[u8]) -> u32 {
        let compressed = deflate(data);
        self.stream(&format!("{} /Filter /FlateDecode", dict_extra), &compressed)
    }

    fn header(&self) -> Vec<u8> {
        format!("%PDF-{}\n", self.version).into_bytes()
    }

    fn body(&self, out: &mut Vec<u8>) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(self.objects.len());
        for (i, obj) in self.objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
            out.extend_from_slice(obj);
            out.extend_from_slice(b"\nendobj\n");
        }
        offsets
    }

    /// Classic `xref` table and `trailer`.
    pub fn build(&self, root: u32) -> Vec<u8> {
        let mut out = self.header();
        let offsets = self.body(&mut out);

        let xref_offset = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", offsets.len() + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in &offsets {
            out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root {} 0 R {} >>\nstartxref\n{}\n%%EOF\n",
                offsets.len() + 1,
                root,
                self.trailer_extra,
                xref_offset
            )
            .as_bytes(),
        );
        out
    }

    /// PDF 1.5 cross-reference stream instead of a table.
    pub fn build_with_xref_stream(&self, root: u32) -> Vec<u8> {
        let mut out = self.header();
        let offsets = self.body(&mut out);

        let xref_id = offsets.len() + 1;
        let xref_offset = out.len();
        let mut rows = vec![0u8, 0, 0, 0, 0xFF];
        for offset in offsets.iter().chain(std::iter::once(&xref_offset)) {
            rows.push(1);
            rows.extend_from_slice(&(*offset as u32).to_be_bytes()[1..]);
            rows.push(0);
        }
        let compressed = deflate(&rows);

        out.extend_from_slice(
            format!(
                "{} 0 obj\n<< /Type /XRef /Size {} /W [1 3 1] /Root {} 0 R /Filter /FlateDecode /Length {} {} >>\nstream\n",
                xref_id,
                xref_id + 1,
                root,
                compressed.len(),
                self.trailer_extra
            )
            .as_bytes(),
        );
        out.extend_from_slice(&compressed);
        out.extend_from_slice(format!("\nendstream\nendobj\nstartxref\n{}\n%%EOF\n", xref_offset).as_bytes());
        out
    }

    /// Dictionaries and other non-stream objects, except the catalog, go into
    /// one object stream; streams stay top level.
    pub fn build_with_object_stream(&self, root: u32) -> Vec<u8> {
        let mut out = self.header();
        let n = self.objects.len();
        let is_stream = |id: usize| self.objects[id - 1].windows(7).any(|w| w == b"stream\n");
        let packed: Vec<usize> = (1..=n).filter(|&id| id as u32 != root && !is_stream(id)).collect();

        let mut offsets = vec![0usize; n + 1];
        for id in (1..=n).filter(|id| !packed.contains(id)) {
            offsets[id] = out.len();
            out.extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
            out.extend_from_slice(&self.objects[id - 1]);
            out.extend_from_slice(b"\nendobj\n");
        }

        let mut header = String::new();
        let mut payload = Vec::new();
        for &id in &packed {
            header.push_str(&format!("{} {} ", id, payload.len()));
            payload.extend_from_slice(&self.objects[id - 1]);
            payload.push(b'\n');
        }
        let mut stream_data = header.into_bytes();
        let first = stream_data.len();
        stream_data.extend_from_slice(&payload);
        let compressed = deflate(&stream_data);

        let objstm_id = n + 1;
        let objstm_offset = out.len();
        out.extend_from_slice(
            format!(
                "{} 0 obj\n<< /Type /ObjStm /N {} /First {} /Filter /FlateDecode /Length {} >>\nstream\n",
                objstm_id,
                packed.len(),
                first,
                compressed.len()
            )
            .as_bytes(),
        );
        out.extend_from_slice(&compressed);
        out.extend_from_slice(b"\nendstream\nendobj\n");

        let xref_id = n + 2;
        let xref_offset = out.len();
        let mut rows = vec![0u8, 0, 0, 0, 0xFF];
        let mut push_row = |kind: u8, field: usize, index: u8| {
            rows.push(kind);
            rows.extend_from_slice(&(field as u32).to_be_bytes()[1..]);
            rows.push(index);
        };
        for id in 1..=n {
            match packed.iter().position(|&p| p == id) {
                Some(index) => push_row(2, objstm_id, index as u8),
                None => push_row(1, offsets[id], 0),
            }
        }
        push_row(1, objstm_offset, 0);
        push_row(1, xref_offset, 0);

        out.extend_from_slice(
            format!(
                "{} 0 obj\n<< /Type /XRef /Size {} /W [1 3 1] /Root {} 0 R /Length {} >>\nstream\n",
                xref_id,
                xref_id + 1,
                root,
                rows.len()
            )
            .as_bytes(),
        );
        out.extend_from_slice(&rows);
        out.extend_from_slice(format!("\nendstream\nendobj\nstartxref\n{}\n%%EOF\n", xref_offset).as_bytes());
        out
    }

    /// Objects followed by a trailer and a `startxref` pointing nowhere.
    pub fn build_with_broken_xref(&self, root: u32) -> Vec<u8> {
        let mut out = self.header();
        self.body(&mut out);
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root {} 0 R {} >>\nstartxref\n999999\n%%EOF\n",
                self.objects.len() + 1,
                root,
                self.trailer_extra
            )
            .as_bytes(),
        );
        out
    }
}

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Standard 14 font dictionary.
pub fn base_font(name: &str) -> String {
    format!("<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>", name)
}

/// Document whose pages each have one content stream and share the fonts
/// `F1` Helvetica, `F2` Helvetica-Bold, `F3` Times-Italic, `F4` Times-BoldItalic.
pub struct TextDocument {
    pub builder: PdfBuilder,
    pub catalog: u32,
    pages_id: u32,
    fonts_id: u32,
    page_ids: Vec<u32>,
}

impl TextDocument {
    pub fn new() -> Self {
        Self::with_builder(PdfBuilder::new())
    }

    pub fn with_builder(mut builder: PdfBuilder) -> Self {
        let catalog = builder.object(&format!("<< /Type /Catalog /Pages {} 0 R >>", builder.next_id() + 1));
        let pages_id = builder.object("");
        let f1 = builder.object(&base_font("Helvetica"));
        let f2 = builder.object(&base_font("Helvetica-Bold"));
        let f3 = builder.object(&base_font("Times-Italic"));
        let f4 = builder.object(&base_font("Times-BoldItalic"));
        let fonts_id = builder.object(&format!(
            "<< /F1 {} 0 R /F2 {} 0 R /F3 {} 0 R /F4 {} 0 R >>",
            f1, f2, f3, f4
        ));
        Self {
            builder,
            catalog,
            pages_id,
            fonts_id,
            page_ids: Vec::new(),
        }
    }

    /// Add a page with an uncompressed content stream.
    pub fn page(&mut self, content: &str) -> u32 {
        let contents = self.builder.stream("", content.as_bytes());
        self.page_with_contents(&format!("{} 0 R", contents), "")
    }

    /// Add a page with a Flate-compressed content stream.
    pub fn compressed_page(&mut self, content: &str) -> u32 {
        let contents = self.builder.flate_stream("", content.as_bytes());
        self.page_with_contents(&format!("{} 0 R", contents), "")
    }

    /// Add a page with explicit `/Contents` and extra resource entries next
    /// to the shared fonts.
    pub fn page_with_contents(&mut self, contents: &str, extra_resources: &str) -> u32 {
        let resources = format!("/Font {} 0 R {}", self.fonts_id, extra_resources);
        self.page_with_resources(contents, &resources)
    }

    /// Add a page with explicit `/Contents` and resource dictionary body.
    pub fn page_with_resources(&mut self, contents: &str, resources: &str) -> u32 {
        let id = self.builder.object(&format!(
            "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 612 792] /Resources << {} >> /Contents {} >>",
            self.pages_id, resources, contents
        ));
        self.page_ids.push(id);
        id
    }

    fn finish_tree(&mut self) {
        let kids: Vec<String> = self.page_ids.iter().map(|id| format!("{} 0 R", id)).collect();
        self.builder.set_object(
            self.pages_id,
            &format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids.join(" "), kids.len()),
        );
    }

    pub fn build(mut self) -> Vec<u8> {
        self.finish_tree();
        self.builder.build(self.catalog)
    }

    pub fn build_with_xref_stream(mut self) -> Vec<u8> {
        self.finish_tree();
        self.builder.build_with_xref_stream(self.catalog)
    }

    pub fn build_with_object_stream(mut self) -> Vec<u8> {
        self.finish_tree();
        self.builder.build_with_object_stream(self.catalog)
    }

    pub fn build_with_broken_xref(mut self) -> Vec<u8> {
        self.finish_tree();
        self.builder.build_with_broken_xref(self.catalog)
    }
}

impl Default for TextDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// One `BT ... ET` block showing `text` at `(x, y)` with font `font` at `size`.
pub fn text_at(font: &str, size: f32, x: f32, y: f32, text: &str) -> String {
    format!("BT /{} {} Tf {} {} Td ({}) Tj ET\n", font, size, x, y, text)
}
