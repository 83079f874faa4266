//! PDF document: header, cross-reference, object resolution and page tree.
//!
//! The whole file lives in memory (uploads are read into a buffer before
//! extraction starts), so objects are parsed straight out of a shared
//! [`bytes::Bytes`]. Resolved objects are cached; a resolving stack guards
//! against reference cycles and runaway nesting.
//!
//! PDF Spec: ISO 32000-1:2008, Section 7.5 (file structure), 7.7.3 (page tree)

use crate::config::DecoderLimits;
use crate::error::{DecodeError, DecodeResult};
use crate::lexer::is_whitespace;
use crate::object::{Dict, Object, ObjectRef};
use crate::objstm::{parse_object_stream, ObjectStream};
use crate::parser::parse_indirect_object;
use crate::xref::{find_startxref, load_xref, CrossRefTable, XRefEntry};
use crate::xref_reconstruction::reconstruct_xref;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::rc::Rc;

/// Attributes a page inherits from its ancestors in the page tree.
///
/// PDF Spec: ISO 32000-1:2008, Section 7.7.3.4, Table 30
const INHERITABLE: [&str; 4] = ["Resources", "MediaBox", "CropBox", "Rotate"];

/// One leaf of the page tree with inherited attributes already applied.
#[derive(Debug, Clone)]
pub struct Page {
    /// Reference of the page object, if it was indirect
    pub reference: Option<ObjectRef>,
    /// Page dictionary, including inherited entries
    pub dict: Dict,
}

impl Page {
    /// The page's resource dictionary (possibly still a reference).
    pub fn resources(&self) -> Option<&Object> {
        self.dict.get("Resources")
    }
}

/// A parsed PDF document.
pub struct PdfDocument {
    data: bytes::Bytes,
    version: (u8, u8),
    xref: CrossRefTable,
    limits: DecoderLimits,
    pages: Vec<Page>,
    object_cache: RefCell<HashMap<ObjectRef, Object>>,
    objstm_cache: RefCell<HashMap<u32, Rc<ObjectStream>>>,
    resolving_stack: RefCell<HashSet<ObjectRef>>,
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("len", &self.data.len())
            .field("version", &self.version)
            .field("objects", &self.xref.len())
            .field("pages", &self.pages.len())
            .finish()
    }
}

impl PdfDocument {
    /// Read and parse a PDF file from disk.
    pub fn open(path: impl AsRef<Path>) -> DecodeResult<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Parse a PDF held in memory, with default limits.
    pub fn from_bytes(data: impl Into<bytes::Bytes>) -> DecodeResult<Self> {
        Self::from_bytes_with_limits(data, DecoderLimits::default())
    }

    /// Parse a PDF held in memory.
    pub fn from_bytes_with_limits(
        data: impl Into<bytes::Bytes>,
        limits: DecoderLimits,
    ) -> DecodeResult<Self> {
        let data: bytes::Bytes = data.into();
        let version = parse_header(&data)?;
        log::debug!("PDF {}.{}, {} bytes", version.0, version.1, data.len());

        let xref = match read_xref(&data, &limits) {
            Ok(xref) => xref,
            Err(e) => {
                log::warn!("xref unreadable ({}), reconstructing", e);
                reconstruct_xref(&data)?
            },
        };

        let mut doc = Self {
            data,
            version,
            xref,
            limits,
            pages: Vec::new(),
            object_cache: RefCell::new(HashMap::new()),
            objstm_cache: RefCell::new(HashMap::new()),
            resolving_stack: RefCell::new(HashSet::new()),
        };

        if doc.xref.trailer.contains_key("Encrypt") {
            return Err(DecodeError::Encrypted);
        }

        match doc.collect_pages() {
            Ok(pages) => doc.pages = pages,
            Err(e) => {
                // A syntactically fine xref can still point at the wrong bytes.
                log::warn!("page tree unreadable ({}), retrying with reconstructed xref", e);
                doc.xref = reconstruct_xref(&doc.data)?;
                doc.object_cache.borrow_mut().clear();
                doc.objstm_cache.borrow_mut().clear();
                if doc.xref.trailer.contains_key("Encrypt") {
                    return Err(DecodeError::Encrypted);
                }
                doc.pages = doc.collect_pages()?;
            },
        }

        log::debug!("document has {} pages", doc.pages.len());
        Ok(doc)
    }

    /// PDF version from the header.
    pub fn version(&self) -> (u8, u8) {
        self.version
    }

    /// Limits this document was opened with.
    pub fn limits(&self) -> &DecoderLimits {
        &self.limits
    }

    /// The merged trailer dictionary.
    pub fn trailer(&self) -> &Dict {
        &self.xref.trailer
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page by 1-based number.
    pub fn page(&self, page_number: usize) -> DecodeResult<&Page> {
        page_number
            .checked_sub(1)
            .and_then(|index| self.pages.get(index))
            .ok_or(DecodeError::PageOutOfRange {
                page: page_number,
                count: self.pages.len(),
            })
    }

    /// Load an indirect object.
    ///
    /// References to objects that do not exist resolve to `null`, as the
    /// format requires; cycles and excessive nesting are errors.
    pub fn load_object(&self, obj_ref: ObjectRef) -> DecodeResult<Object> {
        if let Some(cached) = self.object_cache.borrow().get(&obj_ref) {
            return Ok(cached.clone());
        }

        {
            let stack = self.resolving_stack.borrow();
            if stack.contains(&obj_ref) {
                return Err(DecodeError::CircularReference(obj_ref));
            }
            if stack.len() as u32 >= self.limits.max_recursion_depth {
                return Err(DecodeError::RecursionLimitExceeded(self.limits.max_recursion_depth));
            }
        }

        self.resolving_stack.borrow_mut().insert(obj_ref);
        let result = self.load_uncached(obj_ref);
        self.resolving_stack.borrow_mut().remove(&obj_ref);

        let object = result?;
        self.object_cache.borrow_mut().insert(obj_ref, object.clone());
        Ok(object)
    }

    fn load_uncached(&self, obj_ref: ObjectRef) -> DecodeResult<Object> {
        match self.xref.get(obj_ref.id).copied() {
            Some(XRefEntry::Uncompressed { offset, .. }) => {
                if let Some(obj) = self.parse_at(offset, obj_ref) {
                    return Ok(obj);
                }
                log::debug!("{} not at xref offset {}, scanning", obj_ref, offset);
                Ok(self.scan_for_object(obj_ref).unwrap_or(Object::Null))
            },
            Some(XRefEntry::Compressed { stream_id, index }) => {
                let stream = self.object_stream(stream_id)?;
                Ok(stream.get(index, obj_ref.id).cloned().unwrap_or(Object::Null))
            },
            Some(XRefEntry::Free) | None => {
                log::debug!("{} is free or missing, resolving to null", obj_ref);
                Ok(self.scan_for_object(obj_ref).unwrap_or(Object::Null))
            },
        }
    }

    /// Parse `N G obj` at `offset` if it holds the expected object.
    fn parse_at(&self, offset: usize, obj_ref: ObjectRef) -> Option<Object> {
        let (_, (found, obj)) = parse_indirect_object(self.data.get(offset..)?).ok()?;
        (found.id == obj_ref.id).then_some(obj)
    }

    /// Last-resort linear search for `id gen obj`.
    fn scan_for_object(&self, obj_ref: ObjectRef) -> Option<Object> {
        let needle = format!("{} {} obj", obj_ref.id, obj_ref.gen).into_bytes();
        let data = &self.data[..];
        let mut found = None;
        let mut start = 0;
        while let Some(pos) = data[start..].windows(needle.len()).position(|w| w == needle) {
            let at = start + pos;
            let boundary = at == 0 || crate::lexer::is_whitespace(data[at - 1]);
            if boundary {
                found = Some(at);
            }
            start = at + needle.len();
        }
        self.parse_at(found?, obj_ref)
    }

    fn object_stream(&self, stream_id: u32) -> DecodeResult<Rc<ObjectStream>> {
        if let Some(stream) = self.objstm_cache.borrow().get(&stream_id) {
            return Ok(Rc::clone(stream));
        }
        let stream_obj = self.load_object(ObjectRef::new(stream_id, 0))?;
        let parsed = Rc::new(parse_object_stream(&stream_obj, &self.limits)?);
        self.objstm_cache.borrow_mut().insert(stream_id, Rc::clone(&parsed));
        Ok(parsed)
    }

    /// Follow a reference; direct objects are returned as-is.
    pub fn resolve(&self, obj: &Object) -> DecodeResult<Object> {
        match obj {
            Object::Reference(r) => self.load_object(*r),
            other => Ok(other.clone()),
        }
    }

    /// Resolve to a dictionary (streams yield their dictionary).
    pub fn resolve_dict(&self, obj: &Object) -> DecodeResult<Option<Dict>> {
        Ok(match self.resolve(obj)? {
            Object::Dictionary(d) | Object::Stream { dict: d, .. } => Some(d),
            _ => None,
        })
    }

    /// Document catalog (`/Root`).
    pub fn catalog(&self) -> DecodeResult<Dict> {
        let root = self
            .xref
            .trailer
            .get("Root")
            .ok_or_else(|| DecodeError::InvalidPdf("trailer has no /Root".to_string()))?;
        self.resolve_dict(root)?
            .ok_or_else(|| DecodeError::InvalidPdf("/Root is not a dictionary".to_string()))
    }

    fn collect_pages(&self) -> DecodeResult<Vec<Page>> {
        let catalog = self.catalog()?;
        let root = catalog
            .get("Pages")
            .ok_or_else(|| DecodeError::InvalidPdf("catalog has no /Pages".to_string()))?;

        let mut pages = Vec::new();
        let mut visited = HashSet::new();
        self.walk_page_tree(root, &Dict::new(), 0, &mut visited, &mut pages)?;
        Ok(pages)
    }

    fn walk_page_tree(
        &self,
        node: &Object,
        inherited: &Dict,
        depth: u32,
        visited: &mut HashSet<ObjectRef>,
        pages: &mut Vec<Page>,
    ) -> DecodeResult<()> {
        if depth > self.limits.max_recursion_depth {
            return Err(DecodeError::RecursionLimitExceeded(self.limits.max_recursion_depth));
        }
        let reference = node.as_reference();
        if let Some(r) = reference {
            if !visited.insert(r) {
                log::warn!("page tree revisits {}, skipping", r);
                return Ok(());
            }
        }

        let Some(dict) = self.resolve_dict(node)? else {
            log::warn!("page tree node is not a dictionary, skipping");
            return Ok(());
        };

        let mut carried = inherited.clone();
        for key in INHERITABLE {
            if let Some(value) = dict.get(key) {
                carried.insert(key.to_string(), value.clone());
            }
        }

        let is_leaf = match dict.get("Type").and_then(Object::as_name) {
            Some("Page") => true,
            Some("Pages") => false,
            _ => !dict.contains_key("Kids"),
        };

        if is_leaf {
            let mut page_dict = dict;
            for (key, value) in carried {
                page_dict.entry(key).or_insert(value);
            }
            pages.push(Page {
                reference,
                dict: page_dict,
            });
            return Ok(());
        }

        let kids = match dict.get("Kids") {
            Some(kids) => self.resolve(kids)?,
            None => Object::Null,
        };
        for kid in kids.as_array().map(Vec::as_slice).unwrap_or_default() {
            self.walk_page_tree(kid, &carried, depth + 1, visited, pages)?;
        }
        Ok(())
    }

    /// Decoded content stream of a page; multiple `/Contents` streams are
    /// joined with a newline so tokens cannot fuse across the boundary.
    pub fn page_content_data(&self, page_number: usize) -> DecodeResult<Vec<u8>> {
        let page = self.page(page_number)?;
        let contents = match page.dict.get("Contents") {
            Some(contents) => self.resolve(contents)?,
            None => return Ok(Vec::new()),
        };

        let parts = match contents {
            Object::Array(parts) => parts,
            single => vec![single],
        };

        let mut data = Vec::new();
        for part in &parts {
            let stream = self.resolve(part)?;
            if !matches!(stream, Object::Stream { .. }) {
                log::warn!("page {} has a non-stream /Contents entry", page_number);
                continue;
            }
            if !data.is_empty() {
                data.push(b'\n');
            }
            data.extend_from_slice(&stream.decode_stream_data(&self.limits)?);
        }
        Ok(data)
    }
}

fn read_xref(data: &[u8], limits: &DecoderLimits) -> DecodeResult<CrossRefTable> {
    let start = find_startxref(data)?;
    let xref = load_xref(data, start, limits)?;
    if !xref.trailer.contains_key("Root") {
        return Err(DecodeError::InvalidPdf("trailer has no /Root".to_string()));
    }
    Ok(xref)
}

/// Parse `%PDF-M.m` within the first kilobyte.
///
/// PDF Spec: ISO 32000-1:2008, Section 7.5.2 - File Header
pub fn parse_header(data: &[u8]) -> DecodeResult<(u8, u8)> {
    let start = data.iter().position(|&c| !is_whitespace(c)).unwrap_or(data.len());
    let window = &data[start..data.len().min(start + 1024)];
    let pos = start
        + window.windows(5).position(|w| w == b"%PDF-").ok_or_else(|| {
            DecodeError::InvalidHeader(String::from_utf8_lossy(&window[..window.len().min(8)]).into_owned())
        })?;
    if pos > 0 {
        log::debug!("{} bytes of junk before the PDF header", pos);
    }

    let version = &data[pos + 5..];
    match version {
        [major @ b'0'..=b'9', b'.', minor @ b'0'..=b'9', ..] => {
            let (major, minor) = (major - b'0', minor - b'0');
            if major == 0 || major > 2 {
                return Err(DecodeError::UnsupportedVersion(format!("{}.{}", major, minor)));
            }
            Ok((major, minor))
        },
        _ => Err(DecodeError::InvalidHeader(
            String::from_utf8_lossy(&version[..version.len().min(8)]).into_owned(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Assemble a classic PDF with a correct xref table.
    fn build_pdf(objects: &[&str], trailer_extra: &str) -> Vec<u8> {
        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }
        let xref_at = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
        for offset in offsets {
            out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R {} >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                trailer_extra,
                xref_at
            )
            .as_bytes(),
        );
        out
    }

    fn two_page_pdf() -> Vec<u8> {
        build_pdf(
            &[
                "<< /Type /Catalog /Pages 2 0 R >>",
                "<< /Type /Pages /Kids [3 0 R 4 0 R] /Count 2 /Resources << /Font << /F1 5 0 R >> >> >>",
                "<< /Type /Page /Parent 2 0 R /Contents 6 0 R >>",
                "<< /Type /Page /Parent 2 0 R /Contents [6 0 R 7 0 R] /Resources << >> >>",
                "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>",
                "<< /Length 7 >>\nstream\nBT 1 Tc\nendstream",
                "<< /Length 2 >>\nstream\nET\nendstream",
            ],
            "",
        )
    }

    #[test]
    fn test_parse_header() {
        assert_eq!(parse_header(b"%PDF-1.7\n").unwrap(), (1, 7));
        assert_eq!(parse_header(b"junk\n%PDF-2.0\n").unwrap(), (2, 0));
        assert!(matches!(parse_header(b"GIF89a"), Err(DecodeError::InvalidHeader(_))));
        assert!(matches!(parse_header(b"%PDF-9.1"), Err(DecodeError::UnsupportedVersion(_))));
    }

    #[test]
    fn test_pages_and_inherited_resources() {
        let doc = PdfDocument::from_bytes(two_page_pdf()).unwrap();
        assert_eq!(doc.version(), (1, 4));
        assert_eq!(doc.page_count(), 2);

        let first = doc.page(1).unwrap();
        let resources = doc.resolve_dict(first.resources().unwrap()).unwrap().unwrap();
        assert!(resources.contains_key("Font"));

        // The second page overrides the inherited resources.
        let second = doc.page(2).unwrap();
        let resources = doc.resolve_dict(second.resources().unwrap()).unwrap().unwrap();
        assert!(resources.is_empty());
    }

    #[test]
    fn test_page_out_of_range() {
        let doc = PdfDocument::from_bytes(two_page_pdf()).unwrap();
        assert!(matches!(doc.page(0), Err(DecodeError::PageOutOfRange { page: 0, count: 2 })));
        assert!(matches!(doc.page(3), Err(DecodeError::PageOutOfRange { page: 3, count: 2 })));
    }

    #[test]
    fn test_content_streams_are_joined() {
        let doc = PdfDocument::from_bytes(two_page_pdf()).unwrap();
        assert_eq!(doc.page_content_data(1).unwrap(), b"BT 1 Tc");
        assert_eq!(doc.page_content_data(2).unwrap(), b"BT 1 Tc\nET");
    }

    #[test]
    fn test_broken_startxref_is_reconstructed() {
        let mut data = two_page_pdf();
        let pos = data.windows(9).rposition(|w| w == b"startxref").unwrap();
        data.truncate(pos);
        data.extend_from_slice(b"startxref\n3\n%%EOF\n");
        let doc = PdfDocument::from_bytes(data).unwrap();
        assert_eq!(doc.page_count(), 2);
    }

    #[test]
    fn test_encrypted_document_is_rejected() {
        let data = build_pdf(
            &["<< /Type /Catalog /Pages 2 0 R >>", "<< /Type /Pages /Kids [] /Count 0 >>"],
            "/Encrypt << /Filter /Standard >>",
        );
        assert!(matches!(PdfDocument::from_bytes(data), Err(DecodeError::Encrypted)));
    }

    #[test]
    fn test_missing_object_resolves_to_null() {
        let doc = PdfDocument::from_bytes(two_page_pdf()).unwrap();
        assert_eq!(doc.load_object(ObjectRef::new(99, 0)).unwrap(), Object::Null);
    }

    #[test]
    fn test_unparsable_object_resolves_to_null() {
        let data = build_pdf(
            &[
                "<< /Type /Catalog /Pages 2 0 R >>",
                "<< /Type /Pages /Kids [3 0 R] /Count 1 >>",
                "<< /Type /Page /Parent 2 0 R /Contents 4 0 R >>",
                "]] >>",
            ],
            "",
        );
        let doc = PdfDocument::from_bytes(data).unwrap();
        assert_eq!(doc.load_object(ObjectRef::new(4, 0)).unwrap(), Object::Null);
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn test_page_tree_cycle_is_skipped() {
        let data = build_pdf(
            &[
                "<< /Type /Catalog /Pages 2 0 R >>",
                "<< /Type /Pages /Kids [2 0 R 3 0 R] /Count 1 >>",
                "<< /Type /Page /Parent 2 0 R >>",
            ],
            "",
        );
        let doc = PdfDocument::from_bytes(data).unwrap();
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn test_not_a_pdf() {
        assert!(PdfDocument::from_bytes(b"hello world".to_vec()).is_err());
    }
}
