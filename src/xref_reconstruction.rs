//! Cross-reference reconstruction for damaged files.
//!
//! When `startxref` is missing or points at garbage, the file is scanned for
//! `N G obj` headers and the last `trailer` dictionary. Later definitions of
//! the same object number override earlier ones, matching incremental-update
//! order. If no trailer survives, the catalog is located by `/Type /Catalog`.

use crate::error::{DecodeError, DecodeResult};
use crate::object::{Dict, Object, ObjectRef};
use crate::parser::{parse_indirect_object, parse_object};
use crate::xref::{CrossRefTable, XRefEntry};
use lazy_static::lazy_static;
use regex::bytes::Regex;

lazy_static! {
    /// `N G obj` preceded by whitespace or at the start of the file.
    static ref RE_OBJ_HEADER: Regex =
        Regex::new(r"(?-u)(?:^|[ \t\r\n\x00\x0C])(\d{1,10})[ \t\r\n\x00\x0C]+(\d{1,5})[ \t\r\n\x00\x0C]+obj")
            .expect("valid object header regex");
    static ref RE_TRAILER: Regex =
        Regex::new(r"(?-u)trailer[ \t\r\n\x00\x0C]*<<").expect("valid trailer regex");
}

/// Rebuild the xref by scanning every byte of `data`.
pub fn reconstruct_xref(data: &[u8]) -> DecodeResult<CrossRefTable> {
    log::warn!("cross-reference data unusable, scanning {} bytes for objects", data.len());

    let mut table = CrossRefTable::new();
    for caps in RE_OBJ_HEADER.captures_iter(data) {
        let (Some(id), Some(gen)) = (caps.get(1), caps.get(2)) else { continue };
        let id: u32 = match std::str::from_utf8(id.as_bytes()).ok().and_then(|s| s.parse().ok()) {
            Some(id) => id,
            None => continue,
        };
        let generation: u16 =
            match std::str::from_utf8(gen.as_bytes()).ok().and_then(|s| s.parse().ok()) {
                Some(gen) => gen,
                None => continue,
            };
        let offset = caps.get(1).map(|m| m.start()).unwrap_or(0);
        table.insert(id, XRefEntry::Uncompressed { offset, generation });
    }

    if table.is_empty() {
        return Err(DecodeError::InvalidPdf("no objects found while scanning file".to_string()));
    }

    table.trailer = last_trailer(data).unwrap_or_default();
    if !table.trailer.contains_key("Root") {
        if let Some(root) = find_catalog(data, &table) {
            log::debug!("catalog located by scan: {}", root);
            table.trailer.insert("Root".to_string(), Object::Reference(root));
        }
    }

    log::debug!("reconstructed {} xref entries", table.len());
    Ok(table)
}

fn last_trailer(data: &[u8]) -> Option<Dict> {
    let m = RE_TRAILER.find_iter(data).last()?;
    let dict_start = m.end() - 2;
    match parse_object(&data[dict_start..]) {
        Ok((_, Object::Dictionary(dict))) => Some(dict),
        _ => None,
    }
}

fn find_catalog(data: &[u8], table: &CrossRefTable) -> Option<ObjectRef> {
    table.iter().find_map(|(id, entry)| match entry {
        XRefEntry::Uncompressed { offset, generation } => {
            let (_, (_, obj)) = parse_indirect_object(data.get(*offset..)?).ok()?;
            let is_catalog = obj.as_dict()?.get("Type").and_then(Object::as_name) == Some("Catalog");
            is_catalog.then_some(ObjectRef::new(id, *generation))
        },
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAMAGED: &[u8] = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n2 0 obj\n<< /Type /Pages /Kids [] /Count 0 >>\nendobj\nstartxref\n999999\n%%EOF";

    #[test]
    fn test_reconstruct_finds_objects_and_catalog() {
        let table = reconstruct_xref(DAMAGED).unwrap();
        assert_eq!(table.len(), 2);
        match table.get(2) {
            Some(XRefEntry::Uncompressed { offset, .. }) => {
                assert!(DAMAGED[*offset..].starts_with(b"2 0 obj"));
            },
            other => panic!("unexpected entry {:?}", other),
        }
        assert_eq!(
            table.trailer.get("Root").and_then(Object::as_reference),
            Some(ObjectRef::new(1, 0))
        );
    }

    #[test]
    fn test_later_definition_wins() {
        let data = b"1 0 obj\n(old)\nendobj\n1 0 obj\n(new)\nendobj\n";
        let table = reconstruct_xref(data).unwrap();
        match table.get(1) {
            Some(XRefEntry::Uncompressed { offset, .. }) => assert!(*offset > 10),
            other => panic!("unexpected entry {:?}", other),
        }
    }

    #[test]
    fn test_trailer_is_used_when_present() {
        let data = b"1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n<< /Root 1 0 R /Size 2 >>\n";
        let table = reconstruct_xref(data).unwrap();
        assert_eq!(table.trailer.get("Size").and_then(Object::as_integer), Some(2));
    }

    #[test]
    fn test_no_objects_is_error() {
        assert!(reconstruct_xref(b"%PDF-1.4\nnothing here\n").is_err());
    }
}
