//! Object streams (`/Type /ObjStm`, PDF 1.5+).
//!
//! The decoded stream starts with `N` pairs of integers (object number, offset
//! relative to `/First`), followed by the objects themselves.
//!
//! PDF Spec: ISO 32000-1:2008, Section 7.5.7

use crate::config::DecoderLimits;
use crate::error::{DecodeError, DecodeResult};
use crate::lexer::{token, Token};
use crate::object::Object;
use crate::parser::parse_object;

/// Objects of one object stream, in index order.
#[derive(Debug, Clone, Default)]
pub struct ObjectStream {
    objects: Vec<(u32, Object)>,
}

impl ObjectStream {
    /// Object stored at `index`, checked against the expected object number.
    pub fn get(&self, index: u32, id: u32) -> Option<&Object> {
        match self.objects.get(index as usize) {
            Some((found, obj)) if *found == id => Some(obj),
            // Some writers get the index wrong; fall back to the object number.
            _ => self
                .objects
                .iter()
                .find(|(found, _)| *found == id)
                .map(|(_, obj)| obj),
        }
    }

    /// Number of objects in the stream.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True when the stream holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Decode and split an object stream.
pub fn parse_object_stream(stream: &Object, limits: &DecoderLimits) -> DecodeResult<ObjectStream> {
    let dict = match stream {
        Object::Stream { dict, .. } => dict,
        other => {
            return Err(DecodeError::InvalidObjectType {
                expected: "Stream".to_string(),
                found: other.type_name().to_string(),
            })
        },
    };

    if let Some(kind) = dict.get("Type").and_then(Object::as_name) {
        if kind != "ObjStm" {
            return Err(DecodeError::InvalidPdf(format!("expected /Type /ObjStm, got /{}", kind)));
        }
    }

    let count = dict
        .get("N")
        .and_then(Object::as_integer)
        .filter(|n| (0..=1_000_000).contains(n))
        .ok_or_else(|| DecodeError::InvalidPdf("object stream has no valid /N".to_string()))?;
    let first = dict
        .get("First")
        .and_then(Object::as_integer)
        .filter(|f| *f >= 0)
        .ok_or_else(|| DecodeError::InvalidPdf("object stream has no valid /First".to_string()))?
        as usize;

    let data = stream.decode_stream_data(limits)?;
    if data.len() < first {
        return Err(DecodeError::InvalidPdf(format!(
            "object stream is {} bytes, /First is {}",
            data.len(),
            first
        )));
    }

    let (header, body) = data.split_at(first);
    let mut objects = Vec::with_capacity(count as usize);
    let mut input = header;
    for _ in 0..count {
        let (rest, id) = match token(input) {
            Ok((rest, Token::Integer(id))) if id >= 0 => (rest, id as u32),
            _ => break,
        };
        let (rest, offset) = match token(rest) {
            Ok((rest, Token::Integer(offset))) if offset >= 0 => (rest, offset as usize),
            _ => break,
        };
        input = rest;

        let parsed = body.get(offset..).and_then(|slice| parse_object(slice).ok());
        match parsed {
            Some((_, obj)) => objects.push((id, obj)),
            None => {
                log::warn!("object {} at offset {} in object stream is unreadable", id, offset);
                objects.push((id, Object::Null));
            },
        }
    }

    Ok(ObjectStream { objects })
}
