//! PDF object parser.
//!
//! Builds [`Object`] values from the token stream produced by
//! [`crate::lexer`]. Used for indirect objects, trailers, object streams and
//! the operands of content-stream operators.
//!
//! PDF Spec: ISO 32000-1:2008, Section 7.3 - Objects

use crate::lexer::{skip_ws, token, Token};
use crate::object::{Dict, Object, ObjectRef};
use nom::IResult;

/// Arrays and dictionaries nested deeper than this are rejected.
///
/// PDF Spec: ISO 32000-1:2008, Annex C - Implementation Limits
const MAX_NESTING: usize = 256;

fn fail<T>(input: &[u8], kind: nom::error::ErrorKind) -> IResult<&[u8], T> {
    Err(nom::Err::Error(nom::error::Error::new(input, kind)))
}

/// Parse one object, including `N G R` references and streams.
pub fn parse_object(input: &[u8]) -> IResult<&[u8], Object> {
    parse_nested(input, 0)
}

fn parse_nested(input: &[u8], depth: usize) -> IResult<&[u8], Object> {
    if depth > MAX_NESTING {
        return fail(input, nom::error::ErrorKind::TooLarge);
    }

    let (rest, tok) = token(input)?;
    match tok {
        Token::Integer(id) => Ok(reference_after(rest, id).unwrap_or((rest, Object::Integer(id)))),
        Token::Real(r) => Ok((rest, Object::Real(r))),
        Token::LiteralString(s) | Token::HexString(s) => Ok((rest, Object::String(s))),
        Token::Name(name) => Ok((rest, Object::Name(name))),
        Token::ArrayStart => parse_array_body(rest, depth),
        Token::DictStart => {
            let (rest, dict) = parse_dict_body(rest, depth)?;
            match token(rest) {
                Ok((after, Token::Keyword(b"stream"))) => {
                    let (after, data) = stream_body(after, &dict)?;
                    Ok((
                        after,
                        Object::Stream {
                            dict,
                            data: bytes::Bytes::from(data),
                        },
                    ))
                },
                _ => Ok((rest, Object::Dictionary(dict))),
            }
        },
        Token::Keyword(b"true") => Ok((rest, Object::Boolean(true))),
        Token::Keyword(b"false") => Ok((rest, Object::Boolean(false))),
        Token::Keyword(b"null") => Ok((rest, Object::Null)),
        Token::Keyword(_) | Token::ArrayEnd | Token::DictEnd => {
            fail(input, nom::error::ErrorKind::Alt)
        },
    }
}

/// Lookahead for `G R` after an integer.
fn reference_after(input: &[u8], id: i64) -> Option<(&[u8], Object)> {
    let (rest, gen) = match token(input).ok()? {
        (rest, Token::Integer(gen)) => (rest, gen),
        _ => return None,
    };
    match token(rest).ok()? {
        (rest, Token::Keyword(b"R")) => {
            let id = u32::try_from(id).ok()?;
            let gen = u16::try_from(gen).ok()?;
            Some((rest, Object::Reference(ObjectRef::new(id, gen))))
        },
        _ => None,
    }
}

fn parse_array_body(mut input: &[u8], depth: usize) -> IResult<&[u8], Object> {
    let mut items = Vec::new();
    loop {
        input = skip_ws(input);
        match input.first() {
            None => return Ok((input, Object::Array(items))),
            Some(b']') => return Ok((&input[1..], Object::Array(items))),
            _ => {},
        }
        let (rest, item) = parse_nested(input, depth + 1)?;
        items.push(item);
        input = rest;
    }
}

/// Dictionary entries up to `>>`. A missing `>>` at end of input is tolerated.
fn parse_dict_body(mut input: &[u8], depth: usize) -> IResult<&[u8], Dict> {
    let mut dict = Dict::new();
    loop {
        let (rest, tok) = match token(input) {
            Ok(ok) => ok,
            Err(_) if skip_ws(input).is_empty() => return Ok((skip_ws(input), dict)),
            Err(e) => return Err(e),
        };
        let key = match tok {
            Token::DictEnd => return Ok((rest, dict)),
            Token::Name(key) => key,
            _ => return fail(input, nom::error::ErrorKind::Verify),
        };

        // A key directly followed by `>>` has no value; treat it as null.
        if skip_ws(rest).starts_with(b">>") {
            input = rest;
            continue;
        }
        let (rest, value) = parse_nested(rest, depth + 1)?;
        if !value.is_null() {
            dict.insert(key, value);
        }
        input = rest;
    }
}

/// Stream bytes after the `stream` keyword.
///
/// A direct `/Length` is trusted when `endstream` follows it; otherwise the
/// data runs to the next `endstream` (indirect lengths cannot be resolved here).
///
/// PDF Spec: ISO 32000-1:2008, Section 7.3.8.1
fn stream_body<'a>(input: &'a [u8], dict: &Dict) -> IResult<&'a [u8], Vec<u8>> {
    let input = if input.starts_with(b"\r\n") {
        &input[2..]
    } else if input.starts_with(b"\n") || input.starts_with(b"\r") {
        &input[1..]
    } else {
        input
    };

    if let Some(length) = dict.get("Length").and_then(Object::as_integer) {
        let length = length.max(0) as usize;
        if length <= input.len() && skip_ws(&input[length..]).starts_with(b"endstream") {
            let rest = &skip_ws(&input[length..])[b"endstream".len()..];
            return Ok((rest, input[..length].to_vec()));
        }
        log::debug!("stream /Length {} does not reach endstream, scanning", length);
    }

    match find_endstream(input) {
        Some(pos) => {
            let mut end = pos;
            // Drop the EOL that precedes `endstream`.
            if end > 0 && input[end - 1] == b'\n' {
                end -= 1;
            }
            if end > 0 && input[end - 1] == b'\r' {
                end -= 1;
            }
            Ok((&input[pos + b"endstream".len()..], input[..end].to_vec()))
        },
        None => fail(input, nom::error::ErrorKind::Eof),
    }
}

fn find_endstream(input: &[u8]) -> Option<usize> {
    input.windows(b"endstream".len()).position(|w| w == b"endstream")
}

/// Parse an indirect object header and body: `N G obj <object> [endobj]`.
///
/// Returns the object reference and the object. A missing `endobj` is
/// tolerated.
pub fn parse_indirect_object(input: &[u8]) -> IResult<&[u8], (ObjectRef, Object)> {
    let (rest, id) = match token(input)? {
        (rest, Token::Integer(id)) => match u32::try_from(id) {
            Ok(id) => (rest, id),
            Err(_) => return fail(input, nom::error::ErrorKind::Digit),
        },
        _ => return fail(input, nom::error::ErrorKind::Digit),
    };
    let (rest, gen) = match token(rest)? {
        (rest, Token::Integer(gen)) if (0..=u16::MAX as i64).contains(&gen) => (rest, gen as u16),
        _ => return fail(input, nom::error::ErrorKind::Digit),
    };
    let rest = match token(rest)? {
        (rest, Token::Keyword(b"obj")) => rest,
        _ => return fail(input, nom::error::ErrorKind::Tag),
    };
    let (rest, object) = parse_object(rest)?;
    let rest = match token(rest) {
        Ok((after, Token::Keyword(b"endobj"))) => after,
        _ => rest,
    };
    Ok((rest, (ObjectRef::new(id, gen), object)))
}
