//! PDF tokenizer.
//!
//! One lexer serves both the file-level object parser and the content-stream
//! parser: everything that is not a number, string, name or delimiter comes
//! back as a bare [`Token::Keyword`] (`obj`, `R`, `true`, `Tj`, `T*`, `'` ...),
//! and the caller decides what the word means.
//!
//! Whitespace (space, `\t`, `\r`, `\n`, `\0`, `\f`) and `%` comments are
//! skipped between tokens.
//!
//! PDF Spec: ISO 32000-1:2008, Section 7.2 - Lexical Conventions

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_while, take_while1},
    character::complete::{char, digit1, one_of},
    combinator::{map, opt, recognize, value},
    sequence::{pair, preceded, tuple},
    IResult,
};

/// A lexical token.
#[derive(Debug, PartialEq, Clone)]
pub enum Token<'a> {
    /// Integer number
    Integer(i64),
    /// Real number
    Real(f64),
    /// Literal string with escapes already decoded
    LiteralString(Vec<u8>),
    /// Hex string with digits already decoded
    HexString(Vec<u8>),
    /// Name with `#xx` escapes decoded, without the `/`
    Name(String),
    /// Any run of regular characters that is not a number
    Keyword(&'a [u8]),
    /// `[`
    ArrayStart,
    /// `]`
    ArrayEnd,
    /// `<<`
    DictStart,
    /// `>>`
    DictEnd,
}

/// PDF whitespace characters (Table 1).
pub fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C)
}

/// PDF delimiter characters (Table 2).
pub fn is_delimiter(c: u8) -> bool {
    matches!(c, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

/// Regular characters: neither whitespace nor delimiters.
pub fn is_regular(c: u8) -> bool {
    !is_whitespace(c) && !is_delimiter(c)
}

fn comment(input: &[u8]) -> IResult<&[u8], ()> {
    value((), preceded(char('%'), take_till(|c| c == b'\r' || c == b'\n')))(input)
}

/// Skip whitespace and comments. Never fails.
pub fn skip_ws(mut input: &[u8]) -> &[u8] {
    loop {
        let trimmed = match input.iter().position(|&c| !is_whitespace(c)) {
            Some(start) => &input[start..],
            None => return &input[input.len()..],
        };
        match comment(trimmed) {
            Ok((rest, _)) => input = rest,
            Err(_) => return trimmed,
        }
    }
}

/// Integers (`42`, `-7`, `+3`) and reals (`3.14`, `-.5`, `4.`).
fn number(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (rest, text) = recognize(tuple((
        opt(one_of("+-")),
        alt((
            recognize(pair(digit1, opt(pair(char('.'), opt(digit1))))),
            recognize(pair(char('.'), digit1)),
        )),
    )))(input)?;

    // A number glued to regular characters ("12abc") is a keyword, not a number.
    if rest.first().is_some_and(|&c| is_regular(c) && c != b'.' && !c.is_ascii_digit()) {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit)));
    }

    let text = std::str::from_utf8(text)
        .map_err(|_| nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit)))?;

    if text.contains('.') {
        let normalized = text.replace("-.", "-0.").replace("+.", "0.");
        let normalized = if normalized.starts_with('.') {
            format!("0{}", normalized)
        } else {
            normalized
        };
        let real: f64 = normalized.trim_end_matches('.').parse().map_err(|_| {
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Float))
        })?;
        Ok((rest, Token::Real(real)))
    } else {
        match text.parse::<i64>() {
            Ok(int) => Ok((rest, Token::Integer(int))),
            // Out-of-range integers are treated as reals, as most readers do.
            Err(_) => text
                .parse::<f64>()
                .map(|real| (rest, Token::Real(real)))
                .map_err(|_| {
                    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
                }),
        }
    }
}

/// Literal string `( ... )` with balanced parentheses and escapes.
///
/// PDF Spec: ISO 32000-1:2008, Section 7.3.4.2
fn literal_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (body, _) = char('(')(input)?;
    let mut out = Vec::with_capacity(body.len().min(64));
    let mut depth = 1usize;
    let mut i = 0;

    while i < body.len() {
        let c = body[i];
        i += 1;
        match c {
            b'\\' => {
                let Some(&esc) = body.get(i) else { break };
                i += 1;
                match esc {
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0C),
                    b'0'..=b'7' => {
                        let mut code = (esc - b'0') as u32;
                        for _ in 0..2 {
                            match body.get(i) {
                                Some(&d @ b'0'..=b'7') => {
                                    code = code * 8 + (d - b'0') as u32;
                                    i += 1;
                                },
                                _ => break,
                            }
                        }
                        out.push((code & 0xFF) as u8);
                    },
                    // Line continuation: backslash-EOL is dropped.
                    b'\r' => {
                        if body.get(i) == Some(&b'\n') {
                            i += 1;
                        }
                    },
                    b'\n' => {},
                    other => out.push(other),
                }
            },
            b'(' => {
                depth += 1;
                out.push(c);
            },
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&body[i..], Token::LiteralString(out)));
                }
                out.push(c);
            },
            _ => out.push(c),
        }
    }

    Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char)))
}

/// Decode hex digits, ignoring whitespace; an odd trailing digit is padded with 0.
pub fn decode_hex(digits: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(digits.len() / 2);
    let mut high: Option<u8> = None;
    for &c in digits {
        let Some(nibble) = (c as char).to_digit(16) else { continue };
        match high.take() {
            Some(h) => out.push((h << 4) | nibble as u8),
            None => high = Some(nibble as u8),
        }
    }
    if let Some(h) = high {
        out.push(h << 4);
    }
    out
}

/// Hex string `< ... >`.
fn hex_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    if input.starts_with(b"<<") {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag)));
    }
    let (rest, digits) = preceded(
        char('<'),
        take_while(|c: u8| c.is_ascii_hexdigit() || is_whitespace(c)),
    )(input)?;
    let (rest, _) = char('>')(rest)?;
    Ok((rest, Token::HexString(decode_hex(digits))))
}

/// Decode `#xx` escapes in a name.
///
/// PDF Spec: ISO 32000-1:2008, Section 7.3.5
pub fn decode_name_escapes(raw: &[u8]) -> String {
    let mut bytes = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'#' && i + 2 < raw.len() {
            let high = (raw[i + 1] as char).to_digit(16);
            let low = (raw[i + 2] as char).to_digit(16);
            if let (Some(high), Some(low)) = (high, low) {
                bytes.push((high * 16 + low) as u8);
                i += 3;
                continue;
            }
        }
        bytes.push(raw[i]);
        i += 1;
    }
    match String::from_utf8(bytes) {
        Ok(name) => name,
        // Non-UTF-8 names are read as Latin-1 so they stay distinct and printable.
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    }
}

fn name(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    map(preceded(char('/'), take_while(is_regular)), |raw: &[u8]| {
        Token::Name(decode_name_escapes(raw))
    })(input)
}

fn delimiter(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    alt((
        value(Token::DictStart, tag(b"<<")),
        value(Token::DictEnd, tag(b">>")),
        value(Token::ArrayStart, tag(b"[")),
        value(Token::ArrayEnd, tag(b"]")),
    ))(input)
}

fn keyword(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    map(take_while1(is_regular), Token::Keyword)(input)
}

/// Read one token after skipping leading whitespace and comments.
pub fn token(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let input = skip_ws(input);
    alt((number, literal_string, delimiter, hex_string, name, keyword))(input)
}
