//! Content stream parser.
//!
//! Content streams are postfix: operands come first, then the operator
//! keyword that consumes them.
//!
//! ```text
//! BT
//!   /F1 12 Tf
//!   72 712 Td
//!   (Hello) Tj
//! ET
//! ```
//!
//! Parsing never fails. Bytes that cannot be tokenized are skipped one at a
//! time and the pending operands are dropped, so one damaged operator does
//! not cost the rest of the page.

use crate::content::operators::Operator;
use crate::lexer::{is_delimiter, is_whitespace, skip_ws, token, Token};
use crate::parser::parse_object;

/// Parse a decoded content stream into operators.
///
/// ```
/// use pdf_layout_text::content::{parse_content_stream, Operator};
///
/// let ops = parse_content_stream(b"BT /F1 12 Tf (Hello) Tj ET");
/// assert_eq!(ops.len(), 4);
/// assert_eq!(ops[0], Operator::BeginText);
/// ```
pub fn parse_content_stream(data: &[u8]) -> Vec<Operator> {
    let mut operators = Vec::new();
    let mut operands = Vec::new();
    let mut input = data;

    loop {
        input = skip_ws(input);
        if input.is_empty() {
            break;
        }

        match token(input) {
            Ok((rest, Token::Keyword(keyword))) if !is_operand_keyword(keyword) => {
                if keyword == b"BI" {
                    operands.clear();
                    operators.push(Operator::InlineImage);
                    input = skip_inline_image(rest);
                    continue;
                }
                let name = String::from_utf8_lossy(keyword);
                operators.push(Operator::from_parts(&name, std::mem::take(&mut operands)));
                input = rest;
            },
            Ok(_) => match parse_object(input) {
                Ok((rest, operand)) => {
                    operands.push(operand);
                    input = rest;
                },
                Err(_) => {
                    operands.clear();
                    input = &input[1..];
                },
            },
            Err(_) => {
                log::trace!("skipping unparseable content byte 0x{:02X}", input[0]);
                operands.clear();
                input = &input[1..];
            },
        }
    }

    if !operands.is_empty() {
        log::debug!("{} trailing operands without an operator", operands.len());
    }
    operators
}

fn is_operand_keyword(keyword: &[u8]) -> bool {
    matches!(keyword, b"true" | b"false" | b"null")
}

/// Skip an inline image body, returning the input after `EI`.
///
/// PDF Spec: ISO 32000-1:2008, Section 8.9.7
fn skip_inline_image(mut input: &[u8]) -> &[u8] {
    // Image dictionary entries up to the ID keyword.
    loop {
        match token(input) {
            Ok((rest, Token::Keyword(b"ID"))) => {
                input = rest;
                break;
            },
            Ok((rest, _)) => input = rest,
            Err(_) => return input,
        }
    }

    // One whitespace byte separates ID from the binary data.
    if input.first().is_some_and(|&c| is_whitespace(c)) {
        input = &input[1..];
    }

    let mut i = 0;
    while i + 1 < input.len() {
        if &input[i..i + 2] == b"EI" {
            let before = i == 0 || is_whitespace(input[i - 1]);
            let after = input.get(i + 2).map_or(true, |&c| is_whitespace(c) || is_delimiter(c));
            if before && after {
                return &input[i + 2..];
            }
        }
        i += 1;
    }
    log::warn!("inline image without EI");
    &input[input.len()..]
}
