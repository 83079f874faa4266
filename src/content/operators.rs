//! Content stream operators relevant to text placement.
//!
//! Everything the interpreter does not act on is kept as [`Operator::Other`]
//! so a page never fails because of an unfamiliar or malformed operator.
//!
//! PDF Spec: ISO 32000-1:2008, Annex A, Table A.1

use crate::content::graphics_state::Matrix;
use crate::object::Object;

/// A content stream operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    /// Begin text object (BT)
    BeginText,
    /// End text object (ET)
    EndText,
    /// Set font and size (Tf)
    Tf {
        /// Font resource name
        font: String,
        /// Font size
        size: f32,
    },
    /// Move text position (Td)
    Td {
        /// Horizontal offset
        tx: f32,
        /// Vertical offset
        ty: f32,
    },
    /// Move text position and set leading to `-ty` (TD)
    TD {
        /// Horizontal offset
        tx: f32,
        /// Vertical offset
        ty: f32,
    },
    /// Set text matrix and text line matrix (Tm)
    Tm {
        /// New text matrix
        matrix: Matrix,
    },
    /// Move to start of next line (T*)
    TStar,
    /// Show text (Tj)
    Tj {
        /// String bytes
        text: Vec<u8>,
    },
    /// Show text with glyph positioning (TJ)
    TJ {
        /// Strings and adjustments
        array: Vec<TextElement>,
    },
    /// Next line, then show text (')
    Quote {
        /// String bytes
        text: Vec<u8>,
    },
    /// Set spacing, next line, then show text (")
    DoubleQuote {
        /// Word spacing
        word_space: f32,
        /// Character spacing
        char_space: f32,
        /// String bytes
        text: Vec<u8>,
    },
    /// Character spacing (Tc)
    Tc {
        /// Character spacing
        char_space: f32,
    },
    /// Word spacing (Tw)
    Tw {
        /// Word spacing
        word_space: f32,
    },
    /// Horizontal scaling (Tz)
    Tz {
        /// Scale in percent
        scale: f32,
    },
    /// Leading (TL)
    TL {
        /// Leading
        leading: f32,
    },
    /// Text rise (Ts)
    Ts {
        /// Rise
        rise: f32,
    },
    /// Save graphics state (q)
    SaveState,
    /// Restore graphics state (Q)
    RestoreState,
    /// Concatenate matrix to CTM (cm)
    Cm {
        /// Matrix to concatenate
        matrix: Matrix,
    },
    /// Paint XObject (Do)
    Do {
        /// XObject resource name
        name: String,
    },
    /// Inline image (BI ... ID ... EI), skipped as a whole
    InlineImage,
    /// Any other operator
    Other {
        /// Operator name
        name: String,
        /// Operands
        operands: Vec<Object>,
    },
}

/// Element of a TJ array.
#[derive(Debug, Clone, PartialEq)]
pub enum TextElement {
    /// String to show
    String(Vec<u8>),
    /// Adjustment in thousandths of text space (positive moves left)
    Offset(f32),
}

fn number(operands: &[Object], index: usize) -> Option<f32> {
    operands.get(index).and_then(Object::as_number).map(|n| n as f32)
}

fn string(operands: &[Object], index: usize) -> Option<Vec<u8>> {
    operands.get(index).and_then(Object::as_string).map(<[u8]>::to_vec)
}

fn matrix(operands: &[Object]) -> Option<Matrix> {
    let mut m = [0.0f32; 6];
    for (i, slot) in m.iter_mut().enumerate() {
        *slot = number(operands, i)?;
    }
    Some(Matrix::new(m[0], m[1], m[2], m[3], m[4], m[5]))
}

impl Operator {
    /// Build a typed operator from its keyword and operands.
    ///
    /// Operators whose operands are missing or of the wrong type come back
    /// as [`Operator::Other`] and are ignored by the interpreter.
    pub fn from_parts(name: &str, operands: Vec<Object>) -> Operator {
        let typed = match name {
            "BT" => Some(Operator::BeginText),
            "ET" => Some(Operator::EndText),
            "Tf" => operands
                .first()
                .and_then(Object::as_name)
                .zip(number(&operands, 1))
                .map(|(font, size)| Operator::Tf {
                    font: font.to_string(),
                    size,
                }),
            "Td" => number(&operands, 0)
                .zip(number(&operands, 1))
                .map(|(tx, ty)| Operator::Td { tx, ty }),
            "TD" => number(&operands, 0)
                .zip(number(&operands, 1))
                .map(|(tx, ty)| Operator::TD { tx, ty }),
            "Tm" => matrix(&operands).map(|matrix| Operator::Tm { matrix }),
            "T*" => Some(Operator::TStar),
            "Tj" => string(&operands, 0).map(|text| Operator::Tj { text }),
            "'" => string(&operands, 0).map(|text| Operator::Quote { text }),
            "\"" => match (number(&operands, 0), number(&operands, 1), string(&operands, 2)) {
                (Some(word_space), Some(char_space), Some(text)) => Some(Operator::DoubleQuote {
                    word_space,
                    char_space,
                    text,
                }),
                _ => None,
            },
            "TJ" => operands.first().and_then(Object::as_array).map(|items| Operator::TJ {
                array: items
                    .iter()
                    .filter_map(|item| match item {
                        Object::String(s) => Some(TextElement::String(s.clone())),
                        other => other.as_number().map(|n| TextElement::Offset(n as f32)),
                    })
                    .collect(),
            }),
            "Tc" => number(&operands, 0).map(|char_space| Operator::Tc { char_space }),
            "Tw" => number(&operands, 0).map(|word_space| Operator::Tw { word_space }),
            "Tz" => number(&operands, 0).map(|scale| Operator::Tz { scale }),
            "TL" => number(&operands, 0).map(|leading| Operator::TL { leading }),
            "Ts" => number(&operands, 0).map(|rise| Operator::Ts { rise }),
            "q" => Some(Operator::SaveState),
            "Q" => Some(Operator::RestoreState),
            "cm" => matrix(&operands).map(|matrix| Operator::Cm { matrix }),
            "Do" => operands.first().and_then(Object::as_name).map(|name| Operator::Do {
                name: name.to_string(),
            }),
            _ => None,
        };

        match typed {
            Some(op) => op,
            None => Operator::Other {
                name: name.to_string(),
                operands,
            },
        }
    }

    /// True for operators that paint glyphs.
    pub fn shows_text(&self) -> bool {
        matches!(
            self,
            Operator::Tj { .. } | Operator::TJ { .. } | Operator::Quote { .. } | Operator::DoubleQuote { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tf() {
        let op = Operator::from_parts("Tf", vec![Object::Name("F1".into()), Object::Integer(12)]);
        assert_eq!(
            op,
            Operator::Tf {
                font: "F1".into(),
                size: 12.0
            }
        );
    }

    #[test]
    fn test_tm() {
        let operands = [1, 0, 0, 1, 72, 700].iter().map(|&n| Object::Integer(n)).collect();
        match Operator::from_parts("Tm", operands) {
            Operator::Tm { matrix } => assert_eq!(matrix.to_array(), [1.0, 0.0, 0.0, 1.0, 72.0, 700.0]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_tj_array_keeps_strings_and_offsets() {
        let array = Object::Array(vec![
            Object::String(b"A".to_vec()),
            Object::Integer(-250),
            Object::String(b"B".to_vec()),
            Object::Real(12.5),
        ]);
        let op = Operator::from_parts("TJ", vec![array]);
        assert_eq!(
            op,
            Operator::TJ {
                array: vec![
                    TextElement::String(b"A".to_vec()),
                    TextElement::Offset(-250.0),
                    TextElement::String(b"B".to_vec()),
                    TextElement::Offset(12.5),
                ]
            }
        );
        assert!(op.shows_text());
    }

    #[test]
    fn test_missing_operands_become_other() {
        let op = Operator::from_parts("Td", vec![Object::Integer(1)]);
        assert!(matches!(op, Operator::Other { ref name, .. } if name == "Td"));
        let op = Operator::from_parts("Tj", vec![Object::Integer(1)]);
        assert!(!op.shows_text());
    }

    #[test]
    fn test_unknown_operator() {
        let op = Operator::from_parts("re", vec![Object::Integer(0); 4]);
        assert!(matches!(op, Operator::Other { ref name, ref operands } if name == "re" && operands.len() == 4));
    }
}
