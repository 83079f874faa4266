//! Content stream parsing.
//!
//! Turns decoded page content into typed operators and tracks the graphics
//! state needed to place glyphs.

pub mod graphics_state;
pub mod operators;
pub mod parser;

pub use graphics_state::{GraphicsState, GraphicsStateStack, Matrix};
pub use operators::{Operator, TextElement};
pub use parser::parse_content_stream;
