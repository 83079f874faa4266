//! Graphics and text state tracked while interpreting a content stream.
//!
//! Only the parameters that affect where glyphs land are kept: the current
//! transformation matrix and the text state parameters (Tc, Tw, Tz, TL, Tf, Ts).
//! The text matrix itself is not part of the graphics state; it lives in the
//! interpreter and is reset by every `BT`.
//!
//! PDF Spec: ISO 32000-1:2008, Section 8.4 (graphics state), 9.3 (text state)

/// A 2D affine transformation matrix.
///
/// ```text
/// [ a  b  0 ]
/// [ c  d  0 ]
/// [ e  f  1 ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    /// Horizontal scaling component
    pub a: f32,
    /// Rotation/skew component
    pub b: f32,
    /// Rotation/skew component
    pub c: f32,
    /// Vertical scaling component
    pub d: f32,
    /// Horizontal translation
    pub e: f32,
    /// Vertical translation
    pub f: f32,
}

impl Matrix {
    /// The identity matrix.
    ///
    /// ```
    /// use pdf_layout_text::content::Matrix;
    ///
    /// let m = Matrix::identity();
    /// assert_eq!((m.a, m.d, m.e, m.f), (1.0, 1.0, 0.0, 0.0));
    /// ```
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// Matrix from its six components.
    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Pure translation.
    pub fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `self × other`: apply `self` first, then `other`.
    ///
    /// ```
    /// use pdf_layout_text::content::Matrix;
    ///
    /// let scale = Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
    /// let moved = scale.multiply(&Matrix::translation(10.0, 5.0));
    /// assert_eq!(moved.transform_point(1.0, 1.0), (12.0, 7.0));
    /// ```
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    /// Map a point through the matrix.
    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        (self.a * x + self.c * y + self.e, self.b * x + self.d * y + self.f)
    }

    /// The six components in PDF order `[a b c d e f]`.
    pub fn to_array(&self) -> [f32; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

/// Parameters saved and restored by `q`/`Q`.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsState {
    /// Current transformation matrix
    pub ctm: Matrix,
    /// Character spacing (Tc), unscaled text space units
    pub char_space: f32,
    /// Word spacing (Tw), applied to single-byte code 32
    pub word_space: f32,
    /// Horizontal scaling (Tz) in percent
    pub horizontal_scaling: f32,
    /// Leading (TL)
    pub leading: f32,
    /// Font resource name selected by Tf
    pub font_name: Option<String>,
    /// Font size selected by Tf
    pub font_size: f32,
    /// Text rise (Ts)
    pub text_rise: f32,
}

impl GraphicsState {
    /// Initial state at the start of a page.
    pub fn new() -> Self {
        Self {
            ctm: Matrix::identity(),
            char_space: 0.0,
            word_space: 0.0,
            horizontal_scaling: 100.0,
            leading: 0.0,
            font_name: None,
            font_size: 0.0,
            text_rise: 0.0,
        }
    }

    /// Text rendering matrix parameters `[Tfs·Th 0 0 Tfs 0 Trise]`.
    ///
    /// PDF Spec: ISO 32000-1:2008, Section 9.4.4
    pub fn text_space_matrix(&self) -> Matrix {
        Matrix::new(
            self.font_size * self.horizontal_scaling / 100.0,
            0.0,
            0.0,
            self.font_size,
            0.0,
            self.text_rise,
        )
    }
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self::new()
    }
}

/// Save/restore stack for `q` and `Q`.
///
/// An unbalanced `Q` leaves the current state in place.
#[derive(Debug, Clone, Default)]
pub struct GraphicsStateStack {
    current: GraphicsState,
    saved: Vec<GraphicsState>,
}

impl GraphicsStateStack {
    /// Stack holding only the initial state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stack starting from an inherited state (used for form XObjects).
    pub fn from_state(state: GraphicsState) -> Self {
        Self {
            current: state,
            saved: Vec::new(),
        }
    }

    /// The state in effect.
    pub fn current(&self) -> &GraphicsState {
        &self.current
    }

    /// Mutable access to the state in effect.
    pub fn current_mut(&mut self) -> &mut GraphicsState {
        &mut self.current
    }

    /// `q`
    pub fn save(&mut self) {
        self.saved.push(self.current.clone());
    }

    /// `Q`
    pub fn restore(&mut self) {
        match self.saved.pop() {
            Some(state) => self.current = state,
            None => log::debug!("unbalanced Q operator ignored"),
        }
    }

    /// Number of states on the stack, including the current one.
    pub fn depth(&self) -> usize {
        self.saved.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiply_applies_left_first() {
        let translate = Matrix::translation(10.0, 0.0);
        let scale = Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        assert_eq!(translate.multiply(&scale).transform_point(0.0, 0.0), (20.0, 0.0));
        assert_eq!(scale.multiply(&translate).transform_point(0.0, 0.0), (10.0, 0.0));
    }

    #[test]
    fn test_identity_is_neutral() {
        let m = Matrix::new(1.5, 0.2, -0.3, 2.0, 7.0, 9.0);
        assert_eq!(m.multiply(&Matrix::identity()), m);
        assert_eq!(Matrix::identity().multiply(&m), m);
    }

    #[test]
    fn test_text_space_matrix() {
        let mut state = GraphicsState::new();
        state.font_size = 12.0;
        state.horizontal_scaling = 50.0;
        state.text_rise = 3.0;
        assert_eq!(state.text_space_matrix().to_array(), [6.0, 0.0, 0.0, 12.0, 0.0, 3.0]);
    }

    #[test]
    fn test_save_restore() {
        let mut stack = GraphicsStateStack::new();
        stack.current_mut().font_size = 10.0;
        stack.save();
        stack.current_mut().font_size = 20.0;
        assert_eq!(stack.depth(), 2);
        stack.restore();
        assert_eq!(stack.current().font_size, 10.0);
        stack.restore();
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.current().font_size, 10.0);
    }
}
