//! Configuration for decoding and layout reconstruction.
//!
//! The defaults are the behavioural contract: the layout ratios match the
//! constants in [`crate::extractors::layout_text`] and the decoder limits are
//! conservative values for untrusted uploads. Everything is serde-friendly so
//! the command-line tool can read a JSON config file.

use crate::extractors::layout_text::{COLUMN_BREAK_RATIO, LINE_BREAK_RATIO, WORD_SPACE_RATIO};
use serde::{Deserialize, Serialize};

/// Spacing thresholds, each a multiple of the font-height proxy `h`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutThresholds {
    /// `dy > line_break * h` starts a new line
    pub line_break: f32,
    /// `dx > column_break * h` on the same line emits a tab
    pub column_break: f32,
    /// `dx > word_space * h` on the same line emits a space
    pub word_space: f32,
}

impl Default for LayoutThresholds {
    fn default() -> Self {
        Self {
            line_break: LINE_BREAK_RATIO,
            column_break: COLUMN_BREAK_RATIO,
            word_space: WORD_SPACE_RATIO,
        }
    }
}

/// Resource limits applied while decoding untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderLimits {
    /// Maximum depth of nested indirect-object resolution.
    ///
    /// PDF Spec: ISO 32000-1:2008, Annex C - Implementation Limits
    pub max_recursion_depth: u32,

    /// Maximum size of any decoded stream in bytes (0 disables the check).
    pub max_decompressed_size: usize,

    /// Maximum output:input ratio for a decoded stream (0 disables the check).
    pub max_decompression_ratio: u32,

    /// Maximum nesting of Form XObjects invoked with `Do`.
    pub max_form_depth: u32,
}

impl Default for DecoderLimits {
    fn default() -> Self {
        Self {
            max_recursion_depth: 100,
            max_decompressed_size: 100 * 1024 * 1024, // 100 MB
            max_decompression_ratio: 100,
            max_form_depth: 12,
        }
    }
}

impl DecoderLimits {
    /// Set the maximum decoded stream size.
    pub fn with_max_decompressed_size(mut self, bytes: usize) -> Self {
        self.max_decompressed_size = bytes;
        self
    }

    /// Set the maximum Form XObject nesting.
    pub fn with_max_form_depth(mut self, depth: u32) -> Self {
        self.max_form_depth = depth;
        self
    }
}

/// Full configuration for one extraction call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Layout thresholds.
    pub thresholds: LayoutThresholds,
    /// Decoder resource limits.
    pub limits: DecoderLimits,
}

impl ExtractionConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the layout thresholds.
    pub fn with_thresholds(mut self, thresholds: LayoutThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Replace the decoder limits.
    pub fn with_limits(mut self, limits: DecoderLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Parse a JSON configuration; missing fields take their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
