//! Data contract for analysing extracted text with a language model.
//!
//! The crate does not talk to any model. It defines the request a caller
//! builds from extracted text, the structured result a model is expected to
//! return as JSON, and the [`AnalysisService`] seam a client plugs into.

use serde::{Deserialize, Serialize};

/// Extracted text beyond this many characters is not sent for analysis.
pub const MAX_ANALYSIS_CHARS: usize = 800_000;

/// Interface language for user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    /// Arabic (`ar`)
    #[default]
    #[serde(rename = "ar")]
    Arabic,
    /// English (`en`)
    #[serde(rename = "en")]
    English,
}

/// How much detail the summary should keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLevel {
    /// Key points only
    Concise,
    /// Main ideas with supporting detail
    #[default]
    Balanced,
    /// Everything, section by section
    Comprehensive,
}

/// Language the analysis is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OutputLanguage {
    /// Same language as the book
    #[default]
    #[serde(rename = "original")]
    Original,
    /// Arabic
    #[serde(rename = "ar")]
    Arabic,
    /// English
    #[serde(rename = "en")]
    English,
    /// Both, side by side
    #[serde(rename = "mixed")]
    Mixed,
}

/// Text and options handed to an [`AnalysisService`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// Extracted text, at most [`MAX_ANALYSIS_CHARS`] characters
    pub text: String,
    /// Requested summary depth
    pub summary_level: SummaryLevel,
    /// Requested output language
    pub output_language: OutputLanguage,
}

impl AnalysisRequest {
    /// Build a request, truncating `text` to [`MAX_ANALYSIS_CHARS`] characters.
    ///
    /// The limit counts Unicode scalar values (`char`), not UTF-16 code
    /// units. Text outside the Basic Multilingual Plane, such as emoji,
    /// therefore keeps up to twice as many UTF-16 units as a UTF-16 cut would.
    ///
    /// ```
    /// use pdf_layout_text::analysis::{AnalysisRequest, OutputLanguage, SummaryLevel};
    ///
    /// let req = AnalysisRequest::new("--- Page 1 ---\nhello\n\n", SummaryLevel::Concise, OutputLanguage::English);
    /// assert!(req.text.ends_with("hello\n\n"));
    /// ```
    pub fn new(text: &str, summary_level: SummaryLevel, output_language: OutputLanguage) -> Self {
        let text = match text.char_indices().nth(MAX_ANALYSIS_CHARS) {
            Some((cut, _)) => {
                log::debug!("truncating analysis input at byte {} of {}", cut, text.len());
                &text[..cut]
            },
            None => text,
        };
        Self {
            text: text.to_string(),
            summary_level,
            output_language,
        }
    }
}

/// Facts about the book inferred by the model.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BookMetadata {
    /// Primary language, e.g. "Arabic" or "Mixed"
    pub language: String,
    /// Subject matter
    pub subject: String,
    /// Educational stage, e.g. "Grade 10"
    pub stage: String,
    /// Curriculum type, e.g. "Cambridge"
    pub curriculum: String,
    /// Overview paragraph
    pub overview: String,
}

/// Term on the front, definition on the back.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Flashcard {
    /// Term or question
    pub front: String,
    /// Definition or answer
    pub back: String,
}

/// Multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    /// Question text
    pub question: String,
    /// Answer choices
    pub options: Vec<String>,
    /// Index into `options`
    pub correct_answer_index: usize,
    /// Why the answer is correct
    pub explanation: String,
}

impl QuizQuestion {
    /// True if the answer index points at one of the options.
    pub fn is_consistent(&self) -> bool {
        self.correct_answer_index < self.options.len()
    }
}

/// One unit of the study plan.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StudyItem {
    /// Time unit label, e.g. "Day 1"
    pub day: String,
    /// Tasks for this unit
    pub tasks: Vec<String>,
}

/// Structured analysis returned by a model.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Inferred book metadata
    pub metadata: BookMetadata,
    /// Markdown summary
    pub summary: String,
    /// Markdown question bank
    pub qa_bank: String,
    /// Active-recall cards
    pub flashcards: Vec<Flashcard>,
    /// Multiple-choice quiz; absent in older responses
    #[serde(default)]
    pub quiz: Vec<QuizQuestion>,
    /// Suggested schedule
    pub study_plan: Vec<StudyItem>,
}

impl AnalysisResult {
    /// Parse a model response.
    pub fn from_json(response: &str) -> Result<Self, AnalysisError> {
        if response.trim().is_empty() {
            return Err(AnalysisError::EmptyResponse);
        }
        let result: Self = serde_json::from_str(response)?;
        let inconsistent = result.quiz.iter().filter(|q| !q.is_consistent()).count();
        if inconsistent > 0 {
            log::warn!("{} quiz questions point past their options", inconsistent);
        }
        Ok(result)
    }
}

/// Failures of an analysis round trip.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The service answered with nothing
    #[error("No response from analysis service")]
    EmptyResponse,

    /// The response is not a valid analysis document
    #[error("Received invalid JSON from analysis service: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Transport or service-side failure
    #[error("Analysis service error: {0}")]
    Service(String),
}

/// A client able to analyse extracted text.
pub trait AnalysisService {
    /// Run one analysis.
    fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError>;
}
