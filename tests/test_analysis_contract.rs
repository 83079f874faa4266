//! The analysis data contract, exercised through a canned service.

use pdf_layout_text::analysis::{
    AnalysisError, AnalysisRequest, AnalysisResult, AnalysisService, OutputLanguage, SummaryLevel,
    MAX_ANALYSIS_CHARS,
};

/// Replies with a fixed JSON document, or fails when it has none.
struct CannedService {
    response: Option<&'static str>,
}

impl AnalysisService for CannedService {
    fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        assert!(request.text.chars().count() <= MAX_ANALYSIS_CHARS);
        match self.response {
            Some(json) => AnalysisResult::from_json(json),
            None => Err(AnalysisError::Service("quota exceeded".to_string())),
        }
    }
}

const FULL_RESPONSE: &str = r##"{
  "metadata": {
    "language": "Mixed",
    "subject": "الكيمياء",
    "stage": "الصف الثاني الثانوي",
    "curriculum": "IGCSE",
    "overview": "Atomic structure and bonding."
  },
  "summary": "# Atoms\n| particle | charge |\n|---|---|\n| proton | + |",
  "qaBank": "**Q1.** Define isotope. 🟢 Same protons, different neutrons.",
  "flashcards": [
    {"front": "Isotope", "back": "Same element, different mass number"},
    {"front": "Ion", "back": "Charged atom"}
  ],
  "quiz": [
    {"question": "Charge of an electron?", "options": ["+1", "-1", "0"], "correctAnswerIndex": 1,
     "explanation": "Electrons are negative."},
    {"question": "Broken", "options": ["a"], "correctAnswerIndex": 3, "explanation": ""}
  ],
  "studyPlan": [
    {"day": "اليوم الأول", "tasks": ["Read chapter 1", "Solve exercises 1-10"]},
    {"day": "Day 2", "tasks": []}
  ]
}"##;

#[test]
fn test_full_response_round_trip() {
    let service = CannedService {
        response: Some(FULL_RESPONSE),
    };
    let request = AnalysisRequest::new("--- Page 1 ---\nAtoms\n\n", SummaryLevel::Comprehensive, OutputLanguage::Mixed);
    let result = service.analyze(&request).unwrap();

    assert_eq!(result.metadata.curriculum, "IGCSE");
    assert_eq!(result.flashcards.len(), 2);
    assert_eq!(result.quiz.len(), 2);
    assert!(result.quiz[0].is_consistent());
    assert!(!result.quiz[1].is_consistent());
    assert_eq!(result.study_plan[0].tasks.len(), 2);

    let json = serde_json::to_value(&result).unwrap();
    assert!(json.get("qaBank").is_some());
    assert!(json.get("studyPlan").is_some());
    assert_eq!(json["quiz"][0]["correctAnswerIndex"], 1);
}

#[test]
fn test_missing_required_field_is_invalid_json() {
    let err = AnalysisResult::from_json(r#"{"summary": "only this"}"#).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidJson(_)));
    assert!(err.to_string().starts_with("Received invalid JSON"));
}

#[test]
fn test_service_failure_passes_through() {
    let service = CannedService { response: None };
    let request = AnalysisRequest::new("text", SummaryLevel::default(), OutputLanguage::default());
    assert!(matches!(service.analyze(&request), Err(AnalysisError::Service(_))));
}

#[test]
fn test_request_serializes_with_wire_names() {
    let request = AnalysisRequest::new("t", SummaryLevel::Concise, OutputLanguage::Arabic);
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["summaryLevel"], "concise");
    assert_eq!(json["outputLanguage"], "ar");
}

#[test]
fn test_long_text_is_truncated() {
    let text = "x".repeat(MAX_ANALYSIS_CHARS * 2);
    let request = AnalysisRequest::new(&text, SummaryLevel::Balanced, OutputLanguage::Original);
    assert_eq!(request.text.len(), MAX_ANALYSIS_CHARS);
}
