//! POST /api/analyze-cv: structured review of an uploaded PDF CV.

use axum::{
    extract::State,
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::analysis::pdf::{extract_pdf_text, validate_pdf_upload};
use crate::analysis::prompts::{ANALYSIS_PROMPT_TEMPLATE, MAX_ANALYSIS_CHARS};
use crate::errors::AppError;
use crate::extract::MultipartForm;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::state::AppState;

const MIN_SCORE: u8 = 1;
const MAX_SCORE: u8 = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryScores {
    #[serde(default)]
    pub technical_skills: u8,
    #[serde(default)]
    pub experience: u8,
    #[serde(default)]
    pub education: u8,
    #[serde(default)]
    pub achievements: u8,
    #[serde(default)]
    pub presentation: u8,
}

impl CategoryScores {
    fn values(&self) -> [u8; 5] {
        [
            self.technical_skills,
            self.experience,
            self.education,
            self.achievements,
            self.presentation,
        ]
    }

    fn clamped(&self) -> Self {
        let c = |v: u8| v.clamp(MIN_SCORE, MAX_SCORE);
        Self {
            technical_skills: c(self.technical_skills),
            experience: c(self.experience),
            education: c(self.education),
            achievements: c(self.achievements),
            presentation: c(self.presentation),
        }
    }

    fn mean(&self) -> u8 {
        let total: u32 = self.values().iter().map(|&v| u32::from(v)).sum();
        ((total as f32 / 5.0).round() as u8).clamp(MIN_SCORE, MAX_SCORE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvAnalysis {
    #[serde(default)]
    pub overall_score: u8,
    #[serde(default)]
    pub scores: CategoryScores,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl CvAnalysis {
    /// Clamps every score to 1..=100 and fills a missing overall score with
    /// the mean of the categories.
    pub fn normalized(mut self) -> Self {
        self.scores = self.scores.clamped();
        self.overall_score = if self.overall_score == 0 {
            self.scores.mean()
        } else {
            self.overall_score.clamp(MIN_SCORE, MAX_SCORE)
        };
        self
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyzeCvResponse {
    pub analysis: CvAnalysis,
}

/// Scores come back as numbers, numeric strings or floats. Anything out of
/// range for `u8` is clamped before the struct is built.
fn coerce_scores(value: &mut serde_json::Value) {
    fn coerce(v: &mut serde_json::Value) {
        let n = match v {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        *v = match n {
            Some(n) if n.is_finite() => serde_json::Value::from(n.round().clamp(0.0, 255.0) as u8),
            _ => serde_json::Value::from(0u8),
        };
    }

    if let Some(overall) = value.get_mut("overall_score") {
        coerce(overall);
    }
    if let Some(scores) = value.get_mut("scores").and_then(|s| s.as_object_mut()) {
        scores.values_mut().for_each(coerce);
    }
}

#[derive(Debug, Error)]
pub enum AnalysisParseError {
    #[error("unexpected reply shape: {0}")]
    Shape(#[from] serde_json::Error),

    #[error("reply carries no scores")]
    NoScores,
}

/// A reply must carry an overall score or at least one category score;
/// anything else is a failed analysis rather than a CV rated 1/100.
pub fn parse_analysis(mut value: serde_json::Value) -> Result<CvAnalysis, AnalysisParseError> {
    coerce_scores(&mut value);
    let analysis: CvAnalysis = serde_json::from_value(value)?;
    if analysis.overall_score == 0 && analysis.scores.values().iter().all(|&v| v == 0) {
        return Err(AnalysisParseError::NoScores);
    }
    Ok(analysis.normalized())
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// POST /api/analyze-cv
///
/// Multipart with a single `file` field holding a PDF.
pub async fn handle_analyze_cv(
    State(state): State<AppState>,
    MultipartForm(mut multipart): MultipartForm,
) -> Result<Json<AnalyzeCvResponse>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?;
        upload = Some((content_type, bytes));
        break;
    }

    let (content_type, bytes) =
        upload.ok_or_else(|| AppError::Validation("No file provided".to_string()))?;
    validate_pdf_upload(content_type.as_deref(), &bytes)?;

    let size = bytes.len();
    let text = extract_pdf_text(bytes.to_vec()).await?;
    if text.trim().is_empty() {
        return Err(AppError::Validation("No text found in PDF".to_string()));
    }
    info!(size, text_chars = text.chars().count(), "extracted CV text for analysis");

    let prompt =
        ANALYSIS_PROMPT_TEMPLATE.replace("{cv_text}", truncate_chars(&text, MAX_ANALYSIS_CHARS));

    let raw: serde_json::Value = state
        .gemini
        .call_json(&prompt, Some(JSON_ONLY_SYSTEM))
        .await
        .map_err(|e| {
            warn!("CV analysis call failed: {e}");
            AppError::Llm("Failed to analyze CV".to_string())
        })?;

    let analysis = parse_analysis(raw).map_err(|e| {
        warn!("CV analysis reply did not match the expected shape: {e}");
        AppError::Llm("Failed to analyze CV".to_string())
    })?;

    info!(overall_score = analysis.overall_score, "CV analysis complete");
    Ok(Json(AnalyzeCvResponse { analysis }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_analysis() {
        let analysis = parse_analysis(json!({
            "overall_score": 72,
            "scores": {
                "technical_skills": 80, "experience": 70, "education": 65,
                "achievements": 60, "presentation": 85
            },
            "summary": "Profile-nya lumayan solid nih.",
            "strengths": ["Skill-nya komplit"],
            "improvements": ["Kurang metrics"],
            "recommendations": ["Tambahin link GitHub"]
        }))
        .unwrap();
        assert_eq!(analysis.overall_score, 72);
        assert_eq!(analysis.scores.presentation, 85);
        assert_eq!(analysis.strengths.len(), 1);
    }

    #[test]
    fn test_missing_overall_score_uses_mean() {
        let analysis = parse_analysis(json!({
            "scores": {
                "technical_skills": 80, "experience": 70, "education": 60,
                "achievements": 50, "presentation": 90
            }
        }))
        .unwrap();
        assert_eq!(analysis.overall_score, 70);
    }

    #[test]
    fn test_scores_are_clamped_and_coerced() {
        let analysis = parse_analysis(json!({
            "overall_score": "150",
            "scores": {
                "technical_skills": -5, "experience": 300, "education": "88.6",
                "achievements": null, "presentation": 0
            }
        }))
        .unwrap();
        assert_eq!(analysis.overall_score, 100);
        assert_eq!(analysis.scores.technical_skills, 1);
        assert_eq!(analysis.scores.experience, 100);
        assert_eq!(analysis.scores.education, 89);
        assert_eq!(analysis.scores.achievements, 1);
        assert_eq!(analysis.scores.presentation, 1);
    }

    #[test]
    fn test_reply_without_scores_is_error() {
        assert!(matches!(
            parse_analysis(json!({})),
            Err(AnalysisParseError::NoScores)
        ));
        assert!(matches!(
            parse_analysis(json!({"summary": "Bagus", "scores": {}})),
            Err(AnalysisParseError::NoScores)
        ));
        assert!(matches!(
            parse_analysis(json!({"overall_score": "n/a", "scores": {"experience": null}})),
            Err(AnalysisParseError::NoScores)
        ));
    }

    #[test]
    fn test_single_category_score_is_enough() {
        let analysis = parse_analysis(json!({"scores": {"experience": 60}})).unwrap();
        assert_eq!(analysis.scores.experience, 60);
        assert_eq!(analysis.scores.education, 1);
        assert_eq!(analysis.overall_score, 13);
    }

    #[test]
    fn test_non_object_reply_is_error() {
        assert!(matches!(
            parse_analysis(json!(["not", "an", "object"])),
            Err(AnalysisParseError::Shape(_))
        ));
    }
}
