//! CV screening: pluggable, trait-based scorer that rates a CV against a job description.
//!
//! Default: `GeminiScreener` (hosted model).
//! Alternative: `KeywordScreener` (pure-Rust, deterministic, no network).
//!
//! `AppState` holds an `Arc<dyn CvScreener>`, chosen at startup via `CV_SCREENER`.
//! Callers go through [`screen_or_fallback`], which never fails: a screening
//! error yields the neutral "review manually" result.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::applications::prompts::{MAX_CV_CHARS, SCREENING_PROMPT_TEMPLATE, SCREENING_SYSTEM};
use crate::errors::AppError;
use crate::llm_client::extract_json_object;
use crate::llm_client::gemini::GeminiClient;

// ────────────────────────────────────────────────────────────────────────────
// Output data model (shared across all screener backends)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Accept,
    Review,
    Reject,
}

impl Recommendation {
    pub fn from_score(score: u8) -> Self {
        match score {
            75..=u8::MAX => Recommendation::Accept,
            45..=74 => Recommendation::Review,
            _ => Recommendation::Reject,
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ACCEPT" => Some(Recommendation::Accept),
            "REVIEW" => Some(Recommendation::Review),
            "REJECT" => Some(Recommendation::Reject),
            _ => None,
        }
    }
}

/// Stored verbatim in `applications.ai_feedback`; `score` also goes to `ai_score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningResult {
    pub score: u8, // 0 – 100
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendation: Recommendation,
    pub summary: String,
    pub screener: String, // "gemini" | "keyword" | "fallback"
}

impl ScreeningResult {
    /// The neutral result used whenever screening fails.
    pub fn fallback() -> Self {
        Self {
            score: 50,
            strengths: vec!["Unable to analyze".to_string()],
            weaknesses: vec!["AI analysis failed".to_string()],
            recommendation: Recommendation::Review,
            summary: "Please review manually".to_string(),
            screener: "fallback".to_string(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait CvScreener: Send + Sync {
    async fn screen(&self, cv_text: &str, job_description: &str)
        -> Result<ScreeningResult, AppError>;
}

pub async fn screen_or_fallback(
    screener: &dyn CvScreener,
    cv_text: &str,
    job_description: &str,
) -> ScreeningResult {
    match screener.screen(cv_text, job_description).await {
        Ok(result) => result,
        Err(e) => {
            warn!("CV screening failed, using fallback result: {e}");
            ScreeningResult::fallback()
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// GeminiScreener
// ────────────────────────────────────────────────────────────────────────────

pub struct GeminiScreener(pub GeminiClient);

#[async_trait]
impl CvScreener for GeminiScreener {
    async fn screen(
        &self,
        cv_text: &str,
        job_description: &str,
    ) -> Result<ScreeningResult, AppError> {
        let prompt = SCREENING_PROMPT_TEMPLATE
            .replace("{job_description}", job_description)
            .replace("{cv_text}", truncate_chars(cv_text, MAX_CV_CHARS));

        let text = self
            .0
            .generate(&prompt, Some(SCREENING_SYSTEM))
            .await
            .map_err(|e| AppError::Llm(format!("CV screening failed: {e}")))?;

        parse_screening(&text)
    }
}

/// The model's reply before normalization. Fields are loose because models
/// return scores as strings or floats and vary the recommendation casing.
#[derive(Debug, Deserialize)]
struct RawScreening {
    score: Option<Value>,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    weaknesses: Vec<String>,
    recommendation: Option<String>,
    #[serde(default)]
    summary: String,
}

fn parse_screening(text: &str) -> Result<ScreeningResult, AppError> {
    let json = extract_json_object(text)
        .ok_or_else(|| AppError::Llm("Failed to parse AI response".to_string()))?;
    let raw: RawScreening = serde_json::from_str(json)
        .map_err(|e| AppError::Llm(format!("Failed to parse AI response: {e}")))?;

    let score = raw
        .score
        .as_ref()
        .and_then(score_from_value)
        .ok_or_else(|| AppError::Llm("AI response has no usable score".to_string()))?;

    let recommendation = raw
        .recommendation
        .as_deref()
        .and_then(Recommendation::parse)
        .unwrap_or_else(|| Recommendation::from_score(score));

    debug!(score, ?recommendation, "parsed screening result");

    Ok(ScreeningResult {
        score,
        strengths: raw.strengths,
        weaknesses: raw.weaknesses,
        recommendation,
        summary: raw.summary,
        screener: "gemini".to_string(),
    })
}

fn score_from_value(value: &Value) -> Option<u8> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then(|| n.round().clamp(0.0, 100.0) as u8)
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// KeywordScreener
// ────────────────────────────────────────────────────────────────────────────

/// Deterministic keyword-overlap screener.
///
/// Algorithm:
/// 1. Take the most frequent non-stopword terms of the job description.
/// 2. For each term: whole-word match in the CV → 1.0, substring match → 0.6,
///    otherwise 0.0.
/// 3. score = Σ(strength × frequency) / Σ(frequency) × 100
pub struct KeywordScreener;

const MAX_KEYWORDS: usize = 25;
const MAX_LISTED_POINTS: usize = 5;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "you", "your", "our", "are", "will", "that", "this", "have",
    "has", "from", "who", "can", "all", "any", "job", "role", "work", "team", "years", "year",
    "experience", "required", "requirements", "responsibilities", "must", "able", "etc",
    "plus", "about", "into", "such", "their", "they", "them", "yang", "dan", "untuk", "dengan",
    "atau", "dalam", "kami", "anda", "akan", "pada", "dari", "memiliki", "minimal", "tahun",
    "pengalaman", "kerja", "sebagai", "mampu", "serta",
];

#[derive(Debug, Clone, PartialEq)]
struct Keyword {
    term: String,
    frequency: u32,
}

#[async_trait]
impl CvScreener for KeywordScreener {
    async fn screen(
        &self,
        cv_text: &str,
        job_description: &str,
    ) -> Result<ScreeningResult, AppError> {
        Ok(compute_keyword_screening(cv_text, job_description))
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .map(|t| t.trim_matches('.').to_lowercase())
        .filter(|t| !t.is_empty())
}

fn extract_keywords(job_description: &str) -> Vec<Keyword> {
    let stopwords: HashSet<&str> = STOPWORDS.iter().copied().collect();
    let mut counts: HashMap<String, u32> = HashMap::new();

    for token in tokenize(job_description) {
        let symbolic = token.contains('+') || token.contains('#');
        let too_short = token.chars().count() < 3 && !symbolic;
        let numeric = token.chars().all(|c| c.is_ascii_digit() || c == '.');
        if too_short || numeric || stopwords.contains(token.as_str()) {
            continue;
        }
        *counts.entry(token).or_insert(0) += 1;
    }

    let mut keywords: Vec<Keyword> = counts
        .into_iter()
        .map(|(term, frequency)| Keyword { term, frequency })
        .collect();
    keywords.sort_by(|a, b| b.frequency.cmp(&a.frequency).then_with(|| a.term.cmp(&b.term)));
    keywords.truncate(MAX_KEYWORDS);
    keywords
}

fn compute_keyword_screening(cv_text: &str, job_description: &str) -> ScreeningResult {
    let keywords = extract_keywords(job_description);

    if keywords.is_empty() {
        return ScreeningResult {
            score: 50,
            strengths: vec![],
            weaknesses: vec![],
            recommendation: Recommendation::Review,
            summary: "No keywords found in the job description, review manually.".to_string(),
            screener: "keyword".to_string(),
        };
    }

    let cv_lower = cv_text.to_lowercase();
    let cv_tokens: HashSet<String> = tokenize(cv_text).collect();

    let mut matched = Vec::new();
    let mut missing = Vec::new();
    let mut total_weight = 0.0_f32;
    let mut total_score = 0.0_f32;

    for keyword in &keywords {
        let weight = keyword.frequency as f32;
        total_weight += weight;

        let strength = if cv_tokens.contains(&keyword.term) {
            1.0
        } else if cv_lower.contains(&keyword.term) {
            0.6
        } else {
            0.0
        };
        total_score += strength * weight;

        if strength > 0.0 {
            matched.push(keyword.term.as_str());
        } else {
            missing.push(keyword.term.as_str());
        }
    }

    let score = ((total_score / total_weight) * 100.0).round().clamp(0.0, 100.0) as u8;
    let recommendation = Recommendation::from_score(score);

    ScreeningResult {
        score,
        strengths: matched
            .iter()
            .take(MAX_LISTED_POINTS)
            .map(|k| format!("CV mentions {k}"))
            .collect(),
        weaknesses: missing
            .iter()
            .take(MAX_LISTED_POINTS)
            .map(|k| format!("No evidence of {k}"))
            .collect(),
        recommendation,
        summary: build_summary(score, &missing),
        screener: "keyword".to_string(),
    }
}

fn build_summary(score: u8, missing: &[&str]) -> String {
    let top_gaps: Vec<&str> = missing.iter().take(3).copied().collect();

    if score >= 75 {
        "Strong fit. The CV covers the key requirements of the job.".to_string()
    } else if score >= 45 {
        format!(
            "Partial fit ({score}/100). Missing: {}.",
            top_gaps.join(", ")
        )
    } else {
        format!(
            "Low fit ({score}/100). Significant gaps: {}.",
            top_gaps.join(", ")
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingScreener;

    #[async_trait]
    impl CvScreener for FailingScreener {
        async fn screen(&self, _: &str, _: &str) -> Result<ScreeningResult, AppError> {
            Err(AppError::Llm("provider down".to_string()))
        }
    }

    const JD: &str = "Backend Engineer. We need Rust and PostgreSQL. Rust services, \
        PostgreSQL tuning, Docker deployments. Kafka is a plus.";

    #[tokio::test]
    async fn test_fallback_on_screener_error() {
        let result = screen_or_fallback(&FailingScreener, "cv", "jd").await;
        assert_eq!(result, ScreeningResult::fallback());
        assert_eq!(result.score, 50);
        assert_eq!(result.recommendation, Recommendation::Review);
        assert_eq!(result.summary, "Please review manually");
    }

    #[test]
    fn test_parse_screening_from_wrapped_json() {
        let text = "Sure!\n```json\n{\"score\": 82.4, \"strengths\": [\"Rust\"], \
            \"weaknesses\": [], \"recommendation\": \"accept\", \"summary\": \"Cocok\"}\n```";
        let result = parse_screening(text).unwrap();
        assert_eq!(result.score, 82);
        assert_eq!(result.recommendation, Recommendation::Accept);
        assert_eq!(result.strengths, vec!["Rust".to_string()]);
        assert_eq!(result.screener, "gemini");
    }

    #[test]
    fn test_parse_screening_clamps_and_derives_recommendation() {
        let result = parse_screening("{\"score\": \"130\", \"recommendation\": \"MAYBE\"}").unwrap();
        assert_eq!(result.score, 100);
        assert_eq!(result.recommendation, Recommendation::Accept);
    }

    #[test]
    fn test_parse_screening_without_score_fails() {
        assert!(parse_screening("{\"summary\": \"no score\"}").is_err());
        assert!(parse_screening("not json at all").is_err());
    }

    #[test]
    fn test_recommendation_thresholds() {
        assert_eq!(Recommendation::from_score(75), Recommendation::Accept);
        assert_eq!(Recommendation::from_score(74), Recommendation::Review);
        assert_eq!(Recommendation::from_score(45), Recommendation::Review);
        assert_eq!(Recommendation::from_score(44), Recommendation::Reject);
    }

    #[test]
    fn test_extract_keywords_skips_stopwords_and_ranks_by_frequency() {
        let keywords = extract_keywords(JD);
        assert_eq!(keywords[0].term, "postgresql");
        assert_eq!(keywords[0].frequency, 2);
        assert_eq!(keywords[1].term, "rust");
        assert!(keywords.iter().all(|k| k.term != "and" && k.term != "we"));
        assert!(keywords.iter().any(|k| k.term == "kafka"));
    }

    #[test]
    fn test_extract_keywords_keeps_symbolic_terms() {
        let terms: Vec<String> = extract_keywords("Strong C++ and C# skills, Node.js.")
            .into_iter()
            .map(|k| k.term)
            .collect();
        assert!(terms.contains(&"c++".to_string()));
        assert!(terms.contains(&"c#".to_string()));
        assert!(terms.contains(&"node.js".to_string()));
    }

    #[test]
    fn test_keyword_screening_full_match_is_accept() {
        let cv = "Senior backend engineer: Rust, PostgreSQL, Docker, Kafka. Built services \
            with tuning and deployments. Need plus backend engineer.";
        let result = compute_keyword_screening(cv, JD);
        assert!(result.score >= 75, "expected ≥75, got {}", result.score);
        assert_eq!(result.recommendation, Recommendation::Accept);
        assert_eq!(result.screener, "keyword");
    }

    #[test]
    fn test_keyword_screening_no_overlap_is_reject() {
        let result = compute_keyword_screening("Graphic designer, Figma, Illustrator", JD);
        assert_eq!(result.score, 0);
        assert_eq!(result.recommendation, Recommendation::Reject);
        assert!(result.weaknesses.iter().any(|w| w.contains("postgresql")));
        assert!(result.summary.contains("Low fit"));
    }

    #[test]
    fn test_keyword_substring_match_counts_partially() {
        let result = compute_keyword_screening("Experienced with dockerized apps", "docker docker");
        assert_eq!(result.score, 60);
        assert_eq!(result.recommendation, Recommendation::Review);
    }

    #[test]
    fn test_keyword_screening_empty_description() {
        let result = compute_keyword_screening("anything", "the and for");
        assert_eq!(result.score, 50);
        assert_eq!(result.recommendation, Recommendation::Review);
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
