// Prompt templates for screening a CV against a job description.

pub const SCREENING_SYSTEM: &str = "\
You are an experienced technical recruiter screening candidates for a job board. \
Judge the CV strictly against the job description you are given. \
Do not invent experience the CV does not state. \
You MUST respond with a single valid JSON object and nothing else.";

pub const SCREENING_PROMPT_TEMPLATE: &str = r#"Score how well this candidate's CV fits the job.

JOB DESCRIPTION:
{job_description}

CANDIDATE CV:
{cv_text}

OUTPUT SCHEMA (return exactly this structure):
{
  "score": <integer 0-100>,
  "strengths": ["<short point>", ...],
  "weaknesses": ["<short point>", ...],
  "recommendation": "ACCEPT" | "REVIEW" | "REJECT",
  "summary": "<one or two sentences>"
}

RULES:
1. 0-39 means a poor fit, 40-74 a partial fit, 75-100 a strong fit.
2. Use ACCEPT only for strong fits and REJECT only for poor fits.
3. Write strengths, weaknesses and summary in Bahasa Indonesia, at most 15 words per point.
4. Return ONLY the JSON object, no code fences."#;

/// Upper bound on CV characters sent to the model.
pub const MAX_CV_CHARS: usize = 20_000;
