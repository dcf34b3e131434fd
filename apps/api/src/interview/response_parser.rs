use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MalformedResponse {
    #[error("no JSON object found in model reply")]
    NoJsonObject,

    #[error("model reply does not match the {stage} schema: {source}")]
    Schema {
        stage: &'static str,
        source: serde_json::Error,
    },

    #[error("score {0} is outside 0..=100")]
    ScoreOutOfRange(f64),

    #[error("model returned no questions")]
    EmptyQuestions,

    #[error("question #{0} has no text")]
    BlankQuestion(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub evaluation_criteria: String,
    pub difficulty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionBatch {
    pub questions: Vec<GeneratedQuestion>,
}

/// Score is read as a number so `85.0` decodes; it must land in 0..=100.
#[derive(Debug, Deserialize)]
struct RawEvaluation {
    score: f64,
    evaluation: String,
    suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub score: i32,
    pub evaluation: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSummary {
    pub overall_evaluation: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub improvement_suggestions: Vec<String>,
    pub development_suggestions: Vec<String>,
}

pub fn parse_questions(raw: &str) -> Result<Vec<GeneratedQuestion>, MalformedResponse> {
    let batch: QuestionBatch = decode_first(raw, "questions")?;
    if batch.questions.is_empty() {
        return Err(MalformedResponse::EmptyQuestions);
    }
    if let Some(i) = batch
        .questions
        .iter()
        .position(|q| q.question.trim().is_empty())
    {
        return Err(MalformedResponse::BlankQuestion(i + 1));
    }
    Ok(batch.questions)
}

pub fn parse_evaluation(raw: &str) -> Result<Evaluation, MalformedResponse> {
    let raw_eval: RawEvaluation = decode_first(raw, "evaluation")?;
    if !(0.0..=100.0).contains(&raw_eval.score) {
        return Err(MalformedResponse::ScoreOutOfRange(raw_eval.score));
    }
    Ok(Evaluation {
        score: raw_eval.score.round() as i32,
        evaluation: raw_eval.evaluation,
        suggestions: raw_eval.suggestions,
    })
}

pub fn parse_feedback(raw: &str) -> Result<FeedbackSummary, MalformedResponse> {
    decode_first(raw, "feedback")
}

/// Decodes the first JSON object in `raw` that matches `T`.
fn decode_first<T: DeserializeOwned>(
    raw: &str,
    stage: &'static str,
) -> Result<T, MalformedResponse> {
    let mut last_error = None;
    for candidate in json_object_candidates(strip_json_fences(raw)) {
        match serde_json::from_str::<T>(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = Some(e),
        }
    }
    match last_error {
        Some(source) => Err(MalformedResponse::Schema { stage, source }),
        None => Err(MalformedResponse::NoJsonObject),
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let stripped = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match stripped {
        Some(inner) => inner
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(inner.trim_start()),
        None => text,
    }
}

/// Top-level balanced `{...}` spans in order of appearance.
/// Braces inside JSON strings (including escaped quotes) are not counted.
fn json_object_candidates(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut candidates = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            if let Some(len) = balanced_object_len(&bytes[i..]) {
                candidates.push(&text[i..i + len]);
                i += len;
                continue;
            }
        }
        i += 1;
    }
    candidates
}

/// Length of the object starting at `bytes[0] == b'{'`, or `None` if it never closes.
fn balanced_object_len(bytes: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}
