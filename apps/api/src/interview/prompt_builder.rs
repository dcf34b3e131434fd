use std::fmt::Write as _;

use crate::interview::prompts::{
    ANSWER_EVALUATION_TEMPLATE, FEEDBACK_TEMPLATE, QUESTION_GENERATION_TEMPLATE,
};
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::models::interview::{InterviewRecord, QuestionRow};

/// Substitutes `{key}` placeholders in one left-to-right pass.
///
/// Substituted values are never rescanned, so résumé or answer text that
/// happens to contain `{answer}` is emitted verbatim. Braces that do not
/// name a known key (the JSON schema examples) are left as they are.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let value = after.find('}').and_then(|end| {
            let key = &after[..end];
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, end))
        });

        match value {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn with_json_instruction(body: String) -> String {
    format!("{body}\n\n{JSON_ONLY_INSTRUCTION}")
}

pub fn question_generation_prompt(
    resume_content: &str,
    interview_type: &str,
    question_count: usize,
) -> String {
    let count = question_count.to_string();
    with_json_instruction(render(
        QUESTION_GENERATION_TEMPLATE,
        &[
            ("interview_type", interview_type),
            ("question_count", &count),
            ("resume_content", resume_content),
        ],
    ))
}

pub fn answer_evaluation_prompt(question: &QuestionRow, answer: &str) -> String {
    with_json_instruction(render(
        ANSWER_EVALUATION_TEMPLATE,
        &[
            ("question", &question.question),
            ("evaluation_criteria", &question.evaluation_criteria),
            ("answer", answer),
        ],
    ))
}

pub fn feedback_prompt(history: &[InterviewRecord]) -> String {
    let transcript = render_transcript(history);
    with_json_instruction(render(FEEDBACK_TEMPLATE, &[("transcript", &transcript)]))
}

/// Flattens sessions into plain text, in the order given.
/// Unanswered questions are listed without answer lines.
pub fn render_transcript(history: &[InterviewRecord]) -> String {
    let mut out = String::new();
    for record in history {
        let _ = writeln!(out, "Interview type: {}", record.session.interview_type);
        out.push_str("Questions and answers:\n");
        for entry in &record.questions {
            let _ = writeln!(out, "Question: {}", entry.question.question);
            if let Some(answer) = &entry.answer {
                let _ = writeln!(out, "Answer: {}", answer.content);
                let _ = writeln!(out, "Score: {}", answer.score);
                let _ = writeln!(out, "Feedback: {}", answer.feedback);
            }
            out.push_str("---\n");
        }
    }
    out
}
