// Shared prompt constants.
// Each pipeline stage defines its own templates in interview::prompts;
// this file holds the cross-cutting fragments.

/// System message sent with every call: frames the model as an interviewer.
pub const INTERVIEWER_SYSTEM: &str = "You are a professional technical interviewer. \
    You are skilled at writing interview questions, grading candidate answers, \
    and giving constructive feedback.";

/// Appended to every stage prompt so replies stay machine-parseable.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    Respond with ONE valid JSON object that follows the schema exactly. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Write all natural-language values in the same language as the source material.";
