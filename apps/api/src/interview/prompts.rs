// Prompt templates for the three interview stages.
// Placeholders are `{name}` and are filled by prompt_builder::render in a single pass.
// Every template spells out the exact reply schema; response_parser decodes against it.

/// Question generation. Replace: {interview_type}, {question_count}, {resume_content}
pub const QUESTION_GENERATION_TEMPLATE: &str = r#"Write {interview_type} interview questions for the candidate whose resume is below.

RESUME:
{resume_content}

Write exactly {question_count} questions. Each question must:
1. Be grounded in something the resume actually claims
2. Probe the candidate's professional ability, not trivia
3. Come with concrete evaluation criteria an interviewer can score against
4. Be of moderate difficulty overall; label each one "easy", "medium" or "hard"

Return a JSON object with this EXACT schema (no extra fields):
{
  "questions": [
    {
      "question": "the question text",
      "evaluation_criteria": "what a strong answer covers",
      "difficulty": "medium"
    }
  ]
}"#;

/// Answer evaluation. Replace: {question}, {evaluation_criteria}, {answer}
pub const ANSWER_EVALUATION_TEMPLATE: &str = r#"Evaluate the candidate's answer to an interview question.

QUESTION:
{question}

EVALUATION CRITERIA:
{evaluation_criteria}

CANDIDATE ANSWER:
{answer}

Assess the answer on:
1. Completeness
2. Accuracy
3. Depth
4. Logical structure of the explanation
5. What would make it better

SCORING: an integer from 0 to 100 inclusive. 90+ is exceptional, 70-89 solid,
50-69 partial, below 50 weak or incorrect.

Return a JSON object with this EXACT schema (no extra fields):
{
  "score": 85,
  "evaluation": "detailed assessment of the answer",
  "suggestions": ["concrete improvement 1", "concrete improvement 2"]
}"#;

/// Aggregate feedback over a résumé's interview history. Replace: {transcript}
pub const FEEDBACK_TEMPLATE: &str = r#"Write overall feedback for a candidate based on their interview history.

INTERVIEW HISTORY:
{transcript}

Cover:
1. Overall performance
2. Strengths shown across answers
3. Weaknesses and gaps
4. Specific improvements for the next interview
5. Longer-term development directions

Return a JSON object with this EXACT schema (no extra fields):
{
  "overall_evaluation": "summary of the candidate's performance",
  "strengths": ["strength 1", "strength 2"],
  "weaknesses": ["weakness 1", "weakness 2"],
  "improvement_suggestions": ["suggestion 1", "suggestion 2"],
  "development_suggestions": ["direction 1", "direction 2"]
}"#;
