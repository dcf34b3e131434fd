use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::prompt_builder::{
    answer_evaluation_prompt, feedback_prompt, question_generation_prompt,
};
use crate::interview::response_parser::{
    parse_evaluation, parse_feedback, parse_questions, MalformedResponse,
};
use crate::llm_client::{LlmError, TextGenerator};
use crate::models::interview::{
    AnswerRow, FeedbackReportRow, InterviewRecord, NewAnswer, NewFeedbackReport, NewQuestion,
    NewSession,
};
use crate::models::resume::ResumeRow;
use crate::store::{InterviewStore, ResumeStore};

/// Result of scoring one answer.
#[derive(Debug, Serialize)]
pub struct AnswerOutcome {
    pub answer: AnswerRow,
    /// True when this answer was the last one outstanding in its session.
    pub session_completed: bool,
}

/// Runs the three interview stages (question generation, answer evaluation,
/// aggregate feedback) end to end: load, prompt, call, parse, persist.
pub struct InterviewOrchestrator {
    resumes: Arc<dyn ResumeStore>,
    interviews: Arc<dyn InterviewStore>,
    llm: Arc<dyn TextGenerator>,
    question_count: usize,
}

impl InterviewOrchestrator {
    pub fn new(
        resumes: Arc<dyn ResumeStore>,
        interviews: Arc<dyn InterviewStore>,
        llm: Arc<dyn TextGenerator>,
        question_count: usize,
    ) -> Self {
        Self {
            resumes,
            interviews,
            llm,
            question_count,
        }
    }

    async fn load_resume(&self, resume_id: Uuid) -> Result<ResumeRow, AppError> {
        self.resumes
            .get_resume(resume_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("resume {resume_id} not found")))
    }

    /// Generates a question batch for a résumé and stores it as a new session.
    ///
    /// With a `request_key` the call is idempotent: a key already used for
    /// this résumé returns the existing session without calling the model.
    pub async fn generate_questions(
        &self,
        resume_id: Uuid,
        interview_type: &str,
        request_key: Option<String>,
    ) -> Result<InterviewRecord, AppError> {
        let interview_type = interview_type.trim();
        if interview_type.is_empty() {
            return Err(AppError::Validation("interview type must not be empty".into()));
        }

        let resume = self.load_resume(resume_id).await?;

        if let Some(key) = request_key.as_deref() {
            if let Some(existing) = self
                .interviews
                .find_session_by_request_key(resume_id, key)
                .await?
            {
                info!(
                    "Request key {key:?} already served by session {}, returning it",
                    existing.session.id
                );
                return Ok(existing);
            }
        }

        let entity = format!("resume {resume_id}");
        let prompt =
            question_generation_prompt(&resume.content, interview_type, self.question_count);
        let raw = self
            .llm
            .generate(&prompt)
            .await
            .map_err(|e| upstream_failure("generate_questions", &entity, e))?;

        let mut generated =
            parse_questions(&raw).map_err(|e| malformed("generate_questions", &entity, &raw, e))?;
        if generated.len() > self.question_count {
            warn!(
                "Model returned {} questions for {entity}, keeping the first {}",
                generated.len(),
                self.question_count
            );
            generated.truncate(self.question_count);
        }

        let questions = generated
            .into_iter()
            .map(|q| NewQuestion {
                question: q.question,
                evaluation_criteria: q.evaluation_criteria,
                difficulty: q.difficulty,
            })
            .collect();
        let session = NewSession {
            resume_id,
            interview_type: interview_type.to_string(),
            request_key: request_key.clone(),
        };

        match self
            .interviews
            .create_session_with_questions(session, questions)
            .await
        {
            Ok(record) => {
                info!(
                    "Generated {} {interview_type} questions for {entity} (session {})",
                    record.questions.len(),
                    record.session.id
                );
                Ok(record)
            }
            // A concurrent request with the same key won the insert.
            Err(AppError::Conflict(msg)) => match request_key.as_deref() {
                Some(key) => self
                    .interviews
                    .find_session_by_request_key(resume_id, key)
                    .await?
                    .ok_or(AppError::Conflict(msg)),
                None => Err(AppError::Conflict(msg)),
            },
            Err(e) => Err(e),
        }
    }

    /// Scores an answer to one question and persists it. Completes the
    /// session when this was the last unanswered question.
    pub async fn evaluate_answer(
        &self,
        question_id: Uuid,
        answer_text: &str,
    ) -> Result<AnswerOutcome, AppError> {
        let question = self
            .interviews
            .get_question(question_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("question {question_id} not found")))?;

        if answer_text.trim().is_empty() {
            return Err(AppError::Validation("answer must not be empty".into()));
        }

        if self
            .interviews
            .get_answer_for_question(question_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "question {question_id} has already been answered"
            )));
        }

        let entity = format!("question {question_id}");
        let prompt = answer_evaluation_prompt(&question, answer_text);
        let raw = self
            .llm
            .generate(&prompt)
            .await
            .map_err(|e| upstream_failure("evaluate_answer", &entity, e))?;
        let evaluation =
            parse_evaluation(&raw).map_err(|e| malformed("evaluate_answer", &entity, &raw, e))?;

        let answer = self
            .interviews
            .create_answer(NewAnswer {
                question_id,
                content: answer_text.to_string(),
                score: evaluation.score,
                feedback: evaluation.evaluation,
                suggestions: evaluation.suggestions,
            })
            .await?;

        let session_completed = self
            .interviews
            .complete_session_if_answered(question.session_id)
            .await?;
        if session_completed {
            info!("Session {} completed", question.session_id);
        }

        Ok(AnswerOutcome {
            answer,
            session_completed,
        })
    }

    /// Aggregate feedback over every session of a résumé.
    /// Requires at least one completed session.
    pub async fn generate_feedback(&self, resume_id: Uuid) -> Result<FeedbackReportRow, AppError> {
        self.load_resume(resume_id).await?;

        let history = self.interviews.list_history(resume_id).await?;
        if !history.iter().any(InterviewRecord::is_completed) {
            return Err(AppError::NotFound(format!(
                "resume {resume_id} has no completed interview sessions"
            )));
        }

        let entity = format!("resume {resume_id}");
        let prompt = feedback_prompt(&history);
        let raw = self
            .llm
            .generate(&prompt)
            .await
            .map_err(|e| upstream_failure("generate_feedback", &entity, e))?;
        let summary =
            parse_feedback(&raw).map_err(|e| malformed("generate_feedback", &entity, &raw, e))?;

        let report = self
            .interviews
            .create_feedback(NewFeedbackReport {
                resume_id,
                overall_evaluation: summary.overall_evaluation,
                strengths: summary.strengths,
                weaknesses: summary.weaknesses,
                improvement_suggestions: summary.improvement_suggestions,
                development_suggestions: summary.development_suggestions,
            })
            .await?;

        info!(
            "Feedback report {} generated for {entity} from {} sessions",
            report.id,
            history.len()
        );
        Ok(report)
    }

    pub async fn get_interview_history(
        &self,
        resume_id: Uuid,
    ) -> Result<Vec<InterviewRecord>, AppError> {
        self.load_resume(resume_id).await?;
        self.interviews.list_history(resume_id).await
    }

    pub async fn latest_feedback(&self, resume_id: Uuid) -> Result<FeedbackReportRow, AppError> {
        self.load_resume(resume_id).await?;
        self.interviews
            .latest_feedback(resume_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("no feedback report for resume {resume_id}"))
            })
    }
}

fn upstream_failure(stage: &str, entity: &str, err: LlmError) -> AppError {
    AppError::Upstream(format!("{stage} for {entity}: {err}"))
}

fn malformed(stage: &str, entity: &str, raw: &str, err: MalformedResponse) -> AppError {
    let preview: String = raw.chars().take(200).collect();
    warn!("{stage} for {entity}: unusable model reply ({err}): {preview:?}");
    AppError::ParseFailure(format!("{stage} for {entity}: {err}"))
}
