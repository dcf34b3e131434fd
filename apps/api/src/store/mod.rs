//! Persistence gateway.
//!
//! The pipeline only sees these traits. `PgStore` is the production
//! implementation; tests use the in-memory `MemoryStore`.
//!
//! Carried in `AppState` as `Arc<dyn ResumeStore>` / `Arc<dyn InterviewStore>`.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::interview::{
    AnswerRow, FeedbackReportRow, InterviewRecord, InterviewSessionRow, NewAnswer,
    NewFeedbackReport, NewQuestion, NewSession, QuestionRow, QuestionWithAnswer,
};
use crate::models::resume::{NewResume, ResumeRow};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

#[async_trait]
pub trait ResumeStore: Send + Sync {
    async fn create_resume(&self, resume: NewResume) -> Result<ResumeRow, AppError>;

    async fn get_resume(&self, id: Uuid) -> Result<Option<ResumeRow>, AppError>;

    /// Newest first.
    async fn list_resumes_for_user(&self, user_id: Uuid) -> Result<Vec<ResumeRow>, AppError>;

    /// Returns `false` if no such résumé existed. Sessions, questions, answers
    /// and feedback reports for the résumé go with it.
    async fn delete_resume(&self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait InterviewStore: Send + Sync {
    /// Atomically creates a session and its question batch. The session is
    /// inserted `pending` and moved to `in_progress` once the questions are
    /// attached. Fails with `Conflict` if `request_key` is already used for
    /// the résumé.
    async fn create_session_with_questions(
        &self,
        session: NewSession,
        questions: Vec<NewQuestion>,
    ) -> Result<InterviewRecord, AppError>;

    async fn find_session_by_request_key(
        &self,
        resume_id: Uuid,
        request_key: &str,
    ) -> Result<Option<InterviewRecord>, AppError>;

    async fn get_question(&self, id: Uuid) -> Result<Option<QuestionRow>, AppError>;

    async fn get_answer_for_question(
        &self,
        question_id: Uuid,
    ) -> Result<Option<AnswerRow>, AppError>;

    /// Fails with `Conflict` if the question already has an answer.
    async fn create_answer(&self, answer: NewAnswer) -> Result<AnswerRow, AppError>;

    /// Moves the session `in_progress → completed` iff every question has an
    /// answer. A single conditional update: concurrent callers cannot both win.
    async fn complete_session_if_answered(&self, session_id: Uuid) -> Result<bool, AppError>;

    /// Sessions for a résumé, most recent first, questions in batch order.
    async fn list_history(&self, resume_id: Uuid) -> Result<Vec<InterviewRecord>, AppError>;

    async fn create_feedback(
        &self,
        report: NewFeedbackReport,
    ) -> Result<FeedbackReportRow, AppError>;

    async fn latest_feedback(&self, resume_id: Uuid)
        -> Result<Option<FeedbackReportRow>, AppError>;
}

/// Nests questions and answers under their sessions, keeping session order
/// and sorting questions by batch position.
pub(crate) fn assemble_history(
    sessions: Vec<InterviewSessionRow>,
    questions: Vec<QuestionRow>,
    answers: Vec<AnswerRow>,
) -> Vec<InterviewRecord> {
    let mut answers_by_question: HashMap<Uuid, AnswerRow> = answers
        .into_iter()
        .map(|a| (a.question_id, a))
        .collect();

    let mut questions_by_session: HashMap<Uuid, Vec<QuestionWithAnswer>> = HashMap::new();
    for question in questions {
        let answer = answers_by_question.remove(&question.id);
        questions_by_session
            .entry(question.session_id)
            .or_default()
            .push(QuestionWithAnswer { question, answer });
    }

    sessions
        .into_iter()
        .map(|session| {
            let mut questions = questions_by_session.remove(&session.id).unwrap_or_default();
            questions.sort_by_key(|q| q.question.position);
            InterviewRecord { session, questions }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::interview::SessionStatus;

    fn session(id: Uuid) -> InterviewSessionRow {
        InterviewSessionRow {
            id,
            resume_id: Uuid::nil(),
            interview_type: "technical".into(),
            status: SessionStatus::InProgress,
            request_key: None,
            created_at: Utc::now(),
        }
    }

    fn question(session_id: Uuid, position: i32) -> QuestionRow {
        QuestionRow {
            id: Uuid::new_v4(),
            session_id,
            position,
            question: format!("q{position}"),
            evaluation_criteria: String::new(),
            difficulty: "medium".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_assemble_history_nests_and_orders() {
        let (s1, s2) = (Uuid::new_v4(), Uuid::new_v4());
        let q_late = question(s1, 1);
        let q_early = question(s1, 0);
        let q_other = question(s2, 0);
        let answer = AnswerRow {
            id: Uuid::new_v4(),
            question_id: q_early.id,
            content: "a".into(),
            score: 70,
            feedback: "ok".into(),
            suggestions: vec![],
            created_at: Utc::now(),
        };

        let history = assemble_history(
            vec![session(s2), session(s1)],
            vec![q_late.clone(), q_other, q_early.clone()],
            vec![answer],
        );

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].session.id, s2);
        assert_eq!(history[1].questions[0].question.id, q_early.id);
        assert_eq!(history[1].questions[1].question.id, q_late.id);
        assert!(history[1].questions[0].answer.is_some());
        assert!(history[1].questions[1].answer.is_none());
    }

    #[test]
    fn test_assemble_history_keeps_sessions_without_questions() {
        let history = assemble_history(vec![session(Uuid::new_v4())], vec![], vec![]);
        assert_eq!(history.len(), 1);
        assert!(history[0].questions.is_empty());
    }
}
