use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{assemble_history, InterviewStore, ResumeStore};
use crate::errors::AppError;
use crate::models::interview::{
    AnswerRow, FeedbackReportRow, InterviewRecord, InterviewSessionRow, NewAnswer,
    NewFeedbackReport, NewQuestion, NewSession, QuestionRow, SessionStatus,
};
use crate::models::resume::{NewResume, ResumeRow};

#[derive(Default)]
struct Tables {
    resumes: Vec<ResumeRow>,
    sessions: Vec<InterviewSessionRow>,
    questions: Vec<QuestionRow>,
    answers: Vec<AnswerRow>,
    feedback: Vec<FeedbackReportRow>,
}

/// In-memory store with the same constraints as the Postgres schema:
/// unique answer per question, unique request key per résumé, cascading deletes.
/// Rows are kept in insertion order, which stands in for `created_at`.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_count(&self) -> usize {
        self.tables.lock().unwrap().sessions.len()
    }

    pub fn answer_count(&self) -> usize {
        self.tables.lock().unwrap().answers.len()
    }

    pub fn feedback_count(&self) -> usize {
        self.tables.lock().unwrap().feedback.len()
    }

    fn records(tables: &Tables, sessions: Vec<InterviewSessionRow>) -> Vec<InterviewRecord> {
        let ids: Vec<Uuid> = sessions.iter().map(|s| s.id).collect();
        let questions: Vec<QuestionRow> = tables
            .questions
            .iter()
            .filter(|q| ids.contains(&q.session_id))
            .cloned()
            .collect();
        let answers = tables
            .answers
            .iter()
            .filter(|a| questions.iter().any(|q| q.id == a.question_id))
            .cloned()
            .collect();
        assemble_history(sessions, questions, answers)
    }
}

#[async_trait]
impl ResumeStore for MemoryStore {
    async fn create_resume(&self, resume: NewResume) -> Result<ResumeRow, AppError> {
        let row = ResumeRow {
            id: Uuid::new_v4(),
            user_id: resume.user_id,
            file_name: resume.file_name,
            file_path: resume.file_path,
            file_size: resume.file_size,
            content: resume.content,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().resumes.push(row.clone());
        Ok(row)
    }

    async fn get_resume(&self, id: Uuid) -> Result<Option<ResumeRow>, AppError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.resumes.iter().find(|r| r.id == id).cloned())
    }

    async fn list_resumes_for_user(&self, user_id: Uuid) -> Result<Vec<ResumeRow>, AppError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .resumes
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_resume(&self, id: Uuid) -> Result<bool, AppError> {
        let mut guard = self.tables.lock().unwrap();
        let tables = &mut *guard;
        let before = tables.resumes.len();
        tables.resumes.retain(|r| r.id != id);
        if tables.resumes.len() == before {
            return Ok(false);
        }

        let session_ids: Vec<Uuid> = tables
            .sessions
            .iter()
            .filter(|s| s.resume_id == id)
            .map(|s| s.id)
            .collect();
        let question_ids: Vec<Uuid> = tables
            .questions
            .iter()
            .filter(|q| session_ids.contains(&q.session_id))
            .map(|q| q.id)
            .collect();
        tables.answers.retain(|a| !question_ids.contains(&a.question_id));
        tables.questions.retain(|q| !session_ids.contains(&q.session_id));
        tables.sessions.retain(|s| s.resume_id != id);
        tables.feedback.retain(|f| f.resume_id != id);
        Ok(true)
    }
}

#[async_trait]
impl InterviewStore for MemoryStore {
    async fn create_session_with_questions(
        &self,
        session: NewSession,
        questions: Vec<NewQuestion>,
    ) -> Result<InterviewRecord, AppError> {
        let mut tables = self.tables.lock().unwrap();

        if let Some(key) = &session.request_key {
            let taken = tables.sessions.iter().any(|s| {
                s.resume_id == session.resume_id && s.request_key.as_deref() == Some(key.as_str())
            });
            if taken {
                return Err(AppError::Conflict(format!(
                    "request key {key:?} already used for resume {}",
                    session.resume_id
                )));
            }
        }

        let now = Utc::now();
        let mut row = InterviewSessionRow {
            id: Uuid::new_v4(),
            resume_id: session.resume_id,
            interview_type: session.interview_type,
            status: SessionStatus::Pending,
            request_key: session.request_key,
            created_at: now,
        };
        let question_rows: Vec<QuestionRow> = questions
            .into_iter()
            .enumerate()
            .map(|(position, q)| QuestionRow {
                id: Uuid::new_v4(),
                session_id: row.id,
                position: position as i32,
                question: q.question,
                evaluation_criteria: q.evaluation_criteria,
                difficulty: q.difficulty,
                created_at: now,
            })
            .collect();

        if row.status.can_advance_to(SessionStatus::InProgress) {
            row.status = SessionStatus::InProgress;
        }

        tables.sessions.push(row.clone());
        tables.questions.extend(question_rows.iter().cloned());

        Ok(Self::records(&tables, vec![row]).remove(0))
    }

    async fn find_session_by_request_key(
        &self,
        resume_id: Uuid,
        request_key: &str,
    ) -> Result<Option<InterviewRecord>, AppError> {
        let tables = self.tables.lock().unwrap();
        let session = tables
            .sessions
            .iter()
            .find(|s| s.resume_id == resume_id && s.request_key.as_deref() == Some(request_key))
            .cloned();
        Ok(session.map(|s| Self::records(&tables, vec![s]).remove(0)))
    }

    async fn get_question(&self, id: Uuid) -> Result<Option<QuestionRow>, AppError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.questions.iter().find(|q| q.id == id).cloned())
    }

    async fn get_answer_for_question(
        &self,
        question_id: Uuid,
    ) -> Result<Option<AnswerRow>, AppError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .answers
            .iter()
            .find(|a| a.question_id == question_id)
            .cloned())
    }

    async fn create_answer(&self, answer: NewAnswer) -> Result<AnswerRow, AppError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.answers.iter().any(|a| a.question_id == answer.question_id) {
            return Err(AppError::Conflict(format!(
                "question {} has already been answered",
                answer.question_id
            )));
        }
        let row = AnswerRow {
            id: Uuid::new_v4(),
            question_id: answer.question_id,
            content: answer.content,
            score: answer.score,
            feedback: answer.feedback,
            suggestions: answer.suggestions,
            created_at: Utc::now(),
        };
        tables.answers.push(row.clone());
        Ok(row)
    }

    async fn complete_session_if_answered(&self, session_id: Uuid) -> Result<bool, AppError> {
        let mut guard = self.tables.lock().unwrap();
        let tables = &mut *guard;

        let all_answered = tables
            .questions
            .iter()
            .filter(|q| q.session_id == session_id)
            .all(|q| tables.answers.iter().any(|a| a.question_id == q.id));
        if !all_answered {
            return Ok(false);
        }

        match tables.sessions.iter_mut().find(|s| s.id == session_id) {
            Some(session) if session.status == SessionStatus::InProgress => {
                session.status = SessionStatus::Completed;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_history(&self, resume_id: Uuid) -> Result<Vec<InterviewRecord>, AppError> {
        let tables = self.tables.lock().unwrap();
        let sessions = tables
            .sessions
            .iter()
            .rev()
            .filter(|s| s.resume_id == resume_id)
            .cloned()
            .collect();
        Ok(Self::records(&tables, sessions))
    }

    async fn create_feedback(
        &self,
        report: NewFeedbackReport,
    ) -> Result<FeedbackReportRow, AppError> {
        let row = FeedbackReportRow {
            id: Uuid::new_v4(),
            resume_id: report.resume_id,
            overall_evaluation: report.overall_evaluation,
            strengths: report.strengths,
            weaknesses: report.weaknesses,
            improvement_suggestions: report.improvement_suggestions,
            development_suggestions: report.development_suggestions,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().feedback.push(row.clone());
        Ok(row)
    }

    async fn latest_feedback(
        &self,
        resume_id: Uuid,
    ) -> Result<Option<FeedbackReportRow>, AppError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .feedback
            .iter()
            .rev()
            .find(|f| f.resume_id == resume_id)
            .cloned())
    }
}
