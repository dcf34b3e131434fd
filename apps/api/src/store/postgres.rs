use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use super::{assemble_history, InterviewStore, ResumeStore};
use crate::errors::AppError;
use crate::models::interview::{
    AnswerRow, FeedbackReportRow, InterviewRecord, InterviewSessionRow, NewAnswer,
    NewFeedbackReport, NewQuestion, NewSession, QuestionRow, SessionStatus, StatusTransition,
};
use crate::models::resume::{NewResume, ResumeRow};

/// sqlx-backed gateway over the `resumes`, `interview_sessions`, `questions`,
/// `answers` and `feedback_reports` tables.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads questions and answers for the given sessions and nests them.
    async fn load_records(
        &self,
        sessions: Vec<InterviewSessionRow>,
    ) -> Result<Vec<InterviewRecord>, AppError> {
        if sessions.is_empty() {
            return Ok(Vec::new());
        }
        let session_ids: Vec<Uuid> = sessions.iter().map(|s| s.id).collect();

        let questions = sqlx::query_as::<_, QuestionRow>(
            "SELECT * FROM questions WHERE session_id = ANY($1) ORDER BY session_id, position",
        )
        .bind(&session_ids)
        .fetch_all(&self.pool)
        .await?;

        let answers = sqlx::query_as::<_, AnswerRow>(
            r#"
            SELECT a.*
            FROM answers a
            JOIN questions q ON q.id = a.question_id
            WHERE q.session_id = ANY($1)
            "#,
        )
        .bind(&session_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(assemble_history(sessions, questions, answers))
    }
}

/// Conditional status update: only applies if the session is still in
/// `transition.from`. Returns whether the row changed.
async fn transition_status(
    tx: &mut Transaction<'_, Postgres>,
    session_id: Uuid,
    transition: StatusTransition,
) -> Result<bool, AppError> {
    if !transition.from.can_advance_to(transition.to) {
        return Err(AppError::Internal(anyhow::anyhow!(
            "illegal session transition {} -> {}",
            transition.from,
            transition.to
        )));
    }

    let result =
        sqlx::query("UPDATE interview_sessions SET status = $1 WHERE id = $2 AND status = $3")
            .bind(transition.to.as_str())
            .bind(session_id)
            .bind(transition.from.as_str())
            .execute(&mut **tx)
            .await?;

    Ok(result.rows_affected() == 1)
}

/// Maps a unique-index violation onto `Conflict`; anything else stays a
/// persistence failure.
fn conflict_on_duplicate(err: sqlx::Error, message: String) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(message),
        _ => AppError::Persistence(err),
    }
}

#[async_trait]
impl ResumeStore for PgStore {
    async fn create_resume(&self, resume: NewResume) -> Result<ResumeRow, AppError> {
        let row = sqlx::query_as::<_, ResumeRow>(
            r#"
            INSERT INTO resumes (id, user_id, file_name, file_path, file_size, content)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(resume.user_id)
        .bind(&resume.file_name)
        .bind(&resume.file_path)
        .bind(resume.file_size)
        .bind(&resume.content)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn get_resume(&self, id: Uuid) -> Result<Option<ResumeRow>, AppError> {
        Ok(
            sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_resumes_for_user(&self, user_id: Uuid) -> Result<Vec<ResumeRow>, AppError> {
        Ok(sqlx::query_as::<_, ResumeRow>(
            "SELECT * FROM resumes WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn delete_resume(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM resumes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl InterviewStore for PgStore {
    async fn create_session_with_questions(
        &self,
        session: NewSession,
        questions: Vec<NewQuestion>,
    ) -> Result<InterviewRecord, AppError> {
        let mut tx = self.pool.begin().await?;
        let session_id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO interview_sessions (id, resume_id, interview_type, status, request_key)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(session_id)
        .bind(session.resume_id)
        .bind(&session.interview_type)
        .bind(SessionStatus::Pending.as_str())
        .bind(session.request_key.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            conflict_on_duplicate(
                e,
                format!(
                    "request key {:?} already used for resume {}",
                    session.request_key, session.resume_id
                ),
            )
        })?;

        for (position, question) in questions.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO questions
                    (id, session_id, position, question, evaluation_criteria, difficulty)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(session_id)
            .bind(position as i32)
            .bind(&question.question)
            .bind(&question.evaluation_criteria)
            .bind(&question.difficulty)
            .execute(&mut *tx)
            .await?;
        }

        transition_status(
            &mut tx,
            session_id,
            StatusTransition {
                from: SessionStatus::Pending,
                to: SessionStatus::InProgress,
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            "Created interview session {session_id} with {} questions for resume {}",
            questions.len(),
            session.resume_id
        );

        let row = sqlx::query_as::<_, InterviewSessionRow>(
            "SELECT * FROM interview_sessions WHERE id = $1",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await?;

        self.load_records(vec![row])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("session {session_id} vanished")))
    }

    async fn find_session_by_request_key(
        &self,
        resume_id: Uuid,
        request_key: &str,
    ) -> Result<Option<InterviewRecord>, AppError> {
        let session = sqlx::query_as::<_, InterviewSessionRow>(
            "SELECT * FROM interview_sessions WHERE resume_id = $1 AND request_key = $2",
        )
        .bind(resume_id)
        .bind(request_key)
        .fetch_optional(&self.pool)
        .await?;

        match session {
            Some(session) => Ok(self.load_records(vec![session]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn get_question(&self, id: Uuid) -> Result<Option<QuestionRow>, AppError> {
        Ok(
            sqlx::query_as::<_, QuestionRow>("SELECT * FROM questions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn get_answer_for_question(
        &self,
        question_id: Uuid,
    ) -> Result<Option<AnswerRow>, AppError> {
        Ok(
            sqlx::query_as::<_, AnswerRow>("SELECT * FROM answers WHERE question_id = $1")
                .bind(question_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn create_answer(&self, answer: NewAnswer) -> Result<AnswerRow, AppError> {
        sqlx::query_as::<_, AnswerRow>(
            r#"
            INSERT INTO answers (id, question_id, content, score, feedback, suggestions)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(answer.question_id)
        .bind(&answer.content)
        .bind(answer.score)
        .bind(&answer.feedback)
        .bind(&answer.suggestions)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            conflict_on_duplicate(
                e,
                format!("question {} has already been answered", answer.question_id),
            )
        })
    }

    async fn complete_session_if_answered(&self, session_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE interview_sessions s
            SET status = $2
            WHERE s.id = $1
              AND s.status = $3
              AND NOT EXISTS (
                  SELECT 1
                  FROM questions q
                  LEFT JOIN answers a ON a.question_id = q.id
                  WHERE q.session_id = s.id AND a.id IS NULL
              )
            "#,
        )
        .bind(session_id)
        .bind(SessionStatus::Completed.as_str())
        .bind(SessionStatus::InProgress.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_history(&self, resume_id: Uuid) -> Result<Vec<InterviewRecord>, AppError> {
        let sessions = sqlx::query_as::<_, InterviewSessionRow>(
            "SELECT * FROM interview_sessions WHERE resume_id = $1 ORDER BY created_at DESC, id",
        )
        .bind(resume_id)
        .fetch_all(&self.pool)
        .await?;

        self.load_records(sessions).await
    }

    async fn create_feedback(
        &self,
        report: NewFeedbackReport,
    ) -> Result<FeedbackReportRow, AppError> {
        Ok(sqlx::query_as::<_, FeedbackReportRow>(
            r#"
            INSERT INTO feedback_reports
                (id, resume_id, overall_evaluation, strengths, weaknesses,
                 improvement_suggestions, development_suggestions)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(report.resume_id)
        .bind(&report.overall_evaluation)
        .bind(&report.strengths)
        .bind(&report.weaknesses)
        .bind(&report.improvement_suggestions)
        .bind(&report.development_suggestions)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn latest_feedback(
        &self,
        resume_id: Uuid,
    ) -> Result<Option<FeedbackReportRow>, AppError> {
        Ok(sqlx::query_as::<_, FeedbackReportRow>(
            "SELECT * FROM feedback_reports WHERE resume_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(resume_id)
        .fetch_optional(&self.pool)
        .await?)
    }
}
