use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

/// Lifecycle of an interview session. Transitions only move forward:
/// `pending → in_progress → completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    InProgress,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
        }
    }

    /// Whether `self → next` is a legal single-step transition.
    pub fn can_advance_to(&self, next: SessionStatus) -> bool {
        matches!(
            (self, next),
            (SessionStatus::Pending, SessionStatus::InProgress)
                | (SessionStatus::InProgress, SessionStatus::Completed)
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown session status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for SessionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SessionStatus::Pending),
            "in_progress" => Ok(SessionStatus::InProgress),
            "completed" => Ok(SessionStatus::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Column decoding goes through here, so a stray value fails the row
/// instead of being read as some other status.
impl TryFrom<String> for SessionStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewSessionRow {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub interview_type: String,
    #[sqlx(try_from = "String")]
    pub status: SessionStatus,
    pub request_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct QuestionRow {
    pub id: Uuid,
    pub session_id: Uuid,
    pub position: i32,
    pub question: String,
    pub evaluation_criteria: String,
    pub difficulty: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnswerRow {
    pub id: Uuid,
    pub question_id: Uuid,
    pub content: String,
    pub score: i32,
    pub feedback: String,
    pub suggestions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeedbackReportRow {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub overall_evaluation: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub improvement_suggestions: Vec<String>,
    pub development_suggestions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A question together with its answer, if one has been submitted.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionWithAnswer {
    #[serde(flatten)]
    pub question: QuestionRow,
    pub answer: Option<AnswerRow>,
}

/// One interview session with its questions in batch order.
#[derive(Debug, Clone, Serialize)]
pub struct InterviewRecord {
    #[serde(flatten)]
    pub session: InterviewSessionRow,
    pub questions: Vec<QuestionWithAnswer>,
}

impl InterviewRecord {
    pub fn is_completed(&self) -> bool {
        self.session.status == SessionStatus::Completed
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Typed write models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NewSession {
    pub resume_id: Uuid,
    pub interview_type: String,
    pub request_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewQuestion {
    pub question: String,
    pub evaluation_criteria: String,
    pub difficulty: String,
}

#[derive(Debug, Clone)]
pub struct NewAnswer {
    pub question_id: Uuid,
    pub content: String,
    pub score: i32,
    pub feedback: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewFeedbackReport {
    pub resume_id: Uuid,
    pub overall_evaluation: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub improvement_suggestions: Vec<String>,
    pub development_suggestions: Vec<String>,
}

/// The only post-creation mutation a session supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    pub from: SessionStatus,
    pub to: SessionStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [
            SessionStatus::Pending,
            SessionStatus::InProgress,
            SessionStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<SessionStatus>().unwrap(), status);
        }
        assert!("done".parse::<SessionStatus>().is_err());
    }

    #[test]
    fn test_unknown_status_is_an_error_not_pending() {
        let err = SessionStatus::try_from("archived".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "unknown session status 'archived'");
        assert!(SessionStatus::try_from(String::new()).is_err());
        assert_eq!(
            SessionStatus::try_from("completed".to_string()).unwrap(),
            SessionStatus::Completed
        );
    }

    #[test]
    fn test_session_row_serializes_status_as_text() {
        let row = InterviewSessionRow {
            id: Uuid::nil(),
            resume_id: Uuid::nil(),
            interview_type: "technical".into(),
            status: SessionStatus::InProgress,
            request_key: None,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["status"], "in_progress");
    }

    #[test]
    fn test_status_only_moves_forward_one_step() {
        use SessionStatus::*;
        assert!(Pending.can_advance_to(InProgress));
        assert!(InProgress.can_advance_to(Completed));
        assert!(!Pending.can_advance_to(Completed));
        assert!(!Completed.can_advance_to(InProgress));
        assert!(!InProgress.can_advance_to(Pending));
        assert!(!Completed.can_advance_to(Completed));
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
    }
}
