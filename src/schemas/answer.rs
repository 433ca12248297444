use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Answer;
use crate::db::types::AnswerValue;

pub(crate) const DEFAULT_STATUS: &str = "submitted";

fn default_status() -> String {
    DEFAULT_STATUS.to_string()
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AnswerCreate {
    #[serde(alias = "questionId")]
    #[validate(length(min = 1, message = "question_id must not be empty"))]
    pub(crate) question_id: String,
    /// Raw submission. Normalised before scoring.
    #[serde(default)]
    pub(crate) value: Option<serde_json::Value>,
    #[serde(default = "default_status")]
    #[validate(length(min = 1, max = 50, message = "status must be 1..50 characters"))]
    pub(crate) status: String,
    #[serde(default)]
    pub(crate) remark: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AnswerScoreUpdate {
    #[validate(
        required(message = "score is required"),
        range(min = 0, max = 100, message = "score must be in range 0..100")
    )]
    pub(crate) score: Option<i32>,
    #[serde(default)]
    pub(crate) remark: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnswerListQuery {
    #[serde(default)]
    pub(crate) question_id: Option<String>,
}

/// What the submitting student sees. Score and correctness stay hidden.
#[derive(Debug, Serialize)]
pub(crate) struct AnswerSubmittedResponse {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) student_id: String,
    pub(crate) value: Option<AnswerValue>,
    pub(crate) status: String,
    pub(crate) remark: Option<String>,
    pub(crate) created_at: String,
}

impl From<Answer> for AnswerSubmittedResponse {
    fn from(answer: Answer) -> Self {
        Self {
            id: answer.id,
            question_id: answer.question_id,
            student_id: answer.student_id,
            value: answer.value.map(|value| value.0),
            status: answer.status,
            remark: answer.remark,
            created_at: format_primitive(answer.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerResponse {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) student_id: String,
    pub(crate) value: Option<AnswerValue>,
    pub(crate) status: String,
    pub(crate) remark: Option<String>,
    pub(crate) score: i32,
    pub(crate) is_correct: Option<bool>,
    pub(crate) manually_graded: bool,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl From<Answer> for AnswerResponse {
    fn from(answer: Answer) -> Self {
        Self {
            id: answer.id,
            question_id: answer.question_id,
            student_id: answer.student_id,
            value: answer.value.map(|value| value.0),
            status: answer.status,
            remark: answer.remark,
            score: answer.score,
            is_correct: answer.is_correct,
            manually_graded: answer.manually_graded,
            created_at: format_primitive(answer.created_at),
            updated_at: format_primitive(answer.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use sqlx::types::Json;
    use time::macros::datetime;

    use super::*;

    fn answer() -> Answer {
        Answer {
            id: "a1".to_string(),
            question_id: "q1".to_string(),
            student_id: "s1".to_string(),
            value: Some(Json(AnswerValue::Text("B".to_string()))),
            status: DEFAULT_STATUS.to_string(),
            remark: None,
            score: 10,
            is_correct: Some(true),
            manually_graded: false,
            created_at: datetime!(2026-03-01 08:05),
            updated_at: datetime!(2026-03-01 08:05),
        }
    }

    #[test]
    fn submitted_view_hides_score() {
        let json = serde_json::to_value(AnswerSubmittedResponse::from(answer())).unwrap();
        assert!(json.get("score").is_none());
        assert!(json.get("is_correct").is_none());
        assert_eq!(json["value"], "B");
    }

    #[test]
    fn staff_view_includes_score() {
        let json = serde_json::to_value(AnswerResponse::from(answer())).unwrap();
        assert_eq!(json["score"], 10);
        assert_eq!(json["is_correct"], true);
    }

    #[test]
    fn status_defaults_to_submitted() {
        let payload: AnswerCreate =
            serde_json::from_value(serde_json::json!({"question_id": "q1", "value": ["A", "C"]}))
                .unwrap();
        assert_eq!(payload.status, "submitted");
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn score_update_requires_score() {
        let payload: AnswerScoreUpdate =
            serde_json::from_value(serde_json::json!({"remark": "good"})).unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("score"));

        let payload: AnswerScoreUpdate =
            serde_json::from_value(serde_json::json!({"score": 101})).unwrap();
        assert!(payload.validate().is_err());
    }
}
