use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Question;
use crate::db::types::{AnswerValue, QuestionKind};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[validate(length(min = 1, message = "exam_id must not be empty"))]
    pub(crate) exam_id: String,
    pub(crate) kind: QuestionKind,
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    pub(crate) prompt: String,
    #[serde(default)]
    pub(crate) choices: Option<Vec<String>>,
    #[serde(default, alias = "answerKey")]
    pub(crate) answer_key: Option<AnswerValue>,
    #[serde(default, alias = "imageUrl")]
    #[validate(length(max = 1024, message = "image_url must be at most 1024 characters"))]
    pub(crate) image_url: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, max = 100, message = "points must be in range 0..100"))]
    pub(crate) points: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionUpdate {
    #[serde(default)]
    pub(crate) kind: Option<QuestionKind>,
    #[serde(default)]
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    pub(crate) prompt: Option<String>,
    #[serde(default)]
    pub(crate) choices: Option<Vec<String>>,
    #[serde(default, alias = "answerKey")]
    pub(crate) answer_key: Option<AnswerValue>,
    #[serde(default, alias = "imageUrl")]
    #[validate(length(max = 1024, message = "image_url must be at most 1024 characters"))]
    pub(crate) image_url: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, max = 100, message = "points must be in range 0..100"))]
    pub(crate) points: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionExamQuery {
    #[serde(default)]
    pub(crate) exam_id: Option<String>,
}

/// Rejects answer keys whose shape does not fit the question kind.
pub(crate) fn check_key_shape(
    kind: QuestionKind,
    answer_key: Option<&AnswerValue>,
) -> Result<(), &'static str> {
    match (kind, answer_key) {
        (QuestionKind::SingleChoice, Some(AnswerValue::Choices(_))) => {
            Err("answer_key must be a single value for single_choice questions")
        }
        (QuestionKind::MultipleChoice, Some(AnswerValue::Text(_))) => {
            Err("answer_key must be a list for multiple_choice questions")
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) kind: QuestionKind,
    pub(crate) prompt: String,
    pub(crate) choices: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) answer_key: Option<AnswerValue>,
    pub(crate) image_url: Option<String>,
    pub(crate) points: i32,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl QuestionResponse {
    /// Staff view, including the answer key.
    pub(crate) fn with_key(question: Question) -> Self {
        let answer_key = question.answer_key.clone().map(|key| key.0);
        Self { answer_key, ..Self::without_key(question) }
    }

    /// Student view. The answer key never leaves the server.
    pub(crate) fn without_key(question: Question) -> Self {
        Self {
            id: question.id,
            exam_id: question.exam_id,
            kind: question.kind,
            prompt: question.prompt,
            choices: question.choices.map(|choices| choices.0),
            answer_key: None,
            image_url: question.image_url,
            points: question.points,
            created_at: format_primitive(question.created_at),
            updated_at: format_primitive(question.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RandomQuestionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) message: Option<String>,
    pub(crate) question: Option<QuestionResponse>,
}
