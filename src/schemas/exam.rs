use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Exam;
use crate::repositories::exams::{ExamListRow, ExamReviewRow};
use crate::schemas::datetime::{deserialize_datetime, deserialize_option_datetime};
use crate::schemas::question::QuestionResponse;

pub(crate) const NOTE_NOT_REGISTERED: &str = "Not registered";
pub(crate) const NOTE_ALREADY_COMPLETED: &str = "Already completed";

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamCreate {
    #[serde(alias = "classOfferingId")]
    #[validate(length(min = 1, message = "class_offering_id must not be empty"))]
    pub(crate) class_offering_id: String,
    #[validate(length(min = 1, max = 100, message = "kind must not be empty"))]
    pub(crate) kind: String,
    #[validate(length(min = 1, message = "roster must contain at least one student"))]
    pub(crate) roster: Vec<String>,
    #[serde(alias = "start_date", alias = "startTime", deserialize_with = "deserialize_datetime")]
    pub(crate) start_time: PrimitiveDateTime,
    #[serde(alias = "end_date", alias = "endTime", deserialize_with = "deserialize_datetime")]
    pub(crate) end_time: PrimitiveDateTime,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamUpdate {
    #[serde(default, alias = "classOfferingId")]
    #[validate(length(min = 1, message = "class_offering_id must not be empty"))]
    pub(crate) class_offering_id: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "kind must not be empty"))]
    pub(crate) kind: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "roster must contain at least one student"))]
    pub(crate) roster: Option<Vec<String>>,
    #[serde(
        default,
        alias = "start_date",
        alias = "startTime",
        deserialize_with = "deserialize_option_datetime"
    )]
    pub(crate) start_time: Option<PrimitiveDateTime>,
    #[serde(
        default,
        alias = "end_date",
        alias = "endTime",
        deserialize_with = "deserialize_option_datetime"
    )]
    pub(crate) end_time: Option<PrimitiveDateTime>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExamListQuery {
    #[serde(default)]
    pub(crate) class_offering_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamResponse {
    pub(crate) id: String,
    pub(crate) class_offering_id: String,
    pub(crate) kind: String,
    pub(crate) start_time: String,
    pub(crate) end_time: String,
    pub(crate) created_by: Option<String>,
    pub(crate) roster: Vec<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ExamResponse {
    pub(crate) fn from_db(exam: Exam, roster: Vec<String>) -> Self {
        Self {
            id: exam.id,
            class_offering_id: exam.class_offering_id,
            kind: exam.kind,
            start_time: format_primitive(exam.start_time),
            end_time: format_primitive(exam.end_time),
            created_by: exam.created_by,
            roster,
            created_at: format_primitive(exam.created_at),
            updated_at: format_primitive(exam.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamListItem {
    pub(crate) id: String,
    pub(crate) class_offering_id: String,
    pub(crate) kind: String,
    pub(crate) start_time: String,
    pub(crate) end_time: String,
    pub(crate) student_count: i64,
    pub(crate) roster_size: i64,
    pub(crate) question_count: i64,
    pub(crate) available: bool,
    pub(crate) notes: Option<&'static str>,
}

impl From<ExamListRow> for ExamListItem {
    fn from(row: ExamListRow) -> Self {
        let (available, notes) = availability(&row);
        Self {
            id: row.exam.id,
            class_offering_id: row.exam.class_offering_id,
            kind: row.exam.kind,
            start_time: format_primitive(row.exam.start_time),
            end_time: format_primitive(row.exam.end_time),
            student_count: row.student_count,
            roster_size: row.roster_size,
            question_count: row.question_count,
            available,
            notes,
        }
    }
}

fn availability(row: &ExamListRow) -> (bool, Option<&'static str>) {
    if !row.on_roster {
        return (false, Some(NOTE_NOT_REGISTERED));
    }
    if row.question_count > 0 && row.answered_count >= row.question_count {
        return (false, Some(NOTE_ALREADY_COMPLETED));
    }
    (true, None)
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamDetailResponse {
    #[serde(flatten)]
    pub(crate) exam: ExamResponse,
    pub(crate) question_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) answered_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) questions: Option<Vec<QuestionResponse>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamReviewStudent {
    pub(crate) student_id: String,
    pub(crate) full_name: String,
    pub(crate) student_number: Option<String>,
    pub(crate) national_student_number: Option<String>,
    pub(crate) total_score: i64,
    pub(crate) answered_count: i64,
}

impl From<ExamReviewRow> for ExamReviewStudent {
    fn from(row: ExamReviewRow) -> Self {
        Self {
            student_id: row.student_id,
            full_name: row.full_name,
            student_number: row.student_number,
            national_student_number: row.national_student_number,
            total_score: row.total_score,
            answered_count: row.answered_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamReviewResponse {
    pub(crate) exam_id: String,
    pub(crate) kind: String,
    pub(crate) question_count: i64,
    pub(crate) students: Vec<ExamReviewStudent>,
}
