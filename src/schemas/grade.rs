use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::api::errors::{deserialize_error_field, flatten_validation_errors, ApiError};
use crate::core::time::format_primitive;
use crate::db::models::Grade;
use crate::services::grade_report::ReportTable;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct GradeCreate {
    #[serde(alias = "classOfferingId")]
    #[validate(length(min = 1, message = "class_offering_id must not be empty"))]
    pub(crate) class_offering_id: String,
    #[serde(alias = "studentId")]
    #[validate(length(min = 1, message = "student_id must not be empty"))]
    pub(crate) student_id: String,
    #[serde(default, alias = "moduleId")]
    pub(crate) module_id: Option<String>,
    #[serde(default, alias = "examId")]
    pub(crate) exam_id: Option<String>,
    #[validate(length(min = 1, max = 255, message = "name must not be empty"))]
    pub(crate) name: String,
    #[validate(range(min = 0, max = 100, message = "score must be in range 0..100"))]
    pub(crate) score: i32,
}

#[derive(Debug)]
pub(crate) struct GradeCreateBatch {
    pub(crate) grades: Vec<GradeCreate>,
}

impl GradeCreateBatch {
    /// `POST /grades` accepts one grade or a list of them. Rows are decoded and
    /// validated one by one so every offending field of every row is reported
    /// under `grades[i]`.
    pub(crate) fn from_payload(payload: Value) -> Result<Self, ApiError> {
        let rows = match payload {
            Value::Array(rows) => rows,
            row @ Value::Object(_) => vec![row],
            _ => {
                return Err(ApiError::invalid_field(
                    "grades",
                    "expected a grade object or a list of grades",
                ))
            }
        };
        if rows.is_empty() {
            return Err(ApiError::invalid_field("grades", "at least one grade is required"));
        }

        let mut errors = BTreeMap::new();
        let mut grades = Vec::with_capacity(rows.len());
        for (index, row) in rows.into_iter().enumerate() {
            let prefix = format!("grades[{index}]");
            match serde_json::from_value::<GradeCreate>(row) {
                Ok(grade) => {
                    if let Err(invalid) = grade.validate() {
                        flatten_validation_errors(&invalid, &prefix, &mut errors);
                    }
                    grades.push(grade);
                }
                Err(err) => {
                    let message = err.to_string();
                    let path = match deserialize_error_field(&message) {
                        Some(field) => format!("{prefix}.{field}"),
                        None => prefix,
                    };
                    errors.entry(path).or_insert_with(Vec::new).push(message);
                }
            }
        }

        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }
        Ok(Self { grades })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct GradeUpdate {
    /// Rows without an id are skipped.
    #[serde(default)]
    pub(crate) id: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "name must not be empty"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, max = 100, message = "score must be in range 0..100"))]
    pub(crate) score: Option<i32>,
    #[serde(default, alias = "moduleId")]
    pub(crate) module_id: Option<String>,
    #[serde(default, alias = "examId")]
    pub(crate) exam_id: Option<String>,
}

#[derive(Debug, Validate)]
pub(crate) struct GradeUpdateBatch {
    #[validate(nested)]
    pub(crate) grades: Vec<GradeUpdate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GradeListQuery {
    #[serde(default)]
    pub(crate) class_offering_id: Option<String>,
    #[serde(default)]
    pub(crate) module_id: Option<String>,
    #[serde(default)]
    pub(crate) exam_id: Option<String>,
    #[serde(default)]
    pub(crate) student_id: Option<String>,
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "crate::api::pagination::default_limit")]
    pub(crate) limit: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct GradeResponse {
    pub(crate) id: String,
    pub(crate) class_offering_id: String,
    pub(crate) student_id: String,
    pub(crate) module_id: Option<String>,
    pub(crate) exam_id: Option<String>,
    pub(crate) name: String,
    pub(crate) score: i32,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl From<Grade> for GradeResponse {
    fn from(grade: Grade) -> Self {
        Self {
            id: grade.id,
            class_offering_id: grade.class_offering_id,
            student_id: grade.student_id,
            module_id: grade.module_id,
            exam_id: grade.exam_id,
            name: grade.name,
            score: grade.score,
            created_at: format_primitive(grade.created_at),
            updated_at: format_primitive(grade.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ClassOfferingReportResponse {
    pub(crate) class_offering_id: String,
    #[serde(flatten)]
    pub(crate) table: ReportTable,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubjectReport {
    pub(crate) subject_name: String,
    pub(crate) class_offering_id: String,
    #[serde(flatten)]
    pub(crate) table: ReportTable,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentReportResponse {
    pub(crate) student_id: String,
    pub(crate) academic_year_id: String,
    pub(crate) subjects: Vec<SubjectReport>,
}
