use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStaff;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::exam::{ExamReviewResponse, ExamReviewStudent};

use super::super::helpers;

/// Roster students with their live totals. Totals are summed on every read.
pub(in crate::api::exams) async fn review_exam(
    Path(exam_id): Path<String>,
    CurrentStaff(_staff): CurrentStaff,
    State(state): State<AppState>,
) -> Result<Json<ExamReviewResponse>, ApiError> {
    let exam = helpers::fetch_exam(&state, &exam_id).await?;

    let question_count = repositories::questions::count_by_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count questions"))?;
    let rows = repositories::exams::review(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam review"))?;

    Ok(Json(ExamReviewResponse {
        exam_id: exam.id,
        kind: exam.kind,
        question_count,
        students: rows.into_iter().map(ExamReviewStudent::from).collect(),
    }))
}
