use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::guards::{CurrentStaff, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::exam::{ExamDetailResponse, ExamResponse, ExamUpdate};
use crate::schemas::question::QuestionResponse;
use crate::services::exam_access::{self, ExamAccessError};

use super::super::helpers;

pub(in crate::api::exams) async fn get_exam(
    Path(exam_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ExamDetailResponse>, ApiError> {
    let exam = helpers::fetch_exam(&state, &exam_id).await?;
    let db = state.db();

    let question_count = repositories::questions::count_by_exam(db, &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count questions"))?;

    if user.role.is_staff() {
        let questions = repositories::questions::list_by_exam(db, &exam.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load questions"))?;
        let exam = helpers::exam_response(&state, exam).await?;
        return Ok(Json(ExamDetailResponse {
            exam,
            question_count,
            answered_count: None,
            questions: Some(questions.into_iter().map(QuestionResponse::with_key).collect()),
        }));
    }

    let on_roster = repositories::exams::is_on_roster(db, &exam.id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check exam roster"))?;
    if !on_roster {
        return Err(ExamAccessError::NotRegistered.into());
    }

    let answered_count = repositories::answers::count_for_student_in_exam(db, &exam.id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count answers"))?;
    let exam = helpers::exam_response(&state, exam).await?;

    Ok(Json(ExamDetailResponse {
        exam,
        question_count,
        answered_count: Some(answered_count),
        questions: None,
    }))
}

pub(in crate::api::exams) async fn update_exam(
    Path(exam_id): Path<String>,
    CurrentStaff(staff): CurrentStaff,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ExamUpdate>,
) -> Result<Json<ExamResponse>, ApiError> {
    payload.validate()?;

    let current = helpers::fetch_exam(&state, &exam_id).await?;
    exam_access::validate_window(
        payload.start_time.unwrap_or(current.start_time),
        payload.end_time.unwrap_or(current.end_time),
    )
    .map_err(|message| ApiError::invalid_field("end_time", message))?;

    if let Some(class_offering_id) = payload.class_offering_id.as_deref() {
        helpers::fetch_offering(&state, class_offering_id).await?;
    }

    let roster = payload.roster.map(helpers::dedup_roster);

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let exam = repositories::exams::update(
        &mut *tx,
        &exam_id,
        repositories::exams::UpdateExam {
            class_offering_id: payload.class_offering_id,
            kind: payload.kind.map(|kind| kind.trim().to_string()),
            start_time: payload.start_time,
            end_time: payload.end_time,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::from_write(e, helpers::DUPLICATE_KIND, "Failed to update exam"))?
    .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    if let Some(roster) = roster.as_deref() {
        helpers::verify_roster(&mut tx, roster).await?;
        repositories::exams::replace_roster(&mut tx, &exam.id, roster)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to store exam roster"))?;
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit exam update"))?;

    tracing::info!(
        action = "exam_update",
        user_id = %staff.id,
        exam_id = %exam.id,
        roster_replaced = roster.is_some(),
        "Exam updated"
    );

    Ok(Json(helpers::exam_response(&state, exam).await?))
}

pub(in crate::api::exams) async fn delete_exam(
    Path(exam_id): Path<String>,
    CurrentStaff(staff): CurrentStaff,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::exams::soft_delete(state.db(), &exam_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete exam"))?;
    if !deleted {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    }

    tracing::info!(action = "exam_delete", user_id = %staff.id, exam_id = %exam_id, "Exam deleted");

    Ok(StatusCode::NO_CONTENT)
}
