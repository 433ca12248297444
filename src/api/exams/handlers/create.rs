use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::guards::CurrentStaff;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::exam::{ExamCreate, ExamResponse};
use crate::services::exam_access;

use super::super::helpers;

pub(in crate::api::exams) async fn create_exam(
    CurrentStaff(staff): CurrentStaff,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ExamCreate>,
) -> Result<(StatusCode, Json<ExamResponse>), ApiError> {
    payload.validate()?;
    exam_access::validate_window(payload.start_time, payload.end_time)
        .map_err(|message| ApiError::invalid_field("end_time", message))?;

    helpers::fetch_offering(&state, &payload.class_offering_id).await?;

    let roster = helpers::dedup_roster(payload.roster);
    let now = primitive_now_utc();

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    helpers::verify_roster(&mut tx, &roster).await?;

    let exam = repositories::exams::create(
        &mut *tx,
        repositories::exams::CreateExam {
            id: &Uuid::new_v4().to_string(),
            class_offering_id: &payload.class_offering_id,
            kind: payload.kind.trim(),
            start_time: payload.start_time,
            end_time: payload.end_time,
            created_by: &staff.id,
            now,
        },
    )
    .await
    .map_err(|e| ApiError::from_write(e, helpers::DUPLICATE_KIND, "Failed to create exam"))?;

    repositories::exams::replace_roster(&mut tx, &exam.id, &roster)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to store exam roster"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit exam"))?;

    tracing::info!(
        action = "exam_create",
        user_id = %staff.id,
        exam_id = %exam.id,
        class_offering_id = %exam.class_offering_id,
        roster_size = roster.len(),
        "Exam created"
    );

    Ok((StatusCode::CREATED, Json(ExamResponse::from_db(exam, roster))))
}
