use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::guards::{CurrentStaff, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;
use crate::repositories::grades::GradeFilter;
use crate::schemas::grade::{
    GradeCreateBatch, GradeListQuery, GradeResponse, GradeUpdate, GradeUpdateBatch,
};

pub(super) async fn list_grades(
    Query(params): Query<GradeListQuery>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<GradeResponse>>, ApiError> {
    // Students only ever see their own grades.
    let student_id = match user.role {
        UserRole::Student => Some(user.id.as_str()),
        _ => params.student_id.as_deref(),
    };

    let grades = repositories::grades::list(
        state.db(),
        GradeFilter {
            class_offering_id: params.class_offering_id.as_deref(),
            module_id: params.module_id.as_deref(),
            exam_id: params.exam_id.as_deref(),
            student_id,
        },
        params.skip,
        params.limit,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list grades"))?;

    Ok(Json(grades.into_iter().map(GradeResponse::from).collect()))
}

pub(super) async fn get_grade(
    Path(grade_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<GradeResponse>, ApiError> {
    let grade = repositories::grades::find_by_id(state.db(), &grade_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch grade"))?
        .ok_or_else(|| ApiError::NotFound("Grade not found".to_string()))?;

    if user.role == UserRole::Student && grade.student_id != user.id {
        return Err(ApiError::Forbidden("Access denied"));
    }

    Ok(Json(GradeResponse::from(grade)))
}

/// Accepts one grade or a list. Every row is validated before anything is
/// written; rows are inserted in one transaction.
pub(super) async fn create_grades(
    CurrentStaff(staff): CurrentStaff,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<serde_json::Value>,
) -> Result<(StatusCode, Json<Vec<GradeResponse>>), ApiError> {
    let batch = GradeCreateBatch::from_payload(payload)?;

    let now = primitive_now_utc();
    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let mut created = Vec::with_capacity(batch.grades.len());
    for grade in &batch.grades {
        let row = repositories::grades::create(
            &mut *tx,
            repositories::grades::CreateGrade {
                id: &Uuid::new_v4().to_string(),
                class_offering_id: &grade.class_offering_id,
                student_id: &grade.student_id,
                module_id: grade.module_id.as_deref(),
                exam_id: grade.exam_id.as_deref(),
                name: grade.name.trim(),
                score: grade.score,
                now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create grade"))?;
        created.push(GradeResponse::from(row));
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit grades"))?;

    tracing::info!(action = "grade_create", user_id = %staff.id, count = created.len(), "Grades created");

    Ok((StatusCode::CREATED, Json(created)))
}

/// Bulk update by id in one transaction. Rows without an id are skipped.
pub(super) async fn update_grades(
    CurrentStaff(staff): CurrentStaff,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Vec<GradeUpdate>>,
) -> Result<Json<Vec<GradeResponse>>, ApiError> {
    let batch = GradeUpdateBatch { grades: payload };
    batch.validate()?;

    let now = primitive_now_utc();
    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let mut updated = Vec::with_capacity(batch.grades.len());
    for (index, grade) in batch.grades.into_iter().enumerate() {
        let Some(grade_id) = grade.id else {
            tracing::warn!(index, "Skipping grade update without id");
            continue;
        };

        let row = repositories::grades::update(
            &mut *tx,
            &grade_id,
            repositories::grades::UpdateGrade {
                name: grade.name.map(|name| name.trim().to_string()),
                score: grade.score,
                module_id: grade.module_id,
                exam_id: grade.exam_id,
                updated_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update grade"))?
        .ok_or_else(|| ApiError::NotFound(format!("Grade {grade_id} not found")))?;
        updated.push(GradeResponse::from(row));
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit grades"))?;

    tracing::info!(action = "grade_update", user_id = %staff.id, count = updated.len(), "Grades updated");

    Ok(Json(updated))
}

pub(super) async fn delete_grade(
    Path(grade_id): Path<String>,
    CurrentStaff(staff): CurrentStaff,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::grades::soft_delete(state.db(), &grade_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete grade"))?;
    if !deleted {
        return Err(ApiError::NotFound("Grade not found".to_string()));
    }

    tracing::info!(action = "grade_delete", user_id = %staff.id, grade_id = %grade_id, "Grade deleted");

    Ok(StatusCode::NO_CONTENT)
}
