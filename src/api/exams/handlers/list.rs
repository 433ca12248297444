use axum::{
    extract::{Query, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::exam::{ExamListItem, ExamListQuery};

/// Newest exams first, annotated with the caller's availability.
pub(in crate::api::exams) async fn list_exams(
    Query(params): Query<ExamListQuery>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamListItem>>, ApiError> {
    let rows = repositories::exams::list_for_user(
        state.db(),
        &user.id,
        params.class_offering_id.as_deref(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    Ok(Json(rows.into_iter().map(ExamListItem::from).collect()))
}
