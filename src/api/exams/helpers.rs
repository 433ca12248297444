use std::collections::HashSet;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::db::models::{ClassOffering, Exam};
use crate::repositories;
use crate::schemas::exam::ExamResponse;

pub(super) const DUPLICATE_KIND: &str =
    "An exam of this kind already exists for the class offering";

pub(super) async fn fetch_exam(state: &AppState, exam_id: &str) -> Result<Exam, ApiError> {
    repositories::exams::find_by_id(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))
}

pub(super) async fn fetch_offering(
    state: &AppState,
    class_offering_id: &str,
) -> Result<ClassOffering, ApiError> {
    repositories::class_offerings::find_by_id(state.db(), class_offering_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load class offering"))?
        .ok_or_else(|| ApiError::NotFound("Class offering not found".to_string()))
}

/// Drops duplicate ids while keeping the submitted order.
pub(super) fn dedup_roster(roster: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    roster
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty() && seen.insert(id.clone()))
        .collect()
}

/// Every roster id must reference an existing student.
pub(super) async fn verify_roster(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    roster: &[String],
) -> Result<(), ApiError> {
    if roster.is_empty() {
        return Err(ApiError::invalid_field("roster", "roster must contain at least one student"));
    }

    let known = repositories::users::existing_student_ids(&mut **tx, roster)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to verify roster"))?;
    let known: HashSet<&str> = known.iter().map(String::as_str).collect();
    let unknown: Vec<&str> =
        roster.iter().map(String::as_str).filter(|id| !known.contains(id)).collect();

    if unknown.is_empty() {
        Ok(())
    } else {
        Err(ApiError::invalid_field("roster", format!("Unknown students: {}", unknown.join(", "))))
    }
}

pub(super) async fn exam_response(state: &AppState, exam: Exam) -> Result<ExamResponse, ApiError> {
    let roster = repositories::exams::roster(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam roster"))?;
    Ok(ExamResponse::from_db(exam, roster))
}
