use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentStaff, CurrentStudent};
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::grade::{ClassOfferingReportResponse, StudentReportResponse, SubjectReport};
use crate::services::grade_report::{self, ReportScores, ReportStudent};

/// Class offering report: module cells hold the latest manual grade, exam
/// cells the live sum of answer scores.
pub(super) async fn class_offering_report(
    Path(class_offering_id): Path<String>,
    CurrentStaff(_staff): CurrentStaff,
    State(state): State<AppState>,
) -> Result<Json<ClassOfferingReportResponse>, ApiError> {
    let db = state.db();
    let offering = repositories::class_offerings::find_by_id(db, &class_offering_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load class offering"))?
        .ok_or_else(|| ApiError::NotFound("Class offering not found".to_string()))?;

    let students: Vec<ReportStudent> =
        repositories::enrollments::list_students(db, &offering.class_id, &offering.academic_year_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load class roster"))?
            .into_iter()
            .map(|student| ReportStudent { id: student.id, name: student.full_name })
            .collect();

    let offering_ids = [offering.id.clone()];
    let modules = repositories::modules::list_by_offerings(db, &offering_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load modules"))?;
    let exams = repositories::exams::list_by_offerings(db, &offering_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exams"))?;

    let student_ids: Vec<String> = students.iter().map(|student| student.id.clone()).collect();
    let scores = load_scores(&state, &modules, &exams, &student_ids).await?;

    let table = grade_report::class_offering_table(
        &students,
        &modules,
        &exams,
        &scores,
        &state.settings().exam().missing_score_marker,
    );

    Ok(Json(ClassOfferingReportResponse { class_offering_id: offering.id, table }))
}

/// The calling student's report for one academic year, one entry per subject.
pub(super) async fn student_report(
    Path(academic_year_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<StudentReportResponse>, ApiError> {
    let db = state.db();
    let offerings =
        repositories::class_offerings::list_for_student_year(db, &student.id, &academic_year_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load class offerings"))?;
    if offerings.is_empty() {
        return Err(ApiError::NotFound(
            "You are not enrolled in any class for this academic year".to_string(),
        ));
    }

    let offering_ids: Vec<String> = offerings.iter().map(|offering| offering.id.clone()).collect();
    let modules = repositories::modules::list_by_offerings(db, &offering_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load modules"))?;
    let exams = repositories::exams::list_by_offerings(db, &offering_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exams"))?;

    let student_ids = [student.id.clone()];
    let scores = load_scores(&state, &modules, &exams, &student_ids).await?;
    let marker = &state.settings().exam().missing_score_marker;

    let subjects = offerings
        .into_iter()
        .map(|offering| SubjectReport {
            table: grade_report::student_offering_table(
                &student.id,
                &offering.id,
                &modules,
                &exams,
                &scores,
                marker,
            ),
            subject_name: offering.subject_name,
            class_offering_id: offering.id,
        })
        .collect();

    Ok(Json(StudentReportResponse { student_id: student.id, academic_year_id, subjects }))
}

async fn load_scores(
    state: &AppState,
    modules: &[crate::db::models::Module],
    exams: &[crate::db::models::Exam],
    student_ids: &[String],
) -> Result<ReportScores, ApiError> {
    let module_ids: Vec<String> = modules.iter().map(|module| module.id.clone()).collect();
    let exam_ids: Vec<String> = exams.iter().map(|exam| exam.id.clone()).collect();

    let module_scores: HashMap<(String, String), i32> =
        repositories::grades::latest_module_scores(state.db(), &module_ids, student_ids)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load module grades"))?
            .into_iter()
            .map(|row| ((row.module_id, row.student_id), row.score))
            .collect();

    let exam_totals: HashMap<(String, String), i64> =
        repositories::answers::exam_totals(state.db(), &exam_ids, student_ids)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load exam totals"))?
            .into_iter()
            .map(|row| ((row.exam_id, row.student_id), row.total))
            .collect();

    Ok(ReportScores { modules: module_scores, exams: exam_totals })
}
