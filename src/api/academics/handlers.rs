use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::guards::{CurrentAdmin, CurrentStaff, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::ClassOffering;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::academic::{
    AcademicYearCreate, AcademicYearResponse, ClassCreate, ClassOfferingCreate,
    ClassOfferingQuery, ClassOfferingResponse, ClassResponse, EnrollmentCreate,
    EnrollmentResponse, RosterStudentResponse, SubjectCreate, SubjectResponse,
};

pub(super) async fn list_subjects(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<SubjectResponse>>, ApiError> {
    let subjects = repositories::subjects::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list subjects"))?;
    Ok(Json(subjects.into_iter().map(SubjectResponse::from).collect()))
}

pub(super) async fn create_subject(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SubjectCreate>,
) -> Result<(StatusCode, Json<SubjectResponse>), ApiError> {
    payload.validate()?;

    let subject = repositories::subjects::create(
        state.db(),
        &Uuid::new_v4().to_string(),
        payload.name.trim(),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create subject"))?;

    tracing::info!(action = "subject_create", admin_id = %admin.id, subject_id = %subject.id, "Subject created");

    Ok((StatusCode::CREATED, Json(SubjectResponse::from(subject))))
}

pub(super) async fn delete_subject(
    Path(subject_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::subjects::soft_delete(state.db(), &subject_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete subject"))?;
    if !deleted {
        return Err(ApiError::NotFound("Subject not found".to_string()));
    }

    tracing::info!(action = "subject_delete", admin_id = %admin.id, subject_id = %subject_id, "Subject deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn list_academic_years(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AcademicYearResponse>>, ApiError> {
    let years = repositories::academic_years::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list academic years"))?;
    Ok(Json(years.into_iter().map(AcademicYearResponse::from).collect()))
}

pub(super) async fn create_academic_year(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<AcademicYearCreate>,
) -> Result<(StatusCode, Json<AcademicYearResponse>), ApiError> {
    payload.validate()?;

    let year = repositories::academic_years::create(
        state.db(),
        &Uuid::new_v4().to_string(),
        payload.name.trim(),
        payload.is_active,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create academic year"))?;

    tracing::info!(
        action = "academic_year_create",
        admin_id = %admin.id,
        academic_year_id = %year.id,
        "Academic year created"
    );

    Ok((StatusCode::CREATED, Json(AcademicYearResponse::from(year))))
}

pub(super) async fn delete_academic_year(
    Path(academic_year_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::academic_years::soft_delete(
        state.db(),
        &academic_year_id,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to delete academic year"))?;
    if !deleted {
        return Err(ApiError::NotFound("Academic year not found".to_string()));
    }

    tracing::info!(
        action = "academic_year_delete",
        admin_id = %admin.id,
        academic_year_id = %academic_year_id,
        "Academic year deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn list_classes(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ClassResponse>>, ApiError> {
    let classes = repositories::classes::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list classes"))?;
    Ok(Json(classes.into_iter().map(ClassResponse::from).collect()))
}

pub(super) async fn create_class(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ClassCreate>,
) -> Result<(StatusCode, Json<ClassResponse>), ApiError> {
    payload.validate()?;

    let class = repositories::classes::create(
        state.db(),
        &Uuid::new_v4().to_string(),
        payload.name.trim(),
        payload.grade_level,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create class"))?;

    tracing::info!(action = "class_create", admin_id = %admin.id, class_id = %class.id, "Class created");

    Ok((StatusCode::CREATED, Json(ClassResponse::from(class))))
}

pub(super) async fn delete_class(
    Path(class_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::classes::soft_delete(state.db(), &class_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete class"))?;
    if !deleted {
        return Err(ApiError::NotFound("Class not found".to_string()));
    }

    tracing::info!(action = "class_delete", admin_id = %admin.id, class_id = %class_id, "Class deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn list_class_offerings(
    Query(params): Query<ClassOfferingQuery>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ClassOfferingResponse>>, ApiError> {
    let offerings = repositories::class_offerings::list(
        state.db(),
        params.academic_year_id.as_deref(),
        params.class_id.as_deref(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list class offerings"))?;
    Ok(Json(offerings.into_iter().map(ClassOfferingResponse::from).collect()))
}

pub(super) async fn get_class_offering(
    Path(class_offering_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ClassOfferingResponse>, ApiError> {
    let offering = fetch_offering(&state, &class_offering_id).await?;
    Ok(Json(ClassOfferingResponse::from(offering)))
}

pub(super) async fn create_class_offering(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ClassOfferingCreate>,
) -> Result<(StatusCode, Json<ClassOfferingResponse>), ApiError> {
    payload.validate()?;

    let db = state.db();
    let class = repositories::classes::find_by_id(db, &payload.class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load class"))?;
    if class.is_none() {
        return Err(ApiError::NotFound("Class not found".to_string()));
    }
    let year = repositories::academic_years::find_by_id(db, &payload.academic_year_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load academic year"))?;
    if year.is_none() {
        return Err(ApiError::NotFound("Academic year not found".to_string()));
    }
    let subject = repositories::subjects::find_by_id(db, &payload.subject_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load subject"))?;
    if subject.is_none() {
        return Err(ApiError::NotFound("Subject not found".to_string()));
    }

    if let Some(teacher_id) = payload.teacher_id.as_deref() {
        let teacher = repositories::users::find_by_id(db, teacher_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load teacher"))?;
        if !teacher.is_some_and(|user| user.role == UserRole::Teacher) {
            return Err(ApiError::invalid_field("teacher_id", "teacher_id must reference a teacher"));
        }
    }

    let offering = repositories::class_offerings::create(
        db,
        repositories::class_offerings::CreateClassOffering {
            id: &Uuid::new_v4().to_string(),
            class_id: &payload.class_id,
            academic_year_id: &payload.academic_year_id,
            subject_id: &payload.subject_id,
            teacher_id: payload.teacher_id.as_deref(),
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create class offering"))?;

    tracing::info!(
        action = "class_offering_create",
        admin_id = %admin.id,
        class_offering_id = %offering.id,
        "Class offering created"
    );

    Ok((StatusCode::CREATED, Json(ClassOfferingResponse::from(offering))))
}

pub(super) async fn delete_class_offering(
    Path(class_offering_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::class_offerings::soft_delete(
        state.db(),
        &class_offering_id,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to delete class offering"))?;
    if !deleted {
        return Err(ApiError::NotFound("Class offering not found".to_string()));
    }

    tracing::info!(
        action = "class_offering_delete",
        admin_id = %admin.id,
        class_offering_id = %class_offering_id,
        "Class offering deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn list_offering_students(
    Path(class_offering_id): Path<String>,
    CurrentStaff(_staff): CurrentStaff,
    State(state): State<AppState>,
) -> Result<Json<Vec<RosterStudentResponse>>, ApiError> {
    let offering = fetch_offering(&state, &class_offering_id).await?;
    let students = repositories::enrollments::list_students(
        state.db(),
        &offering.class_id,
        &offering.academic_year_id,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list class roster"))?;
    Ok(Json(students.into_iter().map(RosterStudentResponse::from).collect()))
}

pub(super) async fn create_enrollments(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<EnrollmentCreate>,
) -> Result<(StatusCode, Json<Vec<EnrollmentResponse>>), ApiError> {
    payload.validate()?;

    let db = state.db();
    let class = repositories::classes::find_by_id(db, &payload.class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load class"))?;
    if class.is_none() {
        return Err(ApiError::NotFound("Class not found".to_string()));
    }
    let year = repositories::academic_years::find_by_id(db, &payload.academic_year_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load academic year"))?;
    if year.is_none() {
        return Err(ApiError::NotFound("Academic year not found".to_string()));
    }

    let mut seen = HashSet::new();
    let student_ids: Vec<String> =
        payload.student_ids.into_iter().filter(|id| seen.insert(id.clone())).collect();

    let mut tx = db.begin().await.map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let known = repositories::users::existing_student_ids(&mut *tx, &student_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to verify students"))?;
    let known: HashSet<&str> = known.iter().map(String::as_str).collect();
    let unknown: Vec<&str> =
        student_ids.iter().map(String::as_str).filter(|id| !known.contains(id)).collect();
    if !unknown.is_empty() {
        return Err(ApiError::invalid_field(
            "student_ids",
            format!("Unknown students: {}", unknown.join(", ")),
        ));
    }

    let enrollments = repositories::enrollments::insert_many(
        &mut tx,
        &payload.class_id,
        &payload.academic_year_id,
        &student_ids,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to enroll students"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit enrollments"))?;

    tracing::info!(
        action = "enrollment_create",
        admin_id = %admin.id,
        class_id = %payload.class_id,
        academic_year_id = %payload.academic_year_id,
        requested = student_ids.len(),
        inserted = enrollments.len(),
        "Students enrolled"
    );

    Ok((StatusCode::CREATED, Json(enrollments.into_iter().map(EnrollmentResponse::from).collect())))
}

pub(super) async fn delete_enrollment(
    Path(enrollment_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted =
        repositories::enrollments::soft_delete(state.db(), &enrollment_id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to delete enrollment"))?;
    if !deleted {
        return Err(ApiError::NotFound("Enrollment not found".to_string()));
    }

    tracing::info!(
        action = "enrollment_delete",
        admin_id = %admin.id,
        enrollment_id = %enrollment_id,
        "Enrollment deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_offering(state: &AppState, class_offering_id: &str) -> Result<ClassOffering, ApiError> {
    repositories::class_offerings::find_by_id(state.db(), class_offering_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load class offering"))?
        .ok_or_else(|| ApiError::NotFound("Class offering not found".to_string()))
}
