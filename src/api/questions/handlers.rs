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
use crate::api::guards::{require_exam_access, CurrentStaff, CurrentStudent, CurrentUser};
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Question;
use crate::repositories;
use crate::schemas::question::{
    check_key_shape, QuestionCreate, QuestionExamQuery, QuestionResponse, QuestionUpdate,
    RandomQuestionResponse,
};
use crate::services::exam_access::ExamAccessError;
use crate::services::question_selector;

const ALL_ANSWERED: &str = "All questions have been answered";

pub(super) async fn create_question(
    CurrentStaff(staff): CurrentStaff,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<QuestionCreate>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    payload.validate()?;
    check_key_shape(payload.kind, payload.answer_key.as_ref())
        .map_err(|message| ApiError::invalid_field("answer_key", message))?;

    let exam = repositories::exams::find_by_id(state.db(), &payload.exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?;
    if exam.is_none() {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    }

    let question = repositories::questions::create(
        state.db(),
        repositories::questions::CreateQuestion {
            id: &Uuid::new_v4().to_string(),
            exam_id: &payload.exam_id,
            kind: payload.kind,
            prompt: &payload.prompt,
            choices: payload.choices,
            answer_key: payload.answer_key,
            image_url: payload.image_url.as_deref(),
            points: payload.points,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    tracing::info!(
        action = "question_create",
        user_id = %staff.id,
        question_id = %question.id,
        exam_id = %question.exam_id,
        kind = question.kind.as_str(),
        "Question created"
    );

    Ok((StatusCode::CREATED, Json(QuestionResponse::with_key(question))))
}

pub(super) async fn list_staff_questions(
    Query(params): Query<QuestionExamQuery>,
    CurrentStaff(_staff): CurrentStaff,
    State(state): State<AppState>,
) -> Result<Json<Vec<QuestionResponse>>, ApiError> {
    let exam_id = required_exam_id(params)?;
    let questions = load_questions(&state, &exam_id).await?;
    Ok(Json(questions.into_iter().map(QuestionResponse::with_key).collect()))
}

pub(super) async fn list_student_questions(
    Query(params): Query<QuestionExamQuery>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<Vec<QuestionResponse>>, ApiError> {
    let exam_id = required_exam_id(params)?;
    let exam = require_exam_access(&state, &exam_id, &student.id).await?;
    let questions = load_questions(&state, &exam.id).await?;
    Ok(Json(questions.into_iter().map(QuestionResponse::without_key).collect()))
}

/// Serves one unanswered question of the exam, objective kinds first.
pub(super) async fn random_question(
    Path(exam_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<RandomQuestionResponse>, ApiError> {
    let exam = require_exam_access(&state, &exam_id, &student.id).await?;

    let questions = load_questions(&state, &exam.id).await?;
    let answered: HashSet<String> =
        repositories::answers::answered_question_ids(state.db(), &exam.id, &student.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load answered questions"))?
            .into_iter()
            .collect();

    let picked = question_selector::pick_next(questions, &answered, &mut rand::thread_rng());
    metrics::record_question_served(picked.as_ref().map(|question| question.kind));

    let response = match picked {
        Some(question) => RandomQuestionResponse {
            message: None,
            question: Some(QuestionResponse::without_key(question)),
        },
        None => RandomQuestionResponse { message: Some(ALL_ANSWERED.to_string()), question: None },
    };

    Ok(Json(response))
}

pub(super) async fn get_question(
    Path(question_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let question = fetch_question(&state, &question_id).await?;

    if user.role.is_staff() {
        return Ok(Json(QuestionResponse::with_key(question)));
    }

    let on_roster = repositories::exams::is_on_roster(state.db(), &question.exam_id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check exam roster"))?;
    if !on_roster {
        return Err(ExamAccessError::NotRegistered.into());
    }

    Ok(Json(QuestionResponse::without_key(question)))
}

/// Merges the update. A points change on an objective question rescores every
/// recorded answer from its stored correctness flag, in the same transaction.
pub(super) async fn update_question(
    Path(question_id): Path<String>,
    CurrentStaff(staff): CurrentStaff,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<QuestionUpdate>,
) -> Result<Json<QuestionResponse>, ApiError> {
    payload.validate()?;

    let current = fetch_question(&state, &question_id).await?;
    let kind = payload.kind.unwrap_or(current.kind);
    let answer_key = payload.answer_key.as_ref().or(current.answer_key.as_ref().map(|key| &key.0));
    check_key_shape(kind, answer_key)
        .map_err(|message| ApiError::invalid_field("answer_key", message))?;

    let points_changed = payload.points.is_some_and(|points| points != current.points);
    let now = primitive_now_utc();

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let question = repositories::questions::update(
        &mut *tx,
        &question_id,
        repositories::questions::UpdateQuestion {
            kind: payload.kind,
            prompt: payload.prompt,
            choices: payload.choices,
            answer_key: payload.answer_key,
            image_url: payload.image_url,
            points: payload.points,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update question"))?
    .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    let mut rescored = 0;
    if points_changed && question.kind.is_objective() {
        rescored = repositories::answers::rescore_for_question(
            &mut *tx,
            &question.id,
            question.points,
            now,
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to rescore answers"))?;
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit question update"))?;

    tracing::info!(
        action = "question_update",
        user_id = %staff.id,
        question_id = %question.id,
        points = question.points,
        rescored,
        "Question updated"
    );

    Ok(Json(QuestionResponse::with_key(question)))
}

pub(super) async fn delete_question(
    Path(question_id): Path<String>,
    CurrentStaff(staff): CurrentStaff,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted =
        repositories::questions::soft_delete(state.db(), &question_id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to delete question"))?;
    if !deleted {
        return Err(ApiError::NotFound("Question not found".to_string()));
    }

    tracing::info!(
        action = "question_delete",
        user_id = %staff.id,
        question_id = %question_id,
        "Question deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

fn required_exam_id(params: QuestionExamQuery) -> Result<String, ApiError> {
    params
        .exam_id
        .filter(|exam_id| !exam_id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("exam_id is required".to_string()))
}

async fn load_questions(state: &AppState, exam_id: &str) -> Result<Vec<Question>, ApiError> {
    repositories::questions::list_by_exam(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load questions"))
}

async fn fetch_question(state: &AppState, question_id: &str) -> Result<Question, ApiError> {
    repositories::questions::find_by_id(state.db(), question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))
}
