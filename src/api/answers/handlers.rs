use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::guards::{require_exam_access, CurrentStaff, CurrentStudent, CurrentTeacher};
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::answer::{
    AnswerCreate, AnswerListQuery, AnswerResponse, AnswerScoreUpdate, AnswerSubmittedResponse,
};
use crate::services::scoring;

const ALREADY_ANSWERED: &str = "You have already answered this question";

/// Records a student's answer and scores it. The score is never returned to
/// the student.
pub(super) async fn submit_answer(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<AnswerCreate>,
) -> Result<(StatusCode, Json<AnswerSubmittedResponse>), ApiError> {
    payload.validate()?;

    let question = repositories::questions::find_by_id(state.db(), &payload.question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    require_exam_access(&state, &question.exam_id, &student.id).await?;

    let value = scoring::normalize_submission(payload.value.as_ref());
    let scored = scoring::score_answer(
        question.kind,
        question.points,
        question.answer_key.as_ref().map(|key| &key.0),
        value.as_ref(),
    );

    let answer = repositories::answers::create(
        state.db(),
        repositories::answers::CreateAnswer {
            id: &Uuid::new_v4().to_string(),
            question_id: &question.id,
            student_id: &student.id,
            value,
            status: &payload.status,
            remark: payload.remark.as_deref(),
            score: scored.score,
            is_correct: scored.is_correct,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::from_write(e, ALREADY_ANSWERED, "Failed to store answer"))?;

    metrics::record_answer_scored(question.kind, scored.is_correct);
    tracing::info!(
        action = "answer_submit",
        student_id = %student.id,
        question_id = %question.id,
        exam_id = %question.exam_id,
        kind = question.kind.as_str(),
        "Answer submitted"
    );

    Ok((StatusCode::CREATED, Json(AnswerSubmittedResponse::from(answer))))
}

pub(super) async fn list_answers(
    Query(params): Query<AnswerListQuery>,
    CurrentStaff(_staff): CurrentStaff,
    State(state): State<AppState>,
) -> Result<Json<Vec<AnswerResponse>>, ApiError> {
    let question_id = params
        .question_id
        .filter(|question_id| !question_id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("question_id is required".to_string()))?;

    let answers = repositories::answers::list_by_question(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list answers"))?;

    Ok(Json(answers.into_iter().map(AnswerResponse::from).collect()))
}

/// Manual grading. Bypasses the scorer; the stored correctness flag is kept.
pub(super) async fn grade_answer(
    Path(answer_id): Path<String>,
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<AnswerScoreUpdate>,
) -> Result<Json<AnswerResponse>, ApiError> {
    payload.validate()?;
    let score = payload.score.ok_or_else(|| ApiError::invalid_field("score", "score is required"))?;

    let answer = repositories::answers::update_score(
        state.db(),
        &answer_id,
        score,
        payload.remark.as_deref(),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update answer score"))?
    .ok_or_else(|| ApiError::NotFound("Answer not found".to_string()))?;

    tracing::info!(
        action = "answer_grade",
        teacher_id = %teacher.id,
        answer_id = %answer.id,
        score,
        "Answer graded"
    );

    Ok(Json(AnswerResponse::from(answer)))
}
