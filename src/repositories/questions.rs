use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Question;
use crate::db::types::{AnswerValue, QuestionKind};

const COLUMNS: &str = "\
    id, exam_id, kind, prompt, choices, answer_key, image_url, points, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_by_exam(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions
         WHERE exam_id = $1 AND deleted_at IS NULL
         ORDER BY created_at ASC, id ASC"
    ))
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_by_exam(pool: &PgPool, exam_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE exam_id = $1 AND deleted_at IS NULL")
        .bind(exam_id)
        .fetch_one(pool)
        .await
}

pub(crate) struct CreateQuestion<'a> {
    pub id: &'a str,
    pub exam_id: &'a str,
    pub kind: QuestionKind,
    pub prompt: &'a str,
    pub choices: Option<Vec<String>>,
    pub answer_key: Option<AnswerValue>,
    pub image_url: Option<&'a str>,
    pub points: i32,
    pub now: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            id, exam_id, kind, prompt, choices, answer_key, image_url, points,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$9)
        RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.exam_id)
    .bind(params.kind)
    .bind(params.prompt)
    .bind(params.choices.map(Json))
    .bind(params.answer_key.map(Json))
    .bind(params.image_url)
    .bind(params.points)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateQuestion {
    pub kind: Option<QuestionKind>,
    pub prompt: Option<String>,
    pub choices: Option<Vec<String>>,
    pub answer_key: Option<AnswerValue>,
    pub image_url: Option<String>,
    pub points: Option<i32>,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    params: UpdateQuestion,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "UPDATE questions SET
            kind = COALESCE($1, kind),
            prompt = COALESCE($2, prompt),
            choices = COALESCE($3, choices),
            answer_key = COALESCE($4, answer_key),
            image_url = COALESCE($5, image_url),
            points = COALESCE($6, points),
            updated_at = $7
         WHERE id = $8 AND deleted_at IS NULL
         RETURNING {COLUMNS}"
    ))
    .bind(params.kind)
    .bind(params.prompt)
    .bind(params.choices.map(Json))
    .bind(params.answer_key.map(Json))
    .bind(params.image_url)
    .bind(params.points)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn soft_delete(
    pool: &PgPool,
    id: &str,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE questions SET deleted_at = $1, updated_at = $1
         WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
