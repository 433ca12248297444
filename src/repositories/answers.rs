use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Answer;
use crate::db::types::AnswerValue;

const COLUMNS: &str = "\
    id, question_id, student_id, value, status, remark, score, is_correct, manually_graded,
    created_at, updated_at";

/// Live exam total for one student.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ExamTotalRow {
    pub(crate) exam_id: String,
    pub(crate) student_id: String,
    pub(crate) total: i64,
}

pub(crate) async fn list_by_question(
    pool: &PgPool,
    question_id: &str,
) -> Result<Vec<Answer>, sqlx::Error> {
    sqlx::query_as::<_, Answer>(&format!(
        "SELECT {COLUMNS} FROM answers
         WHERE question_id = $1 AND deleted_at IS NULL
         ORDER BY created_at ASC, id ASC"
    ))
    .bind(question_id)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateAnswer<'a> {
    pub id: &'a str,
    pub question_id: &'a str,
    pub student_id: &'a str,
    pub value: Option<AnswerValue>,
    pub status: &'a str,
    pub remark: Option<&'a str>,
    pub score: i32,
    pub is_correct: Option<bool>,
    pub now: PrimitiveDateTime,
}

/// Inserts the answer. A second answer for the same student and question fails
/// with a unique violation on `answers_student_question_key`.
pub(crate) async fn create(pool: &PgPool, params: CreateAnswer<'_>) -> Result<Answer, sqlx::Error> {
    sqlx::query_as::<_, Answer>(&format!(
        "INSERT INTO answers (
            id, question_id, student_id, value, status, remark, score, is_correct,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$9)
        RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.question_id)
    .bind(params.student_id)
    .bind(params.value.map(Json))
    .bind(params.status)
    .bind(params.remark)
    .bind(params.score)
    .bind(params.is_correct)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

/// Manual grading: overrides the score and optionally the remark.
pub(crate) async fn update_score(
    pool: &PgPool,
    id: &str,
    score: i32,
    remark: Option<&str>,
    now: PrimitiveDateTime,
) -> Result<Option<Answer>, sqlx::Error> {
    sqlx::query_as::<_, Answer>(&format!(
        "UPDATE answers SET
            score = $1,
            manually_graded = TRUE,
            remark = COALESCE($2, remark),
            updated_at = $3
         WHERE id = $4 AND deleted_at IS NULL
         RETURNING {COLUMNS}"
    ))
    .bind(score)
    .bind(remark)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Rewrites scores of auto-scored answers after a point change: answers marked
/// correct get `points`, answers marked incorrect get 0. Answers without a
/// correctness flag and manually graded answers are left alone.
pub(crate) async fn rescore_for_question(
    executor: impl sqlx::PgExecutor<'_>,
    question_id: &str,
    points: i32,
    now: PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE answers SET
            score = CASE WHEN is_correct THEN $1 ELSE 0 END,
            updated_at = $2
         WHERE question_id = $3
           AND is_correct IS NOT NULL
           AND NOT manually_graded
           AND deleted_at IS NULL",
    )
    .bind(points)
    .bind(now)
    .bind(question_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Ids of the exam's questions the student already answered.
pub(crate) async fn answered_question_ids(
    pool: &PgPool,
    exam_id: &str,
    student_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT a.question_id FROM answers a
         JOIN questions q ON q.id = a.question_id
         WHERE q.exam_id = $1 AND a.student_id = $2 AND a.deleted_at IS NULL",
    )
    .bind(exam_id)
    .bind(student_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_for_student_in_exam(
    pool: &PgPool,
    exam_id: &str,
    student_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM answers a
         JOIN questions q ON q.id = a.question_id AND q.deleted_at IS NULL
         WHERE q.exam_id = $1 AND a.student_id = $2 AND a.deleted_at IS NULL",
    )
    .bind(exam_id)
    .bind(student_id)
    .fetch_one(pool)
    .await
}

/// Sums answer scores per (exam, student). Students without any answer in an
/// exam have no row.
pub(crate) async fn exam_totals(
    pool: &PgPool,
    exam_ids: &[String],
    student_ids: &[String],
) -> Result<Vec<ExamTotalRow>, sqlx::Error> {
    if exam_ids.is_empty() || student_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, ExamTotalRow>(
        "SELECT q.exam_id, a.student_id, SUM(a.score)::BIGINT AS total
         FROM answers a
         JOIN questions q ON q.id = a.question_id AND q.deleted_at IS NULL
         WHERE q.exam_id = ANY($1)
           AND a.student_id = ANY($2)
           AND a.deleted_at IS NULL
         GROUP BY q.exam_id, a.student_id",
    )
    .bind(exam_ids)
    .bind(student_ids)
    .fetch_all(pool)
    .await
}
