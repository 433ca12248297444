use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Exam;

pub(crate) const COLUMNS: &str = "\
    id, class_offering_id, kind, start_time, end_time, created_by, created_at, updated_at";

/// Exam row enriched with the counters the listing needs for one caller.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ExamListRow {
    #[sqlx(flatten)]
    pub(crate) exam: Exam,
    pub(crate) student_count: i64,
    pub(crate) roster_size: i64,
    pub(crate) on_roster: bool,
    pub(crate) question_count: i64,
    pub(crate) answered_count: i64,
}

/// Roster entry with the student's live exam total.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ExamReviewRow {
    pub(crate) student_id: String,
    pub(crate) full_name: String,
    pub(crate) student_number: Option<String>,
    pub(crate) national_student_number: Option<String>,
    pub(crate) total_score: i64,
    pub(crate) answered_count: i64,
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {COLUMNS} FROM exams WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_for_user(
    pool: &PgPool,
    user_id: &str,
    class_offering_id: Option<&str>,
) -> Result<Vec<ExamListRow>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(
        "SELECT e.id, e.class_offering_id, e.kind, e.start_time, e.end_time, e.created_by,
                e.created_at, e.updated_at,
                (SELECT COUNT(DISTINCT cs.student_id)
                   FROM class_students cs
                  WHERE cs.class_id = co.class_id
                    AND cs.academic_year_id = co.academic_year_id
                    AND cs.deleted_at IS NULL) AS student_count,
                (SELECT COUNT(*) FROM exam_roster r WHERE r.exam_id = e.id) AS roster_size,
                EXISTS (SELECT 1 FROM exam_roster r
                         WHERE r.exam_id = e.id AND r.student_id = ",
    );
    builder.push_bind(user_id);
    builder.push(
        ") AS on_roster,
                (SELECT COUNT(*) FROM questions q
                  WHERE q.exam_id = e.id AND q.deleted_at IS NULL) AS question_count,
                (SELECT COUNT(*) FROM answers a
                   JOIN questions q ON q.id = a.question_id AND q.deleted_at IS NULL
                  WHERE q.exam_id = e.id AND a.deleted_at IS NULL AND a.student_id = ",
    );
    builder.push_bind(user_id);
    builder.push(
        ") AS answered_count
         FROM exams e
         JOIN class_offerings co ON co.id = e.class_offering_id
         WHERE e.deleted_at IS NULL",
    );

    if let Some(class_offering_id) = class_offering_id {
        builder.push(" AND e.class_offering_id = ");
        builder.push_bind(class_offering_id);
    }

    builder.push(" ORDER BY e.start_time DESC, e.id DESC");
    builder.build_query_as::<ExamListRow>().fetch_all(pool).await
}

/// Exams of several offerings at once, in report column order.
pub(crate) async fn list_by_offerings(
    pool: &PgPool,
    class_offering_ids: &[String],
) -> Result<Vec<Exam>, sqlx::Error> {
    if class_offering_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {COLUMNS} FROM exams
         WHERE class_offering_id = ANY($1) AND deleted_at IS NULL
         ORDER BY start_time ASC, id ASC"
    ))
    .bind(class_offering_ids)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateExam<'a> {
    pub id: &'a str,
    pub class_offering_id: &'a str,
    pub kind: &'a str,
    pub start_time: PrimitiveDateTime,
    pub end_time: PrimitiveDateTime,
    pub created_by: &'a str,
    pub now: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateExam<'_>,
) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "INSERT INTO exams (
            id, class_offering_id, kind, start_time, end_time, created_by, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$7)
        RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.class_offering_id)
    .bind(params.kind)
    .bind(params.start_time)
    .bind(params.end_time)
    .bind(params.created_by)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

pub(crate) struct UpdateExam {
    pub class_offering_id: Option<String>,
    pub kind: Option<String>,
    pub start_time: Option<PrimitiveDateTime>,
    pub end_time: Option<PrimitiveDateTime>,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    params: UpdateExam,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "UPDATE exams SET
            class_offering_id = COALESCE($1, class_offering_id),
            kind = COALESCE($2, kind),
            start_time = COALESCE($3, start_time),
            end_time = COALESCE($4, end_time),
            updated_at = $5
         WHERE id = $6 AND deleted_at IS NULL
         RETURNING {COLUMNS}"
    ))
    .bind(params.class_offering_id)
    .bind(params.kind)
    .bind(params.start_time)
    .bind(params.end_time)
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
        "UPDATE exams SET deleted_at = $1, updated_at = $1 WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Replaces the whole roster of an exam. Duplicate ids collapse to one row.
pub(crate) async fn replace_roster(
    executor: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    exam_id: &str,
    student_ids: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM exam_roster WHERE exam_id = $1")
        .bind(exam_id)
        .execute(&mut **executor)
        .await?;

    sqlx::query(
        "INSERT INTO exam_roster (exam_id, student_id)
         SELECT $1, student_id FROM UNNEST($2::varchar[]) AS t(student_id)
         ON CONFLICT DO NOTHING",
    )
    .bind(exam_id)
    .bind(student_ids)
    .execute(&mut **executor)
    .await?;

    Ok(())
}

pub(crate) async fn roster(pool: &PgPool, exam_id: &str) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT student_id FROM exam_roster WHERE exam_id = $1 ORDER BY student_id ASC",
    )
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn is_on_roster(
    pool: &PgPool,
    exam_id: &str,
    student_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM exam_roster WHERE exam_id = $1 AND student_id = $2)",
    )
    .bind(exam_id)
    .bind(student_id)
    .fetch_one(pool)
    .await
}

/// Roster students of an exam with the live sum of their answer scores.
pub(crate) async fn review(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<ExamReviewRow>, sqlx::Error> {
    sqlx::query_as::<_, ExamReviewRow>(
        "SELECT u.id AS student_id,
                u.full_name,
                u.student_number,
                u.national_student_number,
                COALESCE(SUM(a.score), 0)::BIGINT AS total_score,
                COUNT(a.id) AS answered_count
         FROM exam_roster r
         JOIN users u ON u.id = r.student_id AND u.deleted_at IS NULL
         LEFT JOIN questions q ON q.exam_id = r.exam_id AND q.deleted_at IS NULL
         LEFT JOIN answers a
           ON a.question_id = q.id
          AND a.student_id = r.student_id
          AND a.deleted_at IS NULL
         WHERE r.exam_id = $1
         GROUP BY u.id, u.full_name, u.student_number, u.national_student_number
         ORDER BY u.full_name ASC, u.id ASC",
    )
    .bind(exam_id)
    .fetch_all(pool)
    .await
}
