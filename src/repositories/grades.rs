use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Grade;

const COLUMNS: &str = "\
    id, class_offering_id, student_id, module_id, exam_id, name, score, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ModuleScoreRow {
    pub(crate) module_id: String,
    pub(crate) student_id: String,
    pub(crate) score: i32,
}

#[derive(Debug, Default)]
pub(crate) struct GradeFilter<'a> {
    pub class_offering_id: Option<&'a str>,
    pub module_id: Option<&'a str>,
    pub exam_id: Option<&'a str>,
    pub student_id: Option<&'a str>,
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Grade>, sqlx::Error> {
    sqlx::query_as::<_, Grade>(&format!(
        "SELECT {COLUMNS} FROM grades WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: GradeFilter<'_>,
    skip: i64,
    limit: i64,
) -> Result<Vec<Grade>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS} FROM grades WHERE deleted_at IS NULL"
    ));

    if let Some(class_offering_id) = filter.class_offering_id {
        builder.push(" AND class_offering_id = ");
        builder.push_bind(class_offering_id);
    }
    if let Some(module_id) = filter.module_id {
        builder.push(" AND module_id = ");
        builder.push_bind(module_id);
    }
    if let Some(exam_id) = filter.exam_id {
        builder.push(" AND exam_id = ");
        builder.push_bind(exam_id);
    }
    if let Some(student_id) = filter.student_id {
        builder.push(" AND student_id = ");
        builder.push_bind(student_id);
    }

    builder.push(" ORDER BY updated_at DESC, id ASC OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<Grade>().fetch_all(pool).await
}

pub(crate) struct CreateGrade<'a> {
    pub id: &'a str,
    pub class_offering_id: &'a str,
    pub student_id: &'a str,
    pub module_id: Option<&'a str>,
    pub exam_id: Option<&'a str>,
    pub name: &'a str,
    pub score: i32,
    pub now: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateGrade<'_>,
) -> Result<Grade, sqlx::Error> {
    sqlx::query_as::<_, Grade>(&format!(
        "INSERT INTO grades (
            id, class_offering_id, student_id, module_id, exam_id, name, score,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$8)
        RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.class_offering_id)
    .bind(params.student_id)
    .bind(params.module_id)
    .bind(params.exam_id)
    .bind(params.name)
    .bind(params.score)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

pub(crate) struct UpdateGrade {
    pub name: Option<String>,
    pub score: Option<i32>,
    pub module_id: Option<String>,
    pub exam_id: Option<String>,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    params: UpdateGrade,
) -> Result<Option<Grade>, sqlx::Error> {
    sqlx::query_as::<_, Grade>(&format!(
        "UPDATE grades SET
            name = COALESCE($1, name),
            score = COALESCE($2, score),
            module_id = COALESCE($3, module_id),
            exam_id = COALESCE($4, exam_id),
            updated_at = $5
         WHERE id = $6 AND deleted_at IS NULL
         RETURNING {COLUMNS}"
    ))
    .bind(params.name)
    .bind(params.score)
    .bind(params.module_id)
    .bind(params.exam_id)
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
        "UPDATE grades SET deleted_at = $1, updated_at = $1 WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Most recently updated manual grade per (module, student).
pub(crate) async fn latest_module_scores(
    pool: &PgPool,
    module_ids: &[String],
    student_ids: &[String],
) -> Result<Vec<ModuleScoreRow>, sqlx::Error> {
    if module_ids.is_empty() || student_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, ModuleScoreRow>(
        "SELECT DISTINCT ON (module_id, student_id) module_id, student_id, score
         FROM grades
         WHERE module_id = ANY($1)
           AND student_id = ANY($2)
           AND deleted_at IS NULL
         ORDER BY module_id, student_id, updated_at DESC, id DESC",
    )
    .bind(module_ids)
    .bind(student_ids)
    .fetch_all(pool)
    .await
}
