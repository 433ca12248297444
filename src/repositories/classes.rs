use sqlx::PgPool;

use crate::db::models::SchoolClass;

const COLUMNS: &str = "id, name, grade_level, created_at, updated_at";

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<SchoolClass>, sqlx::Error> {
    sqlx::query_as::<_, SchoolClass>(&format!(
        "SELECT {COLUMNS} FROM classes WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<SchoolClass>, sqlx::Error> {
    sqlx::query_as::<_, SchoolClass>(&format!(
        "SELECT {COLUMNS} FROM classes WHERE deleted_at IS NULL
         ORDER BY grade_level ASC NULLS LAST, name ASC"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn create(
    pool: &PgPool,
    id: &str,
    name: &str,
    grade_level: Option<i32>,
    now: time::PrimitiveDateTime,
) -> Result<SchoolClass, sqlx::Error> {
    sqlx::query_as::<_, SchoolClass>(&format!(
        "INSERT INTO classes (id, name, grade_level, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$4)
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(name)
    .bind(grade_level)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn soft_delete(
    pool: &PgPool,
    id: &str,
    now: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE classes SET deleted_at = $1, updated_at = $1 WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
