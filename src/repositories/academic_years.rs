use sqlx::PgPool;

use crate::db::models::AcademicYear;

const COLUMNS: &str = "id, name, is_active, created_at, updated_at";

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<AcademicYear>, sqlx::Error> {
    sqlx::query_as::<_, AcademicYear>(&format!(
        "SELECT {COLUMNS} FROM academic_years WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<AcademicYear>, sqlx::Error> {
    sqlx::query_as::<_, AcademicYear>(&format!(
        "SELECT {COLUMNS} FROM academic_years WHERE deleted_at IS NULL ORDER BY name DESC"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn create(
    pool: &PgPool,
    id: &str,
    name: &str,
    is_active: bool,
    now: time::PrimitiveDateTime,
) -> Result<AcademicYear, sqlx::Error> {
    sqlx::query_as::<_, AcademicYear>(&format!(
        "INSERT INTO academic_years (id, name, is_active, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$4)
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(name)
    .bind(is_active)
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
        "UPDATE academic_years SET deleted_at = $1, updated_at = $1
         WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
