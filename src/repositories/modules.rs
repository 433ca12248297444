use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::Module;

const COLUMNS: &str = "\
    id, class_offering_id, name, kind, description, start_time, end_time, created_by, \
    created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Module>, sqlx::Error> {
    sqlx::query_as::<_, Module>(&format!(
        "SELECT {COLUMNS} FROM modules WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list(
    pool: &PgPool,
    class_offering_id: Option<&str>,
) -> Result<Vec<Module>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS} FROM modules WHERE deleted_at IS NULL"
    ));

    if let Some(class_offering_id) = class_offering_id {
        builder.push(" AND class_offering_id = ");
        builder.push_bind(class_offering_id);
    }

    builder.push(" ORDER BY created_at ASC, id ASC");
    builder.build_query_as::<Module>().fetch_all(pool).await
}

/// Modules of several offerings at once, in report column order.
pub(crate) async fn list_by_offerings(
    pool: &PgPool,
    class_offering_ids: &[String],
) -> Result<Vec<Module>, sqlx::Error> {
    if class_offering_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, Module>(&format!(
        "SELECT {COLUMNS} FROM modules
         WHERE class_offering_id = ANY($1) AND deleted_at IS NULL
         ORDER BY created_at ASC, id ASC"
    ))
    .bind(class_offering_ids)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateModule<'a> {
    pub id: &'a str,
    pub class_offering_id: &'a str,
    pub name: &'a str,
    pub kind: &'a str,
    pub description: Option<&'a str>,
    pub start_time: Option<time::PrimitiveDateTime>,
    pub end_time: Option<time::PrimitiveDateTime>,
    pub created_by: &'a str,
    pub now: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateModule<'_>) -> Result<Module, sqlx::Error> {
    sqlx::query_as::<_, Module>(&format!(
        "INSERT INTO modules (
            id, class_offering_id, name, kind, description, start_time, end_time,
            created_by, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$9)
        RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.class_offering_id)
    .bind(params.name)
    .bind(params.kind)
    .bind(params.description)
    .bind(params.start_time)
    .bind(params.end_time)
    .bind(params.created_by)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateModule {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<time::PrimitiveDateTime>,
    pub end_time: Option<time::PrimitiveDateTime>,
    pub updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateModule,
) -> Result<Option<Module>, sqlx::Error> {
    sqlx::query_as::<_, Module>(&format!(
        "UPDATE modules SET
            name = COALESCE($1, name),
            kind = COALESCE($2, kind),
            description = COALESCE($3, description),
            start_time = COALESCE($4, start_time),
            end_time = COALESCE($5, end_time),
            updated_at = $6
         WHERE id = $7 AND deleted_at IS NULL
         RETURNING {COLUMNS}"
    ))
    .bind(params.name)
    .bind(params.kind)
    .bind(params.description)
    .bind(params.start_time)
    .bind(params.end_time)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn soft_delete(
    pool: &PgPool,
    id: &str,
    now: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE modules SET deleted_at = $1, updated_at = $1 WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
