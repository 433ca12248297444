use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::ClassOffering;

const COLUMNS: &str = "\
    id, class_id, academic_year_id, subject_id, teacher_id, created_at, updated_at";

/// Offering joined with the subject name, used by the per-student report.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OfferingWithSubject {
    pub(crate) id: String,
    pub(crate) subject_name: String,
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<ClassOffering>, sqlx::Error> {
    sqlx::query_as::<_, ClassOffering>(&format!(
        "SELECT {COLUMNS} FROM class_offerings WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list(
    pool: &PgPool,
    academic_year_id: Option<&str>,
    class_id: Option<&str>,
) -> Result<Vec<ClassOffering>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS} FROM class_offerings WHERE deleted_at IS NULL"
    ));

    if let Some(academic_year_id) = academic_year_id {
        builder.push(" AND academic_year_id = ");
        builder.push_bind(academic_year_id);
    }
    if let Some(class_id) = class_id {
        builder.push(" AND class_id = ");
        builder.push_bind(class_id);
    }

    builder.push(" ORDER BY created_at DESC");
    builder.build_query_as::<ClassOffering>().fetch_all(pool).await
}

pub(crate) struct CreateClassOffering<'a> {
    pub id: &'a str,
    pub class_id: &'a str,
    pub academic_year_id: &'a str,
    pub subject_id: &'a str,
    pub teacher_id: Option<&'a str>,
    pub now: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateClassOffering<'_>,
) -> Result<ClassOffering, sqlx::Error> {
    sqlx::query_as::<_, ClassOffering>(&format!(
        "INSERT INTO class_offerings (
            id, class_id, academic_year_id, subject_id, teacher_id, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$6)
        RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.class_id)
    .bind(params.academic_year_id)
    .bind(params.subject_id)
    .bind(params.teacher_id)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn soft_delete(
    pool: &PgPool,
    id: &str,
    now: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE class_offerings SET deleted_at = $1, updated_at = $1
         WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Offerings of every class the student is enrolled in for the academic year.
pub(crate) async fn list_for_student_year(
    pool: &PgPool,
    student_id: &str,
    academic_year_id: &str,
) -> Result<Vec<OfferingWithSubject>, sqlx::Error> {
    sqlx::query_as::<_, OfferingWithSubject>(
        "SELECT DISTINCT co.id, s.name AS subject_name
         FROM class_students cs
         JOIN class_offerings co
           ON co.class_id = cs.class_id
          AND co.academic_year_id = cs.academic_year_id
          AND co.deleted_at IS NULL
         JOIN subjects s ON s.id = co.subject_id
         WHERE cs.student_id = $1
           AND cs.academic_year_id = $2
           AND cs.deleted_at IS NULL
         ORDER BY s.name ASC, co.id ASC",
    )
    .bind(student_id)
    .bind(academic_year_id)
    .fetch_all(pool)
    .await
}
